// src/health/report.rs
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeStatus {
    #[serde(rename = "OK")]
    Ok,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverallStatus {
    Available,
    PartiallyAvailable,
    Unavailable,
    Unknown,
}

/// One probed dependency, produced fresh on every aggregation call.
#[derive(Debug, Clone, Serialize)]
pub struct HealthRecord {
    pub status: ProbeStatus,
    pub component: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub overall_status: OverallStatus,
    pub timestamp: String,
    pub checks: Vec<HealthRecord>,
}

impl HealthReport {
    /// Reduce individual records into one report, stamped with the current
    /// time in RFC 3339.
    pub fn from_checks(checks: Vec<HealthRecord>) -> Self {
        Self {
            overall_status: reduce(&checks),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            checks,
        }
    }
}

fn reduce(checks: &[HealthRecord]) -> OverallStatus {
    if checks.is_empty() {
        return OverallStatus::Unknown;
    }

    let ok_count = checks
        .iter()
        .filter(|check| check.status == ProbeStatus::Ok)
        .count();

    if ok_count == checks.len() {
        OverallStatus::Available
    } else if ok_count == 0 {
        OverallStatus::Unavailable
    } else {
        OverallStatus::PartiallyAvailable
    }
}
