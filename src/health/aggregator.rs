// src/health/aggregator.rs
use super::ping::Pingable;
use super::probe::ProbeRunner;
use super::report::{HealthReport, ProbeStatus};
use crate::metrics::MetricsCollector;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

struct Dependency {
    name: String,
    version: String,
    target: Arc<dyn Pingable>,
}

/// Probes every registered liveness capability and reduces the results to
/// one report. Owns no state across calls: each `check()` produces fresh
/// records in registration order.
pub struct HealthAggregator {
    dependencies: Vec<Dependency>,
    runner: ProbeRunner,
    metrics: Option<Arc<MetricsCollector>>,
}

impl HealthAggregator {
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            dependencies: Vec::new(),
            runner: ProbeRunner::new(probe_timeout),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register a dependency. An absent handle means the dependency is not
    /// configured: it contributes no record, not a failure record.
    pub fn register(&mut self, name: &str, version: &str, target: Option<Arc<dyn Pingable>>) {
        match target {
            Some(target) => self.dependencies.push(Dependency {
                name: name.to_string(),
                version: version.to_string(),
                target,
            }),
            None => debug!(component = name, "dependency not configured, skipping"),
        }
    }

    /// Run every probe sequentially, each under its own timeout, and reduce
    /// the records. This never fails: dependency failures are absorbed into
    /// per-record statuses so the caller always gets a structured answer.
    pub async fn check(&self) -> HealthReport {
        let mut checks = Vec::with_capacity(self.dependencies.len());

        for dependency in &self.dependencies {
            let started = std::time::Instant::now();
            let record = self
                .runner
                .probe(&dependency.name, &dependency.version, dependency.target.as_ref())
                .await;

            if let Some(metrics) = &self.metrics {
                metrics.record_probe(
                    &dependency.name,
                    record.status == ProbeStatus::Ok,
                    started.elapsed(),
                );
            }

            checks.push(record);
        }

        let healthy = checks
            .iter()
            .filter(|check| check.status == ProbeStatus::Ok)
            .count();

        if let Some(metrics) = &self.metrics {
            metrics.update_dependency_counts(healthy, checks.len());
        }

        info!(
            "Health check complete: {} healthy, {} unhealthy",
            healthy,
            checks.len() - healthy
        );

        HealthReport::from_checks(checks)
    }
}
