// src/health/probe.rs
use super::ping::Pingable;
use super::report::{HealthRecord, ProbeStatus};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Bounds a single `ping()` by a timeout and converts the outcome into a
/// uniform record. Errors and timeouts become `Unavailable`, never an error
/// return: one unreachable dependency must not abort the aggregation.
pub struct ProbeRunner {
    timeout: Duration,
}

impl ProbeRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn probe(
        &self,
        component: &str,
        version: &str,
        target: &dyn Pingable,
    ) -> HealthRecord {
        let status = match timeout(self.timeout, target.ping()).await {
            Ok(Ok(())) => {
                debug!(component, "probe ok");
                ProbeStatus::Ok
            }
            Ok(Err(err)) => {
                warn!(component, %err, "probe failed");
                ProbeStatus::Unavailable
            }
            Err(_) => {
                warn!(component, timeout = ?self.timeout, "probe timed out");
                ProbeStatus::Unavailable
            }
        };

        HealthRecord {
            status,
            component: component.to_string(),
            version: version.to_string(),
        }
    }
}
