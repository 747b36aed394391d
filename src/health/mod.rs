// src/health/mod.rs
mod aggregator;
mod ping;
mod probe;
mod report;

pub use aggregator::HealthAggregator;
pub use ping::Pingable;
pub use probe::ProbeRunner;
pub use report::{HealthRecord, HealthReport, OverallStatus, ProbeStatus};
