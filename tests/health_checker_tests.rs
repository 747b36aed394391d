// tests/health_checker_tests.rs
use async_trait::async_trait;
use rust_health_checker::health::{HealthAggregator, OverallStatus, Pingable};
use std::sync::Arc;
use std::time::Duration;

struct StaticPing {
    healthy: bool,
}

#[async_trait]
impl Pingable for StaticPing {
    async fn ping(&self) -> anyhow::Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(anyhow::anyhow!("unreachable"))
        }
    }
}

struct HangingPing;

#[async_trait]
impl Pingable for HangingPing {
    async fn ping(&self) -> anyhow::Result<()> {
        futures::future::pending().await
    }
}

fn handle(healthy: bool) -> Option<Arc<dyn Pingable>> {
    Some(Arc::new(StaticPing { healthy }))
}

#[tokio::test]
async fn mixed_results_reduce_to_partially_available() {
    let mut aggregator = HealthAggregator::new(Duration::from_secs(1));
    aggregator.register("postgres", "1.0.0", handle(true));
    aggregator.register("redis", "1.0.0", handle(false));
    aggregator.register("rabbitmq", "1.0.0", handle(true));

    let report = aggregator.check().await;

    assert_eq!(report.overall_status, OverallStatus::PartiallyAvailable);
    let components: Vec<&str> = report
        .checks
        .iter()
        .map(|check| check.component.as_str())
        .collect();
    assert_eq!(components, ["postgres", "redis", "rabbitmq"]);
}

#[tokio::test]
async fn report_serializes_to_the_wire_contract() {
    let mut aggregator = HealthAggregator::new(Duration::from_secs(1));
    aggregator.register("postgres", "1.0.0", handle(true));
    aggregator.register("rabbitmq", "1.0.0", handle(false));

    let report = aggregator.check().await;
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["overallStatus"], "PartiallyAvailable");
    assert_eq!(value["checks"][0]["status"], "OK");
    assert_eq!(value["checks"][1]["status"], "Unavailable");
    assert_eq!(value["checks"][1]["component"], "rabbitmq");
    chrono::DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).unwrap();
}

#[tokio::test]
async fn hanging_dependency_does_not_hang_the_aggregation() {
    let mut aggregator = HealthAggregator::new(Duration::from_millis(200));
    aggregator.register("postgres", "1.0.0", handle(true));
    aggregator.register("rabbitmq", "1.0.0", Some(Arc::new(HangingPing)));

    let started = std::time::Instant::now();
    let report = tokio::time::timeout(Duration::from_secs(2), aggregator.check())
        .await
        .expect("aggregation must return within the probe timeout plus overhead");

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(report.overall_status, OverallStatus::PartiallyAvailable);
    assert_eq!(report.checks.len(), 2);
}

#[tokio::test]
async fn unconfigured_dependencies_yield_unknown() {
    let mut aggregator = HealthAggregator::new(Duration::from_secs(1));
    aggregator.register("postgres", "1.0.0", None);
    aggregator.register("redis", "1.0.0", None);
    aggregator.register("rabbitmq", "1.0.0", None);

    let report = aggregator.check().await;
    assert_eq!(report.overall_status, OverallStatus::Unknown);
    assert!(report.checks.is_empty());
}
