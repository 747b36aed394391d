// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        buffer
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,

    // Broker metrics
    pub broker_reconnects_total: IntCounter,

    // Dependency metrics
    pub healthy_dependencies: IntGauge,
    pub total_dependencies: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("hc_probes_total", "Total number of dependency probes"),
            &["component", "status"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "hc_probe_duration_seconds",
                "Dependency probe duration in seconds",
            ),
            &["component"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let broker_reconnects_total = IntCounter::new(
            "hc_broker_reconnects_total",
            "Successful broker reconnections",
        )?;
        registry.register(Box::new(broker_reconnects_total.clone()))?;

        let healthy_dependencies =
            IntGauge::new("hc_healthy_dependencies", "Number of healthy dependencies")?;
        registry.register(Box::new(healthy_dependencies.clone()))?;

        let total_dependencies =
            IntGauge::new("hc_total_dependencies", "Total number of probed dependencies")?;
        registry.register(Box::new(total_dependencies.clone()))?;

        Ok(Self {
            probes_total,
            probe_duration_seconds,
            broker_reconnects_total,
            healthy_dependencies,
            total_dependencies,
        })
    }

    pub fn record_probe(&self, component: &str, healthy: bool, duration: std::time::Duration) {
        let status = if healthy { "ok" } else { "unavailable" };
        self.probes_total
            .with_label_values(&[component, status])
            .inc();

        self.probe_duration_seconds
            .with_label_values(&[component])
            .observe(duration.as_secs_f64());
    }

    pub fn inc_broker_reconnect(&self) {
        self.broker_reconnects_total.inc();
    }

    pub fn update_dependency_counts(&self, healthy: usize, total: usize) {
        self.healthy_dependencies.set(healthy as i64);
        self.total_dependencies.set(total as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_exposes_probe_counters() {
        let registry = MetricsRegistry::new().unwrap();
        let collector = registry.collector();

        collector.record_probe("postgres", true, std::time::Duration::from_millis(3));
        collector.record_probe("rabbitmq", false, std::time::Duration::from_millis(12));
        collector.update_dependency_counts(1, 2);
        collector.inc_broker_reconnect();

        let output = String::from_utf8(registry.gather()).unwrap();
        assert!(output.contains("hc_probes_total"));
        assert!(output.contains("hc_broker_reconnects_total 1"));
        assert!(output.contains("hc_healthy_dependencies 1"));
        assert!(output.contains("hc_total_dependencies 2"));
    }
}
