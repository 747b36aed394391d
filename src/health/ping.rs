// src/health/ping.rs
use async_trait::async_trait;

/// The liveness capability every probed dependency must expose: a single
/// "are you currently reachable" check. Implementations must not block
/// longer than their own transport requires; the probe runner bounds the
/// call with a timeout regardless.
#[async_trait]
pub trait Pingable: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;
}
