// src/cache/mod.rs
use crate::config::CacheConfig;
use crate::health::Pingable;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::RedisError;
use tracing::info;

/// Redis client with the narrow contract the health checker needs: verify
/// liveness and close. The multiplexed connection is cheap to clone, so
/// `ping` never contends with other users of the cache.
pub struct Cache {
    connection: MultiplexedConnection,
}

impl Cache {
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client =
            redis::Client::open(config.url.as_str()).context("Invalid Redis URL")?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")?;

        info!("redis connection established");
        Ok(Self { connection })
    }

    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut connection = self.connection.clone();
        redis::cmd("PING").query_async::<()>(&mut connection).await
    }

    // The multiplexed connection terminates when its last clone drops;
    // there is nothing to tear down eagerly.
    pub fn close(&self) {
        info!("redis connection closed");
    }
}

#[async_trait]
impl Pingable for Cache {
    async fn ping(&self) -> anyhow::Result<()> {
        Cache::ping(self).await.map_err(Into::into)
    }
}
