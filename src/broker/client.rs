// src/broker/client.rs
use super::error::BrokerError;
use super::transport::{AmqpDialer, Dialer};
use crate::health::Pingable;
use crate::metrics::MetricsCollector;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

/// Broker connection parameters. Immutable once a connect succeeds; every
/// reconnect attempt reuses them verbatim.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub vhost: String,
}

impl ConnectParams {
    pub fn new(host: &str, port: &str, user: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port: port.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            vhost: "/".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), BrokerError> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push("host".to_string());
        }
        if self.port.is_empty() {
            missing.push("port".to_string());
        }
        if self.user.is_empty() {
            missing.push("user".to_string());
        }
        if self.password.is_empty() {
            missing.push("password".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BrokerError::Configuration { missing })
        }
    }

    pub(crate) fn amqp_url(&self) -> String {
        format!(
            "amqp://{}:{}@{}:{}/{}",
            self.user,
            self.password,
            self.host,
            self.port,
            self.vhost.replace('/', "%2f")
        )
    }

    /// Connection URL without credentials, for logging.
    pub fn redacted_url(&self) -> String {
        format!("amqp://{}@{}:{}", self.user, self.host, self.port)
    }
}

#[derive(Default)]
struct ClientState {
    connection: Option<Box<dyn super::transport::ConnectionHandle>>,
    channel: Option<Box<dyn super::transport::ChannelHandle>>,
    // Set by the first successful connect and never cleared; this is the
    // lifecycle marker, while the handles above come and go with losses.
    params: Option<ConnectParams>,
    closed: bool,
}

/// Concurrency-safe broker client with automatic reconnection.
///
/// `connect` dials once and spawns a single long-lived supervisor task. The
/// supervisor waits for a close notification, then re-dials on a fixed
/// cadence until it succeeds or the client is closed; each success re-arms a
/// fresh close listener. All connection/channel state is serialized behind
/// one lock, so a reconnect in progress blocks `ping` and `close` until the
/// dial finishes.
pub struct BrokerClient {
    dialer: Arc<dyn Dialer>,
    retry_interval: Duration,
    state: Arc<Mutex<ClientState>>,
    metrics: Option<Arc<MetricsCollector>>,
    shutdown_tx: watch::Sender<bool>,
}

impl BrokerClient {
    pub fn new(retry_interval: Duration) -> Self {
        Self::with_dialer(Arc::new(AmqpDialer), retry_interval)
    }

    pub fn with_dialer(dialer: Arc<dyn Dialer>, retry_interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            dialer,
            retry_interval,
            state: Arc::new(Mutex::new(ClientState::default())),
            metrics: None,
            shutdown_tx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Observe the shutdown signal; fires exactly once, on the first `close`.
    pub fn on_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Validate the parameters, dial the broker, open a channel and spawn
    /// the supervisor. Dial failures surface to the caller; only losses
    /// *after* a successful connect trigger the background retry loop.
    pub async fn connect(&self, params: ConnectParams) -> Result<(), BrokerError> {
        params.validate()?;

        let mut state = self.state.lock().await;
        if state.closed {
            return Err(BrokerError::Closed);
        }
        // Guard on the lifecycle marker, not the live handle: the handle is
        // absent while the supervisor waits to redial, but the client is
        // still connected in the contract sense and must not accept a second
        // connect (which would spawn a second supervisor).
        if state.params.is_some() {
            return Err(BrokerError::AlreadyConnected);
        }

        info!(url = %params.redacted_url(), "connecting to broker");
        let link = self.dialer.dial(&params).await?;

        let (tx, rx) = mpsc::channel(1);
        link.connection.notify_closed(tx.clone());
        link.channel.notify_closed(tx);

        state.params = Some(params);
        state.connection = Some(link.connection);
        state.channel = Some(link.channel);
        drop(state);

        self.spawn_supervisor(rx);
        info!("broker connection established");
        Ok(())
    }

    /// Alive only when both the connection and the channel are currently
    /// open. Inspects guarded state; never issues network I/O.
    pub async fn ping(&self) -> Result<(), BrokerError> {
        let state = self.state.lock().await;
        if state.closed {
            return Err(BrokerError::Closed);
        }

        let connection = state
            .connection
            .as_ref()
            .ok_or(BrokerError::Unreachable("connection is not established"))?;
        let channel = state
            .channel
            .as_ref()
            .ok_or(BrokerError::Unreachable("channel is not initialized"))?;

        if !connection.is_open() {
            return Err(BrokerError::Unreachable("connection is closed"));
        }
        if !channel.is_open() {
            return Err(BrokerError::Unreachable("channel is closed"));
        }
        Ok(())
    }

    /// Idempotent shutdown. The first caller fires the shutdown signal and
    /// closes the channel, then the connection; later callers observe the
    /// fired signal and do no redundant work. Close errors surface, but the
    /// signal fires regardless.
    pub async fn close(&self) -> Result<(), BrokerError> {
        let (channel, connection, first) = {
            let mut state = self.state.lock().await;
            let first = !state.closed;
            state.closed = true;
            (state.channel.take(), state.connection.take(), first)
        };

        if first {
            // The supervisor observes this at its next retry boundary.
            let _ = self.shutdown_tx.send(true);
        }

        if channel.is_none() && connection.is_none() {
            return Ok(());
        }

        let mut result = Ok(());
        if let Some(channel) = channel {
            if let Err(err) = channel.close().await {
                error!(%err, "failed to close broker channel");
                result = Err(err);
            }
        }
        if let Some(connection) = connection {
            if let Err(err) = connection.close().await {
                error!(%err, "failed to close broker connection");
                // The channel error, if any, takes precedence.
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        info!("broker client closed");
        result
    }

    fn spawn_supervisor(&self, closed_rx: mpsc::Receiver<()>) {
        let dialer = self.dialer.clone();
        let state = self.state.clone();
        let metrics = self.metrics.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let retry_interval = self.retry_interval;

        tokio::spawn(supervise(
            dialer,
            state,
            metrics,
            shutdown_rx,
            retry_interval,
            closed_rx,
        ));
    }
}

#[async_trait]
impl Pingable for BrokerClient {
    async fn ping(&self) -> anyhow::Result<()> {
        BrokerClient::ping(self).await.map_err(Into::into)
    }
}

/// One supervisor per client lifetime: waits for a close notification,
/// drives the reconnect loop, and re-arms itself with the fresh listener
/// after every successful reconnect.
async fn supervise(
    dialer: Arc<dyn Dialer>,
    state: Arc<Mutex<ClientState>>,
    metrics: Option<Arc<MetricsCollector>>,
    mut shutdown_rx: watch::Receiver<bool>,
    retry_interval: Duration,
    mut closed_rx: mpsc::Receiver<()>,
) {
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = closed_rx.recv() => {
                warn!("broker connection lost, reconnecting");
                {
                    let mut state = state.lock().await;
                    state.connection = None;
                    state.channel = None;
                }

                match reconnect(&dialer, &state, &metrics, &shutdown_rx, retry_interval).await {
                    Some(rx) => closed_rx = rx,
                    None => break,
                }
            }
        }
    }

    debug!("broker supervisor stopped");
}

/// Fixed-interval retry, no backoff, no attempt cap. The shutdown signal is
/// consulted at each retry boundary, never mid-dial; an in-flight attempt
/// completes before shutdown is observed.
async fn reconnect(
    dialer: &Arc<dyn Dialer>,
    state: &Arc<Mutex<ClientState>>,
    metrics: &Option<Arc<MetricsCollector>>,
    shutdown_rx: &watch::Receiver<bool>,
    retry_interval: Duration,
) -> Option<mpsc::Receiver<()>> {
    loop {
        sleep(retry_interval).await;
        if *shutdown_rx.borrow() {
            return None;
        }

        let mut state = state.lock().await;
        if state.closed {
            return None;
        }
        let Some(params) = state.params.clone() else {
            return None;
        };

        match dialer.dial(&params).await {
            Ok(link) => {
                let (tx, rx) = mpsc::channel(1);
                link.connection.notify_closed(tx.clone());
                link.channel.notify_closed(tx);

                state.connection = Some(link.connection);
                state.channel = Some(link.channel);

                if let Some(metrics) = metrics {
                    metrics.inc_broker_reconnect();
                }
                info!("broker reconnected");
                return Some(rx);
            }
            Err(err) => error!(%err, "broker reconnect attempt failed"),
        }
    }
}
