// src/broker/transport.rs
// Thin seam over the AMQP wire types so the client's state machine can be
// exercised against scripted fakes.
use super::client::ConnectParams;
use super::error::BrokerError;
use async_trait::async_trait;
use lapin::{Connection, ConnectionProperties};
use tokio::sync::mpsc;
use tracing::warn;

#[async_trait]
pub trait ChannelHandle: Send + Sync {
    fn is_open(&self) -> bool;

    /// Arm a close-notification listener; `tx` fires when the channel is lost.
    fn notify_closed(&self, tx: mpsc::Sender<()>);

    async fn close(&self) -> Result<(), BrokerError>;
}

#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    fn is_open(&self) -> bool;

    /// Arm a close-notification listener; `tx` fires when the connection is lost.
    fn notify_closed(&self, tx: mpsc::Sender<()>);

    async fn close(&self) -> Result<(), BrokerError>;
}

/// A dialed connection plus its derived channel. Exclusively owned by the
/// broker client; nothing else may hold a reference to either handle.
pub struct BrokerLink {
    pub connection: Box<dyn ConnectionHandle>,
    pub channel: Box<dyn ChannelHandle>,
}

#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, params: &ConnectParams) -> Result<BrokerLink, BrokerError>;
}

/// Production dialer backed by `lapin`.
pub struct AmqpDialer;

#[async_trait]
impl Dialer for AmqpDialer {
    async fn dial(&self, params: &ConnectParams) -> Result<BrokerLink, BrokerError> {
        let connection = Connection::connect(
            &params.amqp_url(),
            ConnectionProperties::default().with_connection_name("rust-health-checker".into()),
        )
        .await
        .map_err(|err| BrokerError::Dial(err.to_string()))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|err| BrokerError::Dial(format!("channel open failed: {err}")))?;

        Ok(BrokerLink {
            connection: Box::new(AmqpConnection { inner: connection }),
            channel: Box::new(AmqpChannel { inner: channel }),
        })
    }
}

struct AmqpConnection {
    inner: Connection,
}

#[async_trait]
impl ConnectionHandle for AmqpConnection {
    fn is_open(&self) -> bool {
        self.inner.status().connected()
    }

    fn notify_closed(&self, tx: mpsc::Sender<()>) {
        self.inner.on_error(move |err| {
            warn!(%err, "broker connection error");
            let _ = tx.try_send(());
        });
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.inner
            .close(200, "shutting down")
            .await
            .map_err(|err| BrokerError::Shutdown {
                part: "connection",
                reason: err.to_string(),
            })
    }
}

struct AmqpChannel {
    inner: lapin::Channel,
}

#[async_trait]
impl ChannelHandle for AmqpChannel {
    fn is_open(&self) -> bool {
        self.inner.status().connected()
    }

    fn notify_closed(&self, tx: mpsc::Sender<()>) {
        self.inner.on_error(move |err| {
            warn!(%err, "broker channel error");
            let _ = tx.try_send(());
        });
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.inner
            .close(200, "shutting down")
            .await
            .map_err(|err| BrokerError::Shutdown {
                part: "channel",
                reason: err.to_string(),
            })
    }
}
