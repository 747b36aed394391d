// src/broker/error.rs

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("missing broker connection parameters: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    #[error("failed to dial broker: {0}")]
    Dial(String),

    #[error("broker client is already connected")]
    AlreadyConnected,

    #[error("broker unreachable: {0}")]
    Unreachable(&'static str),

    #[error("failed to close broker {part}: {reason}")]
    Shutdown { part: &'static str, reason: String },

    #[error("broker client is closed")]
    Closed,
}
