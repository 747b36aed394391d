// src/broker/mod.rs
mod client;
mod error;
mod transport;

pub use client::{BrokerClient, ConnectParams};
pub use error::BrokerError;
pub use transport::{AmqpDialer, BrokerLink, ChannelHandle, ConnectionHandle, Dialer};
