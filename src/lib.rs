// src/lib.rs
pub mod broker;
pub mod cache;
pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod store;
