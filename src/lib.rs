//! FluxMQ, a lightweight in-memory publish/subscribe message broker.
//!
//! This crate exports
//!  * `core`    - partitioned topic logs, subscriptions, delivery protocol
//!  * `broker`  - TCP transport (length-prefixed protobuf frames)
//!  * `config`  - TOML-driven runtime configuration
//!  * `logging` - tracing subscriber setup
//!
//! Downstream applications can embed the serving loop (`start_broker`) or
//! drive the `core::Broker` directly from their own binaries.

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod broker;
pub mod config;
pub mod core;
pub mod logging;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use broker::server::serve as start_broker;
pub use config::{load_config, Config};
