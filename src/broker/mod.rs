//! TCP transport for the broker core: length-prefixed protobuf frames,
//! request dispatch and the serving loop. A thin translation layer; all
//! delivery semantics live in [`crate::core`].

pub mod client;
pub mod server;
pub mod wire;

pub use client::Client;
pub use server::serve;
