//! Client-side data access for a remote task server.
//!
//! A [`TaskClient`] owns one blocking channel, a cached snapshot of every
//! task, and the logic that keeps the two in step.

pub mod cache;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;

// Re-exports for convenience
pub use cache::{Snapshot, TaskCache};
pub use client::{SyncOutcome, TaskClient};
pub use config::{ClientConfig, ConnectionConfig, FilterConfig, FilterMode, ServerConfig};
pub use connection::{Connection, Connector, Endpoint, TcpConnector, Timeouts};
pub use error::{ClientError, ErrorKind, Result};
