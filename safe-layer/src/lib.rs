//! Safe layer: deploys and drives single-owner Safe accounts for users.
//!
//! The backend key pays for `createProxyWithNonce` on the proxy factory and relays
//! `execTransaction` calls signed by the owner. Everything is exposed over JSON-RPC.

pub mod address;
pub mod config;
pub mod contracts;
pub mod handlers;
pub mod safe;
pub mod server;
pub mod service;
pub mod traits;

pub use handlers::{Ledger, SafeHandler, SystemHandler};
pub use safe::{Safe, SharedSafe};
pub use server::run_rpc_server;

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}
