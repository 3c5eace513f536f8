//! Fork settings of the local development chain.
//!
//! Reads the `networks.hardhat.forking` document, validates the url / chain id pair and
//! optionally checks that the fork source really serves the configured chain.

mod document;
mod verify;

pub use document::{NetworksDocument, HARDHAT_NETWORK};
pub use primitives::{ForkMode, ForkSummary, ForkingConfig, InvalidFork};
pub use verify::{verify_chain_id, ChainIdSource, ForkVerifier, HttpChainIdSource};

pub(crate) const LOG_TARGET: &str = "fork";

#[derive(Debug, thiserror::Error)]
pub enum ForkError {
    #[error("failed to read fork settings {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed fork settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fork settings missing key `{0}`")]
    MissingKey(String),
    #[error(transparent)]
    Invalid(#[from] InvalidFork),
    #[error("fork source serves chain {actual}, settings expect {expected}")]
    ChainIdMismatch { expected: u64, actual: u64 },
    #[error("fork source unreachable: {0}")]
    Source(String),
}
