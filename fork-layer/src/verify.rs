use alloy_provider::{Provider, ProviderBuilder};
use async_trait::async_trait;
use primitives::ForkMode;
use tracing::info;
use url::Url;

use crate::{ForkError, LOG_TARGET};

/// Compare the chain id a fork source reports against the configured one.
/// A disabled fork has nothing to compare.
pub fn verify_chain_id(mode: &ForkMode, reported: u64) -> Result<(), ForkError> {
    match mode {
        ForkMode::Disabled => Ok(()),
        ForkMode::Enabled { chain_id, .. } if *chain_id == reported => Ok(()),
        ForkMode::Enabled { chain_id, .. } => {
            Err(ForkError::ChainIdMismatch { expected: *chain_id, actual: reported })
        }
    }
}

/// Anything able to answer `eth_chainId` for a fork source url
#[async_trait]
pub trait ChainIdSource {
    async fn chain_id(&self, url: &Url) -> Result<u64, ForkError>;
}

/// Asks the source over HTTP JSON-RPC
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpChainIdSource;

#[async_trait]
impl ChainIdSource for HttpChainIdSource {
    async fn chain_id(&self, url: &Url) -> Result<u64, ForkError> {
        let provider = ProviderBuilder::new().connect_http(url.clone());
        provider.get_chain_id().await.map_err(|e| ForkError::Source(e.to_string()))
    }
}

pub struct ForkVerifier<S = HttpChainIdSource> {
    source: S,
}

impl Default for ForkVerifier {
    fn default() -> Self {
        Self { source: HttpChainIdSource }
    }
}

impl<S: ChainIdSource + Send + Sync> ForkVerifier<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn verify(&self, mode: &ForkMode) -> Result<(), ForkError> {
        let ForkMode::Enabled { url, .. } = mode else {
            return Ok(());
        };

        let reported = self.source.chain_id(url).await?;
        verify_chain_id(mode, reported)?;
        info!(target: LOG_TARGET, source = %mode.redacted_url(), chain_id = reported, "Fork source verified.");
        Ok(())
    }
}
