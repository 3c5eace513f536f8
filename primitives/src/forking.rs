//! Forking settings of the local simulated chain.
//!
//! The record mirrors the `networks.hardhat.forking` object of the development node
//! configuration: a provider `url` and the `chainId` of the network being forked. An empty
//! url switches forking off, in which case the chain id carries no meaning.

use serde::{Deserialize, Serialize};
use url::Url;

/// Chain id of Ethereum mainnet, the default fork target
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Raw forking record as written in the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkingConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

fn default_chain_id() -> u64 {
    MAINNET_CHAIN_ID
}

impl Default for ForkingConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ForkingConfig {
    pub fn disabled() -> Self {
        Self { url: String::new(), chain_id: MAINNET_CHAIN_ID }
    }

    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Check the url / chain id coupling and produce the resolved mode.
    pub fn validate(&self) -> Result<ForkMode, InvalidFork> {
        if !self.is_enabled() {
            return Ok(ForkMode::Disabled);
        }

        let url = Url::parse(self.url.trim())
            .map_err(|e| InvalidFork::Url(format!("{}: {e}", redact(self.url.trim()))))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(InvalidFork::Scheme(other.to_owned())),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(InvalidFork::Url(format!("{}: missing host", redact(url.as_str()))));
        }
        if self.chain_id == 0 {
            return Err(InvalidFork::ChainId);
        }

        Ok(ForkMode::Enabled { url, chain_id: self.chain_id })
    }
}

/// Forking settings after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkMode {
    Disabled,
    Enabled { url: Url, chain_id: u64 },
}

impl ForkMode {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ForkMode::Enabled { .. })
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            ForkMode::Disabled => None,
            ForkMode::Enabled { chain_id, .. } => Some(*chain_id),
        }
    }

    /// Source url with path and query hidden, provider keys usually live there.
    pub fn redacted_url(&self) -> String {
        match self {
            ForkMode::Disabled => String::new(),
            ForkMode::Enabled { url, .. } => redact(url.as_str()),
        }
    }

    pub fn summary(&self) -> ForkSummary {
        ForkSummary {
            enabled: self.is_enabled(),
            url: self.redacted_url(),
            chain_id: self.chain_id(),
        }
    }
}

/// What the service reports about its fork over RPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkSummary {
    pub enabled: bool,
    pub url: String,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFork {
    #[error("invalid fork url {0}")]
    Url(String),
    #[error("fork url must use http or https, got `{0}`")]
    Scheme(String),
    #[error("fork chain id must be a positive integer")]
    ChainId,
}

fn redact(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
            let hidden = url.path() != "/" || url.query().is_some();
            format!("{}://{host}{port}{}", url.scheme(), if hidden { "/…" } else { "" })
        }
        Err(_) => "<unparseable url>".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn config(url: &str, chain_id: u64) -> ForkingConfig {
        ForkingConfig { url: url.to_owned(), chain_id }
    }

    #[test]
    fn empty_url_disables_forking_whatever_the_chain_id() {
        assert_eq!(config("", 1).validate().unwrap(), ForkMode::Disabled);
        assert_eq!(config("   ", 0).validate().unwrap(), ForkMode::Disabled);
        assert!(!ForkingConfig::default().is_enabled());
    }

    #[test]
    fn well_formed_url_requires_positive_chain_id() {
        assert_matches!(
            config("https://eth-mainnet.g.alchemy.com/v2/key", 0).validate(),
            Err(InvalidFork::ChainId)
        );

        let mode = config("https://eth-mainnet.g.alchemy.com/v2/key", 1).validate().unwrap();
        assert_eq!(mode.chain_id(), Some(1));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert_matches!(config("ws://localhost:8545", 1).validate(), Err(InvalidFork::Scheme(s)) if s == "ws");
        assert_matches!(config("not a url", 1).validate(), Err(InvalidFork::Url(_)));
    }

    #[test]
    fn redaction_hides_api_keys() {
        let mode = config("https://eth-mainnet.g.alchemy.com/v2/secret", 1).validate().unwrap();
        assert_eq!(mode.redacted_url(), "https://eth-mainnet.g.alchemy.com/…");

        let local = config("http://127.0.0.1:8545", 31337).validate().unwrap();
        assert_eq!(local.redacted_url(), "http://127.0.0.1:8545");
    }

    #[test]
    fn reads_camel_case_chain_id() {
        let parsed: ForkingConfig = serde_json::from_str(r#"{"url": "", "chainId": 5}"#).unwrap();
        assert_eq!(parsed.chain_id, 5);

        let defaulted: ForkingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, ForkingConfig::disabled());
    }
}
