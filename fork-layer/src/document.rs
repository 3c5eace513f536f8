use std::path::Path;

use primitives::{ForkMode, ForkingConfig};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::{ForkError, LOG_TARGET};

/// Network name the development node reads its fork settings from
pub const HARDHAT_NETWORK: &str = "hardhat";

/// The settings document
/// `networks` ===> `hardhat` ===> `forking` ===> { `url`, `chainId` }
/// Sibling keys at any level belong to the host tool and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworksDocument {
    pub forking: ForkingConfig,
}

impl NetworksDocument {
    pub fn from_json_str(raw: &str) -> Result<Self, ForkError> {
        let root: JsonValue = serde_json::from_str(raw)?;

        let forking = lookup(&root, &["networks", HARDHAT_NETWORK, "forking"])?;
        for key in ["url", "chainId"] {
            if forking.get(key).is_none() {
                return Err(ForkError::MissingKey(format!(
                    "networks.{HARDHAT_NETWORK}.forking.{key}"
                )));
            }
        }

        let forking: ForkingConfig = serde_json::from_value(forking.clone())?;
        Ok(Self { forking })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ForkError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ForkError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Like `from_path`, but a missing file means forking is off.
    pub fn load_or_disabled(path: impl AsRef<Path>) -> Result<Self, ForkError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(target: LOG_TARGET, path = %path.display(), "No fork settings found, forking disabled.");
            return Ok(Self::default());
        }
        let document = Self::from_path(path)?;
        debug!(target: LOG_TARGET, path = %path.display(), enabled = document.forking.is_enabled(), "Loaded fork settings.");
        Ok(document)
    }

    pub fn mode(&self) -> Result<ForkMode, ForkError> {
        Ok(self.forking.validate()?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ForkError> {
        let document = json!({
            "networks": {
                "hardhat": {
                    "forking": self.forking,
                }
            }
        });
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

fn lookup<'a>(root: &'a JsonValue, path: &[&str]) -> Result<&'a JsonValue, ForkError> {
    let mut node = root;
    for (depth, key) in path.iter().enumerate() {
        node = node
            .get(key)
            .filter(|value| value.is_object())
            .ok_or_else(|| ForkError::MissingKey(path[..=depth].join(".")))?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    const SHIPPED: &str = include_str!("../../hardhat/forking.json");

    #[test]
    fn shipped_settings_disable_forking() {
        let document = NetworksDocument::from_json_str(SHIPPED).unwrap();
        assert_eq!(document.forking, ForkingConfig { url: String::new(), chain_id: 1 });
        assert_eq!(document.mode().unwrap(), ForkMode::Disabled);
    }

    #[test]
    fn reports_the_first_missing_key() {
        assert_matches!(
            NetworksDocument::from_json_str("{}"),
            Err(ForkError::MissingKey(key)) if key == "networks"
        );
        assert_matches!(
            NetworksDocument::from_json_str(r#"{"networks": {"localhost": {}}}"#),
            Err(ForkError::MissingKey(key)) if key == "networks.hardhat"
        );
        assert_matches!(
            NetworksDocument::from_json_str(r#"{"networks": {"hardhat": {"forking": {"url": ""}}}}"#),
            Err(ForkError::MissingKey(key)) if key == "networks.hardhat.forking.chainId"
        );
    }

    #[test]
    fn wrong_types_are_parse_errors() {
        let raw = r#"{"networks": {"hardhat": {"forking": {"url": "", "chainId": "one"}}}}"#;
        assert_matches!(NetworksDocument::from_json_str(raw), Err(ForkError::Parse(_)));
    }

    #[test]
    fn enabled_fork_with_extra_host_settings() {
        let raw = r#"{
            "solidity": "0.8.19",
            "networks": {
                "hardhat": {
                    "mining": { "auto": true },
                    "forking": { "url": "https://rpc.example.org/v1/key", "chainId": 10, "blockNumber": 1 }
                }
            }
        }"#;
        let mode = NetworksDocument::from_json_str(raw).unwrap().mode().unwrap();
        assert_eq!(mode.chain_id(), Some(10));
    }

    #[test]
    fn invalid_pair_surfaces_on_mode() {
        let raw = r#"{"networks": {"hardhat": {"forking": {"url": "https://rpc.example.org", "chainId": 0}}}}"#;
        let document = NetworksDocument::from_json_str(raw).unwrap();
        assert_matches!(document.mode(), Err(ForkError::Invalid(_)));
    }

    #[test]
    fn renders_the_same_schema() {
        let document = NetworksDocument {
            forking: ForkingConfig { url: "http://127.0.0.1:8545".into(), chain_id: 5 },
        };
        let rendered = document.to_json_pretty().unwrap();
        assert_eq!(NetworksDocument::from_json_str(&rendered).unwrap(), document);
    }

    #[test]
    fn missing_file_means_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let document = NetworksDocument::load_or_disabled(dir.path().join("absent.json")).unwrap();
        assert!(!document.forking.is_enabled());

        assert_matches!(
            NetworksDocument::from_path(dir.path().join("absent.json")),
            Err(ForkError::Io { .. })
        );
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"networks": {{"hardhat": {{"forking": {{"url": "http://localhost:8545", "chainId": 31337}}}}}}}}"#).unwrap();

        let document = NetworksDocument::load_or_disabled(file.path()).unwrap();
        assert_eq!(document.forking.chain_id, 31337);
        assert!(document.forking.is_enabled());
    }
}
