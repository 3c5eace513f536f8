use std::path::PathBuf;
use std::str::FromStr;

use alloy_primitives::{hex, Address, U256};
use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use url::Url;

use crate::address::SafeDeployment;

/// Safe layer cli server arguments.
/// Every flag falls back to its environment variable, `.env` is loaded beforehand.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Deploys and relays single-owner Safe accounts", long_about = None)]
pub struct SafeLayerCli {
    /// Interface to listen on
    #[arg(long, env = "ADDRESS", default_value = "127.0.0.1")]
    pub address: String,
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
    /// Ethereum JSON-RPC endpoint, usually the local forked node
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: String,
    /// Hex private key paying for deployments and relayed calls
    #[arg(long, env = "BACKEND_PRIVATE_KEY", hide_env_values = true)]
    pub backend_private_key: String,
    #[arg(long, env = "FALLBACK_ADDRESS")]
    pub fallback_address: String,
    #[arg(long, env = "MASTER_COPY_CONTRACT_ADDRESS")]
    pub master_copy_address: String,
    #[arg(long, env = "PROXY_FACTORY_CONTRACT_ADDRESS")]
    pub proxy_factory_address: String,
    /// Hex encoded CREATE2 salt nonce, at most 32 bytes
    #[arg(long, env = "SALT_NONCE")]
    pub salt_nonce: String,
    /// Fork settings document, a missing file disables forking
    #[arg(long, env = "FORK_CONFIG", default_value = "hardhat/forking.json")]
    pub fork_config: PathBuf,
    /// Check that the fork source serves the configured chain before starting
    #[arg(long, env = "VERIFY_FORK")]
    pub verify_fork: bool,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl ToString) -> Self {
        ConfigError::Invalid { var, reason: reason.to_string() }
    }
}

/// Typed settings the service runs with
#[derive(Debug, Clone)]
pub struct SafeSettings {
    pub listen: String,
    pub rpc_url: Url,
    pub signer: PrivateKeySigner,
    pub deployment: SafeDeployment,
    pub fork_config: PathBuf,
    pub verify_fork: bool,
}

impl SafeLayerCli {
    pub fn validate(&self) -> Result<SafeSettings, ConfigError> {
        let rpc_url =
            Url::parse(self.rpc_url.trim()).map_err(|e| ConfigError::invalid("RPC_URL", e))?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid("RPC_URL", "expected an http(s) url"));
        }

        // never echo the key itself
        let signer = PrivateKeySigner::from_str(self.backend_private_key.trim())
            .map_err(|_| ConfigError::invalid("BACKEND_PRIVATE_KEY", "not a secp256k1 hex key"))?;

        let deployment = SafeDeployment {
            proxy_factory: address("PROXY_FACTORY_CONTRACT_ADDRESS", &self.proxy_factory_address)?,
            master_copy: address("MASTER_COPY_CONTRACT_ADDRESS", &self.master_copy_address)?,
            fallback_handler: address("FALLBACK_ADDRESS", &self.fallback_address)?,
            salt_nonce: salt_nonce(&self.salt_nonce)?,
        };

        Ok(SafeSettings {
            listen: format!("{}:{}", self.address, self.port),
            rpc_url,
            signer,
            deployment,
            fork_config: self.fork_config.clone(),
            verify_fork: self.verify_fork,
        })
    }
}

fn address(var: &'static str, value: &str) -> Result<Address, ConfigError> {
    value.trim().parse::<Address>().map_err(|e| ConfigError::invalid(var, e))
}

fn salt_nonce(value: &str) -> Result<U256, ConfigError> {
    let bytes = hex::decode(value.trim()).map_err(|e| ConfigError::invalid("SALT_NONCE", e))?;
    if bytes.is_empty() || bytes.len() > 32 {
        return Err(ConfigError::invalid("SALT_NONCE", "expected 1 to 32 bytes"));
    }
    Ok(U256::from_be_slice(&bytes))
}
