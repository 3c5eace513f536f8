use alloy_network::{EthereumWallet, ReceiptResponse};
use alloy_primitives::{Address, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use primitives::{parse_address, ForkMode, Operation, SafeCall, SafeError, SafeInfo, SafeResponse};
use tracing::{debug, info, warn};

use crate::address::SafeDeployment;
use crate::config::SafeSettings;
use crate::contracts::{IProxyFactory, ISafe};
use crate::safe::Safe;

const LOG_TARGET: &str = "safe::service";

/// `Safe` backed by an Ethereum node, transactions are signed with the backend key
#[derive(Clone)]
pub struct SafeService {
    provider: DynProvider,
    deployment: SafeDeployment,
}

impl SafeService {
    pub fn new(provider: DynProvider, deployment: SafeDeployment) -> Self {
        Self { provider, deployment }
    }

    pub async fn connect(settings: &SafeSettings, fork: &ForkMode) -> Result<Self, SafeError> {
        let wallet = EthereumWallet::from(settings.signer.clone());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(settings.rpc_url.clone())
            .erased();

        let chain_id = provider.get_chain_id().await.map_err(rpc_error)?;
        info!(
            target: LOG_TARGET,
            chain_id,
            backend = %settings.signer.address(),
            fork = %fork.redacted_url(),
            "Connected to node."
        );
        if let Some(forked) = fork.chain_id() {
            if forked != chain_id {
                warn!(target: LOG_TARGET, node = chain_id, forked, "Node chain id differs from the forked chain.");
            }
        }

        Ok(Self::new(provider, settings.deployment))
    }

    /// Address of `owner`'s Safe and whether it has code
    async fn locate(&self, owner: Address) -> Result<(Address, bool), SafeError> {
        let factory = IProxyFactory::new(self.deployment.proxy_factory, &self.provider);
        let creation_code = factory.proxyCreationCode().call().await.map_err(rpc_error)?;
        let safe = self.deployment.safe_address(owner, &creation_code);

        let code = self.provider.get_code_at(safe).await.map_err(rpc_error)?;
        debug!(target: LOG_TARGET, %owner, %safe, code_len = code.len(), "Located safe.");
        Ok((safe, !code.is_empty()))
    }
}

#[async_trait]
impl Safe for SafeService {
    async fn info(&self, owner: &str) -> Result<SafeInfo, SafeError> {
        let owner = parse_address("owner", owner)?;
        let (safe, is_deployed) = self.locate(owner).await?;
        Ok(SafeInfo { address: safe.to_checksum(None), is_deployed })
    }

    async fn deploy(&self, owner: &str) -> Result<SafeResponse, SafeError> {
        let owner = parse_address("owner", owner)?;
        let (safe, is_deployed) = self.locate(owner).await?;
        if is_deployed {
            return Err(SafeError::AlreadyExists);
        }

        let factory = IProxyFactory::new(self.deployment.proxy_factory, &self.provider);
        let receipt = factory
            .createProxyWithNonce(
                self.deployment.master_copy,
                self.deployment.initializer(owner),
                self.deployment.salt_nonce,
            )
            .send()
            .await
            .map_err(|e| send_error(e.to_string()))?
            .get_receipt()
            .await
            .map_err(rpc_error)?;

        debug!(target: LOG_TARGET, ?receipt, "Deployment mined.");
        into_response(safe, &receipt)
    }

    async fn exec(&self, owner: &str, call: SafeCall) -> Result<SafeResponse, SafeError> {
        let owner = parse_address("owner", owner)?;
        let (safe, is_deployed) = self.locate(owner).await?;
        if !is_deployed {
            return Err(SafeError::NotDeployed);
        }

        let operation = Operation::try_from(call.operation)?;
        let to = parse_address("to", &call.to)?;
        let gas_token = parse_address("gasToken", &call.gas_token)?;
        let refund_receiver = parse_address("refundReceiver", &call.refund_receiver)?;
        let value = parse_u256("value", &call.value)?;
        let safe_tx_gas = parse_u256("safeTxGas", &call.safe_tx_gas)?;
        let base_gas = parse_u256("baseGas", &call.base_gas)?;
        let gas_price = parse_u256("gasPrice", &call.gas_price)?;

        let contract = ISafe::new(safe, &self.provider);
        let receipt = contract
            .execTransaction(
                to,
                value,
                call.data,
                operation.into(),
                safe_tx_gas,
                base_gas,
                gas_price,
                gas_token,
                refund_receiver,
                call.signatures,
            )
            .send()
            .await
            .map_err(|e| send_error(e.to_string()))?
            .get_receipt()
            .await
            .map_err(rpc_error)?;

        debug!(target: LOG_TARGET, ?receipt, "Safe transaction mined.");
        into_response(safe, &receipt)
    }
}

fn into_response<R: ReceiptResponse>(safe: Address, receipt: &R) -> Result<SafeResponse, SafeError> {
    if !receipt.status() {
        return Err(SafeError::Reverted(receipt.transaction_hash().to_string()));
    }
    let block_hash = receipt
        .block_hash()
        .ok_or_else(|| SafeError::Rpc("receipt carries no block hash".to_owned()))?;
    Ok(SafeResponse::new(safe, block_hash, receipt.transaction_hash()))
}

fn parse_u256(field: &str, value: &str) -> Result<U256, SafeError> {
    let digits = value.trim();
    if digits.is_empty() {
        return Err(SafeError::BadParams(format!("{field} is empty")));
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| SafeError::BadParams(format!("{field} `{value}`: {e}")))
}

fn rpc_error(e: impl std::fmt::Display) -> SafeError {
    SafeError::Rpc(e.to_string())
}

// Gas estimation runs the call, so a failing Safe transaction surfaces here.
fn send_error(message: String) -> SafeError {
    if message.contains("revert") {
        SafeError::Reverted(message)
    } else {
        SafeError::Rpc(message)
    }
}
