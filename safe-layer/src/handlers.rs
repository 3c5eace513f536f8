use crate::safe::SharedSafe;
use crate::traits::*;
use alloy_primitives::Address;
use chrono::Utc;
use jsonrpsee::core::{async_trait, Error as RpcError, RpcResult};
use jsonrpsee::types::error::{CallError, ErrorObject};
use parity_scale_codec::{Decode, Encode};
use primitives::{
    parse_address, ForkSummary, LedgerEntry, LedgerKind, LedgerRecord, SafeCall, SafeError,
    SafeInfo, SafeResponse,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "safe::rpc";

/// In-memory record of the transactions submitted by the service
/// `owner` ===> SCALE encoded `LedgerEntry`, oldest first
#[derive(Default)]
pub struct Ledger {
    pub entries: HashMap<[u8; 20], Vec<Vec<u8>>>,
}

#[derive(Clone)]
pub struct SafeHandler {
    safe: SharedSafe,
    ledger: Arc<Mutex<Ledger>>,
    fork: ForkSummary,
}

impl SafeHandler {
    pub fn new(safe: SharedSafe, fork: ForkSummary) -> Self {
        Self { safe, ledger: Arc::new(Mutex::new(Ledger::default())), fork }
    }

    pub async fn record(
        &self,
        kind: LedgerKind,
        owner: &str,
        response: &SafeResponse,
    ) -> Result<(), SafeError> {
        let owner = parse_address("owner", owner)?;
        let entry = LedgerEntry::from_response(kind, owner, response, Utc::now())?;

        let mut ledger = self.ledger.lock().await;
        ledger.entries.entry(entry.owner).or_default().push(entry.encode());
        Ok(())
    }

    // The transaction is already mined, so a ledger failure must not fail the request.
    async fn settle(&self, kind: LedgerKind, owner: &str, response: &SafeResponse) {
        if let Err(err) = self.record(kind, owner, response).await {
            warn!(
                target: LOG_TARGET,
                %owner,
                ?kind,
                tx = %response.transaction_hash,
                error = %err,
                "Transaction mined but not recorded."
            );
        }
    }

    pub async fn entries(&self, owner: Address) -> Result<Vec<LedgerEntry>, parity_scale_codec::Error> {
        let ledger = self.ledger.lock().await;
        let Some(encoded) = ledger.entries.get(&owner.0.0) else {
            return Ok(Vec::new());
        };
        encoded.iter().map(|raw| LedgerEntry::decode(&mut &raw[..])).collect()
    }
}

/// Turn a backend failure into a JSON-RPC error object carrying its stable code
pub fn into_rpc_error(err: SafeError) -> RpcError {
    CallError::Custom(ErrorObject::owned(err.code(), err.to_string(), None::<()>)).into()
}

fn rejected(method: &str, owner: &str, err: SafeError) -> RpcError {
    warn!(target: LOG_TARGET, method, %owner, error = %err, "Request failed.");
    into_rpc_error(err)
}

#[async_trait]
impl SafeApiServer for SafeHandler {
    async fn info(&self, owner: String) -> RpcResult<SafeInfo> {
        debug!(target: LOG_TARGET, %owner, "safe_info");
        self.safe.info(&owner).await.map_err(|e| rejected("safe_info", &owner, e))
    }

    async fn deploy(&self, owner: String) -> RpcResult<SafeResponse> {
        debug!(target: LOG_TARGET, %owner, "safe_deploy");
        let response =
            self.safe.deploy(&owner).await.map_err(|e| rejected("safe_deploy", &owner, e))?;
        info!(target: LOG_TARGET, %owner, safe = %response.safe_address, tx = %response.transaction_hash, "Safe deployed.");

        self.settle(LedgerKind::Deploy, &owner, &response).await;
        Ok(response)
    }

    async fn exec(&self, owner: String, call: SafeCall) -> RpcResult<SafeResponse> {
        debug!(target: LOG_TARGET, %owner, to = %call.to, operation = call.operation, "safe_exec");
        let response =
            self.safe.exec(&owner, call).await.map_err(|e| rejected("safe_exec", &owner, e))?;
        info!(target: LOG_TARGET, %owner, tx = %response.transaction_hash, "Safe transaction relayed.");

        self.settle(LedgerKind::Exec, &owner, &response).await;
        Ok(response)
    }

    async fn history(&self, owner: String) -> RpcResult<Vec<LedgerRecord>> {
        debug!(target: LOG_TARGET, %owner, "safe_history");
        let address = parse_address("owner", &owner).map_err(|e| rejected("safe_history", &owner, e))?;
        let entries = self
            .entries(address)
            .await
            .map_err(|e| CallError::Failed(anyhow::anyhow!("corrupt ledger entry: {e}")))?;
        Ok(entries.iter().map(LedgerRecord::from).collect())
    }

    async fn forking(&self) -> RpcResult<ForkSummary> {
        debug!(target: LOG_TARGET, enabled = self.fork.enabled, "safe_forking");
        Ok(self.fork.clone())
    }
}

pub struct SystemHandler;

impl SystemApiServer for SystemHandler {
    fn health(&self) -> RpcResult<String> {
        Ok("ok".to_owned())
    }
}
