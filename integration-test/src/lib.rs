//! SAFE OFFCHAIN INTEGRATION TESTS
//!
//!
//! Testing the following functionalities over a live JSON-RPC server
//!
//! 1. Computing the counterfactual Safe address of an owner
//! 2. Rejecting malformed owner addresses and call parameters
//! 3. Deploying a Safe, and refusing to deploy it twice
//! 4. Relaying `execTransaction` only once the Safe exists
//! 5. Recording every submitted transaction in the owner's history
//! 6. Reporting the fork settings and answering the health probe
//!
//! The node is replaced by `MockSafe`, which derives addresses exactly like the real
//! service and keeps deployments in memory.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use jsonrpsee::http_client::transport::HttpBackend;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::server::ServerHandle;
use primitives::{
    parse_address, ForkSummary, Operation, SafeCall, SafeError, SafeInfo, SafeResponse,
};
use safe_layer::address::SafeDeployment;
use safe_layer::{run_rpc_server, Safe, SafeHandler};
use tokio::sync::Mutex;

/// Bytes standing in for the factory's proxy creation code
pub const CREATION_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52, 0x34, 0x80, 0x15];

pub fn deployment() -> SafeDeployment {
    SafeDeployment {
        proxy_factory: Address::repeat_byte(0xfa),
        master_copy: Address::repeat_byte(0xc0),
        fallback_handler: Address::repeat_byte(0xfb),
        salt_nonce: U256::from(1),
    }
}

pub struct MockSafe {
    deployment: SafeDeployment,
    deployed: Mutex<HashSet<Address>>,
    nonce: AtomicU64,
    node_down: AtomicBool,
}

impl MockSafe {
    pub fn new() -> Self {
        Self {
            deployment: deployment(),
            deployed: Mutex::new(HashSet::new()),
            nonce: AtomicU64::new(0),
            node_down: AtomicBool::new(false),
        }
    }

    /// Every following call fails as if the node were unreachable
    pub fn take_node_down(&self) {
        self.node_down.store(true, Ordering::SeqCst);
    }

    fn locate(&self, owner: &str) -> Result<(Address, Address), SafeError> {
        if self.node_down.load(Ordering::SeqCst) {
            return Err(SafeError::Rpc("connection refused".to_owned()));
        }
        let owner = parse_address("owner", owner)?;
        Ok((owner, self.deployment.safe_address(owner, CREATION_CODE)))
    }

    fn mined(&self, safe: Address) -> SafeResponse {
        let n = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        SafeResponse::new(safe, B256::with_last_byte(n as u8), B256::left_padding_from(&n.to_be_bytes()))
    }
}

impl Default for MockSafe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Safe for MockSafe {
    async fn info(&self, owner: &str) -> Result<SafeInfo, SafeError> {
        let (_, safe) = self.locate(owner)?;
        let is_deployed = self.deployed.lock().await.contains(&safe);
        Ok(SafeInfo { address: safe.to_checksum(None), is_deployed })
    }

    async fn deploy(&self, owner: &str) -> Result<SafeResponse, SafeError> {
        let (_, safe) = self.locate(owner)?;
        if !self.deployed.lock().await.insert(safe) {
            return Err(SafeError::AlreadyExists);
        }
        Ok(self.mined(safe))
    }

    async fn exec(&self, owner: &str, call: SafeCall) -> Result<SafeResponse, SafeError> {
        let (_, safe) = self.locate(owner)?;
        if !self.deployed.lock().await.contains(&safe) {
            return Err(SafeError::NotDeployed);
        }
        Operation::try_from(call.operation)?;
        parse_address("to", &call.to)?;
        if call.signatures.is_empty() {
            return Err(SafeError::Reverted("GS020".to_owned()));
        }
        Ok(self.mined(safe))
    }
}

/// Running server plus a client pointed at it
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: HttpClient<HttpBackend>,
    pub safe: Arc<MockSafe>,
    handle: ServerHandle,
}

impl TestServer {
    pub async fn start(fork: ForkSummary) -> anyhow::Result<Self> {
        let safe = Arc::new(MockSafe::new());
        let handler = SafeHandler::new(safe.clone(), fork);
        let (addr, handle) = run_rpc_server(handler, "127.0.0.1:0".to_owned()).await?;
        let client = HttpClientBuilder::default().build(format!("http://{addr}"))?;
        Ok(Self { addr, client, safe, handle })
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.handle.stop();
    }
}

pub fn call_to(to: Address, signatures: &[u8]) -> SafeCall {
    SafeCall {
        to: to.to_string(),
        value: "0".to_owned(),
        data: Default::default(),
        operation: Operation::Call.into(),
        safe_tx_gas: "0".to_owned(),
        base_gas: "0".to_owned(),
        gas_price: "0".to_owned(),
        gas_token: Address::ZERO.to_string(),
        refund_receiver: Address::ZERO.to_string(),
        signatures: signatures.to_vec().into(),
    }
}
