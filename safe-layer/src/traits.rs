use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use primitives::*;

/// Safe account management for users
/// Addresses are hex strings, the service holds no owner keys
#[rpc(server, client, namespace = "safe")]
pub trait SafeApi {
    /// Counterfactual address of the owner's Safe and whether it is deployed
    #[method(name = "info")]
    async fn info(&self, owner: String) -> RpcResult<SafeInfo>;

    /// Deploy the owner's Safe through the proxy factory, paid by the backend key
    #[method(name = "deploy")]
    async fn deploy(&self, owner: String) -> RpcResult<SafeResponse>;

    /// Relay an `execTransaction` already signed by the owner
    #[method(name = "exec")]
    async fn exec(&self, owner: String, call: SafeCall) -> RpcResult<SafeResponse>;

    /// Transactions this service submitted for the owner, oldest first
    #[method(name = "history")]
    async fn history(&self, owner: String) -> RpcResult<Vec<LedgerRecord>>;

    /// Fork settings the service was started with
    #[method(name = "forking")]
    async fn forking(&self) -> RpcResult<ForkSummary>;
}

#[rpc(server, client)]
pub trait SystemApi {
    /// Liveness probe, also served on `GET /health`
    #[method(name = "system_health")]
    fn health(&self) -> RpcResult<String>;
}
