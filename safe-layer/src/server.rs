use std::net::SocketAddr;

use jsonrpsee::server::middleware::proxy_get_request::ProxyGetRequestLayer;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers::{SafeHandler, SystemHandler};
use crate::traits::{SafeApiServer, SystemApiServer};

const LOG_TARGET: &str = "safe::server";

/// Start the JSON-RPC server on `url` and return its bound address and handle.
/// `GET /health` is answered by `system_health`.
pub async fn run_rpc_server(
    rpc_handler: SafeHandler,
    url: String,
) -> anyhow::Result<(SocketAddr, ServerHandle)> {
    let middleware = tower::ServiceBuilder::new()
        .layer(ProxyGetRequestLayer::new("/health", "system_health")?)
        .layer(CorsLayer::permissive());

    let server = ServerBuilder::default().set_middleware(middleware).build(url).await?;

    let addr = server.local_addr()?;
    let mut module = rpc_handler.into_rpc();
    module.merge(SystemHandler.into_rpc())?;
    let handle = server.start(module)?;

    info!(target: LOG_TARGET, %addr, "JSON-RPC server started.");
    Ok((addr, handle))
}
