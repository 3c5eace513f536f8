use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use fork_layer::{ForkVerifier, NetworksDocument};
use safe_layer::config::SafeLayerCli;
use safe_layer::service::SafeService;
use safe_layer::{init_tracing, run_rpc_server, SafeHandler};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = SafeLayerCli::parse();
    init_tracing(&cli.log);

    let settings = cli.validate()?;

    let fork = NetworksDocument::load_or_disabled(&settings.fork_config)?.mode()?;
    if settings.verify_fork {
        ForkVerifier::default().verify(&fork).await?;
    }

    let service = SafeService::connect(&settings, &fork).await?;
    let rpc_handler = SafeHandler::new(Arc::new(service), fork.summary());

    let (addr, handle) = run_rpc_server(rpc_handler, settings.listen.clone()).await?;
    info!(%addr, "Safe layer listening.");

    tokio::select! {
        _ = handle.clone().stopped() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down.");
            // already stopped is fine
            let _ = handle.stop();
            handle.stopped().await;
        }
    }

    Ok(())
}
