//! fluxmq broker daemon.
//
//  $ fluxmq --config fluxmq.toml

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use fluxmq::core::Broker;
use fluxmq::{load_config, logging, start_broker, Config};

#[derive(Debug, Parser)]
#[command(name = "fluxmq", version, about = "FluxMQ pub/sub broker daemon")]
struct Cli {
    /// Path to config TOML (env FLUXMQ_CONFIG overrides)
    #[arg(short, long, default_value = "fluxmq.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg_path: String = std::env::var("FLUXMQ_CONFIG").unwrap_or(cli.config);
    let cfg: Config = load_config(&cfg_path)?;
    logging::init_logging(&cfg.logging.level);
    info!("config loaded: bind_addr={}", cfg.server.bind_addr);

    let broker = Arc::new(Broker::from_config(&cfg.broker));
    let listener = TcpListener::bind(&cfg.server.bind_addr).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(start_broker(
        listener,
        broker,
        cfg.broker.default_consume_batch,
        shutdown_rx,
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutting down...");
    let _ = shutdown_tx.send(true);
    server.await??;
    Ok(())
}
