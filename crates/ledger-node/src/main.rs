mod api;
mod constants;
mod peer_client;

use clap::Parser;
use ledger_core::{scheduler::Scheduler, Blockchain, LedgerConfig};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tracing::{info, Level};

use crate::api::{router, AppState};
use crate::constants::{DEFAULT_BIND, DEFAULT_HOST, DEFAULT_PORT};
use crate::peer_client::{HttpPeerClient, TcpProbe};

#[derive(Parser, Debug)]
struct Args {
    /// TCP port the node listens on and advertises to neighbors
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// IPv4 address neighbors are searched around
    #[arg(long, default_value = DEFAULT_HOST)]
    host: Ipv4Addr,

    /// Interface to bind the HTTP server to
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: Ipv4Addr,

    /// Blockchain address credited with mining rewards (defaults to miner-<host>:<port>)
    #[arg(long)]
    address: Option<String>,

    /// Leading zero hex characters required of a mined block
    #[arg(long, default_value_t = ledger_core::constants::MINING_DIFFICULTY)]
    difficulty: usize,

    /// Seconds between mining rounds
    #[arg(long, default_value_t = 20)]
    mining_interval_secs: u64,

    /// Seconds between neighbor refreshes
    #[arg(long, default_value_t = 20)]
    sync_interval_secs: u64,

    /// Upper bound on each outbound peer call, in milliseconds
    #[arg(long, default_value_t = 3000)]
    peer_timeout_ms: u64,
}

impl Args {
    fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            difficulty: self.difficulty,
            mining_interval: Duration::from_secs(self.mining_interval_secs),
            sync_interval: Duration::from_secs(self.sync_interval_secs),
            peer_timeout: Duration::from_millis(self.peer_timeout_ms),
            ..LedgerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.ledger_config();
    let address = args
        .address
        .clone()
        .unwrap_or_else(|| format!("miner-{}:{}", args.host, args.port));

    let client = Arc::new(HttpPeerClient::new(config.peer_timeout)?);
    let probe = Arc::new(TcpProbe::new(config.probe_timeout));
    let ledger = Arc::new(Blockchain::with_peer_client(
        address.as_str(),
        config.clone(),
        client,
    )?);
    info!(address, difficulty = config.difficulty, "ledger created");

    let mut scheduler = Scheduler::new();
    scheduler.spawn_peer_sync(
        ledger.clone(),
        args.host,
        args.port,
        probe,
        config.sync_interval,
    );
    scheduler.spawn_mining(ledger.clone(), config.mining_interval);

    let app = router(AppState { ledger });
    let addr = SocketAddr::from((args.bind, args.port));
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    scheduler.shutdown().await?;
    Ok(())
}
