//! FairDraw daemon: entry point for running the giveaway service.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config::ServiceConfig;
use fairdraw_draw::{DrawMetrics, DrawService, GiveawayService};
use fairdraw_rpc::{RpcServer, RpcState, StaticTokens};
use fairdraw_store::Store;
use fairdraw_store_lmdb::LmdbEnvironment;
use fairdraw_types::{Clock, GiveawayId, SystemClock};
use fairdraw_utils::{init_logging, shutdown_signal, LogFormat};
use fairdraw_vrf::DrandClient;

#[derive(Parser)]
#[command(name = "fairdraw-daemon", about = "Giveaway service with verifiable winner selection")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "FAIRDRAW_CONFIG")]
    config: Option<PathBuf>,

    /// Address for the HTTP API, e.g. "0.0.0.0:8787".
    #[arg(long, env = "FAIRDRAW_LISTEN")]
    listen: Option<SocketAddr>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "FAIRDRAW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "FAIRDRAW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "FAIRDRAW_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// drand HTTP relay base URL.
    #[arg(long, env = "FAIRDRAW_DRAND_URL")]
    drand_url: Option<String>,

    /// Upper bound on the oracle wait, in milliseconds.
    #[arg(long, env = "FAIRDRAW_ORACLE_TIMEOUT_MS")]
    oracle_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Run,
    /// Re-verify a drawn giveaway's proof and winner list.
    Audit {
        /// Giveaway identifier.
        giveaway_id: String,
    },
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_toml_file(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(url) = &self.drand_url {
            config.drand.relay_url = url.clone();
        }
        if let Some(ms) = self.oracle_timeout_ms {
            config.draw.oracle_timeout_ms = ms;
        }
        Ok(config)
    }
}

struct Services {
    store: Arc<dyn Store>,
    draws: Arc<DrawService>,
    giveaways: Arc<GiveawayService>,
}

fn build_services(config: &ServiceConfig) -> anyhow::Result<Services> {
    let env = LmdbEnvironment::open(&config.data_dir, config.map_size)
        .with_context(|| format!("failed to open store at {}", config.data_dir.display()))?;
    let store: Arc<dyn Store> = Arc::new(env);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let oracle = Arc::new(
        DrandClient::new(&config.drand)
            .context("invalid drand configuration")?
            .with_clock(Arc::clone(&clock)),
    );

    let draws = Arc::new(DrawService::new(
        Arc::clone(&store),
        oracle,
        &config.draw,
        Arc::new(DrawMetrics::new()),
        clock.clone(),
    ));
    let giveaways = Arc::new(GiveawayService::new(Arc::clone(&store), clock));
    Ok(Services {
        store,
        draws,
        giveaways,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_logging(config.log_format, &config.log_level);

    let services = build_services(&config)?;

    match cli.command {
        Command::Run => {
            let auth = StaticTokens::from_entries(&config.tokens)
                .context("invalid token table in configuration")?;
            if auth.is_empty() {
                tracing::warn!("no API tokens configured; every authenticated endpoint will answer 401");
            }
            tracing::info!(
                listen = %config.listen,
                data_dir = %config.data_dir.display(),
                drand = %config.drand.relay_url,
                "starting FairDraw"
            );

            let state = Arc::new(RpcState {
                draws: services.draws,
                giveaways: services.giveaways,
                store: services.store,
                auth: Arc::new(auth),
            });
            RpcServer::new(config.listen, state)
                .start(shutdown_signal())
                .await?;
            tracing::info!("FairDraw exited cleanly");
        }
        Command::Audit { giveaway_id } => {
            let id = GiveawayId::new(giveaway_id)?;
            let report = services.draws.audit(&id)?;
            println!(
                "giveaway {}: proof {}, selection {}",
                report.giveaway_id,
                if report.proof_valid { "valid" } else { "INVALID" },
                if report.selection_matches { "matches" } else { "DOES NOT MATCH" },
            );
            if !(report.proof_valid && report.selection_matches) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
