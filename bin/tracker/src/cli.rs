//! Contains the tracker CLI.

use crate::flags::{FinalityArgs, Mode, VaultArgs, websocket_url};
use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use katana_cli::{init_tracing_subscriber, metrics_args::MetricsArgs};
use katana_monitor::{
    AlloyL1Client, AlloyL2Client, FinalityCorrelator, FinalitySubscriber, L2TimestampResolver,
    Metrics, MonitorActor, RecorderEmitter, VaultPoller, VaultTable,
};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Tracks the finality lag and fee vault balances of a rollup, and exports them as prometheus
/// gauges.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (0-2).
    #[arg(long, short, action = ArgAction::Count, global = true)]
    pub v: u8,
    /// The loops to run.
    #[arg(long, value_enum, default_value_t = Mode::All, env = "MONITOR_MODE")]
    pub mode: Mode,
    /// URL of the L2 RPC API.
    #[arg(long = "l2-rpc", visible_alias = "l2", env = "ROLLUP_RPC")]
    pub l2_rpc: Url,
    /// Identifier of the rollup in the rollup manager.
    #[arg(long, env = "ROLLUP_ID")]
    pub rollup_id: u32,
    /// Finality tracking flags.
    #[command(flatten)]
    pub finality: FinalityArgs,
    /// Vault polling flags.
    #[command(flatten)]
    pub vaults: VaultArgs,
    /// Prometheus flags.
    #[command(flatten)]
    pub metrics: MetricsArgs,
}

impl Cli {
    /// Runs the tracker until it receives SIGINT or SIGTERM.
    pub fn run(self) -> Result<()> {
        init_tracing_subscriber(self.v, None::<EnvFilter>)?;

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        runtime.block_on(self.start())
    }

    /// Starts the actors selected by [`Mode`] and waits for shutdown.
    ///
    /// An actor stopping on its own is an error, and stops the others.
    pub async fn start(self) -> Result<()> {
        let metrics_addr = self.metrics.init_metrics().context("failed to start metrics server")?;
        Metrics::init();
        info!(target: "tracker", mode = ?self.mode, rollup_id = self.rollup_id, %metrics_addr, "Starting tracker");

        let cancellation = CancellationToken::new();
        let l2 = Arc::new(AlloyL2Client::new_http(self.l2_rpc.clone()));
        let emitter = Arc::new(RecorderEmitter);
        let mut actors = JoinSet::new();

        if self.mode.tracks_finality() {
            let l1_rpc = self
                .finality
                .l1_rpc
                .as_ref()
                .ok_or_else(|| anyhow!("--l1-rpc is required to track finality"))?;
            let rollup_manager = self
                .finality
                .rollup_manager
                .ok_or_else(|| anyhow!("--rollup-manager is required to track finality"))?;
            let url = websocket_url(l1_rpc);
            if url != *l1_rpc {
                info!(target: "tracker", from = %l1_rpc, to = %url, "Using websocket endpoint for L1");
            }

            let criteria = self.finality.criteria(rollup_manager, self.rollup_id);
            let config = self.finality.subscriber_config();
            let l2 = l2.clone();
            let emitter = emitter.clone();
            let cancellation = cancellation.clone();
            actors.spawn(async move {
                let Some(l1) = connect_l1(&url, config.reconnect_delay, &cancellation).await else {
                    return Ok(());
                };
                let l1 = Arc::new(l1);
                let correlator = FinalityCorrelator::new(
                    criteria,
                    l1.clone(),
                    L2TimestampResolver::new(l2),
                    emitter,
                );
                FinalitySubscriber::new(config, l1, correlator, cancellation)
                    .start()
                    .await
                    .context("finality subscriber failed")
            });
        }

        if self.mode.polls_vaults() {
            let table = match &self.vaults.vault_config {
                Some(path) => VaultTable::from_file(path)
                    .with_context(|| format!("failed to load vault table {}", path.display()))?,
                None => VaultTable::default(),
            };
            Metrics::describe_vaults(&table, self.vaults.interval());
            let poller = VaultPoller::new(
                l2,
                emitter,
                &table,
                self.rollup_id,
                self.vaults.interval(),
                cancellation.clone(),
            );
            actors.spawn(async move { poller.start().await.context("vault poller failed") });
        }

        let early = tokio::select! {
            _ = shutdown_signal() => None,
            Some(joined) = actors.join_next() => Some(joined),
        };
        cancellation.cancel();

        let mut outcome = match early {
            None => Ok(()),
            Some(joined) => match joined? {
                Ok(()) => Err(anyhow!("an actor stopped before shutdown")),
                Err(err) => Err(err),
            },
        };
        while let Some(joined) = actors.join_next().await {
            if let Err(err) = joined? {
                error!(target: "tracker", %err, "Actor failed during shutdown");
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }

        info!(target: "tracker", "Tracker stopped");
        outcome
    }
}

/// Connects to the L1 node, retrying every `delay` until it succeeds or `cancellation` fires.
async fn connect_l1(
    url: &Url,
    delay: Duration,
    cancellation: &CancellationToken,
) -> Option<AlloyL1Client> {
    loop {
        match AlloyL1Client::connect(url).await {
            Ok(client) => return Some(client),
            Err(err) => {
                warn!(target: "tracker", %url, %err, ?delay, "Failed to connect to L1 node");
            }
        }
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Listens for OS shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target: "tracker", %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target: "tracker", %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!(target: "tracker", "Received SIGINT (Ctrl+C)");
        },
        _ = terminate => {
            info!(target: "tracker", "Received SIGTERM");
        },
    }
}
