//! Flags of the tracker CLI.

use alloy_primitives::{Address, B256};
use clap::{Args, ValueEnum};
use katana_monitor::{
    FilterCriteria, OUTPUT_PROPOSED, SubscriberConfig, VERIFY_BATCHES_TRUSTED_AGGREGATOR,
    finality::{DEFAULT_DISPATCH_CAPACITY, DEFAULT_LIVENESS_INTERVAL, DEFAULT_RECONNECT_DELAY},
    vaults::DEFAULT_POLL_INTERVAL,
};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// The loops the tracker runs.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Finality tracking and vault polling.
    #[default]
    All,
    /// Finality tracking only.
    Finality,
    /// Vault polling only.
    Vaults,
}

impl Mode {
    /// Returns `true` if the finality subscriber runs in this mode.
    pub const fn tracks_finality(self) -> bool {
        matches!(self, Self::All | Self::Finality)
    }

    /// Returns `true` if the vault poller runs in this mode.
    pub const fn polls_vaults(self) -> bool {
        matches!(self, Self::All | Self::Vaults)
    }
}

/// Finality tracking flags.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FinalityArgs {
    /// URL of the L1 RPC API. `http(s)` urls are rewritten to `ws(s)`.
    #[arg(long = "l1-rpc", visible_alias = "l1", env = "ETH_RPC")]
    pub l1_rpc: Option<Url>,
    /// Address of the rollup manager contract on L1.
    #[arg(long, env = "POLYGON_ZKEVM_PROXY_ADDR")]
    pub rollup_manager: Option<Address>,
    /// Signature of the batch verification event.
    #[arg(long, env = "VERIFY_BATCHES_TOPIC", default_value_t = VERIFY_BATCHES_TRUSTED_AGGREGATOR)]
    pub verify_batches_topic: B256,
    /// Signature of the output proposal event.
    #[arg(long, env = "OUTPUT_PROPOSED_TOPIC", default_value_t = OUTPUT_PROPOSED)]
    pub output_proposed_topic: B256,
    /// Seconds to wait before re-establishing a lost subscription.
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_RECONNECT_DELAY.as_secs())]
    pub reconnect_delay: u64,
    /// Seconds between two L1 liveness probes.
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_LIVENESS_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub liveness_interval: u64,
    /// Number of matched logs buffered ahead of the correlator.
    #[arg(long, default_value_t = DEFAULT_DISPATCH_CAPACITY)]
    pub dispatch_capacity: usize,
}

impl FinalityArgs {
    /// Returns the subscriber timings.
    pub const fn subscriber_config(&self) -> SubscriberConfig {
        SubscriberConfig {
            reconnect_delay: Duration::from_secs(self.reconnect_delay),
            liveness_interval: Duration::from_secs(self.liveness_interval),
            dispatch_capacity: self.dispatch_capacity,
        }
    }

    /// Returns the log criteria for `rollup_manager` and `rollup_id`.
    pub const fn criteria(&self, rollup_manager: Address, rollup_id: u32) -> FilterCriteria {
        FilterCriteria::new(rollup_manager, rollup_id)
            .with_topics(self.verify_batches_topic, self.output_proposed_topic)
    }
}

/// Vault polling flags.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct VaultArgs {
    /// Seconds between two polling cycles. Also names the delta gauges.
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub vault_interval: u64,
    /// TOML file listing the vaults to poll. Defaults to the OP stack fee vaults.
    #[arg(long, env = "VAULT_CONFIG")]
    pub vault_config: Option<PathBuf>,
}

impl VaultArgs {
    /// Returns the polling interval.
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.vault_interval)
    }
}

/// Rewrites an `http(s)` url to `ws(s)`, which log subscriptions require. Other urls are
/// returned unchanged.
pub fn websocket_url(url: &Url) -> Url {
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        _ => return url.clone(),
    };
    let mut rewritten = url.clone();
    match rewritten.set_scheme(scheme) {
        Ok(()) => rewritten,
        Err(()) => url.clone(),
    }
}
