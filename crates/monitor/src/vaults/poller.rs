//! Periodic sampling of vault balances.

use crate::{
    L2Client, Metrics, MetricsEmitter, MonitorActor, PollerError, VaultConfig, VaultTable,
    emitter::signed_f64, tag,
};
use alloy_primitives::{Address, I256, U256, hex};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default period between two polling cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// The last two balance samples of a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSnapshot {
    /// The vault.
    pub address: Address,
    /// The category the metrics are named after.
    pub category: String,
    /// The latest sample.
    pub current: U256,
    /// The sample before `current`, zero until two samples were taken.
    pub previous: U256,
    /// `current - previous`.
    pub delta: I256,
}

impl VaultSnapshot {
    /// Creates an empty snapshot. All samples start at zero, so the first delta equals the first
    /// balance.
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            address: config.address,
            category: config.category.clone(),
            current: U256::ZERO,
            previous: U256::ZERO,
            delta: I256::ZERO,
        }
    }

    /// Shifts `current` into `previous`, stores `balance` and recomputes the delta.
    pub fn record(&mut self, balance: U256) {
        self.previous = self.current;
        self.current = balance;
        // Two's complement of the wrapped difference. Exact while |delta| < 2^255.
        self.delta = I256::from_raw(self.current.wrapping_sub(self.previous));
    }

    /// Tags attached to both gauges of the vault.
    pub fn tags(&self, rollup_id: u32) -> Vec<String> {
        vec![
            tag("vault_type", &self.category),
            tag("vault_address", hex::encode_prefixed(self.address)),
            tag("rollup_id", rollup_id),
        ]
    }
}

/// Samples the balance of every vault of a [`VaultTable`] on a fixed interval, and emits the
/// balance and its change since the previous sample.
///
/// The first cycle runs as soon as the poller starts.
#[derive(Debug)]
pub struct VaultPoller<L2, E> {
    l2: Arc<L2>,
    emitter: Arc<E>,
    rollup_id: u32,
    interval: Duration,
    snapshots: Vec<VaultSnapshot>,
    cancellation: CancellationToken,
}

impl<L2, E> VaultPoller<L2, E>
where
    L2: L2Client + 'static,
    E: MetricsEmitter + 'static,
{
    /// Creates a new [`VaultPoller`].
    pub fn new(
        l2: Arc<L2>,
        emitter: Arc<E>,
        table: &VaultTable,
        rollup_id: u32,
        interval: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        let snapshots = table.vaults().iter().map(VaultSnapshot::new).collect();
        Self { l2, emitter, rollup_id, interval, snapshots, cancellation }
    }

    /// The current snapshots, in polling order.
    pub fn snapshots(&self) -> &[VaultSnapshot] {
        &self.snapshots
    }

    /// Samples every vault once, in order.
    ///
    /// A failed balance query ends the cycle, leaving the remaining snapshots untouched. Gauge
    /// submission failures are logged and do not end the cycle.
    pub async fn poll_cycle(&mut self) -> Result<(), PollerError> {
        for snapshot in &mut self.snapshots {
            let address = snapshot.address;
            let balance = self
                .l2
                .balance(address)
                .await
                .map_err(|source| PollerError::Balance { address, source })?;
            snapshot.record(balance);

            let tags = snapshot.tags(self.rollup_id);
            let gauges = [
                (Metrics::vault_balance(&snapshot.category), f64::from(snapshot.current)),
                (Metrics::vault_delta(&snapshot.category, self.interval), signed_f64(snapshot.delta)),
            ];
            for (name, value) in gauges {
                if let Err(err) = self.emitter.gauge(&name, value, &tags) {
                    warn!(target: "vaults::poller", %address, metric = %name, %err, "Failed to submit vault metric");
                }
            }

            debug!(
                target: "vaults::poller",
                %address,
                category = %snapshot.category,
                balance = %snapshot.current,
                delta = %snapshot.delta,
                "Sampled vault balance"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl<L2, E> MonitorActor for VaultPoller<L2, E>
where
    L2: L2Client + 'static,
    E: MetricsEmitter + 'static,
{
    type Error = PollerError;

    async fn start(mut self) -> Result<(), Self::Error> {
        let cancel = self.cancellation.clone();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            target: "vaults::poller",
            vaults = self.snapshots.len(),
            interval = ?self.interval,
            "Starting vault poller"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(target: "vaults::poller", "Vault poller cancelled, stopping");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_cycle().await {
                        warn!(target: "vaults::poller", %err, "Vault polling cycle aborted");
                    }
                }
            }
        }
    }
}
