//! Metric names and descriptions.

use crate::VaultTable;
use std::time::Duration;

/// Container for the metrics submitted by the monitor.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Identifier for the gauge tracking the L1 timestamp of an output proposal minus the
    /// timestamp of the proposed L2 block, in seconds.
    pub const L1_L2_TIME_DELTA: &'static str = "l1_l2_time_delta";

    /// Identifier for the gauge tracking the number of matched logs waiting for correlation.
    pub const FINALITY_DISPATCH_QUEUE_DEPTH: &'static str = "finality_dispatch_queue_depth";

    /// Identifier for the counter of L1 log subscription reconnects.
    pub const FINALITY_SUBSCRIPTION_RECONNECTS: &'static str =
        "finality_subscription_reconnects_total";

    /// Initializes metrics for the monitor.
    ///
    /// This does two things:
    /// * Describes the static metrics with their units.
    /// * Initializes the operational metrics to 0 so they show up on dashboards immediately.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_gauge!(
            Self::L1_L2_TIME_DELTA,
            metrics::Unit::Seconds,
            "Difference between the L1 timestamp of an output proposal and the timestamp of the proposed L2 block",
        );
        metrics::describe_gauge!(
            Self::FINALITY_DISPATCH_QUEUE_DEPTH,
            metrics::Unit::Count,
            "Matched L1 logs waiting for correlation",
        );
        metrics::describe_counter!(
            Self::FINALITY_SUBSCRIPTION_RECONNECTS,
            metrics::Unit::Count,
            "Number of times the L1 log subscription was torn down and re-established",
        );
    }

    fn zero() {
        metrics::gauge!(Self::FINALITY_DISPATCH_QUEUE_DEPTH).set(0.0);
        metrics::counter!(Self::FINALITY_SUBSCRIPTION_RECONNECTS).increment(0);
    }

    /// Describes the balance and delta gauges of every vault in `table`, sampled every
    /// `interval`.
    pub fn describe_vaults(table: &VaultTable, interval: Duration) {
        for vault in table.vaults() {
            metrics::describe_gauge!(
                Self::vault_balance(&vault.category),
                format!("Balance of the {} vault, in wei", vault.category)
            );
            metrics::describe_gauge!(
                Self::vault_delta(&vault.category, interval),
                format!(
                    "Change of the {} vault balance over the last {}s, in wei",
                    vault.category,
                    interval.as_secs()
                )
            );
        }
    }

    /// Returns the name of the balance gauge for a vault category.
    pub fn vault_balance(category: &str) -> String {
        format!("{category}_vault_balance")
    }

    /// Returns the name of the delta gauge for a vault category sampled every `interval`.
    pub fn vault_delta(category: &str, interval: Duration) -> String {
        format!("{category}_vault_delta_{}s", interval.as_secs())
    }
}
