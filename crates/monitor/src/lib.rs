//! # katana-monitor
//!
//! Observes a rollup's finality and fee vault balances by correlating events across the
//! settlement chain (L1) and the rollup (L2), and submitting the derived values as gauges.
//!
//! ## Overview
//!
//! Two long-running actors make up the monitor:
//!
//! - [`FinalitySubscriber`]: holds a filtered log subscription on L1, hands every matched log to
//!   the [`FinalityCorrelator`], probes the L1 connection periodically and reconnects after a
//!   fixed delay whenever the subscription or the probe fails.
//! - [`VaultPoller`]: samples the balance of a fixed set of L2 accounts on a timer and emits the
//!   balance together with its delta against the previous sample.
//!
//! Both actors implement [`MonitorActor`] and stop when their shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken) is cancelled.
//!
//! ## Delivery guarantees
//!
//! The subscription is live only. Logs emitted on L1 while the subscription is down are not
//! replayed after reconnecting, and metrics are submitted at most once per observed event.

#![doc(issue_tracker_base_url = "https://github.com/katana-network/katana-monitor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod actor;
pub use actor::MonitorActor;

mod client;
pub use client::{
    AlloyL1Client, AlloyL2Client, BlockHeaderResponse, ChainSource, L1Client, L2Client,
    LogSubscription, RawLog,
};

mod emitter;
pub use emitter::{EmitError, MetricsEmitter, RecorderEmitter, tag};

mod telemetry;
pub use telemetry::Metrics;

pub mod finality;
pub use finality::{
    Correlation, FilterCriteria, FinalityCorrelator, FinalityError, FinalityObservation,
    FinalitySubscriber, L2TimestampResolver, OUTPUT_PROPOSED, ResolverError, SubscriberConfig,
    SubscriberError, VERIFY_BATCHES_TRUSTED_AGGREGATOR,
};

pub mod vaults;
pub use vaults::{
    BASE_FEE_VAULT, L1_FEE_VAULT, OPERATOR_FEE_VAULT, PollerError, SEQUENCER_FEE_VAULT,
    VaultConfig, VaultConfigError, VaultPoller, VaultSnapshot, VaultTable,
};

#[cfg(test)]
pub(crate) mod test_utils;
