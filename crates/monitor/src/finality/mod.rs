//! Finality tracking.
//!
//! The rollup manager on L1 emits `VerifyBatchesTrustedAggregator` when a batch of the rollup is
//! verified. The same transaction emits `OutputProposed`, carrying the proposed L2 block number
//! and the L1 timestamp of the proposal. The delta between that L1 timestamp and the timestamp of
//! the L2 block is the finality lag of the rollup.
//!
//! ```text
//!  L1 log subscription ──▶ FinalitySubscriber ──▶ bounded queue ──▶ FinalityCorrelator
//!                               │  ▲                                    │
//!                     liveness  │  │ reconnect                          ├─▶ L2TimestampResolver
//!                        probe  ▼  │ after delay                        └─▶ MetricsEmitter
//! ```

mod types;
pub use types::{
    Correlation, FilterCriteria, FinalityObservation, OUTPUT_PROPOSED,
    VERIFY_BATCHES_TRUSTED_AGGREGATOR,
};

mod error;
pub use error::{FinalityError, ResolverError, SubscriberError};

mod resolver;
pub use resolver::L2TimestampResolver;

mod correlator;
pub use correlator::{FinalityCorrelator, decode_output_proposed, decode_rollup_id};

mod subscriber;
pub use subscriber::{
    DEFAULT_DISPATCH_CAPACITY, DEFAULT_LIVENESS_INTERVAL, DEFAULT_RECONNECT_DELAY,
    FinalitySubscriber, SubscriberConfig,
};
