use crate::{ChainSource, EmitError};
use alloy_primitives::{B256, U256};
use alloy_transport::TransportError;
use thiserror::Error;

/// An error correlating a matched L1 log.
#[derive(Debug, Error)]
pub enum FinalityError {
    /// The log has fewer topics than its event requires.
    #[error("log has {actual} topics, expected at least {expected}")]
    MissingTopics {
        /// Minimum number of topics.
        expected: usize,
        /// Number of topics found.
        actual: usize,
    },
    /// The log payload is shorter than its event requires.
    #[error("log payload is {actual} bytes, expected at least {expected}")]
    ShortPayload {
        /// Minimum payload length.
        expected: usize,
        /// Payload length found.
        actual: usize,
    },
    /// The matched log was not observed on the settlement chain.
    #[error("log observed on {0}, expected l1")]
    UnexpectedSource(ChainSource),
    /// The matched log was delivered without a transaction hash.
    #[error("log has no transaction hash")]
    MissingTransactionHash,
    /// The L1 node has no receipt for the transaction of the matched log.
    #[error("no receipt for transaction {0}")]
    ReceiptNotFound(B256),
    /// The L1 timestamp of a proposal is too large for a signed 128-bit delta.
    #[error("l1 timestamp {0} does not fit in a signed 128-bit delta")]
    TimestampOverflow(U256),
    /// Fetching the transaction logs failed.
    #[error("failed to fetch transaction logs: {0}")]
    Transport(#[from] TransportError),
    /// Resolving the L2 block timestamp failed.
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    /// Submitting the delta gauge failed.
    #[error("failed to submit finality metric: {0}")]
    Emit(#[from] EmitError),
}

impl FinalityError {
    /// Returns `true` for malformed logs, which are dropped without retry.
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::MissingTopics { .. } | Self::ShortPayload { .. } | Self::UnexpectedSource(_)
        )
    }
}

/// An error resolving the timestamp of an L2 block.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The L2 node does not know the block.
    #[error("l2 block {0} not found")]
    BlockNotFound(U256),
    /// The block response carries no timestamp.
    #[error("l2 block {0} has no timestamp")]
    MissingTimestamp(U256),
    /// The timestamp is not a `0x` prefixed hex quantity.
    #[error("malformed timestamp `{timestamp}` for l2 block {block}")]
    MalformedTimestamp {
        /// The block that was queried.
        block: U256,
        /// The raw timestamp.
        timestamp: String,
    },
    /// The request to the L2 node failed.
    #[error("l2 block request failed: {0}")]
    Transport(#[from] TransportError),
}

/// An unrecoverable error of the [`FinalitySubscriber`](crate::FinalitySubscriber).
///
/// Every variant except [`SubscriberError::DispatchClosed`] is recovered from by reconnecting.
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// The log subscription could not be established.
    #[error("failed to subscribe to logs: {0}")]
    Subscribe(#[source] TransportError),
    /// The subscription reported a transport error.
    #[error("log subscription failed: {0}")]
    Stream(#[source] TransportError),
    /// The transport ended the subscription.
    #[error("log subscription closed by the transport")]
    Closed,
    /// The liveness probe failed.
    #[error("liveness probe failed: {0}")]
    Liveness(#[source] TransportError),
    /// The correlation task stopped while the subscriber was still running.
    #[error("correlation task is gone")]
    DispatchClosed,
}
