//! Transport-agnostic log and block types.

use alloy_primitives::{B256, Bytes};
use alloy_transport::TransportError;
use futures::stream::BoxStream;
use serde::Deserialize;

/// The chain a [`RawLog`] was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ChainSource {
    /// The settlement chain.
    #[display("l1")]
    L1,
    /// The rollup.
    #[display("l2")]
    L2,
}

/// A log entry as delivered by a subscription or a transaction receipt.
///
/// Only the fields the correlator reads are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    /// Ordered topics. `topics[0]` is the event signature for non-anonymous events.
    pub topics: Vec<B256>,
    /// The non-indexed payload.
    pub data: Bytes,
    /// Hash of the transaction that emitted the log, absent for pending logs.
    pub transaction_hash: Option<B256>,
    /// The chain the log was observed on.
    pub source: ChainSource,
}

impl RawLog {
    /// Converts an RPC log into a [`RawLog`].
    pub fn from_rpc(log: alloy_rpc_types_eth::Log, source: ChainSource) -> Self {
        Self {
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
            transaction_hash: log.transaction_hash,
            source,
        }
    }

    /// Returns the topic at `index`, if present.
    pub fn topic(&self, index: usize) -> Option<B256> {
        self.topics.get(index).copied()
    }
}

/// A live log subscription.
///
/// An `Err` item or the end of the stream means the transport lost the subscription.
pub type LogSubscription = BoxStream<'static, Result<RawLog, TransportError>>;

/// The subset of an `eth_getBlockByNumber` response the timestamp resolver needs.
///
/// The timestamp is kept as the raw hex quantity returned by the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BlockHeaderResponse {
    /// The block timestamp, hex encoded with a `0x` prefix.
    #[serde(default)]
    pub timestamp: Option<String>,
}
