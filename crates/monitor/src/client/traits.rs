use crate::{BlockHeaderResponse, LogSubscription, RawLog};
use alloy_primitives::{Address, B256, U256};
use alloy_transport::TransportError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Client for the settlement chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait L1Client: Debug + Send + Sync {
    /// Opens a live subscription to logs emitted by `contract` with `topics[0] == event_topic`.
    async fn subscribe_logs(
        &self,
        contract: Address,
        event_topic: B256,
    ) -> Result<LogSubscription, TransportError>;

    /// Returns every log of the transaction `tx_hash`, in emission order, or `None` if the node
    /// has no receipt for it.
    async fn transaction_logs(&self, tx_hash: B256) -> Result<Option<Vec<RawLog>>, TransportError>;

    /// Returns the current block height. Used as the liveness probe.
    async fn block_number(&self) -> Result<u64, TransportError>;

    /// Replaces the underlying connection with a new one. Called before every resubscription,
    /// so a transport that stopped for good is not reused.
    async fn reconnect(&self) -> Result<(), TransportError>;
}

/// Client for the rollup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait L2Client: Debug + Send + Sync {
    /// Fetches the header of block `number`, without transactions.
    async fn block_header(
        &self,
        number: U256,
    ) -> Result<Option<BlockHeaderResponse>, TransportError>;

    /// Returns the latest balance of `address`, in wei.
    async fn balance(&self, address: Address) -> Result<U256, TransportError>;
}
