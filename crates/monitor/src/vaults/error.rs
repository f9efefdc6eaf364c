use alloy_primitives::Address;
use alloy_transport::TransportError;
use thiserror::Error;

/// An error of one polling cycle of the [`VaultPoller`](crate::VaultPoller).
#[derive(Debug, Error)]
pub enum PollerError {
    /// The balance query for a vault failed. The remaining vaults of the cycle are skipped.
    #[error("failed to query balance of vault {address}: {source}")]
    Balance {
        /// The vault whose balance could not be fetched.
        address: Address,
        /// The transport error.
        #[source]
        source: TransportError,
    },
}
