//! Resolution of L2 block timestamps.

use crate::{L2Client, ResolverError};
use alloy_primitives::U256;
use std::sync::Arc;
use tracing::debug;

/// Looks up the timestamp of an L2 block with a single header request.
///
/// The resolver does not retry. A failed lookup loses the observation that needed it.
#[derive(Debug)]
pub struct L2TimestampResolver<L2> {
    client: Arc<L2>,
}

impl<L2: L2Client> L2TimestampResolver<L2> {
    /// Creates a new [`L2TimestampResolver`].
    pub const fn new(client: Arc<L2>) -> Self {
        Self { client }
    }

    /// Returns the unix timestamp of L2 block `block_number`.
    pub async fn resolve(&self, block_number: U256) -> Result<u64, ResolverError> {
        let header = self
            .client
            .block_header(block_number)
            .await?
            .ok_or(ResolverError::BlockNotFound(block_number))?;
        let raw = header.timestamp.ok_or(ResolverError::MissingTimestamp(block_number))?;
        let timestamp = parse_hex_quantity(&raw).ok_or_else(|| {
            ResolverError::MalformedTimestamp { block: block_number, timestamp: raw.clone() }
        })?;

        debug!(target: "finality::resolver", %block_number, timestamp, "Resolved L2 block timestamp");
        Ok(timestamp)
    }
}

fn parse_hex_quantity(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix("0x")?;
    u64::from_str_radix(digits, 16).ok()
}
