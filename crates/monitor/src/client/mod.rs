//! Network clients consumed by the monitor.
//!
//! The actors only talk to the chains through the [`L1Client`] and [`L2Client`] traits, which
//! keeps them independent from the transport. [`AlloyL1Client`] and [`AlloyL2Client`] are the
//! production implementations backed by alloy providers.

mod traits;
pub use traits::{L1Client, L2Client};
#[cfg(test)]
pub(crate) use traits::{MockL1Client, MockL2Client};

mod types;
pub use types::{BlockHeaderResponse, ChainSource, LogSubscription, RawLog};

mod rpc;
pub use rpc::{AlloyL1Client, AlloyL2Client};
