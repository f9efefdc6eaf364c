//! Fee vault balance polling.

mod config;
pub use config::{
    BASE_FEE_VAULT, L1_FEE_VAULT, OPERATOR_FEE_VAULT, SEQUENCER_FEE_VAULT, VaultConfig,
    VaultConfigError, VaultTable,
};

mod error;
pub use error::PollerError;

mod poller;
pub use poller::{DEFAULT_POLL_INTERVAL, VaultPoller, VaultSnapshot};
