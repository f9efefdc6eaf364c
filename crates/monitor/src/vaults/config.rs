//! The table of monitored vaults.

use alloy_primitives::{Address, address};
use serde::Deserialize;
use std::{collections::HashSet, path::Path};
use thiserror::Error;

/// The OP stack base fee vault predeploy.
pub const BASE_FEE_VAULT: Address = address!("0x4200000000000000000000000000000000000019");

/// The OP stack L1 fee vault predeploy.
pub const L1_FEE_VAULT: Address = address!("0x420000000000000000000000000000000000001a");

/// The OP stack operator fee vault predeploy.
pub const OPERATOR_FEE_VAULT: Address = address!("0x420000000000000000000000000000000000001b");

/// The OP stack sequencer fee vault predeploy.
pub const SEQUENCER_FEE_VAULT: Address = address!("0x4200000000000000000000000000000000000011");

/// A monitored account and the category its metrics are named after.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, derive_more::Constructor)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// The L2 account.
    pub address: Address,
    /// The category, e.g. `basefee`. Gauges are named `<category>_vault_balance`.
    pub category: String,
}

/// An error building a [`VaultTable`].
#[derive(Debug, Error)]
pub enum VaultConfigError {
    /// The table lists no vault.
    #[error("vault table is empty")]
    Empty,
    /// An address is listed more than once.
    #[error("vault {0} is listed more than once")]
    DuplicateAddress(Address),
    /// A category is empty or would produce an invalid metric name.
    #[error("invalid category `{category}` for vault {address}")]
    InvalidCategory {
        /// The vault.
        address: Address,
        /// The rejected category.
        category: String,
    },
    /// The table file could not be read.
    #[error("failed to read vault table: {0}")]
    Io(#[from] std::io::Error),
    /// The table file is not valid TOML.
    #[error("failed to parse vault table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The ordered set of vaults polled every cycle.
///
/// A table file lists vaults as an array of tables:
///
/// ```toml
/// [[vault]]
/// address = "0x4200000000000000000000000000000000000019"
/// category = "basefee"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultTable {
    vaults: Vec<VaultConfig>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VaultTableFile {
    #[serde(default)]
    vault: Vec<VaultConfig>,
}

impl VaultTable {
    /// Validates and wraps `vaults`, keeping their order.
    pub fn new(vaults: Vec<VaultConfig>) -> Result<Self, VaultConfigError> {
        if vaults.is_empty() {
            return Err(VaultConfigError::Empty);
        }
        let mut seen = HashSet::with_capacity(vaults.len());
        for vault in &vaults {
            if !is_valid_category(&vault.category) {
                return Err(VaultConfigError::InvalidCategory {
                    address: vault.address,
                    category: vault.category.clone(),
                });
            }
            if !seen.insert(vault.address) {
                return Err(VaultConfigError::DuplicateAddress(vault.address));
            }
        }
        Ok(Self { vaults })
    }

    /// Parses a table from TOML.
    pub fn from_toml_str(raw: &str) -> Result<Self, VaultConfigError> {
        let file: VaultTableFile = toml::from_str(raw)?;
        Self::new(file.vault)
    }

    /// Reads a table from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VaultConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// The monitored vaults, in polling order.
    pub fn vaults(&self) -> &[VaultConfig] {
        &self.vaults
    }

    /// Returns the number of vaults.
    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    /// Always `false`, a table holds at least one vault.
    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }
}

impl Default for VaultTable {
    /// The four OP stack fee vaults.
    fn default() -> Self {
        Self {
            vaults: vec![
                VaultConfig::new(BASE_FEE_VAULT, "basefee".to_owned()),
                VaultConfig::new(L1_FEE_VAULT, "l1fee".to_owned()),
                VaultConfig::new(OPERATOR_FEE_VAULT, "operator_fee".to_owned()),
                VaultConfig::new(SEQUENCER_FEE_VAULT, "sequencer_fee".to_owned()),
            ],
        }
    }
}

/// Categories prefix metric names, so they are restricted to `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_valid_category(category: &str) -> bool {
    let mut chars = category.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') &&
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
