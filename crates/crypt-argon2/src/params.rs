//! Cost parameters and hasher configuration.
//!
//! The defaults are the classic `crypt_argon2i` constants: 10 passes over
//! 4 MiB of memory with a single lane and a 32-byte tag. They are plain
//! values handed to [`crate::Hasher::new`], never process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::CryptError;

/// Default number of passes over memory.
pub const DEFAULT_T_COST: u32 = 10;

/// Default memory cost in KiB (2^12 = 4 MiB).
pub const DEFAULT_M_COST: u32 = 1 << 12;

/// Default number of lanes.
pub const DEFAULT_LANES: u32 = 1;

/// Default number of threads.
pub const DEFAULT_THREADS: u32 = 1;

/// Tag length in bytes. The encoded format only carries 32-byte tags.
pub const OUTPUT_LEN: usize = 32;

/// Default maximum secret length in bytes.
pub const DEFAULT_MAX_SECRET_LEN: usize = 128;

/// Minimum salt length in bytes.
pub const MIN_SALT_LEN: usize = 8;

/// Maximum salt length in bytes.
pub const MAX_SALT_LEN: usize = 48;

/// Maximum `keyid` length in bytes.
pub const MAX_KEYID_LEN: usize = 8;

/// Maximum associated `data` length in bytes.
pub const MAX_DATA_LEN: usize = 32;

/// Minimum number of passes.
pub const MIN_T_COST: u32 = 1;

/// Upper bound for lanes and threads (2^24 - 1).
pub const MAX_LANES: u32 = 0x00FF_FFFF;

/// Memory blocks required per lane (`m_cost >= 8 * lanes`).
pub const MIN_BLOCKS_PER_LANE: u32 = 8;

/// Argon2 cost parameters for one generation call.
///
/// Fields follow the `argon2` crate convention:
/// - `m_cost`: memory in KiB
/// - `t_cost`: number of passes
/// - `lanes`: degree of parallelism, baked into the hash
/// - `threads`: runtime concurrency, does not change the hash
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParams {
    /// Number of passes over memory.
    pub t_cost: u32,
    /// Memory cost in kibibytes.
    pub m_cost: u32,
    /// Degree of parallelism recorded in the encoded hash.
    pub lanes: u32,
    /// Runtime concurrency permitted for a single derivation.
    pub threads: u32,
    /// Tag length in bytes.
    pub output_len: usize,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            t_cost: DEFAULT_T_COST,
            m_cost: DEFAULT_M_COST,
            lanes: DEFAULT_LANES,
            threads: DEFAULT_THREADS,
            output_len: OUTPUT_LEN,
        }
    }
}

impl CostParams {
    /// Check the parameters against the bounds of the encoded format.
    ///
    /// # Errors
    ///
    /// Returns `CryptError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), CryptError> {
        if self.t_cost < MIN_T_COST {
            return Err(CryptError::InvalidConfig(format!(
                "t_cost must be at least {MIN_T_COST}"
            )));
        }
        if self.lanes == 0 || self.lanes > MAX_LANES {
            return Err(CryptError::InvalidConfig(format!(
                "lanes must be between 1 and {MAX_LANES}"
            )));
        }
        if self.threads == 0 || self.threads > MAX_LANES {
            return Err(CryptError::InvalidConfig(format!(
                "threads must be between 1 and {MAX_LANES}"
            )));
        }
        if self.m_cost < self.lanes.saturating_mul(MIN_BLOCKS_PER_LANE) {
            return Err(CryptError::InvalidConfig(format!(
                "m_cost must be at least {MIN_BLOCKS_PER_LANE} KiB per lane"
            )));
        }
        if self.output_len != OUTPUT_LEN {
            return Err(CryptError::InvalidConfig(format!(
                "output_len must be {OUTPUT_LEN}"
            )));
        }
        Ok(())
    }
}

/// Configuration for a [`crate::Hasher`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Cost parameters used for generation.
    pub params: CostParams,
    /// Longest secret accepted, in bytes.
    pub max_secret_len: usize,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            params: CostParams::default(),
            max_secret_len: DEFAULT_MAX_SECRET_LEN,
        }
    }
}

impl HasherConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `CryptError::InvalidConfig` if the JSON is invalid or the
    /// resulting configuration fails [`HasherConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, CryptError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CryptError::InvalidConfig(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the cost parameters and the secret limit.
    ///
    /// # Errors
    ///
    /// Returns `CryptError::InvalidConfig` on the first violated bound.
    pub fn validate(&self) -> Result<(), CryptError> {
        if self.max_secret_len == 0 {
            return Err(CryptError::InvalidConfig(
                "max_secret_len must be positive".into(),
            ));
        }
        self.params.validate()
    }
}
