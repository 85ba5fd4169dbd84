//! Runtime configuration
//!
//! Defaults match the handshake's reference timings. Every value can be
//! overridden through `LEDGERSEAL_*` environment variables; the binaries
//! layer their command-line flags on top with [`ConfigOverrides`]. Loading
//! only parses; call [`Config::validate`] once every layer is applied.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::MIN_KEY_BITS;

/// Session lifetime override, in seconds
pub const ENV_SESSION_TTL_SECS: &str = "LEDGERSEAL_SESSION_TTL_SECS";
/// Prune interval override, in seconds
pub const ENV_PRUNE_INTERVAL_SECS: &str = "LEDGERSEAL_PRUNE_INTERVAL_SECS";
/// Nonce validity window override, in seconds
pub const ENV_NONCE_TTL_SECS: &str = "LEDGERSEAL_NONCE_TTL_SECS";
/// RSA modulus size override
pub const ENV_KEY_BITS: &str = "LEDGERSEAL_KEY_BITS";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is not a number
    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// A duration is zero
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// The RSA modulus is below the minimum
    #[error("key_bits must be at least {min}, got {actual}")]
    WeakKey {
        /// Smallest accepted size
        min: usize,
        /// Configured size
        actual: usize,
    },
}

/// Handshake and gateway settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lifetime of an issued session
    pub session_ttl_secs: u64,
    /// Interval between session prune sweeps
    pub prune_interval_secs: u64,
    /// How long a nonce stays on record
    pub nonce_ttl_secs: u64,
    /// RSA modulus size for the server keypair
    pub key_bits: usize,
}

/// Values set explicitly, typically from command-line flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Session lifetime
    pub session_ttl_secs: Option<u64>,
    /// Prune sweep interval
    pub prune_interval_secs: Option<u64>,
    /// Nonce validity window
    pub nonce_ttl_secs: Option<u64>,
    /// RSA modulus size
    pub key_bits: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            session_ttl_secs: 600,
            prune_interval_secs: 60,
            nonce_ttl_secs: 300,
            key_bits: MIN_KEY_BITS,
        }
    }
}

impl Config {
    /// Defaults overridden by whatever `LEDGERSEAL_*` variables are set
    ///
    /// The result is not validated yet.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overridden through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let config = Config {
            session_ttl_secs: parse_var(&lookup, ENV_SESSION_TTL_SECS)?
                .unwrap_or(defaults.session_ttl_secs),
            prune_interval_secs: parse_var(&lookup, ENV_PRUNE_INTERVAL_SECS)?
                .unwrap_or(defaults.prune_interval_secs),
            nonce_ttl_secs: parse_var(&lookup, ENV_NONCE_TTL_SECS)?
                .unwrap_or(defaults.nonce_ttl_secs),
            key_bits: parse_var(&lookup, ENV_KEY_BITS)?.unwrap_or(defaults.key_bits),
        };
        Ok(config)
    }

    /// Replace every value `overrides` sets
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(ttl) = overrides.session_ttl_secs {
            self.session_ttl_secs = ttl;
        }
        if let Some(interval) = overrides.prune_interval_secs {
            self.prune_interval_secs = interval;
        }
        if let Some(ttl) = overrides.nonce_ttl_secs {
            self.nonce_ttl_secs = ttl;
        }
        if let Some(bits) = overrides.key_bits {
            self.key_bits = bits;
        }
    }

    /// Reject zero durations and undersized keys
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::ZeroDuration("session_ttl_secs"));
        }
        if self.prune_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("prune_interval_secs"));
        }
        if self.nonce_ttl_secs == 0 {
            return Err(ConfigError::ZeroDuration("nonce_ttl_secs"));
        }
        if self.key_bits < MIN_KEY_BITS {
            return Err(ConfigError::WeakKey {
                min: MIN_KEY_BITS,
                actual: self.key_bits,
            });
        }
        Ok(())
    }

    /// Session lifetime
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Prune sweep interval
    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs)
    }

    /// Nonce validity window
    pub fn nonce_ttl(&self) -> Duration {
        Duration::from_secs(self.nonce_ttl_secs)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}
