//! Runtime configuration
//!
//! Read from `ember.toml`:
//!
//! ```toml
//! loop_counter_slots = 8
//! max_call_depth = 256
//! echo_output = true
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Number of reserved loop-counter names, `i` through `p`
pub const COUNTER_ALPHABET_LEN: u8 = 8;

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {cause}")]
    Io {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for one program run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// How many nested counted loops get a counter name
    pub loop_counter_slots: u8,
    /// Maximum nesting of function invocations
    pub max_call_depth: usize,
    /// Whether `print` also writes to stdout
    pub echo_output: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            loop_counter_slots: COUNTER_ALPHABET_LEN,
            max_call_depth: 256,
            echo_output: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let mut config: RuntimeConfig = toml::from_str(source)?;
        if config.loop_counter_slots > COUNTER_ALPHABET_LEN {
            tracing::warn!(
                requested = config.loop_counter_slots,
                "only {} loop counter names exist",
                COUNTER_ALPHABET_LEN
            );
            config.loop_counter_slots = COUNTER_ALPHABET_LEN;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|cause| ConfigError::Io {
            path: path.display().to_string(),
            cause,
        })?;
        Self::from_toml_str(&source)
    }

    /// Configuration for tests and embedding: nothing is echoed to stdout
    pub fn quiet() -> Self {
        RuntimeConfig {
            echo_output: false,
            ..Self::default()
        }
    }
}
