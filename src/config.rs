//! Engine options.
//!
//! Every field has a default, so hosts only spell out what they change:
//!
//! ```rust
//! use trellis::config::EngineOptions;
//! let options = EngineOptions::from_yaml_str("max_call_depth: 8").unwrap();
//! assert_eq!(options.max_call_depth, 8);
//! assert_eq!(options.max_range_iterations, 10_000);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, Phase, TrellisError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Nested `call` depth before the runtime gives up.
    pub max_call_depth: usize,
    /// Upper bound on iterations a single `range` may produce.
    pub max_range_iterations: usize,
    /// Trim leading and trailing whitespace from interpolated text.
    pub trim_interpolated_text: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            max_range_iterations: 10_000,
            trim_interpolated_text: false,
        }
    }
}

impl EngineOptions {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TrellisError> {
        let options: Self = serde_yaml::from_str(yaml).map_err(|e| config_error(e.to_string()))?;
        options.checked()
    }

    pub fn from_json_str(json: &str) -> Result<Self, TrellisError> {
        let options: Self = serde_json::from_str(json).map_err(|e| config_error(e.to_string()))?;
        options.checked()
    }

    fn checked(self) -> Result<Self, TrellisError> {
        if self.max_call_depth == 0 {
            return Err(config_error("max_call_depth must be at least 1"));
        }
        Ok(self)
    }
}

fn config_error(message: impl Into<String>) -> TrellisError {
    TrellisError::new(
        ErrorKind::Config {
            message: message.into(),
        },
        "options",
        0,
        Phase::Config,
    )
}
