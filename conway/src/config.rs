// config.rs - Game rules shared by every resolution call
// Defaults first, then `CONWAY_*` environment variables, then validation

use std::collections::HashMap;

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::transition::DEFAULT_PARALLEL_THRESHOLD;

/// Prefix of the environment variables read by [`GameRules::from_env`].
pub const ENV_PREFIX: &str = "CONWAY";

/// Limits applied when boards are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Highest step a board may reach. Reaching it marks the execution final.
    pub max_executions_allowed: u32,
    /// Cell count at which the transition fans rows out across threads.
    pub parallel_threshold: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_executions_allowed: 1000,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl GameRules {
    /// Defaults overridden by `CONWAY_MAX_EXECUTIONS_ALLOWED` and
    /// `CONWAY_PARALLEL_THRESHOLD` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Reads overrides from `vars` instead of the process environment when given.
    fn load(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let rules: Self = Config::builder()
            .add_source(Config::try_from(&GameRules::default())?)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()?;

        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_executions_allowed == 0 {
            return Err(ConfigError::ZeroCeiling);
        }
        if self.parallel_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }
}
