//! # Reward Rates
//!
//! ```toml
//! xp_kill_rate = 1.0
//! max_level = 80
//! group_rates = [1.0, 1.0, 1.0, 1.166, 1.3, 1.4]
//! ```

use serde::Deserialize;
use thiserror::Error;

/// Errors loading the reward configuration.
#[derive(Error, Debug)]
pub enum RewardConfigError {
    /// TOML did not parse or did not match the schema.
    #[error("invalid reward config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Parsed but semantically invalid.
    #[error("invalid reward config value: {0}")]
    Invalid(String),
}

/// Reward tunables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Multiplier on creature kill XP outside battlegrounds.
    pub xp_kill_rate: f32,
    /// Multiplier on kill XP inside battlegrounds.
    pub xp_battleground_kill_rate: f32,
    /// Multiplier on kill reputation.
    pub reputation_rate: f32,
    /// Multiplier on honor.
    pub honor_rate: f32,
    /// XP multiplier for elite creatures.
    pub elite_xp_multiplier: f32,
    /// Characters at this level gain no more XP.
    pub max_level: u8,
    /// Non-raid group XP rate by rewarded member count. Counts past the end
    /// use the last entry.
    pub group_rates: Vec<f32>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            xp_kill_rate: 1.0,
            xp_battleground_kill_rate: 1.0,
            reputation_rate: 1.0,
            honor_rate: 1.0,
            elite_xp_multiplier: 2.0,
            max_level: 80,
            group_rates: vec![1.0, 1.0, 1.0, 1.166, 1.3, 1.4],
        }
    }
}

impl RewardConfig {
    /// Parses and validates a configuration.
    ///
    /// # Errors
    ///
    /// Malformed TOML or an out-of-range value.
    pub fn from_toml_str(content: &str) -> Result<Self, RewardConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`RewardConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), RewardConfigError> {
        let rates = [
            ("xp_kill_rate", self.xp_kill_rate),
            ("xp_battleground_kill_rate", self.xp_battleground_kill_rate),
            ("reputation_rate", self.reputation_rate),
            ("honor_rate", self.honor_rate),
            ("elite_xp_multiplier", self.elite_xp_multiplier),
        ];
        for (name, rate) in rates {
            if !rate.is_finite() || rate < 0.0 {
                return Err(RewardConfigError::Invalid(format!("{name} must be a non-negative number")));
            }
        }
        if self.group_rates.iter().any(|rate| !rate.is_finite() || *rate <= 0.0) {
            return Err(RewardConfigError::Invalid("group_rates must be positive".to_string()));
        }
        if self.max_level == 0 {
            return Err(RewardConfigError::Invalid("max_level must be positive".to_string()));
        }
        Ok(())
    }

    /// XP rate for a group rewarding `count` members.
    #[must_use]
    pub fn group_rate(&self, count: u32, raid: bool) -> f32 {
        if raid {
            return 1.0;
        }
        let index = usize::try_from(count).unwrap_or(usize::MAX);
        self.group_rates
            .get(index)
            .or_else(|| self.group_rates.last())
            .copied()
            .unwrap_or(1.0)
    }
}
