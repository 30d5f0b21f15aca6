//! # Engine Configuration
//!
//! Tunables loaded from TOML. Every field has a default, so an empty file
//! is a valid configuration.
//!
//! ```toml
//! max_money = 99999999999
//! reputation_discount_step_bp = 500
//! combat_rating_multipliers_bp = [10000, 10000, 10500]
//! ```

use serde::Deserialize;

use crate::error::ContentError;
use crate::money::{Money, BASIS_POINTS};

/// Most copper a character may hold by default.
pub const DEFAULT_MAX_MONEY: u64 = 99_999_999_999;

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Money cap.
    pub max_money: Money,
    /// Vendor discount per reputation rank above neutral, in basis points.
    pub reputation_discount_step_bp: u32,
    /// Combat rating multiplier per effective level, in basis points.
    /// Index 0 is level 1. Levels past the end use the last entry; an empty
    /// table means a flat 100%.
    pub combat_rating_multipliers_bp: Vec<u32>,
    /// Expertise rating per point of expertise.
    pub rating_per_expertise: u32,
    /// Weapon swap lockout started by an in-combat weapon equip.
    pub weapon_swap_cooldown_ms: u32,
    /// Seconds a buyback entry stays valid.
    pub buyback_expiry_s: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_money: Money::from_copper(DEFAULT_MAX_MONEY),
            reputation_discount_step_bp: 500,
            combat_rating_multipliers_bp: Vec::new(),
            rating_per_expertise: 8,
            weapon_swap_cooldown_ms: 1_500,
            buyback_expiry_s: 30 * 3_600,
        }
    }
}

impl InventoryConfig {
    /// Parses a configuration from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self, ContentError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.reputation_discount_step_bp.saturating_mul(4) >= BASIS_POINTS {
            return Err(ContentError::InvalidConfig(
                "reputation_discount_step_bp leaves no price at exalted".to_string(),
            ));
        }
        if self.rating_per_expertise == 0 {
            return Err(ContentError::InvalidConfig(
                "rating_per_expertise must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Combat rating multiplier at `level`, in basis points.
    #[must_use]
    pub fn rating_multiplier_bp(&self, level: u8) -> u32 {
        let table = &self.combat_rating_multipliers_bp;
        let Some(&last) = table.last() else {
            return BASIS_POINTS;
        };
        let index = usize::from(level.max(1)) - 1;
        table.get(index).copied().unwrap_or(last)
    }

    /// Discount factor at `steps` reputation ranks above neutral, in basis points.
    #[must_use]
    pub fn reputation_price_bp(&self, steps: u32) -> u32 {
        BASIS_POINTS.saturating_sub(self.reputation_discount_step_bp.saturating_mul(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = InventoryConfig::from_toml_str("").unwrap();
        assert_eq!(config, InventoryConfig::default());
        assert_eq!(config.rating_multiplier_bp(80), BASIS_POINTS);
    }

    #[test]
    fn test_rating_table_lookup() {
        let config = InventoryConfig::from_toml_str(
            "combat_rating_multipliers_bp = [10000, 12000, 15000]",
        )
        .unwrap();
        assert_eq!(config.rating_multiplier_bp(0), 10_000);
        assert_eq!(config.rating_multiplier_bp(2), 12_000);
        assert_eq!(config.rating_multiplier_bp(60), 15_000);
    }

    #[test]
    fn test_reputation_discount() {
        let config = InventoryConfig::default();
        assert_eq!(config.reputation_price_bp(0), 10_000);
        assert_eq!(config.reputation_price_bp(4), 8_000);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(InventoryConfig::from_toml_str("reputation_discount_step_bp = 2500").is_err());
        assert!(InventoryConfig::from_toml_str("rating_per_expertise = 0").is_err());
        assert!(InventoryConfig::from_toml_str("max_money = \"lots\"").is_err());
    }
}
