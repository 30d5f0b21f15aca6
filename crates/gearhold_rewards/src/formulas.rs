//! # XP and Honor Formulas
//!
//! Level arithmetic behind kill rewards. The distributor only talks to the
//! [`XpFormula`] trait so tests and custom realms can swap the curve.

use crate::config::RewardConfig;
use crate::context::{ContentTier, MapKind, Victim};

/// Kill XP and group rate calculation.
pub trait XpFormula {
    /// Highest victim level that is trivial for a killer at `level`.
    fn gray_level(&self, level: u8) -> u8;

    /// XP a killer at `killer_level` earns for `victim`, before group split
    /// and character auras.
    fn kill_xp(&self, killer_level: u8, victim: &Victim, map: MapKind) -> u32;

    /// Group XP rate for `count` rewarded members.
    fn group_rate(&self, count: u32, raid: bool) -> f32;
}

/// Highest trivial victim level for a killer at `level`.
#[must_use]
pub const fn gray_level(level: u8) -> u8 {
    match level {
        0..=5 => 0,
        6..=39 => level - 5 - level / 10,
        40..=59 => level - 1 - level / 5,
        _ => level - 9,
    }
}

/// Level gap below the killer at which XP reaches zero.
#[must_use]
pub const fn zero_difference(level: u8) -> u8 {
    match level {
        0..=7 => 5,
        8..=9 => 6,
        10..=11 => 7,
        12..=15 => 8,
        16..=19 => 9,
        20..=29 => 11,
        30..=39 => 12,
        40..=44 => 13,
        45..=49 => 14,
        50..=54 => 15,
        55..=59 => 16,
        _ => 17,
    }
}

/// XP base constant for a content tier.
#[must_use]
pub const fn tier_base(tier: ContentTier) -> u32 {
    match tier {
        ContentTier::Classic => 45,
        ContentTier::Burning => 235,
        ContentTier::Wrath => 580,
        ContentTier::Later => 1878,
    }
}

/// Unmodified XP for a victim of `victim_level`.
#[must_use]
pub fn base_gain(killer_level: u8, victim_level: u8, tier: ContentTier) -> u32 {
    let base = u32::from(killer_level) * 5 + tier_base(tier);
    if victim_level >= killer_level {
        let diff = u32::from((victim_level - killer_level).min(4));
        return (base * (20 + diff) / 10 + 1) / 2;
    }
    if victim_level <= gray_level(killer_level) {
        return 0;
    }
    let zero = u32::from(zero_difference(killer_level));
    let behind = u32::from(killer_level - victim_level);
    base * zero.saturating_sub(behind) / zero
}

/// Honor for a kill at `level` before the level-gap scaling.
#[must_use]
pub fn hk_honor_at_level_f(level: u8, multiplier: f32) -> f32 {
    multiplier * f32::from(level) * 1.55
}

/// Rounded-up honor for a kill at `level`.
#[must_use]
pub fn hk_honor_at_level(level: u8, multiplier: f32) -> u32 {
    hk_honor_at_level_f(level, multiplier).ceil() as u32
}

/// The standard curve: gray levels, zero differences, content tiers and
/// elite bonuses, scaled by the configured kill rates.
#[derive(Debug, Clone, Default)]
pub struct StandardXpFormula {
    config: RewardConfig,
}

impl StandardXpFormula {
    /// Formula with the given rates.
    #[must_use]
    pub const fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    /// The rates in use.
    #[must_use]
    pub const fn config(&self) -> &RewardConfig {
        &self.config
    }
}

impl XpFormula for StandardXpFormula {
    fn gray_level(&self, level: u8) -> u8 {
        gray_level(level)
    }

    fn kill_xp(&self, killer_level: u8, victim: &Victim, map: MapKind) -> u32 {
        let Some(creature) = victim.as_creature() else {
            return 0;
        };
        if !creature.grants_xp || creature.controlled_by_player {
            return 0;
        }
        let base = base_gain(killer_level, victim.level, creature.tier);
        if base == 0 {
            return 0;
        }
        let mut gain = base as f32;
        if creature.elite {
            gain *= self.config.elite_xp_multiplier;
        }
        let rate = if map == MapKind::Battleground {
            self.config.xp_battleground_kill_rate
        } else {
            self.config.xp_kill_rate
        };
        (gain * creature.xp_modifier * rate) as u32
    }

    fn group_rate(&self, count: u32, raid: bool) -> f32 {
        self.config.group_rate(count, raid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CreatureVictim;

    #[test]
    fn test_gray_level_brackets() {
        assert_eq!(gray_level(5), 0);
        assert_eq!(gray_level(10), 4);
        assert_eq!(gray_level(30), 22);
        assert_eq!(gray_level(50), 39);
        assert_eq!(gray_level(60), 51);
        assert_eq!(gray_level(80), 71);
    }

    #[test]
    fn test_base_gain_by_level_gap() {
        // Same level: (5 * 30 + 45) * 20 / 10 + 1, halved.
        assert_eq!(base_gain(30, 30, ContentTier::Classic), 195);
        // Higher victims cap at four levels.
        assert_eq!(base_gain(30, 40, ContentTier::Classic), base_gain(30, 34, ContentTier::Classic));
        // Lower victims fall off linearly until gray.
        assert_eq!(base_gain(30, 24, ContentTier::Classic), 195 * 6 / 12);
        assert_eq!(base_gain(30, 22, ContentTier::Classic), 0);
    }

    #[test]
    fn test_elite_and_rates() {
        let formula = StandardXpFormula::default();
        let mut creature = CreatureVictim::new(1);
        creature.tier = ContentTier::Classic;
        let normal = formula.kill_xp(30, &Victim::creature(30, creature.clone()), MapKind::World);
        creature.elite = true;
        let elite = formula.kill_xp(30, &Victim::creature(30, creature.clone()), MapKind::World);
        assert_eq!(normal, 195);
        assert_eq!(elite, 390);

        creature.grants_xp = false;
        assert_eq!(formula.kill_xp(30, &Victim::creature(30, creature), MapKind::World), 0);
    }

    #[test]
    fn test_honor_at_level() {
        assert_eq!(hk_honor_at_level(60, 1.0), 93);
        assert_eq!(hk_honor_at_level(1, 1.0), 2);
    }
}
