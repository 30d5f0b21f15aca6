//! # Character Profile
//!
//! The parts of the owning character the engine reads while validating and
//! applying items: level, class, race, skills, known spells, reputation,
//! combat state and a handful of aura totals. The simulation owns this data;
//! the engine only writes the weapon swap timer.

use gearhold_shared::{CharacterGuid, FactionId, SkillId, SpellId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::stats::StatTarget;

/// Reputation standing with a faction.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ReputationRank {
    /// Hated.
    Hated = 0,
    /// Hostile.
    Hostile = 1,
    /// Unfriendly.
    Unfriendly = 2,
    /// Neutral.
    #[default]
    Neutral = 3,
    /// Friendly.
    Friendly = 4,
    /// Honored.
    Honored = 5,
    /// Revered.
    Revered = 6,
    /// Exalted.
    Exalted = 7,
}

impl ReputationRank {
    /// Ranks above neutral, zero at or below it.
    #[must_use]
    pub const fn steps_above_neutral(self) -> u32 {
        (self as u32).saturating_sub(Self::Neutral as u32)
    }
}

/// PvP faction side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Alliance.
    #[default]
    Alliance,
    /// Horde.
    Horde,
}

/// Transient unit state flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct UnitState(u32);

impl UnitState {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Dead.
    pub const DEAD: Self = Self(1 << 0);
    /// In combat.
    pub const IN_COMBAT: Self = Self(1 << 1);
    /// Stunned.
    pub const STUNNED: Self = Self(1 << 2);
    /// Charmed or possessed.
    pub const CHARMED: Self = Self(1 << 3);
    /// Casting a spell.
    pub const CASTING: Self = Self(1 << 4);
    /// Inside an arena match that has started.
    pub const ARENA_MATCH: Self = Self(1 << 5);

    /// Checks if a specific flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Combines two flag sets.
    #[inline]
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }

    /// Clears flags.
    #[inline]
    #[must_use]
    pub const fn without(self, flag: Self) -> Self {
        Self(self.0 & !flag.0)
    }
}

/// A character aura that only applies while a matching weapon is wielded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDependentAura {
    /// Weapon subclasses the aura requires, as a bit mask.
    pub subclass_mask: u32,
    /// Aggregate it modifies.
    pub target: StatTarget,
    /// Amount added while a matching weapon is equipped.
    pub amount: i32,
}

impl WeaponDependentAura {
    /// True if the aura applies to a weapon of `subclass`.
    #[must_use]
    pub const fn matches(&self, subclass: u32) -> bool {
        subclass < 32 && self.subclass_mask & (1 << subclass) != 0
    }
}

/// Read side of the owning character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterProfile {
    /// Character guid.
    pub guid: CharacterGuid,
    /// Character level.
    pub level: u8,
    /// Class id, starting at 1.
    pub class: u8,
    /// Race id, starting at 1.
    pub race: u8,
    /// PvP side.
    pub team: Team,
    /// Skill ranks.
    pub skills: BTreeMap<SkillId, u16>,
    /// Known spells.
    pub spells: BTreeSet<SpellId>,
    /// Reputation ranks.
    pub reputations: BTreeMap<FactionId, ReputationRank>,
    /// Honor rank.
    pub honor_rank: u8,
    /// Best personal arena rating.
    pub arena_rating: u16,
    /// Completed achievements.
    pub achievements: BTreeSet<u32>,
    /// Guild level, if in a guild.
    pub guild_level: Option<u8>,
    /// Transient state.
    pub state: UnitState,
    /// Dual wield is known.
    pub can_dual_wield: bool,
    /// Titan grip is known.
    pub can_titan_grip: bool,
    /// Remaining weapon swap lockout.
    pub weapon_change_timer_ms: u32,
    /// Current shapeshift form.
    pub shapeshift_form: u8,
    /// Vendor price modifier from auras, in percent.
    pub vendor_price_modifier_pct: i32,
    /// Durability loss is suppressed.
    pub prevent_durability_loss: bool,
    /// Auras that depend on the wielded weapon.
    pub weapon_auras: Vec<WeaponDependentAura>,
}

impl CharacterProfile {
    /// A living character of the given level with no skills or spells.
    #[must_use]
    pub fn new(guid: CharacterGuid, level: u8, class: u8, race: u8) -> Self {
        Self {
            guid,
            level,
            class,
            race,
            team: Team::Alliance,
            skills: BTreeMap::new(),
            spells: BTreeSet::new(),
            reputations: BTreeMap::new(),
            honor_rank: 0,
            arena_rating: 0,
            achievements: BTreeSet::new(),
            guild_level: None,
            state: UnitState::NONE,
            can_dual_wield: false,
            can_titan_grip: false,
            weapon_change_timer_ms: 0,
            shapeshift_form: 0,
            vendor_price_modifier_pct: 0,
            prevent_durability_loss: false,
            weapon_auras: Vec::new(),
        }
    }

    /// Class bit for template masks.
    #[must_use]
    pub const fn class_mask(&self) -> u32 {
        mask_bit(self.class)
    }

    /// Race bit for template masks.
    #[must_use]
    pub const fn race_mask(&self) -> u32 {
        mask_bit(self.race)
    }

    /// Skill rank, zero if unknown.
    #[must_use]
    pub fn skill(&self, skill: SkillId) -> u16 {
        self.skills.get(&skill).copied().unwrap_or(0)
    }

    /// True if the spell is known.
    #[must_use]
    pub fn knows_spell(&self, spell: SpellId) -> bool {
        self.spells.contains(&spell)
    }

    /// Reputation rank, neutral if never met.
    #[must_use]
    pub fn reputation(&self, faction: FactionId) -> ReputationRank {
        self.reputations.get(&faction).copied().unwrap_or_default()
    }

    /// True if alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.state.has(UnitState::DEAD)
    }

    /// True if in combat.
    #[must_use]
    pub const fn in_combat(&self) -> bool {
        self.state.has(UnitState::IN_COMBAT)
    }
}

const fn mask_bit(id: u8) -> u32 {
    if id == 0 || id > 32 {
        0
    } else {
        1 << (id - 1)
    }
}
