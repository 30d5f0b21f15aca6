//! # Player Stat Aggregates
//!
//! The character-side totals items contribute to. Every aggregate is an
//! integer sum (or a reference-counted set), so applying a contribution and
//! then removing it restores the exact previous state.
//!
//! ## The modifier table
//!
//! [`ItemModKind::effects`] maps each template stat kind to the aggregates it
//! feeds. Rating kinds are marked [`Scaling::Rating`] and get multiplied by
//! the combat rating multiplier of the character's effective level before
//! being added.

use gearhold_shared::{ItemGuid, ItemSetId, SpellId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::item::EnchantSlot;
use crate::money::BASIS_POINTS;

/// Magic school, for resistances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum School {
    /// Holy.
    Holy,
    /// Fire.
    Fire,
    /// Nature.
    Nature,
    /// Frost.
    Frost,
    /// Shadow.
    Shadow,
    /// Arcane.
    Arcane,
}

/// A unit modifier group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitMod {
    /// Strength.
    Strength,
    /// Agility.
    Agility,
    /// Stamina.
    Stamina,
    /// Intellect.
    Intellect,
    /// Spirit.
    Spirit,
    /// Maximum health.
    Health,
    /// Maximum mana.
    Mana,
    /// Armor.
    Armor,
    /// Melee attack power.
    AttackPower,
    /// Ranged attack power.
    RangedAttackPower,
    /// Resistance to a school.
    Resistance(School),
}

/// Layer of a unit modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModLayer {
    /// Added to the base value.
    BaseFlat,
    /// Percent of the base value, in basis points.
    BasePct,
    /// Added after base percentages.
    TotalFlat,
    /// Percent of the total, in basis points.
    TotalPct,
}

/// Combat ratings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatRating {
    /// Defense.
    Defense,
    /// Dodge.
    Dodge,
    /// Parry.
    Parry,
    /// Block.
    Block,
    /// Melee hit.
    HitMelee,
    /// Ranged hit.
    HitRanged,
    /// Spell hit.
    HitSpell,
    /// Melee crit.
    CritMelee,
    /// Ranged crit.
    CritRanged,
    /// Spell crit.
    CritSpell,
    /// Melee haste.
    HasteMelee,
    /// Ranged haste.
    HasteRanged,
    /// Spell haste.
    HasteSpell,
    /// Expertise.
    Expertise,
    /// Armor penetration.
    ArmorPenetration,
    /// Mastery.
    Mastery,
    /// Versatility.
    Versatility,
    /// Resilience.
    Resilience,
}

/// Weapon attack type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponAttack {
    /// Main hand.
    Base,
    /// Off hand.
    Off,
    /// Ranged.
    Ranged,
}

/// One aggregate an item contribution lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTarget {
    /// A unit modifier layer.
    UnitMod(UnitMod, ModLayer),
    /// A combat rating.
    Rating(CombatRating),
    /// Spell power.
    SpellPower,
    /// Healing done.
    HealingDone,
    /// Spell penetration.
    SpellPenetration,
    /// Mana per five seconds.
    ManaRegen,
    /// Health per five seconds.
    HealthRegen,
    /// Shield block value.
    BlockValue,
    /// Flat weapon damage bonus.
    WeaponDamageBonus(WeaponAttack),
}

/// How a table entry scales.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scaling {
    /// Added as-is.
    Flat,
    /// Multiplied by the combat rating multiplier.
    Rating,
}

/// One row of the modifier table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModEffect {
    /// Destination aggregate.
    pub target: StatTarget,
    /// Scaling rule.
    pub scaling: Scaling,
}

macro_rules! flat {
    ($target:expr) => {
        ModEffect { target: $target, scaling: Scaling::Flat }
    };
}

macro_rules! rating {
    ($rating:ident) => {
        ModEffect { target: StatTarget::Rating(CombatRating::$rating), scaling: Scaling::Rating }
    };
}

macro_rules! base {
    ($unit_mod:expr) => {
        flat!(StatTarget::UnitMod($unit_mod, ModLayer::BaseFlat))
    };
}

macro_rules! total {
    ($unit_mod:expr) => {
        flat!(StatTarget::UnitMod($unit_mod, ModLayer::TotalFlat))
    };
}

/// Stat kinds that appear on templates and enchantments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemModKind {
    /// Mana.
    Mana,
    /// Health.
    Health,
    /// Agility.
    Agility,
    /// Strength.
    Strength,
    /// Intellect.
    Intellect,
    /// Spirit.
    Spirit,
    /// Stamina.
    Stamina,
    /// Defense rating.
    DefenseSkillRating,
    /// Dodge rating.
    DodgeRating,
    /// Parry rating.
    ParryRating,
    /// Block rating.
    BlockRating,
    /// Melee hit rating.
    HitMeleeRating,
    /// Ranged hit rating.
    HitRangedRating,
    /// Spell hit rating.
    HitSpellRating,
    /// Melee crit rating.
    CritMeleeRating,
    /// Ranged crit rating.
    CritRangedRating,
    /// Spell crit rating.
    CritSpellRating,
    /// Melee haste rating.
    HasteMeleeRating,
    /// Ranged haste rating.
    HasteRangedRating,
    /// Spell haste rating.
    HasteSpellRating,
    /// Hit rating (all three).
    HitRating,
    /// Crit rating (all three).
    CritRating,
    /// Haste rating (all three).
    HasteRating,
    /// Resilience rating.
    ResilienceRating,
    /// Expertise rating.
    ExpertiseRating,
    /// Attack power (melee and ranged).
    AttackPower,
    /// Ranged attack power.
    RangedAttackPower,
    /// Healing done.
    SpellHealingDone,
    /// Spell damage done.
    SpellDamageDone,
    /// Mana regeneration.
    ManaRegeneration,
    /// Armor penetration rating.
    ArmorPenetrationRating,
    /// Spell power.
    SpellPower,
    /// Health regeneration.
    HealthRegen,
    /// Spell penetration.
    SpellPenetration,
    /// Block value.
    BlockValue,
    /// Mastery rating.
    MasteryRating,
    /// Versatility rating.
    Versatility,
    /// Bonus armor.
    ExtraArmor,
    /// Fire resistance.
    FireResistance,
    /// Frost resistance.
    FrostResistance,
    /// Holy resistance.
    HolyResistance,
    /// Shadow resistance.
    ShadowResistance,
    /// Nature resistance.
    NatureResistance,
    /// Arcane resistance.
    ArcaneResistance,
}

impl ItemModKind {
    /// Aggregates this kind feeds.
    #[must_use]
    pub fn effects(self) -> &'static [ModEffect] {
        match self {
            Self::Mana => &[base!(UnitMod::Mana)],
            Self::Health => &[base!(UnitMod::Health)],
            Self::Agility => &[base!(UnitMod::Agility)],
            Self::Strength => &[base!(UnitMod::Strength)],
            Self::Intellect => &[base!(UnitMod::Intellect)],
            Self::Spirit => &[base!(UnitMod::Spirit)],
            Self::Stamina => &[base!(UnitMod::Stamina)],
            Self::DefenseSkillRating => &[rating!(Defense)],
            Self::DodgeRating => &[rating!(Dodge)],
            Self::ParryRating => &[rating!(Parry)],
            Self::BlockRating => &[rating!(Block)],
            Self::HitMeleeRating => &[rating!(HitMelee)],
            Self::HitRangedRating => &[rating!(HitRanged)],
            Self::HitSpellRating => &[rating!(HitSpell)],
            Self::CritMeleeRating => &[rating!(CritMelee)],
            Self::CritRangedRating => &[rating!(CritRanged)],
            Self::CritSpellRating => &[rating!(CritSpell)],
            Self::HasteMeleeRating => &[rating!(HasteMelee)],
            Self::HasteRangedRating => &[rating!(HasteRanged)],
            Self::HasteSpellRating => &[rating!(HasteSpell)],
            Self::HitRating => &[rating!(HitMelee), rating!(HitRanged), rating!(HitSpell)],
            Self::CritRating => &[rating!(CritMelee), rating!(CritRanged), rating!(CritSpell)],
            Self::HasteRating => {
                &[rating!(HasteMelee), rating!(HasteRanged), rating!(HasteSpell)]
            }
            Self::ResilienceRating => &[rating!(Resilience)],
            Self::ExpertiseRating => &[rating!(Expertise)],
            Self::AttackPower => &[total!(UnitMod::AttackPower), total!(UnitMod::RangedAttackPower)],
            Self::RangedAttackPower => &[total!(UnitMod::RangedAttackPower)],
            Self::SpellHealingDone => &[flat!(StatTarget::HealingDone)],
            Self::SpellDamageDone => &[flat!(StatTarget::SpellPower)],
            Self::ManaRegeneration => &[flat!(StatTarget::ManaRegen)],
            Self::ArmorPenetrationRating => &[rating!(ArmorPenetration)],
            Self::SpellPower => &[flat!(StatTarget::SpellPower), flat!(StatTarget::HealingDone)],
            Self::HealthRegen => &[flat!(StatTarget::HealthRegen)],
            Self::SpellPenetration => &[flat!(StatTarget::SpellPenetration)],
            Self::BlockValue => &[flat!(StatTarget::BlockValue)],
            Self::MasteryRating => &[rating!(Mastery)],
            Self::Versatility => &[rating!(Versatility)],
            Self::ExtraArmor => &[total!(UnitMod::Armor)],
            Self::FireResistance => &[base!(UnitMod::Resistance(School::Fire))],
            Self::FrostResistance => &[base!(UnitMod::Resistance(School::Frost))],
            Self::HolyResistance => &[base!(UnitMod::Resistance(School::Holy))],
            Self::ShadowResistance => &[base!(UnitMod::Resistance(School::Shadow))],
            Self::NatureResistance => &[base!(UnitMod::Resistance(School::Nature))],
            Self::ArcaneResistance => &[base!(UnitMod::Resistance(School::Arcane))],
        }
    }
}

/// Weapon damage range installed for an attack type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDamage {
    /// Minimum damage.
    pub min: u32,
    /// Maximum damage.
    pub max: u32,
    /// Attack time in milliseconds.
    pub attack_time_ms: u32,
}

impl WeaponDamage {
    /// Bare-handed damage.
    pub const UNARMED: Self = Self {
        min: 1,
        max: 2,
        attack_time_ms: 2_000,
    };
}

/// Active bonuses of one item set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetState {
    /// Equipped pieces.
    pub pieces: BTreeSet<ItemGuid>,
    /// Bonus spells currently granted.
    pub active: BTreeSet<SpellId>,
}

/// Weapon-dependent derived values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DerivedWeaponState {
    /// Expertise for main and off hand.
    pub expertise: [u32; 2],
    /// Armor penetration rating after weapon-dependent auras.
    pub armor_penetration: i64,
    /// Titan grip penalty is active.
    pub titan_grip_penalty: bool,
    /// Bit `i` is set while weapon-dependent aura `i` of the profile applies.
    pub weapon_auras: u64,
}

/// Everything items contribute to a character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerStats {
    totals: BTreeMap<StatTarget, i64>,
    weapon_damage: BTreeMap<WeaponAttack, WeaponDamage>,
    auras: BTreeMap<(ItemGuid, SpellId), u32>,
    visible_passives: Vec<SpellId>,
    sets: BTreeMap<ItemSetId, SetState>,
    procs: BTreeMap<(ItemGuid, SpellId), u32>,
    power_ranks: BTreeMap<(ItemGuid, SpellId), u8>,
    applied_enchants: BTreeSet<(ItemGuid, EnchantSlot)>,
    /// Weapon-dependent derived values.
    pub derived: DerivedWeaponState,
}

impl PlayerStats {
    /// Creates empty aggregates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of an aggregate.
    #[must_use]
    pub fn get(&self, target: StatTarget) -> i64 {
        self.totals.get(&target).copied().unwrap_or(0)
    }

    /// Current combat rating.
    #[must_use]
    pub fn rating(&self, rating: CombatRating) -> i64 {
        self.get(StatTarget::Rating(rating))
    }

    /// Current unit modifier layer.
    #[must_use]
    pub fn unit_mod(&self, unit_mod: UnitMod, layer: ModLayer) -> i64 {
        self.get(StatTarget::UnitMod(unit_mod, layer))
    }

    /// Adds `delta` to an aggregate. Zero totals are dropped so that
    /// a full round trip compares equal to the starting state.
    pub fn add(&mut self, target: StatTarget, delta: i64) {
        if delta == 0 {
            return;
        }
        let value = self.totals.entry(target).or_insert(0);
        *value += delta;
        if *value == 0 {
            self.totals.remove(&target);
        }
    }

    /// Applies or removes one template stat line through the modifier table.
    pub fn apply_mod(&mut self, kind: ItemModKind, value: i32, rating_multiplier_bp: u32, apply: bool) {
        for effect in kind.effects() {
            let amount = match effect.scaling {
                Scaling::Flat => i64::from(value),
                Scaling::Rating => {
                    i64::from(value) * i64::from(rating_multiplier_bp) / i64::from(BASIS_POINTS)
                }
            };
            self.add(effect.target, if apply { amount } else { -amount });
        }
    }

    /// Installed weapon damage for an attack type.
    #[must_use]
    pub fn weapon_damage(&self, attack: WeaponAttack) -> WeaponDamage {
        self.weapon_damage.get(&attack).copied().unwrap_or(WeaponDamage::UNARMED)
    }

    /// Installs or resets weapon damage for an attack type.
    pub fn set_weapon_damage(&mut self, attack: WeaponAttack, damage: Option<WeaponDamage>) {
        match damage {
            Some(damage) => {
                self.weapon_damage.insert(attack, damage);
            }
            None => {
                self.weapon_damage.remove(&attack);
            }
        }
    }

    /// Grants an aura sourced from an item.
    pub fn add_aura(&mut self, item: ItemGuid, spell: SpellId) {
        *self.auras.entry((item, spell)).or_insert(0) += 1;
    }

    /// Removes an aura sourced from an item. Returns false if it was not present.
    pub fn remove_aura(&mut self, item: ItemGuid, spell: SpellId) -> bool {
        release(&mut self.auras, (item, spell))
    }

    /// True if `item` currently grants `spell`.
    #[must_use]
    pub fn has_aura(&self, item: ItemGuid, spell: SpellId) -> bool {
        self.auras.contains_key(&(item, spell))
    }

    /// Spells granted by a particular item.
    pub fn auras_from(&self, item: ItemGuid) -> impl Iterator<Item = SpellId> + '_ {
        self.auras.keys().filter(move |(guid, _)| *guid == item).map(|&(_, spell)| spell)
    }

    /// Adds a spell to the client-visible passive list.
    pub fn add_visible_passive(&mut self, spell: SpellId) {
        self.visible_passives.push(spell);
    }

    /// Removes one occurrence from the client-visible passive list.
    pub fn remove_visible_passive(&mut self, spell: SpellId) {
        if let Some(index) = self.visible_passives.iter().position(|&s| s == spell) {
            self.visible_passives.remove(index);
        }
    }

    /// Client-visible passive list.
    #[must_use]
    pub fn visible_passives(&self) -> &[SpellId] {
        &self.visible_passives
    }

    /// State of an item set.
    #[must_use]
    pub fn set_state(&self, set: ItemSetId) -> Option<&SetState> {
        self.sets.get(&set)
    }

    pub(crate) fn set_state_mut(&mut self, set: ItemSetId) -> &mut SetState {
        self.sets.entry(set).or_default()
    }

    pub(crate) fn prune_set(&mut self, set: ItemSetId) {
        if self.sets.get(&set).is_some_and(|s| s.pieces.is_empty() && s.active.is_empty()) {
            self.sets.remove(&set);
        }
    }

    /// Registers a combat proc from an item.
    pub fn register_proc(&mut self, item: ItemGuid, spell: SpellId) {
        *self.procs.entry((item, spell)).or_insert(0) += 1;
    }

    /// Unregisters a combat proc from an item.
    pub fn unregister_proc(&mut self, item: ItemGuid, spell: SpellId) -> bool {
        release(&mut self.procs, (item, spell))
    }

    /// Registered combat procs.
    pub fn procs(&self) -> impl Iterator<Item = (ItemGuid, SpellId)> + '_ {
        self.procs.keys().copied()
    }

    /// Grants a ranked power spell.
    pub fn grant_power(&mut self, item: ItemGuid, spell: SpellId, rank: u8) {
        self.power_ranks.insert((item, spell), rank);
    }

    /// Revokes a ranked power spell.
    pub fn revoke_power(&mut self, item: ItemGuid, spell: SpellId) -> bool {
        self.power_ranks.remove(&(item, spell)).is_some()
    }

    /// Rank of a granted power spell.
    #[must_use]
    pub fn power_rank(&self, item: ItemGuid, spell: SpellId) -> Option<u8> {
        self.power_ranks.get(&(item, spell)).copied()
    }

    pub(crate) fn mark_enchant(&mut self, item: ItemGuid, slot: EnchantSlot, applied: bool) -> bool {
        if applied {
            self.applied_enchants.insert((item, slot))
        } else {
            self.applied_enchants.remove(&(item, slot))
        }
    }

    /// True if the enchantment in `slot` of `item` is currently applied.
    #[must_use]
    pub fn enchant_applied(&self, item: ItemGuid, slot: EnchantSlot) -> bool {
        self.applied_enchants.contains(&(item, slot))
    }
}

fn release(map: &mut BTreeMap<(ItemGuid, SpellId), u32>, key: (ItemGuid, SpellId)) -> bool {
    let Some(count) = map.get_mut(&key) else {
        return false;
    };
    *count -= 1;
    if *count == 0 {
        map.remove(&key);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ItemModKind; 44] = [
        ItemModKind::Mana,
        ItemModKind::Health,
        ItemModKind::Agility,
        ItemModKind::Strength,
        ItemModKind::Intellect,
        ItemModKind::Spirit,
        ItemModKind::Stamina,
        ItemModKind::DefenseSkillRating,
        ItemModKind::DodgeRating,
        ItemModKind::ParryRating,
        ItemModKind::BlockRating,
        ItemModKind::HitMeleeRating,
        ItemModKind::HitRangedRating,
        ItemModKind::HitSpellRating,
        ItemModKind::CritMeleeRating,
        ItemModKind::CritRangedRating,
        ItemModKind::CritSpellRating,
        ItemModKind::HasteMeleeRating,
        ItemModKind::HasteRangedRating,
        ItemModKind::HasteSpellRating,
        ItemModKind::HitRating,
        ItemModKind::CritRating,
        ItemModKind::HasteRating,
        ItemModKind::ResilienceRating,
        ItemModKind::ExpertiseRating,
        ItemModKind::AttackPower,
        ItemModKind::RangedAttackPower,
        ItemModKind::SpellHealingDone,
        ItemModKind::SpellDamageDone,
        ItemModKind::ManaRegeneration,
        ItemModKind::ArmorPenetrationRating,
        ItemModKind::SpellPower,
        ItemModKind::HealthRegen,
        ItemModKind::SpellPenetration,
        ItemModKind::BlockValue,
        ItemModKind::MasteryRating,
        ItemModKind::Versatility,
        ItemModKind::ExtraArmor,
        ItemModKind::FireResistance,
        ItemModKind::FrostResistance,
        ItemModKind::HolyResistance,
        ItemModKind::ShadowResistance,
        ItemModKind::NatureResistance,
        ItemModKind::ArcaneResistance,
    ];

    #[test]
    fn test_every_kind_round_trips() {
        for kind in ALL_KINDS {
            let mut stats = PlayerStats::new();
            stats.apply_mod(kind, 37, 13_750, true);
            assert_ne!(stats, PlayerStats::new(), "{kind:?} had no effect");
            stats.apply_mod(kind, 37, 13_750, false);
            assert_eq!(stats, PlayerStats::new(), "{kind:?} leaked");
        }
    }

    #[test]
    fn test_rating_scaling() {
        let mut stats = PlayerStats::new();
        stats.apply_mod(ItemModKind::CritRating, 100, 15_000, true);
        assert_eq!(stats.rating(CombatRating::CritMelee), 150);
        assert_eq!(stats.rating(CombatRating::CritSpell), 150);
        stats.apply_mod(ItemModKind::Strength, 100, 15_000, true);
        assert_eq!(stats.unit_mod(UnitMod::Strength, ModLayer::BaseFlat), 100);
    }

    #[test]
    fn test_aura_reference_counting() {
        let mut stats = PlayerStats::new();
        let item = ItemGuid(1);
        stats.add_aura(item, 500);
        stats.add_aura(item, 500);
        assert!(stats.remove_aura(item, 500));
        assert!(stats.has_aura(item, 500));
        assert!(stats.remove_aura(item, 500));
        assert!(!stats.remove_aura(item, 500));
        assert_eq!(stats, PlayerStats::new());
    }
}
