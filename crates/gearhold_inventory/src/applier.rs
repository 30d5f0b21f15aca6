//! # Stat and Effect Applier
//!
//! The apply/unapply protocol run whenever an item enters or leaves an
//! equipped slot. Every contribution made with `apply = true` has an exact
//! inverse with `apply = false`; the applier itself does not remember which
//! items are worn, so callers must pair the calls.
//!
//! ## Layers
//!
//! ```text
//! apply_item_mods
//! ├── apply_item_set                      (not gated by durability)
//! └── apply_item_gated_mods               (skipped for broken items)
//!     ├── correct_meta_gem_enchants       (other equipped items)
//!     ├── stat lines, armor, weapon damage
//!     ├── apply_equip_spells              (form gated, visible passives)
//!     ├── apply_artifact_powers / apply_azerite
//!     └── apply_enchantment               (every enchantment slot)
//! ```
//!
//! ## Enchantment tracking
//!
//! Enchantment effects are conditional (level, skill, meta gem colors,
//! socket colors). Whether a slot's effects are currently in the totals is
//! recorded in [`PlayerStats`], so removal reverts exactly what was added
//! even if a gate changed in between.

use gearhold_shared::{EquipSlot, ItemGuid, Position};

use crate::catalog::{Catalog, EnchantEffect, EnchantmentDef, MetaCondition, PowerEffect};
use crate::character::CharacterProfile;
use crate::config::InventoryConfig;
use crate::item::{EnchantSlot, Item};
use crate::stats::{CombatRating, ModLayer, PlayerStats, StatTarget, UnitMod, WeaponAttack, WeaponDamage};
use crate::store::InventoryStore;
use crate::template::{ItemPowerKind, ItemTemplate, SocketColor, SpellTrigger};

/// Aura source used for item set bonuses, which belong to no single item.
pub const SET_BONUS_SOURCE: ItemGuid = ItemGuid::EMPTY;

/// Attack type fed by a weapon in `position`.
#[must_use]
pub const fn attack_for(position: Position) -> Option<WeaponAttack> {
    match position {
        Position::Equipment(EquipSlot::MainHand) => Some(WeaponAttack::Base),
        Position::Equipment(EquipSlot::OffHand) => Some(WeaponAttack::Off),
        Position::Equipment(EquipSlot::Ranged) => Some(WeaponAttack::Ranged),
        _ => None,
    }
}

/// Applies item effects to a character's aggregates.
#[derive(Clone, Copy)]
pub struct Applier<'a> {
    catalog: &'a dyn Catalog,
    profile: &'a CharacterProfile,
    rating_multiplier_bp: u32,
    rating_per_expertise: u32,
}

impl<'a> Applier<'a> {
    /// Creates an applier for a character at `effective_level`.
    ///
    /// The combat rating multiplier is looked up once here.
    #[must_use]
    pub fn new(
        catalog: &'a dyn Catalog,
        profile: &'a CharacterProfile,
        config: &InventoryConfig,
        effective_level: u8,
    ) -> Self {
        Self {
            catalog,
            profile,
            rating_multiplier_bp: config.rating_multiplier_bp(effective_level),
            rating_per_expertise: config.rating_per_expertise.max(1),
        }
    }

    fn template(&self, item: &Item) -> Option<&'a ItemTemplate> {
        let template = self.catalog.template(item.entry);
        if template.is_none() {
            tracing::error!(guid = ?item.guid, entry = item.entry, "equipped item has no template");
        }
        template
    }

    /// Applies or removes everything `item` contributes from `position`.
    pub fn apply_item_mods(&self, stats: &mut PlayerStats, store: &InventoryStore, item: &Item, position: Position, apply: bool) {
        if !position.is_equipment() {
            return;
        }
        let Some(template) = self.template(item) else {
            return;
        };
        tracing::trace!(guid = ?item.guid, ?position, apply, "item mods");
        self.apply_item_set(stats, item, template, apply);
        self.apply_item_gated_mods(stats, store, item, position, apply);
    }

    /// The durability-gated part of [`Applier::apply_item_mods`].
    ///
    /// Broken items contribute nothing here. Callers removing mods because
    /// durability is about to reach zero must call this before the value
    /// changes.
    pub fn apply_item_gated_mods(
        &self,
        stats: &mut PlayerStats,
        store: &InventoryStore,
        item: &Item,
        position: Position,
        apply: bool,
    ) {
        self.gated_mods(stats, store, item, position, apply, true);
    }

    fn gated_mods(
        &self,
        stats: &mut PlayerStats,
        store: &InventoryStore,
        item: &Item,
        position: Position,
        apply: bool,
        correct_meta: bool,
    ) {
        if !position.is_equipment() || item.is_broken() {
            return;
        }
        let Some(template) = self.template(item) else {
            return;
        };
        if correct_meta && template.has_sockets() {
            self.correct_meta_gem_enchants(stats, store, position, apply);
        }
        for stat in &template.stats {
            stats.apply_mod(stat.kind, stat.value, self.rating_multiplier_bp, apply);
        }
        if template.armor > 0 {
            let armor = i64::from(template.armor);
            stats.add(StatTarget::UnitMod(UnitMod::Armor, ModLayer::BaseFlat), if apply { armor } else { -armor });
        }
        if let (Some(weapon), Some(attack)) = (template.weapon, attack_for(position)) {
            let damage = apply.then_some(WeaponDamage {
                min: weapon.min_damage,
                max: weapon.max_damage,
                attack_time_ms: weapon.delay_ms,
            });
            stats.set_weapon_damage(attack, damage);
        }
        self.apply_equip_spells(stats, item, template, apply);
        self.apply_artifact_powers(stats, item, template, apply);
        self.apply_azerite(stats, item, template, apply);
        for slot in EnchantSlot::ALL {
            self.apply_enchantment(stats, store, item, position, slot, apply);
        }
    }

    /// Adds or removes one piece of an item set, toggling each bonus whose
    /// threshold the piece count crosses.
    pub fn apply_item_set(&self, stats: &mut PlayerStats, item: &Item, template: &ItemTemplate, apply: bool) {
        let Some(set_id) = template.item_set else {
            return;
        };
        let Some(set) = self.catalog.item_set(set_id) else {
            tracing::error!(entry = template.id, set = set_id, "unknown item set");
            return;
        };
        let state = stats.set_state_mut(set_id);
        let changed = if apply {
            state.pieces.insert(item.guid)
        } else {
            state.pieces.remove(&item.guid)
        };
        if !changed {
            return;
        }
        let pieces = state.pieces.len();
        let mut grant = Vec::new();
        let mut revoke = Vec::new();
        for bonus in &set.bonuses {
            let reached = pieces >= usize::from(bonus.threshold);
            if reached && state.active.insert(bonus.spell) {
                grant.push(bonus.spell);
            } else if !reached && state.active.remove(&bonus.spell) {
                revoke.push(bonus.spell);
            }
        }
        for spell in grant {
            stats.add_aura(SET_BONUS_SOURCE, spell);
        }
        for spell in revoke {
            stats.remove_aura(SET_BONUS_SOURCE, spell);
        }
        stats.prune_set(set_id);
    }

    /// Casts or removes on-equip spells and registers hit procs.
    ///
    /// Auras restricted to other shapeshift forms are not applied; spells
    /// flagged as visible passives are mirrored into the client list.
    pub fn apply_equip_spells(&self, stats: &mut PlayerStats, item: &Item, template: &ItemTemplate, apply: bool) {
        let form = self.profile.shapeshift_form;
        for spell in &template.spells {
            match spell.trigger {
                SpellTrigger::OnEquip if apply => {
                    if spell.allowed_in_form(form) {
                        grant_aura(stats, item.guid, spell.spell, spell.visible_passive);
                    }
                }
                SpellTrigger::OnEquip => revoke_aura(stats, item.guid, spell.spell, spell.visible_passive),
                SpellTrigger::ChanceOnHit if apply => stats.register_proc(item.guid, spell.spell),
                SpellTrigger::ChanceOnHit => {
                    stats.unregister_proc(item.guid, spell.spell);
                }
                SpellTrigger::OnUse => {}
            }
        }
    }

    /// Re-evaluates form-restricted equip auras after a shapeshift.
    pub fn refresh_form_auras(&self, stats: &mut PlayerStats, store: &InventoryStore, form: u8) {
        for (_, item) in equipped(store) {
            if item.is_broken() {
                continue;
            }
            let Some(template) = self.template(item) else {
                continue;
            };
            for spell in &template.spells {
                if spell.trigger != SpellTrigger::OnEquip || spell.form_mask == 0 {
                    continue;
                }
                let active = stats.has_aura(item.guid, spell.spell);
                let allowed = spell.allowed_in_form(form);
                if allowed && !active {
                    grant_aura(stats, item.guid, spell.spell, spell.visible_passive);
                } else if !allowed && active {
                    revoke_aura(stats, item.guid, spell.spell, spell.visible_passive);
                }
            }
        }
    }

    /// Grants or revokes artifact power ranks.
    pub fn apply_artifact_powers(&self, stats: &mut PlayerStats, item: &Item, template: &ItemTemplate, apply: bool) {
        if template.power_kind != ItemPowerKind::Artifact {
            return;
        }
        for (&power_id, &rank) in &item.artifact_powers {
            let Some(effect) = self.catalog.artifact_power(power_id).and_then(|p| p.effect_at(rank)) else {
                continue;
            };
            match effect {
                PowerEffect::Spell { spell } if apply => stats.grant_power(item.guid, spell, rank),
                PowerEffect::Spell { spell } => {
                    stats.revoke_power(item.guid, spell);
                }
                PowerEffect::Stat { kind, amount } => {
                    stats.apply_mod(kind, amount, self.rating_multiplier_bp, apply);
                }
                PowerEffect::StatPct { unit_mod, amount_bp } => {
                    let amount = i64::from(amount_bp);
                    stats.add(StatTarget::UnitMod(unit_mod, ModLayer::TotalPct), if apply { amount } else { -amount });
                }
            }
        }
    }

    /// Grants or revokes azerite essences (primary azerite item) or
    /// selected powers (azerite-empowered armor).
    pub fn apply_azerite(&self, stats: &mut PlayerStats, item: &Item, template: &ItemTemplate, apply: bool) {
        let grants: Vec<(u32, u8)> = match template.power_kind {
            ItemPowerKind::AzeriteItem => item
                .azerite_essences
                .iter()
                .filter_map(|(&id, &rank)| {
                    let essence = self.catalog.azerite_essence(id)?;
                    let spell = usize::from(rank).checked_sub(1).and_then(|i| essence.rank_spells.get(i))?;
                    Some((*spell, rank))
                })
                .collect(),
            ItemPowerKind::AzeriteEmpowered => item
                .azerite_powers
                .iter()
                .filter_map(|&id| self.catalog.azerite_power(id).map(|p| (p.spell, 1)))
                .collect(),
            ItemPowerKind::None | ItemPowerKind::Artifact => return,
        };
        for (spell, rank) in grants {
            if apply {
                stats.grant_power(item.guid, spell, rank);
            } else {
                stats.revoke_power(item.guid, spell);
            }
        }
    }

    /// Applies or removes the enchantment in one slot of an equipped item.
    ///
    /// Applying is skipped when a gate fails or the slot is already applied;
    /// removing only reverts a slot that is applied.
    pub fn apply_enchantment(
        &self,
        stats: &mut PlayerStats,
        store: &InventoryStore,
        item: &Item,
        position: Position,
        slot: EnchantSlot,
        apply: bool,
    ) {
        let Some(instance) = item.enchantment(slot) else {
            return;
        };
        if stats.enchant_applied(item.guid, slot) == apply {
            return;
        }
        let Some(def) = self.catalog.enchantment(instance.id) else {
            tracing::warn!(guid = ?item.guid, enchantment = instance.id, "unknown enchantment");
            return;
        };
        if apply && !self.enchantment_gates_pass(store, item, slot, def, None) {
            return;
        }
        self.enchantment_effects(stats, item.guid, position, def, apply);
        stats.mark_enchant(item.guid, slot, apply);
    }

    fn enchantment_gates_pass(
        &self,
        store: &InventoryStore,
        item: &Item,
        slot: EnchantSlot,
        def: &EnchantmentDef,
        except: Option<Position>,
    ) -> bool {
        let profile = self.profile;
        if profile.level < def.min_level {
            return false;
        }
        let Some(template) = self.catalog.template(item.entry) else {
            return false;
        };
        // A gem in the prismatic socket is gated by the prismatic enchantment.
        let prismatic_gem = slot.socket_index() == Some(template.sockets.len());
        let skill_gate = if prismatic_gem {
            item.enchantment(EnchantSlot::Prismatic)
                .and_then(|e| self.catalog.enchantment(e.id))
                .and_then(|prismatic| prismatic.required_skill)
        } else {
            def.required_skill
        };
        if skill_gate.is_some_and(|req| profile.skill(req.skill) < req.rank) {
            return false;
        }
        if slot == EnchantSlot::SocketBonus && !self.gems_fit_sockets(item, template) {
            return false;
        }
        def.conditions.is_empty() || self.meta_conditions_hold(store, &def.conditions, except)
    }

    fn enchantment_effects(&self, stats: &mut PlayerStats, source: ItemGuid, position: Position, def: &EnchantmentDef, apply: bool) {
        let sign = |amount: i32| if apply { i64::from(amount) } else { -i64::from(amount) };
        for effect in &def.effects {
            match *effect {
                EnchantEffect::Stat { kind, amount } => stats.apply_mod(kind, amount, self.rating_multiplier_bp, apply),
                EnchantEffect::Resistance { school, amount } => {
                    stats.add(StatTarget::UnitMod(UnitMod::Resistance(school), ModLayer::TotalFlat), sign(amount));
                }
                EnchantEffect::Damage { amount } => {
                    if let Some(attack) = attack_for(position) {
                        stats.add(StatTarget::WeaponDamageBonus(attack), sign(amount));
                    }
                }
                EnchantEffect::EquipSpell { spell } if apply => stats.add_aura(source, spell),
                EnchantEffect::EquipSpell { spell } => {
                    stats.remove_aura(source, spell);
                }
                EnchantEffect::CombatSpell { spell } if apply => stats.register_proc(source, spell),
                EnchantEffect::CombatSpell { spell } => {
                    stats.unregister_proc(source, spell);
                }
                EnchantEffect::UseSpell { .. } | EnchantEffect::PrismaticSocket => {}
            }
        }
    }

    /// True if every colored socket holds a gem of a matching color.
    #[must_use]
    pub fn gems_fit_sockets(&self, item: &Item, template: &ItemTemplate) -> bool {
        template.sockets.iter().enumerate().all(|(index, color)| {
            let gem_colors = item
                .gems
                .get(index)
                .copied()
                .flatten()
                .and_then(|gem| self.catalog.template(gem))
                .and_then(|t| t.gem)
                .map_or(0, |g| g.colors);
            gem_colors & color.mask() != 0
        })
    }

    /// Gem color totals across equipped, unbroken gear, leaving out `except`.
    fn gem_color_counts(&self, store: &InventoryStore, except: Option<Position>) -> [u32; 4] {
        let mut counts = [0_u32; 4];
        let colors = [SocketColor::Meta, SocketColor::Red, SocketColor::Yellow, SocketColor::Blue];
        for (position, item) in equipped(store) {
            if Some(position) == except || item.is_broken() {
                continue;
            }
            for gem in item.gems.iter().flatten() {
                let mask = self.catalog.template(*gem).and_then(|t| t.gem).map_or(0, |g| g.colors);
                for (count, color) in counts.iter_mut().zip(colors) {
                    if mask & color.mask() != 0 {
                        *count += 1;
                    }
                }
            }
        }
        counts
    }

    fn meta_conditions_hold(&self, store: &InventoryStore, conditions: &[MetaCondition], except: Option<Position>) -> bool {
        let counts = self.gem_color_counts(store, except);
        let count = |color: SocketColor| match color {
            SocketColor::Meta => counts[0],
            SocketColor::Red => counts[1],
            SocketColor::Yellow => counts[2],
            SocketColor::Blue => counts[3],
        };
        conditions.iter().all(|condition| match *condition {
            MetaCondition::AtLeast { color, count: needed } => count(color) >= u32::from(needed),
            MetaCondition::MoreThan { color, than } => count(color) > count(than),
        })
    }

    /// Toggles color-conditional socket enchantments on the other equipped
    /// items after the item at `changed` is applied or removed.
    ///
    /// Only unbroken items are touched, since broken ones have no mods in
    /// the totals.
    pub fn correct_meta_gem_enchants(&self, stats: &mut PlayerStats, store: &InventoryStore, changed: Position, apply: bool) {
        let except = (!apply).then_some(changed);
        for (position, item) in equipped(store) {
            if position == changed || item.is_broken() || position.equip_slot().is_none() {
                continue;
            }
            let Some(template) = self.catalog.template(item.entry) else {
                continue;
            };
            if !template.has_sockets() {
                continue;
            }
            for slot in EnchantSlot::SOCKETS {
                let Some(def) = item.enchantment(slot).and_then(|e| self.catalog.enchantment(e.id)) else {
                    continue;
                };
                if def.conditions.is_empty() {
                    continue;
                }
                let active = stats.enchant_applied(item.guid, slot);
                let should = self.enchantment_gates_pass(store, item, slot, def, except);
                if active != should {
                    tracing::debug!(guid = ?item.guid, ?slot, should, "meta gem state changed");
                    self.enchantment_effects(stats, item.guid, position, def, should);
                    stats.mark_enchant(item.guid, slot, should);
                }
            }
        }
    }

    /// Strips every equipped item's contributions.
    ///
    /// Pass one removes item set pieces and weapon-dependent auras, pass two
    /// the direct bonuses and equip spells.
    pub fn remove_all_item_mods(&self, stats: &mut PlayerStats, store: &InventoryStore) {
        let items: Vec<(Position, &Item)> = equipped(store).collect();
        for &(_, item) in &items {
            if let Some(template) = self.template(item) {
                self.apply_item_set(stats, item, template, false);
            }
        }
        self.set_weapon_auras(stats, store, false);
        for &(position, item) in &items {
            self.gated_mods(stats, store, item, position, false, false);
        }
    }

    /// Re-applies every equipped item's contributions, in reverse pass order.
    pub fn apply_all_item_mods(&self, stats: &mut PlayerStats, store: &InventoryStore) {
        let items: Vec<(Position, &Item)> = equipped(store).collect();
        for &(position, item) in &items {
            self.gated_mods(stats, store, item, position, true, false);
        }
        for &(_, item) in &items {
            if let Some(template) = self.template(item) {
                self.apply_item_set(stats, item, template, true);
            }
        }
        self.set_weapon_auras(stats, store, true);
    }

    /// Recomputes the weapon-dependent derived state: expertise, armor
    /// penetration, the titan grip penalty and the weapon-dependent auras.
    pub fn update_weapon_state(&self, stats: &mut PlayerStats, store: &InventoryStore) {
        self.set_weapon_auras(stats, store, true);
        let usable = |slot: EquipSlot| {
            store
                .equipped(slot)
                .filter(|item| !item.is_broken())
                .and_then(|item| self.catalog.template(item.entry))
                .filter(|t| t.weapon.is_some())
        };
        let expertise = u32::try_from(stats.rating(CombatRating::Expertise).max(0) / i64::from(self.rating_per_expertise))
            .unwrap_or(u32::MAX);
        let off_expertise = if usable(EquipSlot::OffHand).is_some() { expertise } else { 0 };
        let two_hander_held = [EquipSlot::MainHand, EquipSlot::OffHand]
            .into_iter()
            .any(|slot| usable(slot).is_some_and(ItemTemplate::is_two_handed));

        stats.derived.expertise = [expertise, off_expertise];
        stats.derived.armor_penetration = stats.rating(CombatRating::ArmorPenetration);
        stats.derived.titan_grip_penalty = self.profile.can_titan_grip && two_hander_held;
    }

    /// Brings the weapon-dependent auras in line with the wielded weapons.
    /// With `enabled` false every such aura is switched off.
    fn set_weapon_auras(&self, stats: &mut PlayerStats, store: &InventoryStore, enabled: bool) {
        let subclasses: Vec<u32> = [EquipSlot::MainHand, EquipSlot::OffHand, EquipSlot::Ranged]
            .into_iter()
            .filter_map(|slot| store.equipped(slot))
            .filter(|item| !item.is_broken())
            .filter_map(|item| self.catalog.template(item.entry))
            .filter(|t| t.weapon.is_some())
            .map(|t| t.subclass)
            .collect();
        for (index, aura) in self.profile.weapon_auras.iter().enumerate().take(64) {
            let bit = 1_u64 << index;
            let active = stats.derived.weapon_auras & bit != 0;
            let wanted = enabled && subclasses.iter().any(|&subclass| aura.matches(subclass));
            if active == wanted {
                continue;
            }
            let amount = i64::from(aura.amount);
            stats.add(aura.target, if wanted { amount } else { -amount });
            stats.derived.weapon_auras ^= bit;
        }
    }
}

fn grant_aura(stats: &mut PlayerStats, item: ItemGuid, spell: u32, visible: bool) {
    stats.add_aura(item, spell);
    if visible {
        stats.add_visible_passive(spell);
    }
}

fn revoke_aura(stats: &mut PlayerStats, item: ItemGuid, spell: u32, visible: bool) {
    if stats.remove_aura(item, spell) && visible {
        stats.remove_visible_passive(spell);
    }
}

/// Top-level equipped positions (gear, bags, profession gear), in position order.
fn equipped(store: &InventoryStore) -> impl Iterator<Item = (Position, &Item)> {
    store.iter_placed().filter(|(position, _)| position.is_equipment())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemSetDef, SetBonus, StaticCatalog};
    use crate::item::EnchantmentInstance;
    use crate::stats::ItemModKind;
    use crate::template::{InventoryType, ItemSpell};
    use gearhold_shared::CharacterGuid;

    const OWNER: CharacterGuid = CharacterGuid(1);
    const HEAD: Position = Position::Equipment(EquipSlot::Head);
    const CHEST: Position = Position::Equipment(EquipSlot::Chest);

    fn catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with_template(
                ItemTemplate::new(1, "Helm of Tests")
                    .with_inventory_type(InventoryType::Head)
                    .with_stat(ItemModKind::Stamina, 12)
                    .with_stat(ItemModKind::CritRating, 20)
                    .with_armor(300)
                    .with_durability(50)
                    .with_item_set(5)
                    .with_spell(ItemSpell {
                        spell: 900,
                        visible_passive: true,
                        ..ItemSpell::default()
                    }),
            )
            .with_template(
                ItemTemplate::new(2, "Chest of Tests")
                    .with_inventory_type(InventoryType::Chest)
                    .with_item_set(5),
            )
            .with_item_set(ItemSetDef {
                id: 5,
                bonuses: vec![SetBonus { threshold: 2, spell: 555 }],
            })
            .with_enchantment(crate::catalog::EnchantmentDef::new(
                40,
                vec![EnchantEffect::Stat {
                    kind: ItemModKind::Strength,
                    amount: 8,
                }],
            ))
    }

    fn equip(store: &mut InventoryStore, catalog: &StaticCatalog, guid: u64, entry: u32, position: Position) {
        let template = catalog.template(entry).cloned().unwrap();
        store.attach(Item::create(ItemGuid(guid), &template, 1, OWNER), position).unwrap();
    }

    #[test]
    fn test_apply_then_remove_restores_totals() {
        let catalog = catalog();
        let profile = CharacterProfile::new(OWNER, 60, 1, 1);
        let config = InventoryConfig::from_toml_str("combat_rating_multipliers_bp = [15000]").unwrap();
        let applier = Applier::new(&catalog, &profile, &config, 60);
        let mut store = InventoryStore::new(OWNER);
        equip(&mut store, &catalog, 1, 1, HEAD);
        store.get_mut(ItemGuid(1)).unwrap().set_enchantment(EnchantSlot::Permanent, Some(EnchantmentInstance::permanent(40)));

        let mut stats = PlayerStats::new();
        let before = stats.clone();
        let helm = store.get(ItemGuid(1)).unwrap();
        applier.apply_item_mods(&mut stats, &store, helm, HEAD, true);
        assert_eq!(stats.unit_mod(UnitMod::Stamina, ModLayer::BaseFlat), 12);
        assert_eq!(stats.rating(CombatRating::CritSpell), 30);
        assert_eq!(stats.unit_mod(UnitMod::Strength, ModLayer::BaseFlat), 8);
        assert_eq!(stats.visible_passives(), &[900]);
        assert!(stats.enchant_applied(ItemGuid(1), EnchantSlot::Permanent));

        applier.apply_item_mods(&mut stats, &store, helm, HEAD, false);
        assert_eq!(stats, before);
    }

    #[test]
    fn test_set_bonus_threshold_and_broken_piece() {
        let catalog = catalog();
        let profile = CharacterProfile::new(OWNER, 60, 1, 1);
        let config = InventoryConfig::default();
        let applier = Applier::new(&catalog, &profile, &config, 60);
        let mut store = InventoryStore::new(OWNER);
        equip(&mut store, &catalog, 1, 1, HEAD);
        equip(&mut store, &catalog, 2, 2, CHEST);
        store.get_mut(ItemGuid(1)).unwrap().durability = 0;

        let mut stats = PlayerStats::new();
        applier.apply_item_mods(&mut stats, &store, store.get(ItemGuid(1)).unwrap(), HEAD, true);
        assert!(!stats.has_aura(SET_BONUS_SOURCE, 555));
        applier.apply_item_mods(&mut stats, &store, store.get(ItemGuid(2)).unwrap(), CHEST, true);
        assert!(stats.has_aura(SET_BONUS_SOURCE, 555));
        // The broken helm still counts for the set but adds no stats.
        assert_eq!(stats.unit_mod(UnitMod::Stamina, ModLayer::BaseFlat), 0);

        applier.apply_item_mods(&mut stats, &store, store.get(ItemGuid(2)).unwrap(), CHEST, false);
        assert!(!stats.has_aura(SET_BONUS_SOURCE, 555));
    }

    #[test]
    fn test_full_refresh_round_trip() {
        let catalog = catalog();
        let profile = CharacterProfile::new(OWNER, 60, 1, 1);
        let config = InventoryConfig::default();
        let applier = Applier::new(&catalog, &profile, &config, 60);
        let mut store = InventoryStore::new(OWNER);
        equip(&mut store, &catalog, 1, 1, HEAD);
        equip(&mut store, &catalog, 2, 2, CHEST);

        let mut stats = PlayerStats::new();
        applier.apply_all_item_mods(&mut stats, &store);
        let equipped_state = stats.clone();
        applier.remove_all_item_mods(&mut stats, &store);
        assert_eq!(stats, PlayerStats::new());
        applier.apply_all_item_mods(&mut stats, &store);
        assert_eq!(stats, equipped_state);
    }

    #[test]
    fn test_form_restricted_aura() {
        let catalog = StaticCatalog::new().with_template(
            ItemTemplate::new(3, "Idol")
                .with_inventory_type(InventoryType::Relic)
                .with_spell(ItemSpell {
                    spell: 77,
                    form_mask: 1 << 5,
                    ..ItemSpell::default()
                }),
        );
        let mut profile = CharacterProfile::new(OWNER, 60, 11, 4);
        let config = InventoryConfig::default();
        let mut store = InventoryStore::new(OWNER);
        let ranged = Position::Equipment(EquipSlot::Ranged);
        equip(&mut store, &catalog, 3, 3, ranged);

        let mut stats = PlayerStats::new();
        Applier::new(&catalog, &profile, &config, 60).apply_item_mods(&mut stats, &store, store.get(ItemGuid(3)).unwrap(), ranged, true);
        assert!(!stats.has_aura(ItemGuid(3), 77));

        profile.shapeshift_form = 5;
        Applier::new(&catalog, &profile, &config, 60).refresh_form_auras(&mut stats, &store, 5);
        assert!(stats.has_aura(ItemGuid(3), 77));

        Applier::new(&catalog, &profile, &config, 60).apply_item_mods(&mut stats, &store, store.get(ItemGuid(3)).unwrap(), ranged, false);
        assert_eq!(stats, PlayerStats::new());
    }
}
