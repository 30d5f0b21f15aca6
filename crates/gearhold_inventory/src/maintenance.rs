//! # Item Upkeep
//!
//! Changes to items that stay where they are: durability and repair,
//! temporary enchantments, gems, and the character context equipped items
//! are evaluated in (effective level, shapeshift form).
//!
//! ## Broken items
//!
//! An equipped item at zero durability contributes nothing but its item set
//! piece. The applier reads the durability it is handed, so gated effects
//! come off before durability reaches zero and go back on after it leaves
//! zero.

use gearhold_shared::{EnchantmentId, EquipSlot, ItemGuid, Position};

use crate::applier::Applier;
use crate::error::{InventoryError, InventoryResult};
use crate::events::InventoryEvent;
use crate::item::{EnchantSlot, EnchantmentInstance};
use crate::money::{Money, BASIS_POINTS};
use crate::player::Player;

impl Player {
    /// Sets an item's durability, clamped to its maximum.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`.
    pub fn set_durability(&mut self, guid: ItemGuid, durability: u32) -> InventoryResult<()> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let old = item.durability;
        let new = durability.min(item.max_durability);
        if old == new {
            return Ok(());
        }
        let position = item.position();
        let equipped = position.filter(|p| p.is_equipment());

        if let Some(position) = equipped.filter(|_| new == 0) {
            self.gated_mods(guid, position, false);
            tracing::debug!(?guid, ?position, "item broke");
        }
        let item = self.store.get_mut(guid).ok_or(InventoryError::InternalInconsistency)?;
        item.durability = new;
        item.mark_changed();
        if let Some(position) = equipped.filter(|_| old == 0) {
            self.gated_mods(guid, position, true);
        }
        if let Some(position) = equipped {
            self.touch(position);
        }
        self.events.push(InventoryEvent::DurabilityChanged { item: guid, durability: new });
        self.settle();
        Ok(())
    }

    /// Takes `points` of durability from an item. Items without durability
    /// and characters protected from durability loss are unaffected.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`.
    pub fn durability_points_loss(&mut self, guid: ItemGuid, points: u32) -> InventoryResult<()> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        if self.profile.prevent_durability_loss || item.max_durability == 0 || points == 0 {
            return Ok(());
        }
        let durability = item.durability.saturating_sub(points);
        self.set_durability(guid, durability)
    }

    /// Takes a share of maximum durability, in basis points, from an item.
    /// At least one point is lost.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`.
    pub fn durability_loss(&mut self, guid: ItemGuid, loss_bp: u32) -> InventoryResult<()> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let points = u64::from(item.max_durability) * u64::from(loss_bp) / u64::from(BASIS_POINTS);
        let points = u32::try_from(points).unwrap_or(u32::MAX).max(1);
        self.durability_points_loss(guid, points)
    }

    /// [`Player::durability_loss`] for every equipped item, and with
    /// `inventory` for everything carried as well.
    ///
    /// # Errors
    ///
    /// `InternalInconsistency` if the store is corrupt.
    pub fn durability_loss_all(&mut self, loss_bp: u32, inventory: bool) -> InventoryResult<()> {
        for guid in self.repairable(inventory) {
            self.durability_loss(guid, loss_bp)?;
        }
        Ok(())
    }

    /// Cost of repairing an item fully at `price_bp` of the list price.
    #[must_use]
    pub fn repair_cost(&self, guid: ItemGuid, price_bp: u32) -> Money {
        let Some(item) = self.store.get(guid) else {
            return Money::ZERO;
        };
        let Some(template) = self.catalog.template(item.entry) else {
            return Money::ZERO;
        };
        let lost = item.max_durability.saturating_sub(item.durability);
        template
            .repair_cost_per_point
            .checked_mul(u64::from(lost))
            .unwrap_or(Money::MAX)
            .mul_bp(price_bp)
    }

    /// Repairs one item, paying for it. Returns what it cost.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` and `NotEnoughMoney`. Nothing changes on failure.
    pub fn repair_item(&mut self, guid: ItemGuid, price_bp: u32) -> InventoryResult<Money> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        if item.durability == item.max_durability {
            return Ok(Money::ZERO);
        }
        let max = item.max_durability;
        let cost = self.repair_cost(guid, price_bp);
        self.take_money(cost)?;
        self.set_durability(guid, max)?;
        Ok(cost)
    }

    /// Repairs everything equipped and carried, paying the total up front.
    /// The bank is not repaired.
    ///
    /// # Errors
    ///
    /// `NotEnoughMoney` when the total is not affordable; nothing is
    /// repaired then.
    pub fn repair_all(&mut self, price_bp: u32) -> InventoryResult<Money> {
        let damaged: Vec<ItemGuid> = self
            .repairable(true)
            .into_iter()
            .filter(|guid| self.store.get(*guid).is_some_and(|item| item.durability < item.max_durability))
            .collect();
        let total = damaged
            .iter()
            .map(|guid| self.repair_cost(*guid, price_bp))
            .try_fold(Money::ZERO, Money::checked_add)
            .ok_or(InventoryError::NotEnoughMoney)?;
        self.take_money(total)?;
        for guid in &damaged {
            let max = self.store.get(*guid).map_or(0, |item| item.max_durability);
            self.set_durability(*guid, max)?;
        }
        tracing::info!(items = damaged.len(), copper = total.copper(), "repaired all");
        Ok(total)
    }

    /// Items with durability that are worn, plus carried ones with
    /// `inventory`.
    fn repairable(&self, inventory: bool) -> Vec<ItemGuid> {
        self.store
            .iter_placed()
            .filter(|(position, item)| {
                item.max_durability > 0 && (position.is_equipment() || (inventory && position.is_inventory()))
            })
            .map(|(_, item)| item.guid)
            .collect()
    }

    // ---- enchantments ----

    /// Puts a temporary enchantment on an item, replacing the current one.
    ///
    /// A zero `duration_ms` never expires.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` for an unknown item or enchantment.
    pub fn apply_temporary_enchantment(
        &mut self,
        guid: ItemGuid,
        enchantment: EnchantmentId,
        duration_ms: u32,
        charges: u32,
    ) -> InventoryResult<()> {
        if self.catalog.enchantment(enchantment).is_none() {
            return Err(InventoryError::ItemNotFound);
        }
        let instance = EnchantmentInstance {
            id: enchantment,
            duration_ms,
            charges,
        };
        self.replace_enchantment(guid, EnchantSlot::Temporary, Some(instance))?;
        if duration_ms > 0 {
            self.timed_enchants.insert(guid);
        } else {
            self.timed_enchants.remove(&guid);
        }
        Ok(())
    }

    /// Advances timed temporary enchantments by `diff_ms`, removing the ones
    /// that run out.
    ///
    /// # Errors
    ///
    /// `InternalInconsistency` if the store is corrupt.
    pub fn update_enchant_time(&mut self, diff_ms: u32) -> InventoryResult<()> {
        let timed: Vec<ItemGuid> = self.timed_enchants.iter().copied().collect();
        for guid in timed {
            let Some(current) = self.store.get(guid).and_then(|item| item.enchantment(EnchantSlot::Temporary)) else {
                self.timed_enchants.remove(&guid);
                continue;
            };
            if current.duration_ms <= diff_ms {
                tracing::debug!(?guid, enchantment = current.id, "temporary enchantment expired");
                self.replace_enchantment(guid, EnchantSlot::Temporary, None)?;
                self.timed_enchants.remove(&guid);
            } else if let Some(item) = self.store.get_mut(guid) {
                let remaining = EnchantmentInstance {
                    duration_ms: current.duration_ms - diff_ms,
                    ..current
                };
                item.set_enchantment(EnchantSlot::Temporary, Some(remaining));
            }
        }
        Ok(())
    }

    /// Swaps the enchantment in `slot`, reverting and reapplying its effects
    /// if the item is worn.
    fn replace_enchantment(
        &mut self,
        guid: ItemGuid,
        slot: EnchantSlot,
        value: Option<EnchantmentInstance>,
    ) -> InventoryResult<()> {
        let position = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?.position();
        let equipped = position.filter(|p| p.is_equipment());
        if let Some(position) = equipped {
            self.enchantment_mods(guid, position, slot, false);
        }
        let item = self.store.get_mut(guid).ok_or(InventoryError::InternalInconsistency)?;
        item.set_enchantment(slot, value);
        if let Some(position) = equipped {
            self.enchantment_mods(guid, position, slot, true);
        }
        Ok(())
    }

    /// Sockets a gem item into socket `socket` of `guid`, consuming one unit
    /// of the gem. Effects of a worn item are reapplied with the new gem.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`, `WrongSlot` for a socket the item lacks,
    /// `CantDoThatRightNow` for a non-gem, and the unique-equipped rules for
    /// worn items.
    pub fn insert_gem(&mut self, guid: ItemGuid, socket: usize, gem: ItemGuid) -> InventoryResult<()> {
        if guid == gem {
            return Err(InventoryError::CantDoThatRightNow);
        }
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let gem_item = self.store.get(gem).ok_or(InventoryError::ItemNotFound)?;
        let template = self.catalog.template(item.entry).ok_or(InventoryError::ItemNotFound)?;
        let gem_template = self.catalog.template(gem_item.entry).ok_or(InventoryError::ItemNotFound)?;
        let properties = gem_template.gem.ok_or(InventoryError::CantDoThatRightNow)?;
        let prismatic = item.enchantment(EnchantSlot::Prismatic).is_some();
        let sockets = template.sockets.len() + usize::from(prismatic);
        let slot = EnchantSlot::socket(socket)
            .filter(|_| socket < sockets)
            .ok_or(InventoryError::WrongSlot)?;
        let mut gems = item.gems;
        gems[socket] = Some(gem_item.entry);
        let equipped = item.position().filter(|p| p.is_equipment());
        if let Some(position) = equipped {
            self.planner().can_equip_unique(template, &gems, Some(position))?;
        }
        let socket_bonus = template.socket_bonus;
        let gem_entry = gem_item.entry;

        if gem_item.count > 1 {
            let gem_item = self.store.get_mut(gem).ok_or(InventoryError::InternalInconsistency)?;
            gem_item.count -= 1;
            gem_item.mark_changed();
        } else {
            self.destroy_item(gem)?;
        }
        if equipped.is_some() {
            self.apply_mods(guid, false);
        }
        let item = self.store.get_mut(guid).ok_or(InventoryError::InternalInconsistency)?;
        item.gems[socket] = Some(gem_entry);
        item.set_enchantment(slot, Some(EnchantmentInstance::permanent(properties.enchantment)));
        if let Some(bonus) = socket_bonus.filter(|_| item.enchantment(EnchantSlot::SocketBonus).is_none()) {
            item.set_enchantment(EnchantSlot::SocketBonus, Some(EnchantmentInstance::permanent(bonus)));
        }
        if equipped.is_some() {
            self.apply_mods(guid, true);
        }
        tracing::debug!(?guid, socket, gem = gem_entry, "gem socketed");
        Ok(())
    }

    // ---- character context ----

    /// Re-evaluates every equipped item at a new effective level.
    pub fn set_effective_level(&mut self, level: u8) {
        if level == self.effective_level {
            return;
        }
        Applier::new(&*self.catalog, &self.profile, &self.config, self.effective_level)
            .remove_all_item_mods(&mut self.stats, &self.store);
        self.effective_level = level;
        Applier::new(&*self.catalog, &self.profile, &self.config, level).apply_all_item_mods(&mut self.stats, &self.store);
        tracing::debug!(level, "effective level changed");
        self.touch(Position::Equipment(EquipSlot::MainHand));
        self.settle();
    }

    /// Changes shapeshift form, toggling form-restricted equip auras.
    pub fn set_shapeshift_form(&mut self, form: u8) {
        self.profile.shapeshift_form = form;
        Applier::new(&*self.catalog, &self.profile, &self.config, self.effective_level)
            .refresh_form_auras(&mut self.stats, &self.store, form);
    }

    fn gated_mods(&mut self, guid: ItemGuid, position: Position, apply: bool) {
        let Some(item) = self.store.get(guid) else {
            return;
        };
        Applier::new(&*self.catalog, &self.profile, &self.config, self.effective_level)
            .apply_item_gated_mods(&mut self.stats, &self.store, item, position, apply);
    }

    fn enchantment_mods(&mut self, guid: ItemGuid, position: Position, slot: EnchantSlot, apply: bool) {
        let Some(item) = self.store.get(guid) else {
            return;
        };
        if item.is_broken() {
            return;
        }
        Applier::new(&*self.catalog, &self.profile, &self.config, self.effective_level)
            .apply_enchantment(&mut self.stats, &self.store, item, position, slot, apply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EnchantEffect, EnchantmentDef};
    use crate::planner::Anchor;
    use crate::stats::{ItemModKind, ModLayer, UnitMod};
    use crate::test_support::*;

    const AGILITY_OIL: EnchantmentId = 900;

    fn enchanted_player() -> Player {
        let catalog = catalog().with_enchantment(EnchantmentDef::new(
            AGILITY_OIL,
            vec![EnchantEffect::Stat {
                kind: ItemModKind::Agility,
                amount: 5,
            }],
        ));
        player_with(catalog, profile())
    }

    fn stamina(player: &Player) -> i64 {
        player.stats().unit_mod(UnitMod::Stamina, ModLayer::BaseFlat)
    }

    #[test]
    fn test_broken_item_loses_and_regains_stats() {
        let mut player = player();
        let helm = player.equip_new_item(None, HELM).unwrap();
        assert_eq!(stamina(&player), 10);

        player.set_durability(helm, 0).unwrap();
        assert!(player.store().get(helm).unwrap().is_broken());
        assert_eq!(stamina(&player), 0);
        assert_eq!(player.stats().unit_mod(UnitMod::Armor, ModLayer::BaseFlat), 0);

        player.set_durability(helm, 20).unwrap();
        assert_eq!(stamina(&player), 10);
        assert!(player.events().pending().contains(&InventoryEvent::DurabilityChanged { item: helm, durability: 20 }));
    }

    #[test]
    fn test_durability_loss_rounds_up_to_one_point() {
        let mut player = player();
        let helm = player.equip_new_item(None, HELM).unwrap();
        player.durability_loss(helm, 1).unwrap();
        assert_eq!(player.store().get(helm).unwrap().durability, 49);
        player.durability_loss(helm, 2_000).unwrap();
        assert_eq!(player.store().get(helm).unwrap().durability, 39);

        player.profile_mut().prevent_durability_loss = true;
        player.durability_loss_all(BASIS_POINTS, true).unwrap();
        assert_eq!(player.store().get(helm).unwrap().durability, 39);
    }

    #[test]
    fn test_repair_all_is_all_or_nothing() {
        let mut player = player();
        let worn = player.equip_new_item(None, HELM).unwrap();
        let carried = player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0];
        player.set_durability(worn, 0).unwrap();
        player.set_durability(carried, 40).unwrap();
        // 50 + 10 points at 2 copper each.
        player.give_money(Money::from_copper(119)).unwrap();
        assert_eq!(player.repair_all(BASIS_POINTS), Err(InventoryError::NotEnoughMoney));
        assert_eq!(player.store().get(worn).unwrap().durability, 0);
        assert_eq!(player.wallet().money(), Money::from_copper(119));

        player.give_money(Money::from_copper(1)).unwrap();
        assert_eq!(player.repair_all(BASIS_POINTS), Ok(Money::from_copper(120)));
        assert_eq!(player.store().get(worn).unwrap().durability, 50);
        assert_eq!(player.store().get(carried).unwrap().durability, 50);
        assert_eq!(stamina(&player), 10);
        assert!(player.wallet().money().is_zero());
    }

    #[test]
    fn test_repair_item_with_discount() {
        let mut player = player();
        let helm = player.equip_new_item(None, HELM).unwrap();
        player.set_durability(helm, 0).unwrap();
        player.give_money(Money::from_copper(1_000)).unwrap();
        assert_eq!(player.repair_item(helm, 9_000), Ok(Money::from_copper(90)));
        assert_eq!(player.repair_item(helm, 9_000), Ok(Money::ZERO));
    }

    #[test]
    fn test_temporary_enchantment_expires() {
        let mut player = enchanted_player();
        let sword = player.equip_new_item(None, SWORD).unwrap();
        player.apply_temporary_enchantment(sword, AGILITY_OIL, 1_000, 0).unwrap();
        let agility = |p: &Player| p.stats().unit_mod(UnitMod::Agility, ModLayer::BaseFlat);
        assert_eq!(agility(&player), 5);

        player.update_enchant_time(600).unwrap();
        assert_eq!(
            player.store().get(sword).unwrap().enchantment(EnchantSlot::Temporary).unwrap().duration_ms,
            400
        );
        player.update_enchant_time(400).unwrap();
        assert!(player.store().get(sword).unwrap().enchantment(EnchantSlot::Temporary).is_none());
        assert_eq!(agility(&player), 0);
    }

    #[test]
    fn test_effective_level_round_trip() {
        let mut player = player();
        player.equip_new_item(None, HELM).unwrap();
        player.equip_new_item(None, GREATSWORD).unwrap();
        let at_sixty = player.stats().clone();

        player.set_effective_level(20);
        assert_eq!(player.effective_level(), 20);
        player.set_effective_level(60);
        assert_eq!(player.stats(), &at_sixty);

        player.destroy_item_count(HELM, 1, false).unwrap();
        player.destroy_item_count(GREATSWORD, 1, false).unwrap();
        assert_eq!(player.stats().unit_mod(UnitMod::Strength, ModLayer::BaseFlat), 0);
        assert_eq!(stamina(&player), 0);
    }
}
