//! # Equip Rules
//!
//! Equipment-slot resolution and the gates in front of it. These extend
//! [`Planner`] and are just as pure: they read the store and the character
//! profile and return the destination, or the first failing rule.
//!
//! ## Check order
//!
//! ```text
//! loot / binding → ceiling → unit state → combat → slot → usability
//!   → occupied → unique → off hand → two hand
//! ```

use gearhold_shared::{EquipSlot, ItemId, Position};

use crate::catalog::Catalog;
use crate::character::UnitState;
use crate::error::{InventoryError, InventoryResult};
use crate::item::Item;
use crate::planner::{Anchor, Planner, Subject};
use crate::template::{
    BagKind, ItemClass, ItemFlags, ItemTemplate, InventoryType, WEAPON_SUBCLASS_POLEARM,
};

/// Slot pairs whose other half is ignored by the unique check during swaps.
const fn paired_slot(slot: EquipSlot) -> Option<EquipSlot> {
    match slot {
        EquipSlot::MainHand => Some(EquipSlot::OffHand),
        EquipSlot::OffHand => Some(EquipSlot::MainHand),
        EquipSlot::Finger1 => Some(EquipSlot::Finger2),
        EquipSlot::Finger2 => Some(EquipSlot::Finger1),
        EquipSlot::Trinket1 => Some(EquipSlot::Trinket2),
        EquipSlot::Trinket2 => Some(EquipSlot::Trinket1),
        _ => None,
    }
}

const OFF_HAND: Position = Position::Equipment(EquipSlot::OffHand);
const MAIN_HAND: Position = Position::Equipment(EquipSlot::MainHand);

impl Planner<'_> {
    /// Resolves where an existing item would be equipped.
    ///
    /// `slot` pins the destination; `None` takes the first free candidate,
    /// or with `swap` the first occupied one.
    ///
    /// # Errors
    ///
    /// The first failing rule. `ItemNotFound` (`CantSwap` when swapping) if
    /// the template is missing.
    pub fn can_equip(&self, slot: Option<Position>, item: &Item, swap: bool) -> InventoryResult<Position> {
        let template = self
            .template(item.entry)
            .ok_or(if swap { InventoryError::CantSwap } else { InventoryError::ItemNotFound })?;
        if item.loot_generated {
            return Err(InventoryError::LootGone);
        }
        if item.is_bound_not_with(self.profile.guid) {
            return Err(InventoryError::NotOwner);
        }
        self.can_take_more_similar(item.entry, item.count, Some(item))?;
        self.equip_checks(
            slot,
            Subject {
                template,
                item: Some(item),
            },
            swap,
        )
    }

    /// Resolves where a not yet created item of `entry` would be equipped.
    ///
    /// # Errors
    ///
    /// As [`Planner::can_equip`].
    pub fn can_equip_new(&self, slot: Option<Position>, entry: ItemId, swap: bool) -> InventoryResult<Position> {
        let template = self.template(entry).ok_or(InventoryError::ItemNotFound)?;
        self.can_take_more_similar(entry, 1, None)?;
        self.equip_checks(slot, Subject { template, item: None }, swap)
    }

    fn equip_checks(&self, slot: Option<Position>, subject: Subject<'_>, swap: bool) -> InventoryResult<Position> {
        let template = subject.template;
        let profile = self.profile;

        if profile.state.has(UnitState::STUNNED) {
            return Err(InventoryError::GenericStunned);
        }
        if profile.state.has(UnitState::CHARMED) {
            return Err(InventoryError::CantDoThatRightNow);
        }
        self.check_combat_state(template)?;
        let is_weapon_like = template.class == ItemClass::Weapon || template.inventory_type == InventoryType::Relic;
        if profile.in_combat() && is_weapon_like && profile.weapon_change_timer_ms != 0 {
            return Err(InventoryError::ClientLockedOut);
        }
        if profile.state.has(UnitState::CASTING) {
            return Err(InventoryError::ClientLockedOut);
        }

        let destination = self
            .find_equip_slot(template, slot, swap)
            .ok_or(InventoryError::NotEquippable)?;
        match subject.item {
            Some(item) => self.can_use_item(item)?,
            None => {
                if !profile.is_alive() {
                    return Err(InventoryError::PlayerDead);
                }
                self.can_use_template(template)?;
            }
        }
        if !swap && self.store.item_at(destination).is_some() {
            return Err(InventoryError::NoSlotAvailable);
        }

        // When two equipped items trade places the unique check skips the
        // item being moved, not the destination.
        let mut ignore = destination;
        if let Some(pair) = destination.equip_slot().and_then(paired_slot) {
            let pair = Position::Equipment(pair);
            let moving_from_pair = subject
                .item
                .is_some_and(|item| self.store.guid_at(pair) == Some(item.guid));
            if moving_from_pair {
                ignore = pair;
            }
        }
        let gems = subject.item.map_or([None; 3], |item| item.gems);
        self.can_equip_unique(template, &gems, swap.then_some(ignore))?;

        if destination == OFF_HAND {
            self.check_off_hand(template)?;
        }
        if template.is_two_handed() {
            self.check_two_hand(destination, swap)?;
        }
        Ok(destination)
    }

    fn check_combat_state(&self, template: &ItemTemplate) -> InventoryResult<()> {
        if template.can_change_equip_state_in_combat() {
            return Ok(());
        }
        if self.profile.in_combat() {
            return Err(InventoryError::NotInCombat);
        }
        if self.profile.state.has(UnitState::ARENA_MATCH) {
            return Err(InventoryError::NotDuringArenaMatch);
        }
        Ok(())
    }

    fn check_off_hand(&self, template: &ItemTemplate) -> InventoryResult<()> {
        let profile = self.profile;
        match template.inventory_type {
            InventoryType::Weapon if template.subclass == WEAPON_SUBCLASS_POLEARM => {
                return Err(InventoryError::TwoHandSkillNotFound);
            }
            InventoryType::Weapon | InventoryType::WeaponOffHand => {
                if !profile.can_dual_wield && !template.flags.has(ItemFlags::ALWAYS_ALLOW_DUAL_WIELD) {
                    return Err(InventoryError::TwoHandSkillNotFound);
                }
            }
            InventoryType::TwoHandWeapon => {
                if !profile.can_dual_wield || !profile.can_titan_grip {
                    return Err(InventoryError::TwoHandSkillNotFound);
                }
            }
            _ => {}
        }
        if self.is_two_hand_used() {
            return Err(InventoryError::Equipped2Handed);
        }
        Ok(())
    }

    /// A two-hander without titan grip needs the off hand to be removable
    /// and to have somewhere to go.
    fn check_two_hand(&self, destination: Position, swap: bool) -> InventoryResult<()> {
        if destination == OFF_HAND {
            if !self.profile.can_titan_grip {
                return Err(InventoryError::NotEquippable);
            }
        } else if destination != MAIN_HAND {
            return Err(InventoryError::NotEquippable);
        }
        if self.profile.can_titan_grip {
            return Ok(());
        }
        let Some(off_hand) = self.store.item_at(OFF_HAND) else {
            return Ok(());
        };
        let blocked = self.can_unequip(OFF_HAND, false).is_err()
            || self.can_store(Anchor::Any, off_hand, false).is_err();
        if blocked {
            return Err(if swap { InventoryError::CantSwap } else { InventoryError::InvFull });
        }
        Ok(())
    }

    /// True if a two-hander in the main hand also blocks the off hand.
    #[must_use]
    pub fn is_two_hand_used(&self) -> bool {
        !self.profile.can_titan_grip
            && self
                .store
                .item_at(MAIN_HAND)
                .and_then(|item| self.template(item.entry))
                .is_some_and(ItemTemplate::is_two_handed)
    }

    /// Equipment positions an inventory type may occupy, in preference order.
    #[must_use]
    pub fn candidate_slots(&self, template: &ItemTemplate) -> Vec<Position> {
        use EquipSlot as S;
        let profile = self.profile;
        let gear = |slots: &[EquipSlot]| -> Vec<Position> { slots.iter().copied().map(Position::Equipment).collect() };
        match template.inventory_type {
            InventoryType::NonEquip | InventoryType::Ammo => Vec::new(),
            InventoryType::Head => gear(&[S::Head]),
            InventoryType::Neck => gear(&[S::Neck]),
            InventoryType::Shoulders => gear(&[S::Shoulders]),
            InventoryType::Body => gear(&[S::Body]),
            InventoryType::Chest | InventoryType::Robe => gear(&[S::Chest]),
            InventoryType::Waist => gear(&[S::Waist]),
            InventoryType::Legs => gear(&[S::Legs]),
            InventoryType::Feet => gear(&[S::Feet]),
            InventoryType::Wrists => gear(&[S::Wrists]),
            InventoryType::Hands => gear(&[S::Hands]),
            InventoryType::Finger => gear(&[S::Finger1, S::Finger2]),
            InventoryType::Trinket => gear(&[S::Trinket1, S::Trinket2]),
            InventoryType::Cloak => gear(&[S::Back]),
            InventoryType::Weapon if profile.can_dual_wield => gear(&[S::MainHand, S::OffHand]),
            InventoryType::Weapon | InventoryType::WeaponMainHand => gear(&[S::MainHand]),
            InventoryType::TwoHandWeapon if profile.can_dual_wield && profile.can_titan_grip => {
                gear(&[S::MainHand, S::OffHand])
            }
            InventoryType::TwoHandWeapon => gear(&[S::MainHand]),
            InventoryType::Shield | InventoryType::WeaponOffHand | InventoryType::Holdable => gear(&[S::OffHand]),
            InventoryType::Ranged | InventoryType::RangedRight | InventoryType::Thrown | InventoryType::Relic => {
                gear(&[S::Ranged])
            }
            InventoryType::Tabard => gear(&[S::Tabard]),
            InventoryType::Bag | InventoryType::Quiver => match template.container.map(|c| c.kind) {
                Some(BagKind::Reagent) => vec![Position::ReagentBagSlot],
                _ => (0..4).map(Position::BagSlot).collect(),
            },
            InventoryType::ProfessionTool => vec![Position::ProfessionGear(0), Position::ProfessionGear(3)],
            InventoryType::ProfessionGear => [1, 2, 4, 5].into_iter().map(Position::ProfessionGear).collect(),
        }
    }

    /// Picks the equipment position for `template`.
    ///
    /// A requested `slot` is returned if it is a candidate and free (or
    /// `swap`). Otherwise the first free candidate wins, then with `swap` the
    /// first candidate at all. An off hand kept busy by a two-hander does
    /// not count as free.
    #[must_use]
    pub fn find_equip_slot(&self, template: &ItemTemplate, slot: Option<Position>, swap: bool) -> Option<Position> {
        let candidates = self.candidate_slots(template);
        if let Some(slot) = slot {
            let usable = swap || self.store.item_at(slot).is_none();
            return (usable && candidates.contains(&slot)).then_some(slot);
        }
        let free = candidates.iter().copied().find(|&position| {
            self.store.item_at(position).is_none() && (position != OFF_HAND || !self.is_two_hand_used())
        });
        free.or_else(|| candidates.first().copied().filter(|_| swap))
    }

    /// Checks that the character may use this particular item.
    ///
    /// # Errors
    ///
    /// `PlayerDead`, `NotEquippable` for broken items, the template gates,
    /// `ProficiencyNeeded` and `CantEquipReputation`.
    pub fn can_use_item(&self, item: &Item) -> InventoryResult<()> {
        if !self.profile.is_alive() {
            return Err(InventoryError::PlayerDead);
        }
        let template = self.template(item.entry).ok_or(InventoryError::ItemNotFound)?;
        if item.is_broken() {
            return Err(InventoryError::NotEquippable);
        }
        self.can_use_template(template)?;
        if let Some(skill) = template.proficiency {
            if self.profile.skill(skill) == 0 {
                return Err(InventoryError::ProficiencyNeeded);
            }
        }
        if let Some(requirement) = template.required_reputation {
            if self.profile.reputation(requirement.faction) < requirement.rank {
                return Err(InventoryError::CantEquipReputation);
            }
        }
        Ok(())
    }

    /// Template gates shared by equipping and group loot.
    ///
    /// # Errors
    ///
    /// `CantEquipEver` for faction, class or race, `ProficiencyNeeded` and
    /// `CantEquipSkill` for skills, `CantEquipLevel` and `CantEquipRank`.
    pub fn can_use_template(&self, template: &ItemTemplate) -> InventoryResult<()> {
        use crate::character::Team;
        let profile = self.profile;
        if template.flags.has(ItemFlags::HORDE_ONLY) && profile.team != Team::Horde {
            return Err(InventoryError::CantEquipEver);
        }
        if template.flags.has(ItemFlags::ALLIANCE_ONLY) && profile.team != Team::Alliance {
            return Err(InventoryError::CantEquipEver);
        }
        let class_ok = template.allowable_class == 0 || template.allowable_class & profile.class_mask() != 0;
        let race_ok = template.allowable_race == 0 || template.allowable_race & profile.race_mask() != 0;
        if !class_ok || !race_ok {
            return Err(InventoryError::CantEquipEver);
        }
        if let Some(requirement) = template.required_skill {
            match profile.skill(requirement.skill) {
                0 => return Err(InventoryError::ProficiencyNeeded),
                rank if rank < requirement.rank => return Err(InventoryError::CantEquipSkill),
                _ => {}
            }
        }
        if template.required_spell.is_some_and(|spell| !profile.knows_spell(spell)) {
            return Err(InventoryError::ProficiencyNeeded);
        }
        if profile.level < template.required_level {
            return Err(InventoryError::CantEquipLevel);
        }
        if profile.honor_rank < template.required_honor_rank {
            return Err(InventoryError::CantEquipRank);
        }
        Ok(())
    }

    /// Checks that the item at `position` may be taken off.
    ///
    /// Positions other than equipment and bag slots always pass, as do
    /// empty ones.
    ///
    /// # Errors
    ///
    /// `LootGone`, `CantDoThatRightNow` while charmed, the combat and arena
    /// gates, and `DestroyNonemptyBag` for a full bag unless swapping.
    pub fn can_unequip(&self, position: Position, swap: bool) -> InventoryResult<()> {
        if !position.is_equipment() && !position.is_bag_slot() {
            return Ok(());
        }
        let Some(item) = self.store.item_at(position) else {
            return Ok(());
        };
        let template = self.template(item.entry).ok_or(InventoryError::ItemNotFound)?;
        if item.loot_generated {
            return Err(InventoryError::LootGone);
        }
        if self.profile.state.has(UnitState::CHARMED) {
            return Err(InventoryError::CantDoThatRightNow);
        }
        self.check_combat_state(template)?;
        if !swap && item.is_not_empty_bag() {
            return Err(InventoryError::DestroyNonemptyBag);
        }
        Ok(())
    }

    /// Unique-equipped and limit-category equip checks for an item and its gems.
    ///
    /// `except` is left out of the equipped counts.
    ///
    /// # Errors
    ///
    /// `ItemUniqueEquippable`, `ItemMaxLimitCategoryEquippedExceeded`, or
    /// `NotEquippable` for an unknown category.
    pub fn can_equip_unique(
        &self,
        template: &ItemTemplate,
        gems: &[Option<ItemId>],
        except: Option<Position>,
    ) -> InventoryResult<()> {
        self.check_unique(template, except, 1)?;
        for gem in gems.iter().flatten() {
            let Some(gem_template) = self.template(*gem) else {
                continue;
            };
            let copies = gems.iter().flatten().filter(|g| *g == gem).count();
            self.check_unique(gem_template, except, u32::try_from(copies).unwrap_or(u32::MAX))?;
        }
        Ok(())
    }

    fn check_unique(&self, template: &ItemTemplate, except: Option<Position>, adding: u32) -> InventoryResult<()> {
        if template.flags.has(ItemFlags::UNIQUE_EQUIPPABLE) && self.equipped_with_id(template.id, except) > 0 {
            return Err(InventoryError::ItemUniqueEquippable);
        }
        let Some(category_id) = template.limit_category else {
            return Ok(());
        };
        let Some(category) = self.catalog.limit_category(category_id) else {
            tracing::error!(entry = template.id, category = category_id, "unknown limit category");
            return Err(InventoryError::NotEquippable);
        };
        let cap = u32::from(category.quantity);
        if adding > cap || self.equipped_in_category(category_id, except) + adding > cap {
            return Err(InventoryError::ItemMaxLimitCategoryEquippedExceeded);
        }
        Ok(())
    }

    fn equipped_gems(&self, except: Option<Position>) -> impl Iterator<Item = ItemId> + '_ {
        EquipSlot::ALL
            .into_iter()
            .map(Position::Equipment)
            .filter(move |position| Some(*position) != except)
            .filter_map(|position| self.store.item_at(position))
            .flat_map(|item| item.gems.into_iter().flatten())
    }

    fn equipped_with_id(&self, entry: ItemId, except: Option<Position>) -> u32 {
        let gems = self.equipped_gems(except).filter(|gem| *gem == entry).count();
        self.store.count_equipped(entry, except) + u32::try_from(gems).unwrap_or(u32::MAX)
    }

    fn equipped_in_category(&self, category: u32, except: Option<Position>) -> u32 {
        let catalog: &dyn Catalog = self.catalog;
        let gems = self
            .equipped_gems(except)
            .filter(|gem| catalog.template(*gem).is_some_and(|t| t.limit_category == Some(category)))
            .count();
        self.store.count_equipped_limit_category(catalog, category, except) + u32::try_from(gems).unwrap_or(u32::MAX)
    }
}
