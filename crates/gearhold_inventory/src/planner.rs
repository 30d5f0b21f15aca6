//! # Placement Planner
//!
//! Pure functions that decide where units of an item may go. Nothing here
//! mutates the store; a plan is a list of `(position, count)` entries the
//! caller executes afterwards.
//!
//! ## Search
//!
//! A [`PlacementCursor`] carries the units still to place and the entries
//! found so far. It is handed through a fixed sequence of region scans, each
//! of which only consumes what is left:
//!
//! ```text
//! specific slot → specific container (merge, free)
//!   → merge: child slots, backpack, family bags, reagent bag, ordinary bags
//!   → free:  family bags, child slots, reagent bag, backpack, ordinary bags
//! ```
//!
//! Scans skip positions already in the plan and treat the item being moved
//! as absent from its own slot. The order is a fixed list so the same state
//! and request always give the same plan.

use gearhold_shared::constants::{
    ACCOUNT_BANK_TAB_SLOTS, BANK_SLOT_BAG_END, BANK_SLOT_BAG_START, BANK_SLOT_ITEM_END,
    BANK_SLOT_ITEM_START, CHILD_EQUIPMENT_SLOT_END, CHILD_EQUIPMENT_SLOT_START,
    INVENTORY_SLOT_BAG_0, INVENTORY_SLOT_BAG_END, INVENTORY_SLOT_BAG_START, INVENTORY_SLOT_ITEM_END,
    INVENTORY_SLOT_ITEM_START, REAGENT_BAG_SLOT, REAGENT_BANK_SLOT_END, REAGENT_BANK_SLOT_START,
};
use gearhold_shared::{ItemGuid, ItemId, Position, NULL_BAG, NULL_SLOT};
use std::collections::BTreeMap;

use crate::catalog::{Catalog, LimitMode};
use crate::character::CharacterProfile;
use crate::error::{InventoryError, InventoryResult, StoreRejection};
use crate::item::Item;
use crate::store::InventoryStore;
use crate::template::{ContainerSpec, ItemFlags, ItemTemplate};

/// One entry of a destination plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Destination.
    pub position: Position,
    /// Units placed there.
    pub count: u32,
}

/// Outcome of a placement search.
pub type PlanResult = Result<Vec<Placement>, StoreRejection>;

/// Where the caller wants the item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Anywhere.
    #[default]
    Any,
    /// Inside one container: raw id 0 for the backpack, else a bag slot id.
    Container(u8),
    /// One exact slot, then its container, then anywhere.
    Slot(Position),
}

impl Anchor {
    /// Builds an anchor from a raw client pair with wildcard sentinels.
    ///
    /// # Errors
    ///
    /// [`InventoryError::WrongBagType`] for a pair that names no slot.
    pub fn from_raw(bag: u8, slot: u8) -> InventoryResult<Self> {
        if bag == NULL_BAG {
            return Ok(Self::Any);
        }
        if slot == NULL_SLOT {
            return Ok(Self::Container(bag));
        }
        Position::from_raw(bag, slot)
            .map(Self::Slot)
            .ok_or(InventoryError::WrongBagType)
    }

    fn container(self) -> Option<u8> {
        match self {
            Self::Any => None,
            Self::Container(container) => Some(container),
            Self::Slot(position) => Some(position.to_raw().0),
        }
    }
}

/// Which bank a deposit targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BankTarget {
    /// Character bank and bank bags.
    #[default]
    Character,
    /// Reagent bank.
    Reagent,
    /// Account bank tabs.
    Account,
}

/// Accumulator threaded through the region scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCursor {
    remaining: u32,
    plan: Vec<Placement>,
}

impl PlacementCursor {
    /// Starts a search for `count` units.
    #[must_use]
    pub fn new(count: u32) -> Self {
        Self {
            remaining: count,
            plan: Vec::new(),
        }
    }

    /// Units without a destination yet.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// True once every unit has a destination.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Entries found so far.
    #[must_use]
    pub fn plan(&self) -> &[Placement] {
        &self.plan
    }

    /// True if `position` already has an entry.
    #[must_use]
    pub fn has(&self, position: Position) -> bool {
        self.plan.iter().any(|p| p.position == position)
    }

    /// Places up to `space` units at `position`.
    pub fn place(&mut self, position: Position, space: u32) {
        let count = space.min(self.remaining);
        if count == 0 || self.has(position) {
            return;
        }
        self.plan.push(Placement { position, count });
        self.remaining -= count;
    }

    fn finish(self, ceiling: Option<(InventoryError, u32)>) -> PlanResult {
        match ceiling {
            None => Ok(self.plan),
            Some((error, shortfall)) => Err(StoreRejection {
                error,
                shortfall,
                partial: self.plan,
            }),
        }
    }

    fn reject(self, error: InventoryError, ceiling: Option<(InventoryError, u32)>) -> StoreRejection {
        StoreRejection {
            error,
            shortfall: self.remaining + ceiling.map_or(0, |(_, n)| n),
            partial: self.plan,
        }
    }
}

/// The item being placed: a template, plus the instance when it already exists.
#[derive(Clone, Copy)]
pub(crate) struct Subject<'a> {
    pub(crate) template: &'a ItemTemplate,
    pub(crate) item: Option<&'a Item>,
}

impl Subject<'_> {
    fn is_source(&self, other: &Item) -> bool {
        self.item.is_some_and(|item| item.guid == other.guid)
    }

    fn is_not_empty_bag(&self) -> bool {
        self.item.is_some_and(Item::is_not_empty_bag)
    }

    fn is_child(&self) -> bool {
        self.item.is_some_and(|item| item.parent.is_some())
    }
}

fn backpack() -> impl Iterator<Item = Position> {
    (0..INVENTORY_SLOT_ITEM_END - INVENTORY_SLOT_ITEM_START).map(Position::Backpack)
}

fn child_slots() -> impl Iterator<Item = Position> {
    (0..CHILD_EQUIPMENT_SLOT_END - CHILD_EQUIPMENT_SLOT_START).map(Position::ChildEquipment)
}

fn bank_slots() -> impl Iterator<Item = Position> {
    (0..BANK_SLOT_ITEM_END - BANK_SLOT_ITEM_START).map(Position::Bank)
}

fn reagent_bank_slots() -> impl Iterator<Item = Position> {
    (0..REAGENT_BANK_SLOT_END - REAGENT_BANK_SLOT_START).map(Position::ReagentBank)
}

fn account_slots(tabs: u8) -> impl Iterator<Item = Position> {
    (0..tabs).flat_map(|tab| (0..ACCOUNT_BANK_TAB_SLOTS).map(move |index| Position::AccountBank { tab, index }))
}

fn ordinary_bags() -> std::ops::Range<u8> {
    INVENTORY_SLOT_BAG_START..INVENTORY_SLOT_BAG_END
}

fn bank_bags() -> std::ops::Range<u8> {
    BANK_SLOT_BAG_START..BANK_SLOT_BAG_END
}

/// Correction applied to a stored count during batch checks.
#[derive(Clone, Copy, Debug, Default)]
struct HeldAdjust {
    arriving: u32,
    leaving: u32,
}

impl HeldAdjust {
    fn apply(self, held: u32) -> u32 {
        (held + self.arriving).saturating_sub(self.leaving)
    }
}

/// Read-only view used to answer placement questions.
#[derive(Clone, Copy)]
pub struct Planner<'a> {
    pub(crate) catalog: &'a dyn Catalog,
    pub(crate) store: &'a InventoryStore,
    pub(crate) profile: &'a CharacterProfile,
}

impl<'a> Planner<'a> {
    /// Creates a planner over one character.
    #[must_use]
    pub fn new(catalog: &'a dyn Catalog, store: &'a InventoryStore, profile: &'a CharacterProfile) -> Self {
        Self {
            catalog,
            store,
            profile,
        }
    }

    pub(crate) fn template(&self, entry: ItemId) -> Option<&'a ItemTemplate> {
        self.catalog.template(entry)
    }

    /// Checks the per-template and limit-category ownership ceilings.
    ///
    /// On failure the rejection's shortfall is the number of units over the
    /// ceiling. The bank counts; `item` itself does not.
    ///
    /// # Errors
    ///
    /// `ItemMaxCount` for a missing template or the template cap,
    /// `LootGone` while looted, `ItemMaxLimitCategoryCountExceeded` for a
    /// category cap and `NotEquippable` for an unknown category.
    pub fn can_take_more_similar(&self, entry: ItemId, count: u32, item: Option<&Item>) -> Result<(), StoreRejection> {
        let Some(template) = self.template(entry) else {
            return Err(StoreRejection::total(InventoryError::ItemMaxCount, count));
        };
        if item.is_some_and(|i| i.loot_generated) {
            return Err(StoreRejection::total(InventoryError::LootGone, count));
        }
        let skip = item.map(|i| i.guid);
        self.check_ceiling(template, count, skip, HeldAdjust::default(), HeldAdjust::default())
    }

    fn check_ceiling(
        &self,
        template: &ItemTemplate,
        count: u32,
        skip: Option<ItemGuid>,
        same: HeldAdjust,
        in_category: HeldAdjust,
    ) -> Result<(), StoreRejection> {
        if template.max_count > 0 {
            let held = same.apply(self.store.count_item(template.id, true, skip));
            if held + count > template.max_count {
                return Err(StoreRejection::total(
                    InventoryError::ItemMaxCount,
                    held + count - template.max_count,
                ));
            }
        }
        let Some(category_id) = template.limit_category else {
            return Ok(());
        };
        let Some(category) = self.catalog.limit_category(category_id) else {
            tracing::error!(entry = template.id, category = category_id, "unknown limit category");
            return Err(StoreRejection::total(InventoryError::NotEquippable, count));
        };
        if category.mode == LimitMode::Have {
            let held = in_category.apply(self.store.count_limit_category(self.catalog, category_id, skip));
            let cap = u32::from(category.quantity);
            if held + count > cap {
                return Err(StoreRejection::total(
                    InventoryError::ItemMaxLimitCategoryCountExceeded,
                    held + count - cap,
                ));
            }
        }
        Ok(())
    }

    /// Plans storage of an existing item.
    ///
    /// With `swap` an occupied target slot is treated as free.
    pub fn can_store(&self, anchor: Anchor, item: &Item, swap: bool) -> PlanResult {
        self.plan_store(anchor, item.entry, item.count, Some(item), swap)
    }

    /// Plans storage of `count` new units of `entry`. Zero units is
    /// `ItemNotFound`.
    pub fn can_store_new(&self, anchor: Anchor, entry: ItemId, count: u32) -> PlanResult {
        if count == 0 {
            return Err(StoreRejection::total(InventoryError::ItemNotFound, 0));
        }
        self.plan_store(anchor, entry, count, None, false)
    }

    fn plan_store(&self, anchor: Anchor, entry: ItemId, count: u32, item: Option<&Item>, swap: bool) -> PlanResult {
        let Some(template) = self.template(entry) else {
            let error = if swap { InventoryError::CantSwap } else { InventoryError::ItemNotFound };
            return Err(StoreRejection::total(error, count));
        };
        if let Some(item) = item {
            if item.is_bound_not_with(self.profile.guid) {
                return Err(StoreRejection::total(InventoryError::NotOwner, count));
            }
            if item.loot_generated {
                return Err(StoreRejection::total(InventoryError::LootGone, count));
            }
        }
        let ceiling = match self.can_take_more_similar(entry, count, item) {
            Ok(()) => None,
            Err(rejection) if rejection.shortfall >= count => {
                return Err(StoreRejection::total(rejection.error, count));
            }
            Err(rejection) => Some((rejection.error, rejection.shortfall)),
        };
        let subject = Subject { template, item };
        let mut cursor = PlacementCursor::new(count - ceiling.map_or(0, |(_, n)| n));
        let result = self.search_store(anchor, subject, &mut cursor, swap);
        tracing::debug!(entry, count, ?anchor, ?result, placed = cursor.plan.len(), "store plan");
        match result {
            Ok(()) => cursor.finish(ceiling),
            Err(error) => Err(cursor.reject(error, ceiling)),
        }
    }

    fn search_store(
        &self,
        anchor: Anchor,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        swap: bool,
    ) -> InventoryResult<()> {
        let template = subject.template;
        let stackable = template.stack_size() != 1;
        let family = !template.bag_family.is_empty();
        let reagent = template.is_crafting_reagent();

        if let Anchor::Slot(position) = anchor {
            self.in_specific_slot(position, subject, cursor, swap)?;
            if cursor.is_done() {
                return Ok(());
            }
        }
        if let Some(container) = anchor.container() {
            if stackable {
                self.in_container(container, subject, cursor, true)?;
                if cursor.is_done() {
                    return Ok(());
                }
            }
            self.in_container(container, subject, cursor, false)?;
            if cursor.is_done() {
                return Ok(());
            }
        }

        if stackable {
            self.in_slots(child_slots(), subject, cursor, true)?;
            self.in_slots(backpack(), subject, cursor, true)?;
            if cursor.is_done() {
                return Ok(());
            }
            if family && self.in_bags(ordinary_bags(), subject, cursor, true, false) {
                return Ok(());
            }
            if reagent && self.in_bags([REAGENT_BAG_SLOT], subject, cursor, true, false) {
                return Ok(());
            }
            if self.in_bags(ordinary_bags(), subject, cursor, true, true) {
                return Ok(());
            }
        }

        if family && self.in_bags(ordinary_bags(), subject, cursor, false, false) {
            return Ok(());
        }
        if subject.is_not_empty_bag() {
            return Err(InventoryError::BagInBag);
        }
        if subject.is_child() {
            self.in_slots(child_slots(), subject, cursor, false)?;
            if cursor.is_done() {
                return Ok(());
            }
        }
        if reagent && self.in_bags([REAGENT_BAG_SLOT], subject, cursor, false, false) {
            return Ok(());
        }
        self.in_slots(backpack(), subject, cursor, false)?;
        if cursor.is_done() {
            return Ok(());
        }
        if self.in_bags(ordinary_bags(), subject, cursor, false, true) {
            return Ok(());
        }
        Err(InventoryError::InvFull)
    }

    fn in_container(
        &self,
        container: u8,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        merge: bool,
    ) -> InventoryResult<()> {
        if container == INVENTORY_SLOT_BAG_0 {
            if merge {
                self.in_slots(child_slots(), subject, cursor, true)?;
            }
            return self.in_slots(backpack(), subject, cursor, merge);
        }
        self.in_either_bag(container, subject, cursor, merge)
    }

    fn in_bank_container(
        &self,
        container: u8,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        merge: bool,
    ) -> InventoryResult<()> {
        if container == INVENTORY_SLOT_BAG_0 {
            return self.in_slots(bank_slots(), subject, cursor, merge);
        }
        self.in_either_bag(container, subject, cursor, merge)
    }

    /// Tries a bag as specialized first, then as an ordinary bag.
    fn in_either_bag(
        &self,
        container: u8,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        merge: bool,
    ) -> InventoryResult<()> {
        match self.in_bag(container, subject, cursor, merge, false) {
            Ok(()) => Ok(()),
            Err(_) => self.in_bag(container, subject, cursor, merge, true),
        }
    }

    /// Scans several bags, ignoring the ones that reject the item. Returns
    /// true once the cursor is done.
    fn in_bags(
        &self,
        containers: impl IntoIterator<Item = u8>,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        merge: bool,
        non_specialized: bool,
    ) -> bool {
        for container in containers {
            if self.in_bag(container, subject, cursor, merge, non_specialized).is_ok() && cursor.is_done() {
                return true;
            }
        }
        cursor.is_done()
    }

    fn in_slots(
        &self,
        slots: impl Iterator<Item = Position>,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        merge: bool,
    ) -> InventoryResult<()> {
        if subject.is_not_empty_bag() {
            return Err(InventoryError::DestroyNonemptyBag);
        }
        for position in slots {
            self.try_slot(position, subject, cursor, merge);
            if cursor.is_done() {
                break;
            }
        }
        Ok(())
    }

    fn in_bag(
        &self,
        container: u8,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        merge: bool,
        non_specialized: bool,
    ) -> InventoryResult<()> {
        let Some(bag) = self.store.bag_at(container) else {
            return Err(InventoryError::WrongBagType);
        };
        if subject.is_source(bag) {
            return Err(InventoryError::WrongBagType);
        }
        if subject.is_not_empty_bag() {
            return Err(InventoryError::DestroyNonemptyBag);
        }
        let spec = self.container_spec(bag)?;
        if non_specialized == spec.is_specialized() || !spec.accepts(subject.template) {
            return Err(InventoryError::WrongBagType);
        }
        for index in (0..bag.contents().len()).filter_map(|i| u8::try_from(i).ok()) {
            self.try_slot(Position::Bag { container, index }, subject, cursor, merge);
            if cursor.is_done() {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn container_spec(&self, bag: &Item) -> InventoryResult<ContainerSpec> {
        self.template(bag.entry)
            .and_then(|t| t.container)
            .ok_or(InventoryError::WrongBagType)
    }

    /// Offers one slot to the cursor: free slots in the free pass, partial
    /// stacks of the same template in the merge pass.
    fn try_slot(&self, position: Position, subject: Subject<'_>, cursor: &mut PlacementCursor, merge: bool) {
        let occupant = self.store.item_at(position).filter(|o| !subject.is_source(o));
        if occupant.is_some() != merge {
            return;
        }
        let max = subject.template.stack_size();
        let space = match occupant {
            Some(other) if other.can_be_merged_partly_with(subject.template).is_ok() => max - other.count,
            Some(_) => return,
            None => max,
        };
        cursor.place(position, space);
    }

    fn in_specific_slot(
        &self,
        position: Position,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        swap: bool,
    ) -> InventoryResult<()> {
        if subject.is_not_empty_bag() && !position.is_bag_slot() {
            return Err(InventoryError::DestroyNonemptyBag);
        }
        if subject.item.is_some() {
            let child = subject.is_child();
            if child && !position.is_equipment() && !position.is_child_equipment() {
                return Err(InventoryError::WrongBagTypeChild);
            }
            if !child && position.is_child_equipment() {
                return Err(InventoryError::WrongBagTypeChild);
            }
        }
        let occupant = self.store.item_at(position).filter(|o| !subject.is_source(o));
        let max = subject.template.stack_size();
        let space = match occupant {
            Some(other) if !swap => {
                other.can_be_merged_partly_with(subject.template)?;
                max - other.count
            }
            _ => {
                self.check_slot_fits(position, subject.template)?;
                max
            }
        };
        cursor.place(position, space);
        Ok(())
    }

    /// Region rules for placing `template` into an empty `position`.
    fn check_slot_fits(&self, position: Position, template: &ItemTemplate) -> InventoryResult<()> {
        match position {
            Position::Buyback(_) => Err(InventoryError::WrongBagType),
            Position::Equipment(_) | Position::BagSlot(_) | Position::ReagentBagSlot | Position::ProfessionGear(_) => {
                Err(InventoryError::WrongSlot)
            }
            Position::ReagentBank(_) => {
                if self.store.reagent_bank_unlocked && template.is_crafting_reagent() {
                    Ok(())
                } else {
                    Err(InventoryError::WrongBagType)
                }
            }
            Position::Bag { container, index } => {
                let bag = self.store.bag_at(container).ok_or(InventoryError::WrongBagType)?;
                let spec = self.container_spec(bag)?;
                if index >= spec.slots || !spec.accepts(template) {
                    return Err(InventoryError::WrongBagType);
                }
                Ok(())
            }
            Position::AccountBank { tab, .. } => {
                if tab >= self.store.account_bank_tabs {
                    return Err(InventoryError::WrongBagType);
                }
                if template.flags.has(ItemFlags::NO_ACCOUNT_BANK) {
                    return Err(InventoryError::NotBankable);
                }
                Ok(())
            }
            Position::Backpack(_) | Position::Bank(_) | Position::BankBagSlot(_) | Position::ChildEquipment(_) => Ok(()),
        }
    }

    /// Plans a deposit of an existing item into a bank.
    pub fn can_bank(&self, target: BankTarget, anchor: Anchor, item: &Item, swap: bool) -> PlanResult {
        let count = item.count;
        if item.loot_generated {
            return Err(StoreRejection::total(InventoryError::LootGone, count));
        }
        if item.is_bound_not_with(self.profile.guid) {
            return Err(StoreRejection::total(InventoryError::NotOwner, count));
        }
        let Some(template) = self.template(item.entry) else {
            let error = if swap { InventoryError::CantSwap } else { InventoryError::ItemNotFound };
            return Err(StoreRejection::total(error, count));
        };
        if template.is_currency_token() {
            tracing::error!(guid = ?item.guid, entry = item.entry, "currency token moved toward the bank");
            return Err(StoreRejection::total(InventoryError::CantSwap, count));
        }
        let subject = Subject {
            template,
            item: Some(item),
        };
        let mut cursor = PlacementCursor::new(count);
        let result = match target {
            BankTarget::Character => self.search_bank(anchor, subject, &mut cursor, swap),
            BankTarget::Reagent => self.search_reagent_bank(anchor, subject, &mut cursor, swap),
            BankTarget::Account => self.search_account_bank(anchor, subject, &mut cursor, swap),
        };
        tracing::debug!(entry = item.entry, ?target, ?anchor, ?result, "bank plan");
        match result {
            Ok(()) => Ok(cursor.plan),
            Err(error) => Err(cursor.reject(error, None)),
        }
    }

    fn search_bank(
        &self,
        anchor: Anchor,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        swap: bool,
    ) -> InventoryResult<()> {
        let template = subject.template;
        let stackable = template.stack_size() != 1;
        let family = !template.bag_family.is_empty();

        if let Anchor::Slot(position) = anchor {
            if let Position::BankBagSlot(index) = position {
                let Some(bag) = subject.item.filter(|item| item.is_bag()) else {
                    return Err(InventoryError::WrongSlot);
                };
                if index >= self.store.bank_bag_slots {
                    return Err(InventoryError::NoBankSlot);
                }
                self.can_use_item(bag)?;
            }
            self.in_specific_slot(position, subject, cursor, swap)?;
            if cursor.is_done() {
                return Ok(());
            }
        }
        if let Some(container) = anchor.container() {
            if subject.is_not_empty_bag() {
                return Err(InventoryError::BagInBag);
            }
            if stackable {
                self.in_bank_container(container, subject, cursor, true)?;
                if cursor.is_done() {
                    return Ok(());
                }
            }
            self.in_bank_container(container, subject, cursor, false)?;
            if cursor.is_done() {
                return Ok(());
            }
        }

        if stackable {
            self.in_slots(bank_slots(), subject, cursor, true)?;
            if cursor.is_done() {
                return Ok(());
            }
            if family && self.in_bags(bank_bags(), subject, cursor, true, false) {
                return Ok(());
            }
            if self.in_bags(bank_bags(), subject, cursor, true, true) {
                return Ok(());
            }
        }
        if family && self.in_bags(bank_bags(), subject, cursor, false, false) {
            return Ok(());
        }
        self.in_slots(bank_slots(), subject, cursor, false)?;
        if cursor.is_done() {
            return Ok(());
        }
        if self.in_bags(bank_bags(), subject, cursor, false, true) {
            return Ok(());
        }
        Err(InventoryError::BankFull)
    }

    fn search_reagent_bank(
        &self,
        anchor: Anchor,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        swap: bool,
    ) -> InventoryResult<()> {
        if !self.store.reagent_bank_unlocked {
            return Err(InventoryError::NoBankSlot);
        }
        if !subject.template.is_crafting_reagent() {
            return Err(InventoryError::WrongBagType);
        }
        match anchor {
            Anchor::Slot(position @ Position::ReagentBank(_)) => {
                self.in_specific_slot(position, subject, cursor, swap)?;
                if cursor.is_done() {
                    return Ok(());
                }
            }
            Anchor::Slot(_) | Anchor::Container(_) => return Err(InventoryError::WrongSlot),
            Anchor::Any => {}
        }
        if subject.template.stack_size() != 1 {
            self.in_slots(reagent_bank_slots(), subject, cursor, true)?;
        }
        self.in_slots(reagent_bank_slots(), subject, cursor, false)?;
        if cursor.is_done() {
            Ok(())
        } else {
            Err(InventoryError::ReagentBankFull)
        }
    }

    fn search_account_bank(
        &self,
        anchor: Anchor,
        subject: Subject<'_>,
        cursor: &mut PlacementCursor,
        swap: bool,
    ) -> InventoryResult<()> {
        if subject.item.is_some_and(|i| i.bound) || subject.template.flags.has(ItemFlags::NO_ACCOUNT_BANK) {
            return Err(InventoryError::NotBankable);
        }
        match anchor {
            Anchor::Slot(position @ Position::AccountBank { .. }) => {
                self.in_specific_slot(position, subject, cursor, swap)?;
                if cursor.is_done() {
                    return Ok(());
                }
            }
            Anchor::Slot(_) | Anchor::Container(_) => return Err(InventoryError::WrongSlot),
            Anchor::Any => {}
        }
        let tabs = self.store.account_bank_tabs;
        if subject.template.stack_size() != 1 {
            self.in_slots(account_slots(tabs), subject, cursor, true)?;
        }
        self.in_slots(account_slots(tabs), subject, cursor, false)?;
        if cursor.is_done() {
            Ok(())
        } else {
            Err(InventoryError::BankFull)
        }
    }

    /// Checks that a batch of items, received together, all fit.
    ///
    /// Items are considered in order against simulated slot counts, so later
    /// items see where earlier ones went. `vacating` items are treated as
    /// already gone. Each item needs one whole destination: a partial stack
    /// with room for all of it, else a free slot.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`, `LootGone`, `NotOwner`, a ceiling error, or `BagFull`
    /// for the first item that does not fit.
    pub fn can_store_items(&self, items: &[&Item], vacating: &[ItemGuid]) -> InventoryResult<()> {
        let mut sim = SimulatedSlots::capture(self, vacating);
        let mut same_totals: BTreeMap<ItemId, u32> = BTreeMap::new();
        let mut category_totals: BTreeMap<u32, u32> = BTreeMap::new();

        for item in items {
            let template = self.template(item.entry).ok_or(InventoryError::ItemNotFound)?;
            if item.loot_generated {
                return Err(InventoryError::LootGone);
            }
            if item.is_bound_not_with(self.profile.guid) {
                return Err(InventoryError::NotOwner);
            }
            let leaving_same = self.vacating_count(vacating, |t| t.id == template.id);
            let leaving_category = template.limit_category.map_or(0, |category| {
                self.vacating_count(vacating, |t| t.limit_category == Some(category))
            });
            let earlier_same = same_totals.get(&template.id).copied().unwrap_or(0);
            let earlier_category = template
                .limit_category
                .and_then(|c| category_totals.get(&c).copied())
                .unwrap_or(0);
            self.check_ceiling(
                template,
                item.count,
                None,
                HeldAdjust {
                    arriving: earlier_same,
                    leaving: leaving_same,
                },
                HeldAdjust {
                    arriving: earlier_category,
                    leaving: leaving_category,
                },
            )
            .map_err(|rejection| rejection.error)?;
            *same_totals.entry(template.id).or_insert(0) += item.count;
            if let Some(category) = template.limit_category {
                *category_totals.entry(category).or_insert(0) += item.count;
            }

            if !sim.place(template, item.count) {
                tracing::debug!(entry = item.entry, "batch does not fit");
                return Err(InventoryError::BagFull);
            }
        }
        Ok(())
    }

    fn vacating_count(&self, vacating: &[ItemGuid], matches: impl Fn(&ItemTemplate) -> bool) -> u32 {
        vacating
            .iter()
            .filter_map(|guid| self.store.get(*guid))
            .filter(|item| self.template(item.entry).is_some_and(&matches))
            .map(|item| item.count)
            .sum()
    }
}

/// Simulated occupancy of the backpack and equipped bags for batch checks.
struct SimulatedSlots {
    backpack: Vec<Option<(ItemId, u32)>>,
    bags: Vec<(ContainerSpec, Vec<Option<(ItemId, u32)>>)>,
}

impl SimulatedSlots {
    fn capture(planner: &Planner<'_>, vacating: &[ItemGuid]) -> Self {
        let occupant = |position: Position| {
            planner
                .store
                .item_at(position)
                .filter(|item| !vacating.contains(&item.guid))
                .map(|item| (item.entry, if item.loot_generated { u32::MAX } else { item.count }))
        };
        let backpack = backpack().map(occupant).collect();
        let bags = ordinary_bags()
            .chain([REAGENT_BAG_SLOT])
            .filter_map(|container| {
                let bag = planner.store.bag_at(container)?;
                let spec = planner.container_spec(bag).ok()?;
                let slots = (0..bag.contents().len())
                    .filter_map(|i| u8::try_from(i).ok())
                    .map(|index| occupant(Position::Bag { container, index }))
                    .collect();
                Some((spec, slots))
            })
            .collect();
        Self { backpack, bags }
    }

    fn place(&mut self, template: &ItemTemplate, count: u32) -> bool {
        let max = template.stack_size();
        let fits = |slot: &Option<(ItemId, u32)>| {
            matches!(slot, Some((entry, held)) if *entry == template.id && held.saturating_add(count) <= max)
        };
        if max != 1 {
            if let Some(slot) = self.backpack.iter_mut().find(|s| fits(&**s)) {
                merge_into(slot, count);
                return true;
            }
            for (spec, slots) in &mut self.bags {
                if !spec.accepts(template) {
                    continue;
                }
                if let Some(slot) = slots.iter_mut().find(|s| fits(&**s)) {
                    merge_into(slot, count);
                    return true;
                }
            }
        }
        let new_stack = Some((template.id, count));
        if !template.bag_family.is_empty() || template.is_crafting_reagent() {
            for (spec, slots) in &mut self.bags {
                if spec.is_specialized() && spec.accepts(template) {
                    if let Some(slot) = slots.iter_mut().find(|s| s.is_none()) {
                        *slot = new_stack;
                        return true;
                    }
                }
            }
        }
        if let Some(slot) = self.backpack.iter_mut().find(|s| s.is_none()) {
            *slot = new_stack;
            return true;
        }
        for (spec, slots) in &mut self.bags {
            if spec.is_specialized() {
                continue;
            }
            if let Some(slot) = slots.iter_mut().find(|s| s.is_none()) {
                *slot = new_stack;
                return true;
            }
        }
        false
    }
}

fn merge_into(slot: &mut Option<(ItemId, u32)>, count: u32) {
    if let Some((_, held)) = slot {
        *held += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::player::Player;
    use crate::test_support::*;
    use gearhold_shared::CharacterGuid;

    const CAPPED: ItemId = 600;

    fn capped_player() -> Player {
        let catalog: StaticCatalog = catalog().with_template(
            ItemTemplate::new(CAPPED, "Unique Token")
                .with_max_stack(20)
                .with_max_count(10),
        );
        player_with(catalog, profile())
    }

    fn placed(position: Position, count: u32) -> Placement {
        Placement { position, count }
    }

    #[test]
    fn test_cursor_accumulates() {
        let mut cursor = PlacementCursor::new(5);
        cursor.place(Position::Backpack(0), 3);
        cursor.place(Position::Backpack(0), 3);
        assert_eq!(cursor.remaining(), 2);
        cursor.place(Position::Backpack(1), 10);
        assert!(cursor.is_done());
        assert!(cursor.has(Position::Backpack(1)));
        assert_eq!(
            cursor.plan(),
            &[placed(Position::Backpack(0), 3), placed(Position::Backpack(1), 2)]
        );
    }

    #[test]
    fn test_merge_before_free_slot() {
        let mut player = player();
        player.store_new_item(Anchor::Any, CLOTH, 15).unwrap();

        let plan = player.planner().can_store_new(Anchor::Any, CLOTH, 10).unwrap();
        assert_eq!(
            plan,
            vec![placed(Position::Backpack(0), 5), placed(Position::Backpack(1), 5)]
        );
        assert_eq!(player.planner().can_store_new(Anchor::Any, CLOTH, 10).unwrap(), plan);
    }

    #[test]
    fn test_family_bag_first() {
        let mut player = player();
        player.equip_new_item(Some(Position::BagSlot(0)), QUIVER).unwrap();

        let plan = player.planner().can_store_new(Anchor::Any, ARROW, 50).unwrap();
        assert_eq!(
            plan,
            vec![placed(
                Position::Bag {
                    container: INVENTORY_SLOT_BAG_START,
                    index: 0
                },
                50
            )]
        );

        let cloth = player.planner().can_store_new(Anchor::Any, CLOTH, 1).unwrap();
        assert_eq!(cloth, vec![placed(Position::Backpack(0), 1)]);
    }

    #[test]
    fn test_ceiling_returns_partial_plan() {
        let mut player = capped_player();
        player.store_new_item(Anchor::Any, CAPPED, 8).unwrap();

        let rejection = player.planner().can_store_new(Anchor::Any, CAPPED, 5).unwrap_err();
        assert_eq!(rejection.error, InventoryError::ItemMaxCount);
        assert_eq!(rejection.shortfall, 3);
        assert_eq!(rejection.partial, vec![placed(Position::Backpack(0), 2)]);

        let full = player.planner().can_store_new(Anchor::Any, CAPPED, 2).unwrap();
        assert_eq!(full, vec![placed(Position::Backpack(0), 2)]);
    }

    #[test]
    fn test_full_inventory_reports_shortfall() {
        let mut player = player();
        for _ in 0..16 {
            player.store_new_item(Anchor::Any, HELM, 1).unwrap();
        }
        let rejection = player.planner().can_store_new(Anchor::Any, SWORD, 1).unwrap_err();
        assert_eq!(rejection.error, InventoryError::InvFull);
        assert_eq!(rejection.shortfall, 1);
        assert!(rejection.partial.is_empty());
    }

    #[test]
    fn test_specific_slot() {
        let mut player = player();
        player.store_new_item(Anchor::Any, HELM, 1).unwrap();
        player.store_new_item(Anchor::Any, CLOTH, 15).unwrap();

        let taken = player
            .planner()
            .can_store_new(Anchor::Slot(Position::Backpack(0)), SWORD, 1)
            .unwrap_err();
        assert_eq!(taken.error, InventoryError::ItemCantStack);

        let plan = player
            .planner()
            .can_store_new(Anchor::Slot(Position::Backpack(1)), CLOTH, 10)
            .unwrap();
        assert_eq!(
            plan,
            vec![placed(Position::Backpack(1), 5), placed(Position::Backpack(2), 5)]
        );

        let plan = player
            .planner()
            .can_store_new(Anchor::Slot(Position::Backpack(5)), SWORD, 1)
            .unwrap();
        assert_eq!(plan, vec![placed(Position::Backpack(5), 1)]);
    }

    #[test]
    fn test_instance_gates() {
        let mut player = player();
        let guid = player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0];
        let mut item = player.store().get(guid).unwrap().clone();

        item.loot_generated = true;
        assert_eq!(
            player.planner().can_store(Anchor::Any, &item, false).unwrap_err().error,
            InventoryError::LootGone
        );

        item.loot_generated = false;
        item.bound = true;
        item.owner = CharacterGuid(99);
        assert_eq!(
            player.planner().can_store(Anchor::Any, &item, false).unwrap_err().error,
            InventoryError::NotOwner
        );

        assert_eq!(
            player.planner().can_store_new(Anchor::Any, 9_999, 1).unwrap_err().error,
            InventoryError::ItemNotFound
        );
    }

    #[test]
    fn test_batch_counts_earlier_items() {
        let mut player = capped_player();
        let held = player.store_new_item(Anchor::Any, CAPPED, 6).unwrap()[0];
        let owner = player.profile().guid;
        let template = player.planner().template(CAPPED).unwrap().clone();
        let first = Item::create(ItemGuid(900), &template, 3, owner);
        let second = Item::create(ItemGuid(901), &template, 3, owner);

        assert_eq!(player.planner().can_store_items(&[&first], &[]), Ok(()));
        assert_eq!(
            player.planner().can_store_items(&[&first, &second], &[]),
            Err(InventoryError::ItemMaxCount)
        );
        assert_eq!(player.planner().can_store_items(&[&first, &second], &[held]), Ok(()));
    }

    #[test]
    fn test_batch_uses_vacated_slots() {
        let mut player = player();
        let mut worn = Vec::new();
        for _ in 0..16 {
            worn.push(player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0]);
        }
        let owner = player.profile().guid;
        let template = player.planner().template(SWORD).unwrap().clone();
        let sword = Item::create(ItemGuid(900), &template, 1, owner);

        assert_eq!(player.planner().can_store_items(&[&sword], &[]), Err(InventoryError::BagFull));
        assert_eq!(player.planner().can_store_items(&[&sword], &worn[..1]), Ok(()));
    }

    #[test]
    fn test_from_raw_rejects_unknown_positions() {
        assert_eq!(
            Anchor::from_raw(NULL_BAG, NULL_SLOT),
            Ok(Anchor::Any)
        );
        assert_eq!(
            Anchor::from_raw(INVENTORY_SLOT_BAG_0, INVENTORY_SLOT_ITEM_START),
            Ok(Anchor::Slot(Position::Backpack(0)))
        );
        assert!(Anchor::from_raw(INVENTORY_SLOT_BAG_0, 250).is_err());
    }

    #[test]
    fn test_zero_units_are_rejected_up_front() {
        let player = player();
        assert_eq!(
            player.planner().can_store_new(Anchor::Any, CLOTH, 0),
            Err(StoreRejection::total(InventoryError::ItemNotFound, 0))
        );
    }

    #[test]
    fn test_reagent_bank_specific_slot() {
        let mut player = player();
        player.set_bank_access(0, true, 0);
        let herb = player.store_new_item(Anchor::Any, HERB, 5).unwrap()[0];
        let item = player.store().get(herb).unwrap().clone();
        let slot = Anchor::Slot(Position::ReagentBank(3));

        let plan = player.planner().can_bank(BankTarget::Reagent, slot, &item, false).unwrap();
        assert_eq!(plan, vec![placed(Position::ReagentBank(3), 5)]);

        let cloth = player.store_new_item(Anchor::Any, CLOTH, 1).unwrap()[0];
        let cloth = player.store().get(cloth).unwrap().clone();
        let rejection = player.planner().can_bank(BankTarget::Reagent, slot, &cloth, false).unwrap_err();
        assert_eq!(rejection.error, InventoryError::WrongBagType);

        let rejection = player
            .planner()
            .can_bank(BankTarget::Reagent, Anchor::Slot(Position::Bank(0)), &item, false)
            .unwrap_err();
        assert_eq!(rejection.error, InventoryError::WrongSlot);
    }
}
