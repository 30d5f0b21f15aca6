//! # Inventory Store
//!
//! Authoritative mapping between positions and items for one character.
//!
//! ## Invariants
//!
//! - Every placed item's `position` names the slot that holds it, and every
//!   occupied slot names an item whose `position` points back.
//! - Items inside a bag live in the bag's content vector, never in the
//!   top-level slot map.
//! - A buyback slot carries price and timestamp exactly when it holds an item.
//!
//! [`InventoryStore::verify_consistency`] checks all of them.
//!
//! The store does no validation of *whether* an item may go somewhere; that
//! is the planner's job. It only keeps the two directions of the mapping in
//! step.

use gearhold_shared::constants::BUYBACK_SLOT_COUNT;
use gearhold_shared::{CharacterGuid, EquipSlot, ItemGuid, ItemId, LimitCategoryId, Position};
use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::error::{InventoryError, InventoryResult};
use crate::item::{Item, ItemState};
use crate::money::Money;

/// Price and time of a buyback entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuybackEntry {
    /// Refund paid to buy the item back.
    pub price: Money,
    /// When the item was sold, in seconds.
    pub timestamp: u64,
}

/// Items and positions of one character.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    owner: CharacterGuid,
    items: BTreeMap<ItemGuid, Item>,
    slots: BTreeMap<Position, ItemGuid>,
    buyback: [Option<BuybackEntry>; BUYBACK_SLOT_COUNT],
    current_buyback_slot: u8,
    /// Purchased bank bag slots.
    pub bank_bag_slots: u8,
    /// Reagent bank has been unlocked.
    pub reagent_bank_unlocked: bool,
    /// Purchased account bank tabs.
    pub account_bank_tabs: u8,
}

impl InventoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(owner: CharacterGuid) -> Self {
        Self {
            owner,
            items: BTreeMap::new(),
            slots: BTreeMap::new(),
            buyback: [None; BUYBACK_SLOT_COUNT],
            current_buyback_slot: 0,
            bank_bag_slots: 0,
            reagent_bank_unlocked: false,
            account_bank_tabs: 0,
        }
    }

    /// Owning character.
    #[must_use]
    pub const fn owner(&self) -> CharacterGuid {
        self.owner
    }

    /// Item by guid.
    #[must_use]
    pub fn get(&self, guid: ItemGuid) -> Option<&Item> {
        self.items.get(&guid)
    }

    pub(crate) fn get_mut(&mut self, guid: ItemGuid) -> Option<&mut Item> {
        self.items.get_mut(&guid)
    }

    /// True if the store holds `guid`.
    #[must_use]
    pub fn contains(&self, guid: ItemGuid) -> bool {
        self.items.contains_key(&guid)
    }

    /// Number of items, buyback included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Guid of the item at `position`.
    #[must_use]
    pub fn guid_at(&self, position: Position) -> Option<ItemGuid> {
        match position {
            Position::Bag { container, index } => {
                self.bag_at(container)?.contents().get(usize::from(index)).copied().flatten()
            }
            other => self.slots.get(&other).copied(),
        }
    }

    /// Item at `position`.
    #[must_use]
    pub fn item_at(&self, position: Position) -> Option<&Item> {
        self.guid_at(position).and_then(|guid| self.items.get(&guid))
    }

    /// Bag sitting in the bag slot with raw id `container`.
    #[must_use]
    pub fn bag_at(&self, container: u8) -> Option<&Item> {
        let holder = Position::bag_holder(container)?;
        self.slots
            .get(&holder)
            .and_then(|guid| self.items.get(guid))
            .filter(|item| item.is_bag())
    }

    /// Item worn in an equipment slot.
    #[must_use]
    pub fn equipped(&self, slot: EquipSlot) -> Option<&Item> {
        self.item_at(Position::Equipment(slot))
    }

    /// Every placed item, in guid order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Occupied top-level slots in `[start, end)`, in position order.
    pub fn items_in_range(&self, start: Position, end: Position) -> impl Iterator<Item = (Position, &Item)> {
        self.slots
            .range(start..end)
            .filter_map(|(&pos, guid)| self.items.get(guid).map(|item| (pos, item)))
    }

    /// Every placed item with its position, in position order. Bag contents
    /// follow the top-level slots.
    pub fn iter_placed(&self) -> impl Iterator<Item = (Position, &Item)> {
        let top = self
            .slots
            .iter()
            .filter_map(|(&pos, guid)| self.items.get(guid).map(|item| (pos, item)));
        let nested = self.slots.values().filter_map(|guid| self.items.get(guid)).flat_map(|bag| {
            bag.contents()
                .iter()
                .flatten()
                .filter_map(|guid| self.items.get(guid))
                .filter_map(|item| item.position().map(|pos| (pos, item)))
        });
        top.chain(nested)
    }

    /// Units of `entry` carried, optionally including the bank.
    ///
    /// Buyback and the account bank never count. `skip`, and the contents
    /// of `skip` if it is a bag, are left out.
    #[must_use]
    pub fn count_item(&self, entry: ItemId, in_bank: bool, skip: Option<ItemGuid>) -> u32 {
        self.items
            .values()
            .filter(|item| item.entry == entry && self.counts_toward_owner(item, in_bank, skip))
            .map(|item| item.count)
            .sum()
    }

    /// Units of every template in a limit category, bank included.
    #[must_use]
    pub fn count_limit_category(
        &self,
        catalog: &dyn Catalog,
        category: LimitCategoryId,
        skip: Option<ItemGuid>,
    ) -> u32 {
        self.items
            .values()
            .filter(|item| self.counts_toward_owner(item, true, skip))
            .filter(|item| {
                catalog
                    .template(item.entry)
                    .is_some_and(|t| t.limit_category == Some(category))
            })
            .map(|item| item.count)
            .sum()
    }

    /// Equipped copies of `entry`, ignoring `except`.
    #[must_use]
    pub fn count_equipped(&self, entry: ItemId, except: Option<Position>) -> u32 {
        self.equipped_items(except)
            .filter(|item| item.entry == entry)
            .map(|item| item.count)
            .sum()
    }

    /// Equipped units in a limit category, ignoring `except`.
    #[must_use]
    pub fn count_equipped_limit_category(
        &self,
        catalog: &dyn Catalog,
        category: LimitCategoryId,
        except: Option<Position>,
    ) -> u32 {
        self.equipped_items(except)
            .filter(|item| {
                catalog
                    .template(item.entry)
                    .is_some_and(|t| t.limit_category == Some(category))
            })
            .map(|item| item.count)
            .sum()
    }

    fn equipped_items(&self, except: Option<Position>) -> impl Iterator<Item = &Item> {
        self.slots
            .iter()
            .filter(move |(pos, _)| pos.is_equipment() && Some(**pos) != except)
            .filter_map(|(_, guid)| self.items.get(guid))
    }

    fn counts_toward_owner(&self, item: &Item, in_bank: bool, skip: Option<ItemGuid>) -> bool {
        let Some(pos) = item.position() else {
            return false;
        };
        if Some(item.guid) == skip {
            return false;
        }
        if let Position::Bag { container, .. } = pos {
            if skip.is_some() && self.bag_at(container).map(|bag| bag.guid) == skip {
                return false;
            }
        }
        match pos {
            Position::Buyback(_) | Position::AccountBank { .. } => false,
            _ if pos.is_bank() => in_bank,
            _ => true,
        }
    }

    /// Adds an unplaced item to the store at `position`.
    ///
    /// No rules are checked beyond the slot being free and addressable.
    ///
    /// # Errors
    ///
    /// [`InventoryError::InternalInconsistency`] if the slot is taken, the
    /// guid is already stored or a bag position has no bag.
    pub fn attach(&mut self, item: Item, position: Position) -> InventoryResult<()> {
        let guid = item.guid;
        if self.items.contains_key(&guid) {
            tracing::error!(?guid, "attach of an item already in the store");
            return Err(InventoryError::InternalInconsistency);
        }
        self.items.insert(guid, item);
        if let Err(err) = self.link(guid, position) {
            self.items.remove(&guid);
            return Err(err);
        }
        Ok(())
    }

    /// Removes an item from the store and returns it unplaced.
    ///
    /// A bag keeps its content vector; the contents stay in the store with
    /// stale positions until the bag is attached again or they are removed.
    pub fn detach(&mut self, guid: ItemGuid) -> Option<Item> {
        self.unlink(guid);
        let mut item = self.items.remove(&guid)?;
        item.set_position(None);
        Some(item)
    }

    /// Clears the slot holding `guid`. The item stays in the store, unplaced.
    pub(crate) fn unlink(&mut self, guid: ItemGuid) -> Option<Position> {
        let pos = self.items.get(&guid)?.position()?;
        match pos {
            Position::Bag { container, index } => {
                let bag_guid = Position::bag_holder(container).and_then(|h| self.slots.get(&h).copied());
                if let Some(bag) = bag_guid.and_then(|g| self.items.get_mut(&g)) {
                    if let Some(slot) = bag.contents_mut().get_mut(usize::from(index)) {
                        *slot = None;
                    }
                }
            }
            other => {
                self.slots.remove(&other);
            }
        }
        if let Some(item) = self.items.get_mut(&guid) {
            item.set_position(None);
        }
        Some(pos)
    }

    /// Places a stored, unplaced item at `position`.
    pub(crate) fn link(&mut self, guid: ItemGuid, position: Position) -> InventoryResult<()> {
        if self.guid_at(position).is_some() {
            tracing::error!(?guid, ?position, "link into an occupied slot");
            return Err(InventoryError::InternalInconsistency);
        }
        if self.items.get(&guid).map_or(true, |item| item.position().is_some()) {
            tracing::error!(?guid, "link of a missing or placed item");
            return Err(InventoryError::InternalInconsistency);
        }
        match position {
            Position::Bag { container, index } => {
                let bag_guid = self.bag_at(container).map(|bag| bag.guid);
                let slot = bag_guid
                    .and_then(|g| self.items.get_mut(&g))
                    .and_then(|bag| bag.contents_mut().get_mut(usize::from(index)));
                let Some(slot) = slot else {
                    tracing::error!(?guid, ?position, "link into a missing bag slot");
                    return Err(InventoryError::InternalInconsistency);
                };
                *slot = Some(guid);
            }
            other => {
                self.slots.insert(other, guid);
            }
        }
        let contents: Vec<(usize, ItemGuid)> = match self.items.get_mut(&guid) {
            Some(item) => {
                item.set_position(Some(position));
                item.contents()
                    .iter()
                    .enumerate()
                    .filter_map(|(i, slot)| slot.map(|g| (i, g)))
                    .collect()
            }
            None => Vec::new(),
        };
        if let Some(container) = position.as_container() {
            for (index, child) in contents {
                if let (Some(item), Ok(index)) = (self.items.get_mut(&child), u8::try_from(index)) {
                    item.set_position(Some(Position::Bag { container, index }));
                }
            }
        }
        Ok(())
    }

    /// Buyback entry at `index`.
    #[must_use]
    pub fn buyback(&self, index: u8) -> Option<(&Item, BuybackEntry)> {
        let entry = (*self.buyback.get(usize::from(index))?)?;
        self.item_at(Position::Buyback(index)).map(|item| (item, entry))
    }

    /// Slot the next sale goes to when it is free.
    #[must_use]
    pub const fn current_buyback_slot(&self) -> u8 {
        self.current_buyback_slot
    }

    /// Puts a sold item in the buyback ring.
    ///
    /// Uses the current slot if free, else the first free slot, else the slot
    /// with the oldest timestamp. Returns the slot used and the evicted item.
    pub(crate) fn push_buyback(
        &mut self,
        item: Item,
        entry: BuybackEntry,
    ) -> InventoryResult<(u8, Option<Item>)> {
        let index = self.buyback_target();
        let evicted = self.take_buyback(index).map(|(mut old, _)| {
            old.state = ItemState::Removed;
            old
        });
        self.attach(item, Position::Buyback(index))?;
        self.buyback[usize::from(index)] = Some(entry);
        if usize::from(self.current_buyback_slot) + 1 < BUYBACK_SLOT_COUNT {
            self.current_buyback_slot += 1;
        }
        Ok((index, evicted))
    }

    fn buyback_target(&self) -> u8 {
        let occupied = |i: u8| self.buyback[usize::from(i)].is_some();
        if !occupied(self.current_buyback_slot) {
            return self.current_buyback_slot;
        }
        let mut oldest = (u64::MAX, 0u8);
        for (i, entry) in (0u8..).zip(self.buyback.iter()) {
            match entry {
                None => return i,
                Some(e) if e.timestamp < oldest.0 => oldest = (e.timestamp, i),
                Some(_) => {}
            }
        }
        oldest.1
    }

    /// Removes and returns the buyback entry at `index`.
    pub(crate) fn take_buyback(&mut self, index: u8) -> Option<(Item, BuybackEntry)> {
        let entry = self.buyback.get_mut(usize::from(index))?.take()?;
        let guid = self.guid_at(Position::Buyback(index))?;
        self.detach(guid).map(|item| (item, entry))
    }

    /// Checks every store invariant.
    ///
    /// # Errors
    ///
    /// [`InventoryError::InternalInconsistency`] on the first violation, which
    /// is also logged.
    pub fn verify_consistency(&self) -> InventoryResult<()> {
        let fail = |what: &str, guid: ItemGuid| {
            tracing::error!(?guid, what, "inventory store inconsistency");
            Err(InventoryError::InternalInconsistency)
        };
        for (&pos, &guid) in &self.slots {
            match self.items.get(&guid) {
                Some(item) if item.position() == Some(pos) && !matches!(pos, Position::Bag { .. }) => {}
                _ => return fail("slot points at an item that does not point back", guid),
            }
        }
        for item in self.items.values() {
            let Some(pos) = item.position() else {
                return fail("stored item has no position", item.guid);
            };
            if self.guid_at(pos) != Some(item.guid) {
                return fail("item position does not resolve to the item", item.guid);
            }
            if item.count == 0 {
                return fail("empty stack", item.guid);
            }
            if item.is_not_empty_bag() && !pos.is_bag_slot() {
                return fail("non-empty bag outside a bag slot", item.guid);
            }
            if item.state == ItemState::Removed {
                return fail("removed item still stored", item.guid);
            }
            for (index, content) in item.contents().iter().enumerate() {
                let Some(content) = content else { continue };
                let expected = pos
                    .as_container()
                    .zip(u8::try_from(index).ok())
                    .map(|(container, index)| Position::Bag { container, index });
                if self.items.get(content).and_then(Item::position) != expected {
                    return fail("bag content points elsewhere", *content);
                }
            }
        }
        for (index, entry) in (0u8..).zip(self.buyback.iter()) {
            if entry.is_some() != self.slots.contains_key(&Position::Buyback(index)) {
                return fail("buyback metadata out of step", ItemGuid::EMPTY);
            }
        }
        Ok(())
    }
}
