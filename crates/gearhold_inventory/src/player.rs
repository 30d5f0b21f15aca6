//! # Player Inventory
//!
//! [`Player`] binds one character's store, aggregates, wallet and event
//! outbox together. Every mutation follows the same discipline:
//!
//! 1. ask the [`Planner`] for a destination (pure, may fail)
//! 2. mutate the store
//! 3. run the [`Applier`] for each equip transition the move implied
//! 4. queue client events
//!
//! A failure in step 1 returns before anything is touched.
//!
//! ## Weapon state
//!
//! Moves in and out of the hand and ranged slots only mark the derived
//! weapon state dirty. It is recomputed once, when the public operation
//! returns.

use gearhold_shared::{CurrencyId, EquipSlot, ItemGuid, ItemId, Position};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::applier::Applier;
use crate::catalog::Catalog;
use crate::character::CharacterProfile;
use crate::config::InventoryConfig;
use crate::error::{InventoryError, InventoryResult};
use crate::events::{EventOutbox, InventoryEvent};
use crate::item::{EnchantSlot, Item, ItemState};
use crate::money::Money;
use crate::planner::{Anchor, BankTarget, Placement, Planner};
use crate::swap::plan_at;
use crate::stats::PlayerStats;
use crate::store::InventoryStore;
use crate::template::{Bonding, ChildItemSpec, ItemTemplate};

/// Hands out item guids. One allocator is shared by every character of a
/// realm so guids never collide across trades.
#[derive(Debug)]
pub struct ItemGuidAllocator {
    next: AtomicU64,
}

impl ItemGuidAllocator {
    /// Allocator whose first guid is `first` (at least 1).
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }

    /// Next unused guid.
    pub fn allocate(&self) -> ItemGuid {
        ItemGuid(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ItemGuidAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Money and secondary currencies of a character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    money: Money,
    /// Honor points.
    pub honor_points: u32,
    /// Arena points.
    pub arena_points: u32,
    currencies: BTreeMap<CurrencyId, u32>,
}

impl Wallet {
    /// Current money.
    #[must_use]
    pub const fn money(&self) -> Money {
        self.money
    }

    /// Held amount of a currency.
    #[must_use]
    pub fn currency(&self, id: CurrencyId) -> u32 {
        self.currencies.get(&id).copied().unwrap_or(0)
    }

    /// Adds currency, saturating.
    pub fn add_currency(&mut self, id: CurrencyId, count: u32) {
        let held = self.currencies.entry(id).or_insert(0);
        *held = held.saturating_add(count);
    }

    /// Removes currency.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotEnoughCurrency`] if less than `count` is held.
    pub fn take_currency(&mut self, id: CurrencyId, count: u32) -> InventoryResult<()> {
        let held = self.currency(id);
        let left = held.checked_sub(count).ok_or(InventoryError::NotEnoughCurrency)?;
        if left == 0 {
            self.currencies.remove(&id);
        } else {
            self.currencies.insert(id, left);
        }
        Ok(())
    }
}

/// One character's inventory engine.
pub struct Player {
    pub(crate) catalog: Arc<dyn Catalog>,
    pub(crate) config: Arc<InventoryConfig>,
    pub(crate) guids: Arc<ItemGuidAllocator>,
    pub(crate) profile: CharacterProfile,
    pub(crate) store: InventoryStore,
    pub(crate) stats: PlayerStats,
    pub(crate) wallet: Wallet,
    pub(crate) events: EventOutbox,
    pub(crate) effective_level: u8,
    pub(crate) timed_enchants: BTreeSet<ItemGuid>,
    weapon_dirty: bool,
    weapon_state_updates: u64,
}

impl Player {
    /// Creates a character with an empty inventory.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        config: Arc<InventoryConfig>,
        guids: Arc<ItemGuidAllocator>,
        profile: CharacterProfile,
    ) -> Self {
        let store = InventoryStore::new(profile.guid);
        let effective_level = profile.level;
        Self {
            catalog,
            config,
            guids,
            profile,
            store,
            stats: PlayerStats::new(),
            wallet: Wallet::default(),
            events: EventOutbox::new(),
            effective_level,
            timed_enchants: BTreeSet::new(),
            weapon_dirty: false,
            weapon_state_updates: 0,
        }
    }

    /// Character data read by the rules.
    #[must_use]
    pub const fn profile(&self) -> &CharacterProfile {
        &self.profile
    }

    /// Mutable character data.
    ///
    /// Level scaling and shapeshift form have dedicated setters because they
    /// change what equipped items contribute.
    pub fn profile_mut(&mut self) -> &mut CharacterProfile {
        &mut self.profile
    }

    /// The inventory.
    #[must_use]
    pub const fn store(&self) -> &InventoryStore {
        &self.store
    }

    /// Purchased bank bag slots, reagent bank and account tabs.
    pub fn set_bank_access(&mut self, bank_bag_slots: u8, reagent_bank: bool, account_tabs: u8) {
        self.store.bank_bag_slots = bank_bag_slots;
        self.store.reagent_bank_unlocked = reagent_bank;
        self.store.account_bank_tabs = account_tabs;
    }

    /// Item-derived aggregates.
    #[must_use]
    pub const fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Money and currencies.
    #[must_use]
    pub const fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Mutable currencies. Money goes through [`Player::give_money`] and
    /// [`Player::take_money`].
    pub fn wallet_mut(&mut self) -> &mut Wallet {
        &mut self.wallet
    }

    /// Pending client events.
    #[must_use]
    pub const fn events(&self) -> &EventOutbox {
        &self.events
    }

    /// Takes the pending client events.
    pub fn drain_events(&mut self) -> Vec<InventoryEvent> {
        self.events.drain()
    }

    /// Engine tunables.
    #[must_use]
    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Level used for combat rating scaling.
    #[must_use]
    pub const fn effective_level(&self) -> u8 {
        self.effective_level
    }

    /// How many times derived weapon state has been recomputed.
    #[must_use]
    pub const fn weapon_state_updates(&self) -> u64 {
        self.weapon_state_updates
    }

    /// Read-only placement questions against the current state.
    #[must_use]
    pub fn planner(&self) -> Planner<'_> {
        Planner::new(&*self.catalog, &self.store, &self.profile)
    }

    // ---- money ----

    /// Adds money up to the configured cap.
    ///
    /// # Errors
    ///
    /// [`InventoryError::TooMuchGold`]; the balance is unchanged.
    pub fn give_money(&mut self, amount: Money) -> InventoryResult<()> {
        let balance = self.wallet.money.add_capped(amount, self.config.max_money)?;
        self.set_money(balance);
        Ok(())
    }

    /// Removes money.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotEnoughMoney`]; the balance is unchanged.
    pub fn take_money(&mut self, amount: Money) -> InventoryResult<()> {
        let balance = self.wallet.money.pay(amount)?;
        self.set_money(balance);
        Ok(())
    }

    fn set_money(&mut self, balance: Money) {
        if balance != self.wallet.money {
            self.wallet.money = balance;
            self.events.push(InventoryEvent::MoneyChanged { balance });
        }
    }

    // ---- loading ----

    /// Places an item loaded from storage, applying its effects if it is
    /// equipped.
    ///
    /// # Errors
    ///
    /// [`InventoryError::InternalInconsistency`] if the slot is taken or the
    /// guid is already known.
    pub fn load_item(&mut self, item: Item, position: Position) -> InventoryResult<()> {
        let guid = item.guid;
        let timed = item.enchantment(EnchantSlot::Temporary).is_some_and(|e| e.duration_ms > 0);
        self.store.attach(item, position)?;
        if timed {
            self.timed_enchants.insert(guid);
        }
        self.on_placed(guid, position);
        self.settle();
        Ok(())
    }

    // ---- storing ----

    /// Creates `count` units of `entry` in the inventory.
    ///
    /// Returns the stacks that received units, in plan order.
    ///
    /// # Errors
    ///
    /// The planner's blocking result when not every unit fits.
    pub fn store_new_item(&mut self, anchor: Anchor, entry: ItemId, count: u32) -> InventoryResult<Vec<ItemGuid>> {
        let plan = self.planner().can_store_new(anchor, entry, count)?;
        let stacks = self.store_new_item_planned(entry, count, &plan, false)?;
        self.settle();
        Ok(stacks)
    }

    /// Executes a validated plan for new units.
    pub(crate) fn store_new_item_planned(
        &mut self,
        entry: ItemId,
        count: u32,
        plan: &[Placement],
        from_loot: bool,
    ) -> InventoryResult<Vec<ItemGuid>> {
        let catalog = Arc::clone(&self.catalog);
        let template = catalog.template(entry).ok_or(InventoryError::ItemNotFound)?;
        let item = self.create_item(template, count);
        let stacks = self.place_detached(item, plan, true, from_loot)?;
        if let Some(spec) = template.child_item {
            for &stack in &stacks {
                if self.store.get(stack).is_some_and(|item| item.child.is_none()) {
                    self.create_child(stack, spec)?;
                }
            }
        }
        Ok(stacks)
    }

    /// Moves an item already in the store to somewhere in the inventory.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`, the unequip gates when the item is worn, and the
    /// planner's result.
    pub fn store_item(&mut self, anchor: Anchor, guid: ItemGuid) -> InventoryResult<()> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let source = item.position().ok_or(InventoryError::ItemNotFound)?;
        let planner = self.planner();
        planner.can_unequip(source, false)?;
        let plan = planner.can_store(anchor, item, false)?;
        self.place_existing(guid, &plan)?;
        self.relocate_child(guid)?;
        self.settle();
        Ok(())
    }

    /// Moves an item into one of the banks.
    ///
    /// # Errors
    ///
    /// As [`Player::store_item`], with the bank rules of
    /// [`Planner::can_bank`].
    pub fn bank_item(&mut self, target: BankTarget, anchor: Anchor, guid: ItemGuid) -> InventoryResult<()> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let source = item.position().ok_or(InventoryError::ItemNotFound)?;
        let planner = self.planner();
        planner.can_unequip(source, false)?;
        let plan = planner.can_bank(target, anchor, item, false)?;
        self.place_existing(guid, &plan)?;
        self.relocate_child(guid)?;
        self.settle();
        Ok(())
    }

    // ---- equipping ----

    /// Creates one unit of `entry` directly in an equipment slot.
    ///
    /// # Errors
    ///
    /// The first failing equip rule.
    pub fn equip_new_item(&mut self, slot: Option<Position>, entry: ItemId) -> InventoryResult<ItemGuid> {
        let destination = self.planner().can_equip_new(slot, entry, false)?;
        let catalog = Arc::clone(&self.catalog);
        let template = catalog.template(entry).ok_or(InventoryError::ItemNotFound)?;
        let item = self.create_item(template, 1);
        let guid = item.guid;
        self.attach_at(item, destination)?;
        self.pushed(destination, guid, 1, true, false);
        tracing::info!(?guid, entry, ?destination, "equipped new item");
        if let Some(spec) = template.child_item {
            self.create_child(guid, spec)?;
        }
        self.after_equip(guid, destination)?;
        self.settle();
        Ok(guid)
    }

    /// Equips an item from wherever it is into a free equipment slot.
    ///
    /// # Errors
    ///
    /// The first failing equip rule. Occupied slots need
    /// [`Player::swap_item`].
    pub fn equip_item(&mut self, slot: Option<Position>, guid: ItemGuid) -> InventoryResult<Position> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let source = item.position().ok_or(InventoryError::ItemNotFound)?;
        let planner = self.planner();
        planner.can_unequip(source, false)?;
        let destination = planner.can_equip(slot, item, false)?;
        self.move_to(guid, destination)?;
        tracing::info!(?guid, ?source, ?destination, "equipped item");
        self.after_equip(guid, destination)?;
        self.settle();
        Ok(destination)
    }

    /// Follow-up of every equip: weapon swap lockout, off hand freed for a
    /// two-hander, child item moved into place.
    pub(crate) fn after_equip(&mut self, guid: ItemGuid, destination: Position) -> InventoryResult<()> {
        if self.profile.in_combat() && is_weapon_slot(destination) {
            self.profile.weapon_change_timer_ms = self.config.weapon_swap_cooldown_ms;
        }
        self.auto_unequip_offhand_if_needed()?;
        self.relocate_child(guid)
    }

    // ---- removal ----

    /// Takes an item out of the inventory without destroying it.
    ///
    /// Equip effects are reverted and a child item returns to its child
    /// slot. The returned item is unplaced and belongs to the caller.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`, `DestroyNonemptyBag` for a bag with contents, and
    /// `CantSwap` for buyback entries.
    pub fn remove_item(&mut self, guid: ItemGuid) -> InventoryResult<Item> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        if item.is_not_empty_bag() {
            return Err(InventoryError::DestroyNonemptyBag);
        }
        if matches!(item.position(), Some(Position::Buyback(_))) {
            return Err(InventoryError::CantSwap);
        }
        self.lift(guid)?;
        self.relocate_child(guid)?;
        let item = self.store.detach(guid).ok_or(InventoryError::InternalInconsistency)?;
        self.timed_enchants.remove(&guid);
        self.settle();
        Ok(item)
    }

    /// Destroys an item, its bag contents and its child item.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`.
    pub fn destroy_item(&mut self, guid: ItemGuid) -> InventoryResult<()> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let contents: Vec<ItemGuid> = item.contents().iter().flatten().copied().collect();
        let child = item.child;
        for content in contents {
            self.destroy_one(content)?;
        }
        self.destroy_one(guid)?;
        if let Some(child) = child.filter(|c| self.store.contains(*c)) {
            self.destroy_one(child)?;
        }
        self.settle();
        Ok(())
    }

    fn destroy_one(&mut self, guid: ItemGuid) -> InventoryResult<()> {
        let position = self
            .store
            .get(guid)
            .and_then(Item::position)
            .ok_or(InventoryError::ItemNotFound)?;
        let item = match position {
            Position::Buyback(index) => self.store.take_buyback(index).map(|(item, _)| item),
            _ => {
                self.lift(guid)?;
                self.store.detach(guid)
            }
        };
        let mut item = item.ok_or(InventoryError::InternalInconsistency)?;
        item.state = ItemState::Removed;
        self.timed_enchants.remove(&guid);
        tracing::info!(?guid, entry = item.entry, ?position, "item destroyed");
        self.events.push(InventoryEvent::ItemRemoved { item: guid });
        Ok(())
    }

    /// Destroys up to `count` units of `entry`, walking positions in order.
    ///
    /// Returns how many units were destroyed. Buyback and the account bank
    /// are never touched; the character bank only with `include_bank`.
    ///
    /// # Errors
    ///
    /// Propagates [`Player::destroy_item`] failures.
    pub fn destroy_item_count(&mut self, entry: ItemId, count: u32, include_bank: bool) -> InventoryResult<u32> {
        let candidates: Vec<(ItemGuid, u32)> = self
            .store
            .iter_placed()
            .filter(|(position, item)| {
                item.entry == entry
                    && !matches!(position, Position::Buyback(_) | Position::AccountBank { .. })
                    && (include_bank || !position.is_bank())
            })
            .map(|(_, item)| (item.guid, item.count))
            .collect();
        let mut remaining = count;
        for (guid, held) in candidates {
            if remaining == 0 {
                break;
            }
            if held <= remaining {
                self.destroy_item(guid)?;
                remaining -= held;
            } else {
                let item = self.store.get_mut(guid).ok_or(InventoryError::InternalInconsistency)?;
                item.count -= remaining;
                item.mark_changed();
                let left = item.count;
                self.events.push(InventoryEvent::ItemCountChanged { item: guid, count: left });
                remaining = 0;
            }
        }
        Ok(count - remaining)
    }

    // ---- splitting ----

    /// Moves `count` units of the stack at `source` into a new stack at
    /// `destination`, merging into a compatible stack there.
    ///
    /// Returns the stack that received the units.
    ///
    /// # Errors
    ///
    /// `TooFewToSplit` when `count` exceeds the stack, `SplitFailed` when it
    /// is zero or the whole stack, `LootGone`, and the destination's
    /// planner result.
    pub fn split_item(&mut self, source: Position, destination: Position, count: u32) -> InventoryResult<ItemGuid> {
        let item = self.store.item_at(source).ok_or(InventoryError::ItemNotFound)?;
        if item.loot_generated {
            return Err(InventoryError::LootGone);
        }
        if count > item.count {
            return Err(InventoryError::TooFewToSplit);
        }
        if count == 0 || count == item.count {
            return Err(InventoryError::SplitFailed);
        }
        if source.is_equipment() || matches!(source, Position::Buyback(_)) {
            return Err(InventoryError::CantSwap);
        }
        let source_guid = item.guid;
        let piece = item.clone_split(self.guids.allocate(), count);
        let planner = self.planner();
        let plan = plan_at(&planner, &piece, destination, false)?;
        let source_item = self
            .store
            .get_mut(source_guid)
            .ok_or(InventoryError::InternalInconsistency)?;
        source_item.count -= count;
        source_item.mark_changed();
        let left = source_item.count;
        self.events.push(InventoryEvent::ItemCountChanged {
            item: source_guid,
            count: left,
        });
        let stacks = self.place_detached(piece, &plan, false, false)?;
        self.settle();
        stacks.first().copied().ok_or(InventoryError::InternalInconsistency)
    }

    // ---- primitives ----

    pub(crate) fn create_item(&self, template: &ItemTemplate, count: u32) -> Item {
        let mut item = Item::create(self.guids.allocate(), template, count, self.profile.guid);
        item.bound = template.bonding.binds_on_store();
        item
    }

    /// Creates the child of `parent` and puts it next to the parent: in its
    /// equipment slot when the parent is worn, else its child slot, else the
    /// inventory, else the mail.
    fn create_child(&mut self, parent: ItemGuid, spec: ChildItemSpec) -> InventoryResult<()> {
        let catalog = Arc::clone(&self.catalog);
        let Some(template) = catalog.template(spec.entry) else {
            tracing::error!(?parent, child = spec.entry, "child item template missing");
            return Err(InventoryError::ItemNotFound);
        };
        let mut child = self.create_item(template, 1);
        child.parent = Some(parent);
        let guid = child.guid;
        if let Some(parent_item) = self.store.get_mut(parent) {
            parent_item.child = Some(guid);
        }
        let home = Position::ChildEquipment(spec.slot);
        if self.store.item_at(home).is_none() {
            self.attach_at(child, home)?;
            self.pushed(home, guid, 1, true, false);
        } else {
            let planned = self.planner().can_store(Anchor::Any, &child, false);
            match planned {
                Ok(plan) => {
                    self.place_detached(child, &plan, true, false)?;
                }
                Err(_) => self.mail(child),
            }
        }
        self.relocate_child(parent)
    }

    /// Keeps a child item in step with its parent: equipped while the parent
    /// is equipped, back in its child slot otherwise.
    pub(crate) fn relocate_child(&mut self, parent: ItemGuid) -> InventoryResult<()> {
        let Some(parent_item) = self.store.get(parent) else {
            return Ok(());
        };
        let Some(child) = parent_item.child else {
            return Ok(());
        };
        let parent_equipped = parent_item.position().is_some_and(Position::is_equipment);
        let catalog = Arc::clone(&self.catalog);
        let Some(spec) = catalog.template(parent_item.entry).and_then(|t| t.child_item) else {
            return Ok(());
        };
        let Some(child_item) = self.store.get(child) else {
            return Ok(());
        };
        let child_equipped = child_item.position().is_some_and(Position::is_equipment);
        if parent_equipped && !child_equipped {
            let Some(template) = catalog.template(child_item.entry) else {
                return Err(InventoryError::ItemNotFound);
            };
            let Some(target) = self.planner().candidate_slots(template).first().copied() else {
                return Ok(());
            };
            if let Some(occupant) = self.store.guid_at(target) {
                self.stow_or_mail(occupant)?;
            }
            self.move_to(child, target)?;
        } else if !parent_equipped && child_equipped {
            let home = Position::ChildEquipment(spec.slot);
            if self.store.item_at(home).is_none() {
                self.move_to(child, home)?;
            } else {
                self.stow_or_mail(child)?;
            }
        }
        Ok(())
    }

    /// Moves an item anywhere in the inventory, or mails it if nothing fits.
    pub(crate) fn stow_or_mail(&mut self, guid: ItemGuid) -> InventoryResult<()> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let planned = self.planner().can_store(Anchor::Any, item, false);
        match planned {
            Ok(plan) => self.place_existing(guid, &plan),
            Err(rejection) => {
                tracing::debug!(?guid, error = ?rejection.error, "no room, mailing");
                self.lift(guid)?;
                let item = self.store.detach(guid).ok_or(InventoryError::InternalInconsistency)?;
                self.mail(item);
                Ok(())
            }
        }
    }

    pub(crate) fn mail(&mut self, item: Item) {
        tracing::info!(guid = ?item.guid, entry = item.entry, "item sent by mail");
        self.timed_enchants.remove(&item.guid);
        self.events.push(InventoryEvent::ItemMailed { item: Box::new(item) });
    }

    /// Moves a placed item to an empty `position` as a whole.
    pub(crate) fn move_to(&mut self, guid: ItemGuid, position: Position) -> InventoryResult<()> {
        self.lift(guid)?;
        self.store.link(guid, position)?;
        self.on_placed(guid, position);
        let count = self.store.get(guid).map_or(0, |item| item.count);
        self.pushed(position, guid, count, false, false);
        Ok(())
    }

    /// Executes a store or bank plan for an item already in the store.
    pub(crate) fn place_existing(&mut self, guid: ItemGuid, plan: &[Placement]) -> InventoryResult<()> {
        if matches!(self.store.get(guid).and_then(Item::position), Some(Position::Buyback(_))) {
            return Err(InventoryError::CantSwap);
        }
        self.lift(guid)?;
        let item = self.store.detach(guid).ok_or(InventoryError::InternalInconsistency)?;
        self.place_detached(item, plan, false, false)?;
        Ok(())
    }

    /// Executes a plan for an item that is not in the store.
    ///
    /// Merge entries add to the stack already there; free entries take a
    /// split-off piece, and the last one the item itself. An item merged
    /// away completely is marked removed. Returns the receiving stacks.
    pub(crate) fn place_detached(
        &mut self,
        item: Item,
        plan: &[Placement],
        created: bool,
        from_loot: bool,
    ) -> InventoryResult<Vec<ItemGuid>> {
        let guid = item.guid;
        let mut pending = Some(item);
        let mut stacks = Vec::with_capacity(plan.len());
        for placement in plan {
            let Placement { position, count } = *placement;
            let current = pending.as_mut().ok_or(InventoryError::InternalInconsistency)?;
            if let Some(target) = self.store.guid_at(position) {
                let stack = self.store.get_mut(target).ok_or(InventoryError::InternalInconsistency)?;
                stack.count += count;
                stack.mark_changed();
                current.count = current.count.saturating_sub(count);
                self.pushed(position, target, count, created, from_loot);
                stacks.push(target);
                continue;
            }
            let piece = if current.count <= count {
                pending.take().ok_or(InventoryError::InternalInconsistency)?
            } else {
                current.count -= count;
                current.clone_split(self.guids.allocate(), count)
            };
            let piece_guid = piece.guid;
            self.attach_at(piece, position)?;
            self.pushed(position, piece_guid, count, created || piece_guid != guid, from_loot);
            stacks.push(piece_guid);
            if pending.is_none() {
                break;
            }
        }
        if let Some(mut left) = pending {
            if left.count != 0 {
                tracing::error!(?guid, left = left.count, "plan did not cover the whole item");
                return Err(InventoryError::InternalInconsistency);
            }
            let persisted = left.state != ItemState::New;
            left.state = ItemState::Removed;
            self.timed_enchants.remove(&guid);
            if persisted {
                self.events.push(InventoryEvent::ItemRemoved { item: guid });
            }
        }
        Ok(stacks)
    }

    /// Unplaces an item, reverting equip effects first. It stays in the store.
    pub(crate) fn lift(&mut self, guid: ItemGuid) -> InventoryResult<Position> {
        let position = self
            .store
            .get(guid)
            .and_then(Item::position)
            .ok_or(InventoryError::ItemNotFound)?;
        if position.is_equipment() {
            self.apply_mods(guid, false);
            self.touch(position);
        }
        self.store.unlink(guid);
        if let Some(item) = self.store.get_mut(guid) {
            item.mark_changed();
        }
        Ok(position)
    }

    fn attach_at(&mut self, item: Item, position: Position) -> InventoryResult<()> {
        let guid = item.guid;
        self.store.attach(item, position)?;
        self.on_placed(guid, position);
        Ok(())
    }

    /// Equip hook: binding, effects, weapon state. Other positions only mark
    /// the item changed.
    pub(crate) fn on_placed(&mut self, guid: ItemGuid, position: Position) {
        if !position.is_equipment() {
            if let Some(item) = self.store.get_mut(guid) {
                item.mark_changed();
            }
            return;
        }
        let catalog = Arc::clone(&self.catalog);
        if let Some(item) = self.store.get_mut(guid) {
            let binds = catalog
                .template(item.entry)
                .is_some_and(|t| !matches!(t.bonding, Bonding::None | Bonding::OnUse));
            if binds && !item.bound {
                item.bound = true;
            }
            item.mark_changed();
        }
        self.apply_mods(guid, true);
        self.touch(position);
    }

    pub(crate) fn pushed(&mut self, position: Position, item: ItemGuid, count: u32, created: bool, from_loot: bool) {
        self.events.push(InventoryEvent::ItemPushed {
            position,
            item,
            count,
            created,
            from_loot,
        });
    }

    pub(crate) fn apply_mods(&mut self, guid: ItemGuid, apply: bool) {
        let Some(item) = self.store.get(guid) else {
            return;
        };
        let Some(position) = item.position() else {
            return;
        };
        let applier = Applier::new(&*self.catalog, &self.profile, &self.config, self.effective_level);
        applier.apply_item_mods(&mut self.stats, &self.store, item, position, apply);
    }

    /// Marks derived weapon state dirty if `position` is a weapon slot.
    pub(crate) fn touch(&mut self, position: Position) {
        if is_weapon_slot(position) {
            self.weapon_dirty = true;
        }
    }

    /// Ends a public operation: recomputes derived weapon state if a weapon
    /// slot changed.
    pub(crate) fn settle(&mut self) {
        if !std::mem::take(&mut self.weapon_dirty) {
            return;
        }
        let applier = Applier::new(&*self.catalog, &self.profile, &self.config, self.effective_level);
        applier.update_weapon_state(&mut self.stats, &self.store);
        self.weapon_state_updates += 1;
    }
}

/// Main hand, off hand or ranged.
pub(crate) const fn is_weapon_slot(position: Position) -> bool {
    matches!(
        position,
        Position::Equipment(EquipSlot::MainHand | EquipSlot::OffHand | EquipSlot::Ranged)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{ModLayer, UnitMod};
    use crate::test_support::*;

    #[test]
    fn test_store_new_item_merges_then_fills() {
        let mut player = player();
        let first = player.store_new_item(Anchor::Any, CLOTH, 15).unwrap();
        assert_eq!(first.len(), 1);

        let stacks = player.store_new_item(Anchor::Any, CLOTH, 10).unwrap();
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0], first[0]);
        assert_eq!(player.store().item_at(Position::Backpack(0)).unwrap().count, 20);
        assert_eq!(player.store().item_at(Position::Backpack(1)).unwrap().count, 5);
        assert_eq!(player.store().count_item(CLOTH, true, None), 25);
        player.store().verify_consistency().unwrap();
    }

    #[test]
    fn test_store_new_item_full_inventory_creates_nothing() {
        let mut player = player();
        for _ in 0..16 {
            player.store_new_item(Anchor::Any, HELM, 1).unwrap();
        }
        let before = player.store().len();
        assert_eq!(player.store_new_item(Anchor::Any, HELM, 1), Err(InventoryError::InvFull));
        assert_eq!(player.store().len(), before);
    }

    #[test]
    fn test_equip_new_item_applies_and_destroy_reverts() {
        let mut player = player();
        let guid = player.equip_new_item(None, HELM).unwrap();
        assert_eq!(player.stats().unit_mod(UnitMod::Stamina, ModLayer::BaseFlat), 10);
        assert_eq!(player.stats().unit_mod(UnitMod::Armor, ModLayer::BaseFlat), 100);

        player.destroy_item(guid).unwrap();
        assert_eq!(player.stats(), &PlayerStats::new());
        assert!(player
            .events()
            .pending()
            .contains(&InventoryEvent::ItemRemoved { item: guid }));
    }

    #[test]
    fn test_equip_from_backpack_and_store_back() {
        let mut player = player();
        let guid = player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0];
        let destination = player.equip_item(None, guid).unwrap();
        assert_eq!(destination, Position::Equipment(EquipSlot::Head));
        assert!(player.store().get(guid).unwrap().bound);

        player.store_item(Anchor::Any, guid).unwrap();
        assert_eq!(player.store().get(guid).unwrap().position(), Some(Position::Backpack(0)));
        assert_eq!(player.stats(), &PlayerStats::new());
        player.store().verify_consistency().unwrap();
    }

    #[test]
    fn test_split_legality() {
        let mut player = player();
        player.store_new_item(Anchor::Any, CLOTH, 12).unwrap();
        let source = Position::Backpack(0);
        let target = Position::Backpack(5);

        assert_eq!(player.split_item(source, target, 12), Err(InventoryError::SplitFailed));
        assert_eq!(player.split_item(source, target, 13), Err(InventoryError::TooFewToSplit));

        let piece = player.split_item(source, target, 5).unwrap();
        assert_eq!(player.store().item_at(source).unwrap().count, 7);
        assert_eq!(player.store().get(piece).unwrap().count, 5);
        assert_eq!(player.store().get(piece).unwrap().position(), Some(target));
        assert_eq!(player.store().count_item(CLOTH, true, None), 12);
    }

    #[test]
    fn test_destroy_bag_takes_contents() {
        let mut player = player();
        let bag = player.equip_new_item(None, POUCH).unwrap();
        for _ in 0..17 {
            player.store_new_item(Anchor::Any, HELM, 1).unwrap();
        }
        assert_eq!(player.store().get(bag).unwrap().free_bag_slots(), 3);
        assert_eq!(player.remove_item(bag), Err(InventoryError::DestroyNonemptyBag));

        player.destroy_item(bag).unwrap();
        assert_eq!(player.store().count_item(HELM, true, None), 16);
        player.store().verify_consistency().unwrap();
    }

    #[test]
    fn test_destroy_item_count_spans_stacks() {
        let mut player = player();
        player.store_new_item(Anchor::Any, CLOTH, 30).unwrap();
        assert_eq!(player.destroy_item_count(CLOTH, 25, false), Ok(25));
        assert_eq!(player.store().count_item(CLOTH, true, None), 5);
        assert_eq!(player.destroy_item_count(CLOTH, 10, false), Ok(5));
        assert!(player.store().is_empty());
    }

    #[test]
    fn test_child_item_follows_parent() {
        let mut player = player();
        let parent = player.store_new_item(Anchor::Any, ARTIFACT, 1).unwrap()[0];
        let child = player.store().get(parent).unwrap().child.unwrap();
        assert_eq!(player.store().get(child).unwrap().position(), Some(Position::ChildEquipment(0)));

        player.equip_item(None, parent).unwrap();
        assert_eq!(
            player.store().get(child).unwrap().position(),
            Some(Position::Equipment(EquipSlot::OffHand))
        );

        player.store_item(Anchor::Any, parent).unwrap();
        assert_eq!(player.store().get(child).unwrap().position(), Some(Position::ChildEquipment(0)));
        assert_eq!(player.stats(), &PlayerStats::new());
    }

    #[test]
    fn test_weapon_state_recomputed_once_per_operation() {
        let mut player = player();
        player.equip_new_item(None, SHIELD).unwrap();
        assert_eq!(player.weapon_state_updates(), 1);

        // Equipping the two-hander also takes the shield off: still one update.
        player.equip_new_item(None, GREATSWORD).unwrap();
        assert_eq!(player.weapon_state_updates(), 2);
        assert!(player.store().equipped(EquipSlot::OffHand).is_none());

        player.store_new_item(Anchor::Any, CLOTH, 1).unwrap();
        assert_eq!(player.weapon_state_updates(), 2);
    }

    #[test]
    fn test_money_cap() {
        let mut player = player();
        let cap = player.config().max_money;
        player.give_money(cap).unwrap();
        assert_eq!(player.give_money(Money::from_copper(1)), Err(InventoryError::TooMuchGold));
        assert_eq!(player.take_money(Money::MAX), Err(InventoryError::NotEnoughMoney));
        assert_eq!(player.wallet().money(), cap);
    }

    #[test]
    fn test_shrinking_a_stack_reports_its_count() {
        let mut player = player();
        player.store_new_item(Anchor::Any, CLOTH, 30).unwrap();
        player.drain_events();

        assert_eq!(player.destroy_item_count(CLOTH, 25, false), Ok(25));
        let (at, left) = player.store().iter_placed().next().unwrap();
        let left = left.guid;
        let events = player.drain_events();
        assert!(events.contains(&InventoryEvent::ItemCountChanged { item: left, count: 5 }));

        player.split_item(at, Position::Backpack(6), 2).unwrap();
        assert_eq!(player.store().get(left).unwrap().count, 3);
        assert!(player
            .drain_events()
            .contains(&InventoryEvent::ItemCountChanged { item: left, count: 3 }));
    }
}
