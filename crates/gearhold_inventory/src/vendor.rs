//! # Vendors
//!
//! Buying, selling and buying back. A purchase is checked in full (stock,
//! gating, every price component, and the placement plan) before money,
//! points, currencies or turn-in items are taken, so a purchase that cannot
//! be placed costs nothing.

use gearhold_shared::constants::{BUYBACK_SLOT_END, BUYBACK_SLOT_START};
use gearhold_shared::{ExtendedCostId, FactionId, ItemGuid, ItemId};
use serde::{Deserialize, Serialize};

use crate::catalog::ExtendedCost;
use crate::character::Team;
use crate::error::{InventoryError, InventoryResult};
use crate::events::InventoryEvent;
use crate::money::Money;
use crate::planner::Anchor;
use crate::player::Player;
use crate::store::BuybackEntry;
use crate::template::{Bonding, ItemFlags, ItemTemplate};

/// One line of a vendor's stock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorItem {
    /// Template sold.
    pub entry: ItemId,
    /// Stock limit in units, zero for unlimited.
    #[serde(default)]
    pub max_count: u32,
    /// Units left while limited.
    #[serde(default)]
    pub current_count: u32,
    /// Non-money price.
    #[serde(default)]
    pub extended_cost: Option<ExtendedCostId>,
}

impl VendorItem {
    /// Unlimited stock of `entry`.
    #[must_use]
    pub const fn unlimited(entry: ItemId) -> Self {
        Self {
            entry,
            max_count: 0,
            current_count: 0,
            extended_cost: None,
        }
    }

    /// `stock` units of `entry`.
    #[must_use]
    pub const fn limited(entry: ItemId, stock: u32) -> Self {
        Self {
            entry,
            max_count: stock,
            current_count: stock,
            extended_cost: None,
        }
    }

    /// Sets the extended cost.
    #[must_use]
    pub const fn with_extended_cost(mut self, cost: ExtendedCostId) -> Self {
        self.extended_cost = Some(cost);
        self
    }

    /// True if at least `units` can be sold.
    #[must_use]
    pub const fn has_stock(&self, units: u32) -> bool {
        self.max_count == 0 || self.current_count >= units
    }

    /// Refills limited stock.
    pub fn restock(&mut self) {
        self.current_count = self.max_count;
    }
}

/// A vendor and its stock.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    /// Faction whose reputation discounts prices.
    #[serde(default)]
    pub faction: Option<FactionId>,
    /// Stock lines, addressed by index.
    #[serde(default)]
    pub items: Vec<VendorItem>,
}

impl Vendor {
    /// Vendor with no stock.
    #[must_use]
    pub fn new(faction: Option<FactionId>) -> Self {
        Self {
            faction,
            items: Vec::new(),
        }
    }

    /// Adds a stock line.
    #[must_use]
    pub fn with_item(mut self, item: VendorItem) -> Self {
        self.items.push(item);
        self
    }
}

impl Player {
    /// Money price of `stacks` vendor stacks of `template` after reputation
    /// and aura modifiers.
    #[must_use]
    pub fn vendor_price(&self, vendor: &Vendor, template: &ItemTemplate, stacks: u32) -> Money {
        let base = template.buy_price.checked_mul(u64::from(stacks)).unwrap_or(Money::MAX);
        if base.is_zero() {
            return base;
        }
        let steps = vendor
            .faction
            .map_or(0, |faction| self.profile.reputation(faction).steps_above_neutral());
        base.mul_bp(self.config.reputation_price_bp(steps))
            .less_percent(self.profile.vendor_price_modifier_pct)
    }

    /// Buys `stacks` stacks of the vendor's line `index` into the inventory.
    ///
    /// Returns the stacks that received units.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` for an unknown line or one the character may not buy,
    /// `CantBuyQuantity`, `ItemSoldOut`, the gate and price errors of the
    /// extended cost, `NotEnoughMoney`, and the placement result. Nothing is
    /// paid on failure.
    pub fn buy_item(&mut self, vendor: &mut Vendor, index: usize, stacks: u32, anchor: Anchor) -> InventoryResult<Vec<ItemGuid>> {
        let line = vendor.items.get(index).ok_or(InventoryError::ItemNotFound)?;
        if stacks == 0 {
            return Err(InventoryError::CantBuyQuantity);
        }
        let entry = line.entry;
        let template = self.catalog.template(entry).ok_or(InventoryError::ItemNotFound)?;
        let units = template
            .buy_count
            .max(1)
            .checked_mul(stacks)
            .ok_or(InventoryError::CantBuyQuantity)?;
        if !line.has_stock(units) {
            return Err(InventoryError::ItemSoldOut);
        }
        self.check_vendor_gates(template)?;
        let cost = match line.extended_cost {
            Some(id) => Some(self.catalog.extended_cost(id).cloned().ok_or(InventoryError::ItemNotFound)?),
            None => None,
        };
        if let Some(cost) = &cost {
            self.check_extended_cost(cost, stacks)?;
        }
        let price = self.vendor_price(vendor, template, stacks);
        if self.wallet.money() < price {
            return Err(InventoryError::NotEnoughMoney);
        }
        let plan = self.planner().can_store_new(anchor, entry, units)?;

        let received = self.store_new_item_planned(entry, units, &plan, false)?;
        self.take_money(price)?;
        if let Some(cost) = &cost {
            self.pay_extended_cost(cost, stacks)?;
        }
        if let Some(line) = vendor.items.get_mut(index) {
            if line.max_count > 0 {
                line.current_count -= units;
            }
        }
        tracing::info!(entry, units, copper = price.copper(), "bought from vendor");
        self.settle();
        Ok(received)
    }

    fn check_vendor_gates(&self, template: &ItemTemplate) -> InventoryResult<()> {
        let team = self.profile.team;
        if (template.flags.has(ItemFlags::HORDE_ONLY) && team != Team::Horde)
            || (template.flags.has(ItemFlags::ALLIANCE_ONLY) && team != Team::Alliance)
        {
            return Err(InventoryError::ItemNotFound);
        }
        let class_blocked = template.allowable_class != 0 && template.allowable_class & self.profile.class_mask() == 0;
        if class_blocked && template.bonding == Bonding::OnAcquire {
            return Err(InventoryError::ItemNotFound);
        }
        Ok(())
    }

    fn check_extended_cost(&self, cost: &ExtendedCost, stacks: u32) -> InventoryResult<()> {
        let profile = &self.profile;
        let times = |per: u32| per.saturating_mul(stacks);
        if self.wallet.honor_points < times(cost.honor_points) {
            return Err(InventoryError::NotEnoughHonorPoints);
        }
        if self.wallet.arena_points < times(cost.arena_points) {
            return Err(InventoryError::NotEnoughArenaPoints);
        }
        for item in &cost.items {
            if self.store.count_item(item.item, false, None) < times(item.count) {
                return Err(InventoryError::VendorMissingTurnins);
            }
        }
        for currency in &cost.currencies {
            if self.wallet.currency(currency.currency) < times(currency.count) {
                return Err(InventoryError::NotEnoughCurrency);
            }
        }
        if profile.arena_rating < cost.required_arena_rating {
            return Err(InventoryError::ArenaRatingTooLow);
        }
        if let Some(required) = cost.required_reputation {
            if profile.reputation(required.faction) < required.rank {
                return Err(InventoryError::ReputationTooLow);
            }
        }
        if cost.required_achievement.is_some_and(|a| !profile.achievements.contains(&a)) {
            return Err(InventoryError::MissingAchievement);
        }
        if let Some(level) = cost.required_guild_level {
            if profile.guild_level.map_or(true, |guild| guild < level) {
                return Err(InventoryError::GuildLevelTooLow);
            }
        }
        Ok(())
    }

    fn pay_extended_cost(&mut self, cost: &ExtendedCost, stacks: u32) -> InventoryResult<()> {
        let times = |per: u32| per.saturating_mul(stacks);
        self.wallet.honor_points -= times(cost.honor_points);
        self.wallet.arena_points -= times(cost.arena_points);
        for currency in &cost.currencies {
            self.wallet.take_currency(currency.currency, times(currency.count))?;
        }
        for item in &cost.items {
            self.destroy_item_count(item.item, times(item.count), false)?;
        }
        Ok(())
    }

    /// Sells `count` units of an item (zero for the whole stack) into the
    /// buyback ring. Returns the money received.
    ///
    /// The ring keeps the sale even when full: the sale replaces the oldest
    /// entry, which is destroyed.
    ///
    /// # Errors
    ///
    /// `ItemNotFound`, `CantSellItem` for worn, banked, child or priceless
    /// items and counts above the stack, `LootGone`, `DestroyNonemptyBag`,
    /// and `TooMuchGold`.
    pub fn sell_item(&mut self, guid: ItemGuid, count: u32, now_s: u64) -> InventoryResult<Money> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let position = item.position().ok_or(InventoryError::ItemNotFound)?;
        if !position.is_inventory() || position.is_child_equipment() || item.parent.is_some() {
            return Err(InventoryError::CantSellItem);
        }
        if item.loot_generated {
            return Err(InventoryError::LootGone);
        }
        if item.is_not_empty_bag() {
            return Err(InventoryError::DestroyNonemptyBag);
        }
        let template = self.catalog.template(item.entry).ok_or(InventoryError::ItemNotFound)?;
        let count = if count == 0 { item.count } else { count };
        if count > item.count || template.sell_price.is_zero() {
            return Err(InventoryError::CantSellItem);
        }
        let price = template.sell_price.checked_mul(u64::from(count)).unwrap_or(Money::MAX);
        self.wallet.money().add_capped(price, self.config.max_money)?;

        let sold = if count < item.count {
            let piece = item.clone_split(self.guids.allocate(), count);
            let source = self.store.get_mut(guid).ok_or(InventoryError::InternalInconsistency)?;
            source.count -= count;
            source.mark_changed();
            piece
        } else {
            self.lift(guid)?;
            self.store.detach(guid).ok_or(InventoryError::InternalInconsistency)?
        };
        let sold_guid = sold.guid;
        let entry = BuybackEntry { price, timestamp: now_s };
        let (index, evicted) = self.store.push_buyback(sold, entry)?;
        if let Some(evicted) = evicted {
            tracing::debug!(guid = ?evicted.guid, index, "buyback entry evicted");
            self.timed_enchants.remove(&evicted.guid);
            self.events.push(InventoryEvent::ItemRemoved { item: evicted.guid });
        }
        self.events.push(InventoryEvent::BuybackSlotChanged { index });
        self.give_money(price)?;
        tracing::info!(?sold_guid, count, copper = price.copper(), "sold to vendor");
        self.settle();
        Ok(price)
    }

    /// Buys back the entry at buyback `index` into the inventory.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` for an empty slot, `NotEnoughMoney`, and the placement
    /// result. Nothing is paid on failure.
    pub fn buyback_item(&mut self, index: u8) -> InventoryResult<Vec<ItemGuid>> {
        let (item, entry) = self.store.buyback(index).ok_or(InventoryError::ItemNotFound)?;
        if self.wallet.money() < entry.price {
            return Err(InventoryError::NotEnoughMoney);
        }
        let plan = self.planner().can_store(Anchor::Any, item, false)?;
        self.take_money(entry.price)?;
        let (item, _) = self.store.take_buyback(index).ok_or(InventoryError::InternalInconsistency)?;
        let stacks = self.place_detached(item, &plan, false, false)?;
        self.events.push(InventoryEvent::BuybackSlotChanged { index });
        tracing::info!(index, copper = entry.price.copper(), "bought back");
        self.settle();
        Ok(stacks)
    }

    /// Destroys buyback entries older than the configured expiry.
    ///
    /// Returns how many were removed.
    pub fn expire_buyback(&mut self, now_s: u64) -> usize {
        let expiry = self.config.buyback_expiry_s;
        let expired: Vec<u8> = (0..BUYBACK_SLOT_END - BUYBACK_SLOT_START)
            .filter(|&index| {
                self.store
                    .buyback(index)
                    .is_some_and(|(_, entry)| entry.timestamp.saturating_add(expiry) <= now_s)
            })
            .collect();
        for &index in &expired {
            if let Some((item, _)) = self.store.take_buyback(index) {
                self.events.push(InventoryEvent::ItemRemoved { item: item.guid });
                self.events.push(InventoryEvent::BuybackSlotChanged { index });
            }
        }
        expired.len()
    }
}
