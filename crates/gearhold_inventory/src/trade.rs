//! # Trade
//!
//! Settles an accepted two-sided trade. Both offers are checked against
//! both inventories and wallets first; either everything moves or nothing
//! does.

use gearhold_shared::ItemGuid;

use crate::error::{InventoryError, InventoryResult};
use crate::events::InventoryEvent;
use crate::item::{EnchantSlot, Item};
use crate::money::Money;
use crate::planner::Anchor;
use crate::player::Player;

/// Number of item slots in a trade window that actually change hands.
pub const TRADE_SLOT_TRADED_COUNT: usize = 6;

/// What one side puts on the table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TradeOffer {
    /// Offered items, in trade slot order.
    pub items: Vec<ItemGuid>,
    /// Offered money.
    pub money: Money,
}

impl TradeOffer {
    /// Empty offer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item.
    #[must_use]
    pub fn with_item(mut self, guid: ItemGuid) -> Self {
        self.items.push(guid);
        self
    }

    /// Sets the money.
    #[must_use]
    pub const fn with_money(mut self, money: Money) -> Self {
        self.money = money;
        self
    }
}

/// Settles a trade between `a` and `b`.
///
/// # Errors
///
/// Nothing changes on either side when this fails:
/// - `ItemNotFound` for an offered item the offerer does not carry
/// - `NotOwner` for soulbound items
/// - `DestroyNonemptyBag` for bags with contents
/// - `CantSwap` for child items and items outside carried storage
/// - `NotEnoughMoney` and `TooMuchGold` for either wallet
/// - the receiving side's batch placement result
pub fn complete_trade(a: &mut Player, b: &mut Player, offer_a: &TradeOffer, offer_b: &TradeOffer) -> InventoryResult<()> {
    check_offer(a, offer_a)?;
    check_offer(b, offer_b)?;
    check_money(a, offer_a.money, offer_b.money)?;
    check_money(b, offer_b.money, offer_a.money)?;
    check_receiver(b, a, offer_a, offer_b)?;
    check_receiver(a, b, offer_b, offer_a)?;

    let to_b = take_offered(a, offer_a)?;
    let to_a = take_offered(b, offer_b)?;
    receive(b, to_b)?;
    receive(a, to_a)?;

    a.take_money(offer_a.money)?;
    b.take_money(offer_b.money)?;
    a.give_money(offer_b.money)?;
    b.give_money(offer_a.money)?;

    a.settle();
    b.settle();
    tracing::info!(
        a = ?a.profile().guid,
        b = ?b.profile().guid,
        items_a = offer_a.items.len(),
        items_b = offer_b.items.len(),
        "trade completed"
    );
    Ok(())
}

fn check_offer(player: &Player, offer: &TradeOffer) -> InventoryResult<()> {
    if offer.items.len() > TRADE_SLOT_TRADED_COUNT {
        return Err(InventoryError::CantDoThatRightNow);
    }
    for (index, &guid) in offer.items.iter().enumerate() {
        if offer.items[..index].contains(&guid) {
            return Err(InventoryError::ItemNotFound);
        }
        let item = player.store().get(guid).ok_or(InventoryError::ItemNotFound)?;
        let position = item.position().ok_or(InventoryError::ItemNotFound)?;
        if item.bound {
            return Err(InventoryError::NotOwner);
        }
        if item.loot_generated {
            return Err(InventoryError::LootGone);
        }
        if item.is_not_empty_bag() {
            return Err(InventoryError::DestroyNonemptyBag);
        }
        if item.parent.is_some() || item.child.is_some() || !position.is_inventory() {
            return Err(InventoryError::CantSwap);
        }
    }
    Ok(())
}

fn check_money(player: &Player, giving: Money, getting: Money) -> InventoryResult<()> {
    let left = player.wallet().money().checked_sub(giving).ok_or(InventoryError::NotEnoughMoney)?;
    left.add_capped(getting, player.config().max_money)?;
    Ok(())
}

fn check_receiver(receiver: &Player, giver: &Player, incoming: &TradeOffer, outgoing: &TradeOffer) -> InventoryResult<()> {
    let items: Vec<&Item> = incoming
        .items
        .iter()
        .filter_map(|guid| giver.store().get(*guid))
        .collect();
    receiver.planner().can_store_items(&items, &outgoing.items)
}

fn take_offered(player: &mut Player, offer: &TradeOffer) -> InventoryResult<Vec<Item>> {
    let mut taken = Vec::with_capacity(offer.items.len());
    for &guid in &offer.items {
        player.lift(guid)?;
        let item = player.store.detach(guid).ok_or(InventoryError::InternalInconsistency)?;
        player.timed_enchants.remove(&guid);
        player.events.push(InventoryEvent::ItemRemoved { item: guid });
        taken.push(item);
    }
    Ok(taken)
}

fn receive(player: &mut Player, items: Vec<Item>) -> InventoryResult<()> {
    let owner = player.profile().guid;
    for mut item in items {
        item.owner = owner;
        item.mark_changed();
        let guid = item.guid;
        let timed = item.enchantment(EnchantSlot::Temporary).is_some_and(|e| e.duration_ms > 0);
        let planned = player.planner().can_store(Anchor::Any, &item, false);
        match planned {
            Ok(plan) => {
                let stacks = player.place_detached(item, &plan, false, false)?;
                if timed && stacks.contains(&guid) {
                    player.timed_enchants.insert(guid);
                }
            }
            Err(rejection) => {
                tracing::error!(?guid, error = ?rejection.error, "validated trade item did not fit");
                player.mail(item);
            }
        }
    }
    Ok(())
}
