//! # Loot
//!
//! A loot window as the looter sees it, and moving its contents into the
//! inventory. Slots are only marked taken once their units are placed.

use gearhold_shared::{CharacterGuid, CurrencyId, ItemGuid, ItemId};

use crate::error::{InventoryError, InventoryResult};
use crate::events::InventoryEvent;
use crate::money::Money;
use crate::planner::Anchor;
use crate::player::Player;

/// One item slot of a loot window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LootItem {
    /// Template.
    pub entry: ItemId,
    /// Units.
    pub count: u32,
    /// Already looted.
    pub taken: bool,
    /// Locked while a group roll runs.
    pub blocked: bool,
    /// Winner of a finished roll, if it was rolled for.
    pub roll_winner: Option<CharacterGuid>,
}

impl LootItem {
    /// An untaken slot free for anyone.
    #[must_use]
    pub const fn new(entry: ItemId, count: u32) -> Self {
        Self {
            entry,
            count,
            taken: false,
            blocked: false,
            roll_winner: None,
        }
    }

    fn check_lootable(&self, looter: CharacterGuid) -> InventoryResult<()> {
        if self.taken {
            return Err(InventoryError::LootGone);
        }
        if self.blocked {
            return Err(InventoryError::CantDoThatRightNow);
        }
        if self.roll_winner.is_some_and(|winner| winner != looter) {
            return Err(InventoryError::NotOwner);
        }
        Ok(())
    }
}

/// Contents of an opened corpse or container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LootWindow {
    /// Item slots.
    pub items: Vec<LootItem>,
    /// Money left in the window.
    pub money: Money,
    /// Currencies left in the window.
    pub currencies: Vec<(CurrencyId, u32)>,
}

impl LootWindow {
    /// Empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item slot.
    #[must_use]
    pub fn with_item(mut self, entry: ItemId, count: u32) -> Self {
        self.items.push(LootItem::new(entry, count));
        self
    }

    /// Sets the money.
    #[must_use]
    pub const fn with_money(mut self, money: Money) -> Self {
        self.money = money;
        self
    }

    /// Adds a currency.
    #[must_use]
    pub fn with_currency(mut self, currency: CurrencyId, count: u32) -> Self {
        self.currencies.push((currency, count));
        self
    }

    /// True once nothing is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.money.is_zero() && self.currencies.is_empty() && self.items.iter().all(|item| item.taken)
    }
}

impl Player {
    /// Moves loot slot `slot` into the inventory.
    ///
    /// A failed placement leaves the slot in the window and is queued as an
    /// equip error.
    ///
    /// # Errors
    ///
    /// `LootGone` for a missing or taken slot, `CantDoThatRightNow` while it
    /// is rolled for, `NotOwner` when someone else won it, and the placement
    /// result.
    pub fn store_loot_item(&mut self, loot: &mut LootWindow, slot: u8, anchor: Anchor) -> InventoryResult<Vec<ItemGuid>> {
        let item = loot.items.get(usize::from(slot)).ok_or(InventoryError::LootGone)?;
        item.check_lootable(self.profile.guid)?;
        let (entry, count) = (item.entry, item.count);
        let plan = match self.planner().can_store_new(anchor, entry, count) {
            Ok(plan) => plan,
            Err(rejection) => {
                tracing::debug!(entry, count, error = ?rejection.error, "loot does not fit");
                self.events.equip_error(rejection.error, None, None);
                return Err(rejection.error);
            }
        };
        let stacks = self.store_new_item_planned(entry, count, &plan, true)?;
        if let Some(item) = loot.items.get_mut(usize::from(slot)) {
            item.taken = true;
        }
        self.events.push(InventoryEvent::LootRemoved { slot });
        self.settle();
        Ok(stacks)
    }

    /// Loots every slot that fits, skipping the rest. Returns how many slots
    /// were taken.
    pub fn auto_store_loot(&mut self, loot: &mut LootWindow, anchor: Anchor) -> usize {
        let looter = self.profile.guid;
        let slots: Vec<u8> = (0u8..)
            .zip(&loot.items)
            .filter(|(_, item)| item.check_lootable(looter).is_ok())
            .map(|(slot, _)| slot)
            .collect();
        slots
            .into_iter()
            .filter(|&slot| self.store_loot_item(loot, slot, anchor).is_ok())
            .count()
    }

    /// Takes the window's money and currencies.
    ///
    /// # Errors
    ///
    /// `TooMuchGold`; the money stays in the window, currencies are still
    /// taken.
    pub fn loot_money(&mut self, loot: &mut LootWindow) -> InventoryResult<Money> {
        for (currency, count) in loot.currencies.drain(..) {
            self.wallet.add_currency(currency, count);
        }
        let money = loot.money;
        if money.is_zero() {
            return Ok(money);
        }
        self.give_money(money)?;
        loot.money = Money::ZERO;
        Ok(money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn test_store_loot_item_marks_taken() {
        let mut player = player();
        let mut loot = LootWindow::new().with_item(CLOTH, 7).with_item(HELM, 1);

        player.store_loot_item(&mut loot, 0, Anchor::Any).unwrap();
        assert!(loot.items[0].taken);
        assert_eq!(player.store().count_item(CLOTH, true, None), 7);
        assert!(player.events().pending().contains(&InventoryEvent::LootRemoved { slot: 0 }));
        assert!(player.events().pending().iter().any(|event| matches!(
            event,
            InventoryEvent::ItemPushed { from_loot: true, created: true, count: 7, .. }
        )));

        assert_eq!(player.store_loot_item(&mut loot, 0, Anchor::Any), Err(InventoryError::LootGone));
        assert_eq!(player.store_loot_item(&mut loot, 9, Anchor::Any), Err(InventoryError::LootGone));
    }

    #[test]
    fn test_roll_gates() {
        let mut player = player();
        let mut loot = LootWindow::new().with_item(HELM, 1).with_item(HELM, 1);
        loot.items[0].blocked = true;
        loot.items[1].roll_winner = Some(CharacterGuid(99));
        assert_eq!(
            player.store_loot_item(&mut loot, 0, Anchor::Any),
            Err(InventoryError::CantDoThatRightNow)
        );
        assert_eq!(player.store_loot_item(&mut loot, 1, Anchor::Any), Err(InventoryError::NotOwner));
        assert_eq!(player.auto_store_loot(&mut loot, Anchor::Any), 0);
    }

    #[test]
    fn test_auto_store_loot_leaves_what_does_not_fit() {
        let mut player = player();
        for _ in 0..15 {
            player.store_new_item(Anchor::Any, HELM, 1).unwrap();
        }
        let mut loot = LootWindow::new().with_item(SWORD, 1).with_item(SHIELD, 1);
        assert_eq!(player.auto_store_loot(&mut loot, Anchor::Any), 1);
        assert!(loot.items[0].taken);
        assert!(!loot.items[1].taken);
        assert!(!loot.is_empty());
    }

    #[test]
    fn test_loot_money_respects_cap() {
        let mut player = player();
        let cap = player.config().max_money;
        let mut loot = LootWindow::new().with_money(Money::from_copper(50)).with_currency(3, 2);
        player.give_money(cap.saturating_sub(Money::from_copper(10))).unwrap();

        assert_eq!(player.loot_money(&mut loot), Err(InventoryError::TooMuchGold));
        assert_eq!(loot.money, Money::from_copper(50));
        assert_eq!(player.wallet().currency(3), 2);

        player.take_money(Money::from_copper(100)).unwrap();
        assert_eq!(player.loot_money(&mut loot), Ok(Money::from_copper(50)));
        assert!(loot.is_empty());
    }
}
