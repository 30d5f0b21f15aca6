//! # Swaps
//!
//! Moving the item at one position onto another. [`Player::swap_item`]
//! resolves the request into a [`SwapPlan`] with every legality check done,
//! then executes it. The four shapes are:
//!
//! - **Move**: the destination is empty.
//! - **Merge**: same template, the destination stack has room.
//! - **Exchange**: both items trade places, each checked in the other's slot.
//! - **Bag contents**: a full bag in a bag slot and an empty bag elsewhere.
//!   The contents move into the empty bag, which takes the bag slot.

use gearhold_shared::{EquipSlot, ItemGuid, Position};

use crate::error::{InventoryError, InventoryResult};
use crate::events::InventoryEvent;
use crate::item::{Item, ItemState};
use crate::planner::{Anchor, BankTarget, Placement, Planner};
use crate::player::Player;

const OFF_HAND: Position = Position::Equipment(EquipSlot::OffHand);

/// A validated swap.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SwapPlan {
    Move {
        item: ItemGuid,
    },
    Merge {
        from: ItemGuid,
        into: ItemGuid,
        count: u32,
    },
    Exchange {
        first: ItemGuid,
        second: ItemGuid,
    },
    BagContents {
        full: ItemGuid,
        empty: ItemGuid,
        contents: Vec<ItemGuid>,
    },
}

/// Bank a position belongs to, if any.
pub(crate) const fn bank_target(position: Position) -> Option<BankTarget> {
    match position {
        Position::ReagentBank(_) => Some(BankTarget::Reagent),
        Position::AccountBank { .. } => Some(BankTarget::Account),
        _ if position.is_bank() => Some(BankTarget::Character),
        _ => None,
    }
}

/// Plans `item` into exactly `position`, a non-equipment slot.
pub(crate) fn plan_at(planner: &Planner<'_>, item: &Item, position: Position, swap: bool) -> InventoryResult<Vec<Placement>> {
    let anchor = Anchor::Slot(position);
    let plan = match bank_target(position) {
        Some(target) => planner.can_bank(target, anchor, item, swap)?,
        None => planner.can_store(anchor, item, swap)?,
    };
    if plan.iter().any(|placement| placement.position != position) {
        let occupied = planner.store.item_at(position).is_some();
        return Err(match (swap, occupied) {
            (true, _) => InventoryError::CantSwap,
            (false, true) => InventoryError::ItemCantStack,
            (false, false) => InventoryError::WrongSlot,
        });
    }
    Ok(plan)
}

/// Checks that `item` may be put at `position` as a whole.
fn check_lands_at(planner: &Planner<'_>, item: &Item, position: Position, swap: bool) -> InventoryResult<()> {
    if position.is_equipment() {
        let slot = planner.can_equip(Some(position), item, swap)?;
        return if slot == position {
            Ok(())
        } else {
            Err(InventoryError::WrongSlot)
        };
    }
    plan_at(planner, item, position, swap).map(|_| ())
}

/// True if `position` is a slot inside the bag sitting at `bag`.
fn is_inside(position: Position, bag: Position) -> bool {
    match (position, bag.as_container()) {
        (Position::Bag { container, .. }, Some(holder)) => container == holder,
        _ => false,
    }
}

impl Player {
    /// Moves the item at `source` onto `destination`: into an empty slot,
    /// onto a compatible stack, or in exchange for the item there.
    ///
    /// Nothing changes unless every check passes. Failures are also queued as
    /// an equip error event.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` for an empty source, `CantSwap` for buyback slots,
    /// `BagInBag` when one end lies inside the other, `LootGone`, and the
    /// first failing unequip, equip or placement rule.
    pub fn swap_item(&mut self, source: Position, destination: Position) -> InventoryResult<()> {
        if source == destination {
            return Ok(());
        }
        let plan = match self.plan_swap(source, destination) {
            Ok(plan) => plan,
            Err(error) => {
                let item = self.store.guid_at(source);
                let other = self.store.guid_at(destination);
                tracing::debug!(?source, ?destination, ?error, "swap rejected");
                self.events.equip_error(error, item, other);
                return Err(error);
            }
        };
        tracing::debug!(?source, ?destination, ?plan, "swap");
        self.execute_swap(source, destination, plan)?;
        self.settle();
        Ok(())
    }

    fn plan_swap(&self, source: Position, destination: Position) -> InventoryResult<SwapPlan> {
        if matches!(source, Position::Buyback(_)) || matches!(destination, Position::Buyback(_)) {
            return Err(InventoryError::CantSwap);
        }
        let first = self.store.item_at(source).ok_or(InventoryError::ItemNotFound)?;
        if first.loot_generated {
            return Err(InventoryError::LootGone);
        }
        if is_inside(destination, source) {
            return Err(InventoryError::BagInBag);
        }
        let planner = self.planner();

        let Some(second) = self.store.item_at(destination) else {
            planner.can_unequip(source, false)?;
            check_lands_at(&planner, first, destination, false)?;
            return Ok(SwapPlan::Move { item: first.guid });
        };
        if is_inside(source, destination) {
            return Err(InventoryError::BagInBag);
        }
        if second.loot_generated {
            return Err(InventoryError::LootGone);
        }
        if first.is_bound_not_with(self.profile.guid) || second.is_bound_not_with(self.profile.guid) {
            return Err(InventoryError::NotOwner);
        }
        let template = self.catalog.template(first.entry).ok_or(InventoryError::ItemNotFound)?;

        if first.entry == second.entry && template.stack_size() > 1 && second.count < template.stack_size() {
            let count = first.count.min(template.stack_size() - second.count);
            planner.can_unequip(source, count < first.count)?;
            return Ok(SwapPlan::Merge {
                from: first.guid,
                into: second.guid,
                count,
            });
        }

        // Only a bag headed for a bag slot may take over another bag's contents.
        let bag_swap = match (first.is_not_empty_bag(), second.is_not_empty_bag()) {
            (true, false) if second.is_bag() && !destination.is_bag_slot() => Some((first, source, second, destination)),
            (false, true) if first.is_bag() && !source.is_bag_slot() => Some((second, destination, first, source)),
            _ => None,
        };
        if let Some((full, full_at, empty, empty_at)) = bag_swap {
            let contents = self.check_bag_contents(&planner, full, empty)?;
            planner.can_unequip(full_at, true)?;
            planner.can_unequip(empty_at, true)?;
            check_lands_at(&planner, empty, full_at, true)?;
            let mut emptied = full.clone();
            emptied.contents_mut().fill(None);
            check_lands_at(&planner, &emptied, empty_at, true)?;
            return Ok(SwapPlan::BagContents {
                full: full.guid,
                empty: empty.guid,
                contents,
            });
        }

        planner.can_unequip(source, true)?;
        planner.can_unequip(destination, true)?;
        check_lands_at(&planner, first, destination, true)?;
        check_lands_at(&planner, second, source, true)?;
        Ok(SwapPlan::Exchange {
            first: first.guid,
            second: second.guid,
        })
    }

    /// Contents of `full` in slot order, once they are known to fit `empty`.
    fn check_bag_contents(&self, planner: &Planner<'_>, full: &Item, empty: &Item) -> InventoryResult<Vec<ItemGuid>> {
        let contents: Vec<ItemGuid> = full.contents().iter().flatten().copied().collect();
        if contents.len() > empty.contents().len() {
            return Err(InventoryError::BagFull);
        }
        let spec = planner.container_spec(empty)?;
        for guid in &contents {
            let accepted = self
                .store
                .get(*guid)
                .and_then(|item| self.catalog.template(item.entry))
                .is_some_and(|template| spec.accepts(template));
            if !accepted {
                return Err(InventoryError::WrongBagType);
            }
        }
        Ok(contents)
    }

    fn execute_swap(&mut self, source: Position, destination: Position, plan: SwapPlan) -> InventoryResult<()> {
        match plan {
            SwapPlan::Move { item } => {
                self.move_to(item, destination)?;
                self.after_move(item, destination)?;
            }
            SwapPlan::Merge { from, into, count } => {
                let stack = self.store.get_mut(into).ok_or(InventoryError::InternalInconsistency)?;
                stack.count += count;
                stack.mark_changed();
                self.pushed(destination, into, count, false, false);
                let left = {
                    let item = self.store.get_mut(from).ok_or(InventoryError::InternalInconsistency)?;
                    item.count -= count;
                    item.mark_changed();
                    item.count
                };
                if left == 0 {
                    self.lift(from)?;
                    let mut item = self.store.detach(from).ok_or(InventoryError::InternalInconsistency)?;
                    item.state = ItemState::Removed;
                    self.timed_enchants.remove(&from);
                    self.events.push(InventoryEvent::ItemRemoved { item: from });
                } else {
                    self.events.push(InventoryEvent::ItemCountChanged { item: from, count: left });
                }
            }
            SwapPlan::Exchange { first, second } => {
                self.lift(first)?;
                self.lift(second)?;
                self.relink(first, destination)?;
                self.relink(second, source)?;
                self.after_move(first, destination)?;
                self.after_move(second, source)?;
            }
            SwapPlan::BagContents { full, empty, contents } => {
                let full_at = self.store.get(full).and_then(Item::position).ok_or(InventoryError::InternalInconsistency)?;
                let empty_at = self.store.get(empty).and_then(Item::position).ok_or(InventoryError::InternalInconsistency)?;
                for &content in &contents {
                    self.lift(content)?;
                }
                self.lift(full)?;
                self.lift(empty)?;
                self.relink(empty, full_at)?;
                self.relink(full, empty_at)?;
                let container = full_at.as_container().ok_or(InventoryError::InternalInconsistency)?;
                for (index, &content) in contents.iter().enumerate() {
                    let index = u8::try_from(index).map_err(|_| InventoryError::InternalInconsistency)?;
                    self.relink(content, Position::Bag { container, index })?;
                }
                self.after_move(empty, full_at)?;
                self.after_move(full, empty_at)?;
            }
        }
        Ok(())
    }

    /// Links an unplaced item and runs the placement hook.
    fn relink(&mut self, guid: ItemGuid, position: Position) -> InventoryResult<()> {
        self.store.link(guid, position)?;
        self.on_placed(guid, position);
        let count = self.store.get(guid).map_or(0, |item| item.count);
        self.pushed(position, guid, count, false, false);
        Ok(())
    }

    fn after_move(&mut self, guid: ItemGuid, position: Position) -> InventoryResult<()> {
        if position.is_equipment() {
            self.after_equip(guid, position)
        } else {
            self.relocate_child(guid)
        }
    }

    /// Equips an item into the best slot for it, exchanging with whatever
    /// is there.
    ///
    /// # Errors
    ///
    /// The equip rules, or the swap's checks for the displaced item.
    pub fn auto_equip_item(&mut self, guid: ItemGuid) -> InventoryResult<Position> {
        let item = self.store.get(guid).ok_or(InventoryError::ItemNotFound)?;
        let source = item.position().ok_or(InventoryError::ItemNotFound)?;
        let destination = self.planner().can_equip(None, item, true)?;
        self.swap_item(source, destination)?;
        Ok(destination)
    }

    /// Takes the off hand item off when a two-hander (without titan grip)
    /// makes it illegal. It goes to the inventory, or the mail if full.
    ///
    /// Returns true if something was moved.
    ///
    /// # Errors
    ///
    /// `InternalInconsistency` if the store is corrupt.
    pub fn auto_unequip_offhand_if_needed(&mut self) -> InventoryResult<bool> {
        let Some(off_hand) = self.store.item_at(OFF_HAND) else {
            return Ok(false);
        };
        let planner = self.planner();
        let off_hand_two_handed = planner
            .template(off_hand.entry)
            .is_some_and(|template| template.is_two_handed());
        let illegal = planner.is_two_hand_used() || (off_hand_two_handed && !self.profile.can_titan_grip);
        if !illegal {
            return Ok(false);
        }
        let guid = off_hand.guid;
        tracing::debug!(?guid, "off hand freed for a two-hander");
        self.stow_or_mail(guid)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{ModLayer, UnitMod};
    use crate::test_support::*;

    fn snapshot(player: &Player) -> Vec<(Position, Item)> {
        player.store().iter_placed().map(|(p, item)| (p, item.clone())).collect()
    }

    #[test]
    fn test_move_to_empty_slot() {
        let mut player = player();
        player.store_new_item(Anchor::Any, CLOTH, 5).unwrap();
        player.swap_item(Position::Backpack(0), Position::Backpack(9)).unwrap();
        assert!(player.store().item_at(Position::Backpack(0)).is_none());
        assert_eq!(player.store().item_at(Position::Backpack(9)).unwrap().count, 5);
    }

    #[test]
    fn test_merge_full_and_partial() {
        let mut player = player();
        player.store_new_item(Anchor::Any, CLOTH, 20).unwrap();
        player.split_item(Position::Backpack(0), Position::Backpack(1), 8).unwrap();
        player.split_item(Position::Backpack(0), Position::Backpack(2), 8).unwrap();
        // 4, 8, 8
        player.swap_item(Position::Backpack(0), Position::Backpack(1)).unwrap();
        assert!(player.store().item_at(Position::Backpack(0)).is_none());
        assert_eq!(player.store().item_at(Position::Backpack(1)).unwrap().count, 12);

        player.swap_item(Position::Backpack(1), Position::Backpack(2)).unwrap();
        assert_eq!(player.store().item_at(Position::Backpack(2)).unwrap().count, 20);
        assert!(player.store().item_at(Position::Backpack(1)).is_none());
        assert_eq!(player.store().count_item(CLOTH, true, None), 20);
        player.store().verify_consistency().unwrap();
    }

    #[test]
    fn test_exchange_equipped_and_stored() {
        let mut player = player();
        let shield = player.equip_new_item(None, SHIELD).unwrap();
        let sword = player.store_new_item(Anchor::Any, SWORD, 1).unwrap()[0];
        let stored_at = player.store().get(sword).unwrap().position().unwrap();

        // Without dual wield a one-hander only resolves to the main hand.
        let before = snapshot(&player);
        let stats = player.stats().clone();
        assert_eq!(
            player.swap_item(stored_at, Position::Equipment(EquipSlot::OffHand)),
            Err(InventoryError::WrongSlot)
        );
        assert_eq!(snapshot(&player), before);
        assert_eq!(player.stats(), &stats);

        let helm = player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0];
        let helm_at = player.store().get(helm).unwrap().position().unwrap();
        assert!(player.swap_item(helm_at, Position::Equipment(EquipSlot::OffHand)).is_err());
        assert_eq!(player.store().get(shield).unwrap().position(), Some(Position::Equipment(EquipSlot::OffHand)));
    }

    #[test]
    fn test_exchange_two_backpack_items() {
        let mut player = player();
        let cloth = player.store_new_item(Anchor::Any, CLOTH, 3).unwrap()[0];
        let helm = player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0];
        player.swap_item(Position::Backpack(0), Position::Backpack(1)).unwrap();
        assert_eq!(player.store().guid_at(Position::Backpack(0)), Some(helm));
        assert_eq!(player.store().guid_at(Position::Backpack(1)), Some(cloth));
    }

    #[test]
    fn test_bag_contents_move_into_empty_bag() {
        let mut player = player();
        let pouch = player.equip_new_item(None, POUCH).unwrap();
        for _ in 0..16 {
            player.store_new_item(Anchor::Any, HELM, 1).unwrap();
        }
        player.store_new_item(Anchor::Container(Position::BagSlot(0).to_raw().1), CLOTH, 4).unwrap();
        let helm = player.store().guid_at(Position::Backpack(3)).unwrap();
        player.destroy_item(helm).unwrap();
        let big = player.store_new_item(Anchor::Any, BIG_BAG, 1).unwrap()[0];
        assert_eq!(player.store().get(big).unwrap().position(), Some(Position::Backpack(3)));

        player.swap_item(Position::BagSlot(0), Position::Backpack(3)).unwrap();
        assert_eq!(player.store().guid_at(Position::BagSlot(0)), Some(big));
        assert_eq!(player.store().get(pouch).unwrap().position(), Some(Position::Backpack(3)));
        assert!(!player.store().get(pouch).unwrap().is_not_empty_bag());
        assert_eq!(player.store().get(big).unwrap().free_bag_slots(), 15);
        assert_eq!(player.store().count_item(CLOTH, true, None), 4);
        player.store().verify_consistency().unwrap();
    }

    #[test]
    fn test_bag_into_itself_rejected() {
        let mut player = player();
        player.equip_new_item(None, POUCH).unwrap();
        let inside = Position::Bag {
            container: Position::BagSlot(0).to_raw().1,
            index: 1,
        };
        assert_eq!(player.swap_item(Position::BagSlot(0), inside), Err(InventoryError::BagInBag));
        assert!(matches!(
            player.events().pending().last(),
            Some(InventoryEvent::EquipError {
                error: InventoryError::BagInBag,
                ..
            })
        ));
    }

    #[test]
    fn test_auto_equip_exchanges_with_worn_item() {
        let mut player = player();
        let first = player.equip_new_item(None, HELM).unwrap();
        let second = player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0];
        let from = player.store().get(second).unwrap().position().unwrap();

        assert_eq!(player.auto_equip_item(second), Ok(Position::Equipment(EquipSlot::Head)));
        assert_eq!(player.store().get(first).unwrap().position(), Some(from));
        assert_eq!(player.stats().unit_mod(UnitMod::Stamina, ModLayer::BaseFlat), 10);
    }

    #[test]
    fn test_two_hander_frees_off_hand_or_mails() {
        let mut player = player();
        player.equip_new_item(None, SHIELD).unwrap();
        let greatsword = player.store_new_item(Anchor::Any, GREATSWORD, 1).unwrap()[0];
        player.equip_item(None, greatsword).unwrap();
        assert!(player.store().equipped(EquipSlot::OffHand).is_none());
        assert_eq!(player.store().count_item(SHIELD, true, None), 1);
        assert!(!player.auto_unequip_offhand_if_needed().unwrap());
    }

    #[test]
    fn test_bank_target_by_region() {
        assert_eq!(bank_target(Position::Backpack(0)), None);
        assert_eq!(bank_target(Position::Bank(3)), Some(BankTarget::Character));
        assert_eq!(bank_target(Position::ReagentBank(0)), Some(BankTarget::Reagent));
        assert_eq!(bank_target(Position::AccountBank { tab: 0, index: 2 }), Some(BankTarget::Account));
    }
}
