//! # Slot Topology
//!
//! [`Position`] is the typed form of a `(container, slot)` pair. The free
//! functions classify raw pairs exactly the way the wire format and storage
//! see them; the methods on [`Position`] answer the same questions for typed
//! positions and are what the engine uses internally.
//!
//! All of this is pure: no inventory state is consulted.

use serde::{Deserialize, Serialize};

use crate::constants::{
    EquipSlot, ACCOUNT_BANK_TAB_END, ACCOUNT_BANK_TAB_SLOTS, ACCOUNT_BANK_TAB_START,
    BANK_SLOT_BAG_END, BANK_SLOT_BAG_START, BANK_SLOT_ITEM_END, BANK_SLOT_ITEM_START,
    BUYBACK_SLOT_END, BUYBACK_SLOT_START, CHILD_EQUIPMENT_SLOT_END, CHILD_EQUIPMENT_SLOT_START,
    EQUIPMENT_SLOT_END, INVENTORY_SLOT_BAG_0, INVENTORY_SLOT_BAG_END, INVENTORY_SLOT_BAG_START,
    INVENTORY_SLOT_ITEM_END, INVENTORY_SLOT_ITEM_START, MAX_BAG_SIZE, NULL_BAG, NULL_SLOT,
    PROFESSION_SLOT_END, PROFESSION_SLOT_START, REAGENT_BAG_SLOT, REAGENT_BANK_SLOT_END,
    REAGENT_BANK_SLOT_START,
};

/// A concrete location in a character's slot space.
///
/// Indices inside each variant are zero-based offsets into that region, so
/// `Backpack(0)` is the first backpack slot regardless of its raw number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    /// An equipment slot.
    Equipment(EquipSlot),
    /// Ordinary bag slot `0..4`.
    BagSlot(u8),
    /// The crafting reagent bag slot.
    ReagentBagSlot,
    /// Backpack slot `0..16`.
    Backpack(u8),
    /// Bank slot `0..28`.
    Bank(u8),
    /// Bank bag slot `0..7`.
    BankBagSlot(u8),
    /// Reagent bank slot `0..98`.
    ReagentBank(u8),
    /// Buyback ring slot `0..12`.
    Buyback(u8),
    /// Child equipment slot `0..3`.
    ChildEquipment(u8),
    /// Profession gear slot `0..10`.
    ProfessionGear(u8),
    /// A slot inside the bag that sits at raw slot `container`.
    Bag {
        /// Raw slot of the bag (an inventory or bank bag slot).
        container: u8,
        /// Slot inside the bag.
        index: u8,
    },
    /// A slot in an account bank tab.
    AccountBank {
        /// Tab number `0..5`.
        tab: u8,
        /// Slot inside the tab.
        index: u8,
    },
}

/// Offset of `slot` inside `[start, end)`.
#[inline]
fn offset_in(slot: u8, start: u8, end: u8) -> Option<u8> {
    (start..end).contains(&slot).then(|| slot - start)
}

/// True if `container` names a bag slot (inventory or bank).
#[inline]
fn is_bag_container(container: u8) -> bool {
    (INVENTORY_SLOT_BAG_START..=REAGENT_BAG_SLOT).contains(&container)
        || (BANK_SLOT_BAG_START..BANK_SLOT_BAG_END).contains(&container)
}

impl Position {
    /// Parses a raw pair. Sentinels and unknown ranges yield `None`.
    #[must_use]
    pub fn from_raw(bag: u8, slot: u8) -> Option<Self> {
        if bag == NULL_BAG || slot == NULL_SLOT {
            return None;
        }
        if bag == INVENTORY_SLOT_BAG_0 {
            if let Some(eq) = EquipSlot::from_raw(slot) {
                return Some(Self::Equipment(eq));
            }
            if slot == REAGENT_BAG_SLOT {
                return Some(Self::ReagentBagSlot);
            }
            let ranges: [(u8, u8, fn(u8) -> Self); 8] = [
                (INVENTORY_SLOT_BAG_START, INVENTORY_SLOT_BAG_END, Self::BagSlot),
                (INVENTORY_SLOT_ITEM_START, INVENTORY_SLOT_ITEM_END, Self::Backpack),
                (BANK_SLOT_ITEM_START, BANK_SLOT_ITEM_END, Self::Bank),
                (BANK_SLOT_BAG_START, BANK_SLOT_BAG_END, Self::BankBagSlot),
                (BUYBACK_SLOT_START, BUYBACK_SLOT_END, Self::Buyback),
                (CHILD_EQUIPMENT_SLOT_START, CHILD_EQUIPMENT_SLOT_END, Self::ChildEquipment),
                (PROFESSION_SLOT_START, PROFESSION_SLOT_END, Self::ProfessionGear),
                (REAGENT_BANK_SLOT_START, REAGENT_BANK_SLOT_END, Self::ReagentBank),
            ];
            return ranges
                .iter()
                .find_map(|&(start, end, ctor)| offset_in(slot, start, end).map(ctor));
        }
        if is_bag_container(bag) {
            return (slot < MAX_BAG_SIZE).then_some(Self::Bag { container: bag, index: slot });
        }
        if let Some(tab) = offset_in(bag, ACCOUNT_BANK_TAB_START, ACCOUNT_BANK_TAB_END) {
            return (slot < ACCOUNT_BANK_TAB_SLOTS).then_some(Self::AccountBank { tab, index: slot });
        }
        None
    }

    /// Returns the raw `(bag, slot)` pair.
    #[must_use]
    pub const fn to_raw(self) -> (u8, u8) {
        match self {
            Self::Equipment(slot) => (INVENTORY_SLOT_BAG_0, slot.raw()),
            Self::BagSlot(i) => (INVENTORY_SLOT_BAG_0, INVENTORY_SLOT_BAG_START + i),
            Self::ReagentBagSlot => (INVENTORY_SLOT_BAG_0, REAGENT_BAG_SLOT),
            Self::Backpack(i) => (INVENTORY_SLOT_BAG_0, INVENTORY_SLOT_ITEM_START + i),
            Self::Bank(i) => (INVENTORY_SLOT_BAG_0, BANK_SLOT_ITEM_START + i),
            Self::BankBagSlot(i) => (INVENTORY_SLOT_BAG_0, BANK_SLOT_BAG_START + i),
            Self::ReagentBank(i) => (INVENTORY_SLOT_BAG_0, REAGENT_BANK_SLOT_START + i),
            Self::Buyback(i) => (INVENTORY_SLOT_BAG_0, BUYBACK_SLOT_START + i),
            Self::ChildEquipment(i) => (INVENTORY_SLOT_BAG_0, CHILD_EQUIPMENT_SLOT_START + i),
            Self::ProfessionGear(i) => (INVENTORY_SLOT_BAG_0, PROFESSION_SLOT_START + i),
            Self::Bag { container, index } => (container, index),
            Self::AccountBank { tab, index } => (ACCOUNT_BANK_TAB_START + tab, index),
        }
    }

    /// Position of the slot a bag occupies, given its raw container id.
    #[must_use]
    pub fn bag_holder(container: u8) -> Option<Self> {
        match Self::from_raw(INVENTORY_SLOT_BAG_0, container)? {
            pos @ (Self::BagSlot(_) | Self::ReagentBagSlot | Self::BankBagSlot(_)) => Some(pos),
            _ => None,
        }
    }

    /// Raw container id of the bag sitting at this position, if this is a bag slot.
    #[must_use]
    pub const fn as_container(self) -> Option<u8> {
        match self {
            Self::BagSlot(_) | Self::ReagentBagSlot | Self::BankBagSlot(_) => Some(self.to_raw().1),
            _ => None,
        }
    }

    /// Worn gear and equipped bag slots: moving an item here equips it.
    #[must_use]
    pub const fn is_equipment(self) -> bool {
        matches!(
            self,
            Self::Equipment(_) | Self::BagSlot(_) | Self::ReagentBagSlot | Self::ProfessionGear(_)
        )
    }

    /// Carried storage: backpack, equipped bag contents, child equipment.
    #[must_use]
    pub const fn is_inventory(self) -> bool {
        match self {
            Self::Backpack(_) | Self::ChildEquipment(_) => true,
            Self::Bag { container, .. } => {
                container >= INVENTORY_SLOT_BAG_START && container <= REAGENT_BAG_SLOT
            }
            _ => false,
        }
    }

    /// Bank storage, bank bag slots and bank bag contents, reagent bank.
    #[must_use]
    pub const fn is_bank(self) -> bool {
        match self {
            Self::Bank(_) | Self::BankBagSlot(_) | Self::ReagentBank(_) => true,
            Self::Bag { container, .. } => {
                container >= BANK_SLOT_BAG_START && container < BANK_SLOT_BAG_END
            }
            _ => false,
        }
    }

    /// A slot that holds a bag.
    #[must_use]
    pub const fn is_bag_slot(self) -> bool {
        matches!(self, Self::BagSlot(_) | Self::ReagentBagSlot | Self::BankBagSlot(_))
    }

    /// Child equipment slot.
    #[must_use]
    pub const fn is_child_equipment(self) -> bool {
        matches!(self, Self::ChildEquipment(_))
    }

    /// Account bank tab slot.
    #[must_use]
    pub const fn is_account_bank(self) -> bool {
        matches!(self, Self::AccountBank { .. })
    }

    /// Equipment slot, if this is one.
    #[must_use]
    pub const fn equip_slot(self) -> Option<EquipSlot> {
        match self {
            Self::Equipment(slot) => Some(slot),
            _ => None,
        }
    }
}

/// Equipment, equipped bag and profession gear slots.
#[must_use]
pub fn is_equipment_pos(bag: u8, slot: u8) -> bool {
    bag == INVENTORY_SLOT_BAG_0
        && (slot < EQUIPMENT_SLOT_END
            || (INVENTORY_SLOT_BAG_START..=REAGENT_BAG_SLOT).contains(&slot)
            || (PROFESSION_SLOT_START..PROFESSION_SLOT_END).contains(&slot))
}

/// Backpack, equipped bag contents, child equipment, or the "any slot" wildcard.
#[must_use]
pub fn is_inventory_pos(bag: u8, slot: u8) -> bool {
    if bag == INVENTORY_SLOT_BAG_0 && slot == NULL_SLOT {
        return true;
    }
    if bag == INVENTORY_SLOT_BAG_0 {
        return (INVENTORY_SLOT_ITEM_START..INVENTORY_SLOT_ITEM_END).contains(&slot)
            || (CHILD_EQUIPMENT_SLOT_START..CHILD_EQUIPMENT_SLOT_END).contains(&slot);
    }
    (INVENTORY_SLOT_BAG_START..=REAGENT_BAG_SLOT).contains(&bag)
}

/// Bank, bank bag slots, bank bag contents and reagent bank.
#[must_use]
pub fn is_bank_pos(bag: u8, slot: u8) -> bool {
    if bag == INVENTORY_SLOT_BAG_0 {
        return (BANK_SLOT_ITEM_START..BANK_SLOT_ITEM_END).contains(&slot)
            || (BANK_SLOT_BAG_START..BANK_SLOT_BAG_END).contains(&slot)
            || (REAGENT_BANK_SLOT_START..REAGENT_BANK_SLOT_END).contains(&slot);
    }
    (BANK_SLOT_BAG_START..BANK_SLOT_BAG_END).contains(&bag)
}

/// Slots that hold bags (inventory and bank).
#[must_use]
pub fn is_bag_pos(bag: u8, slot: u8) -> bool {
    bag == INVENTORY_SLOT_BAG_0
        && ((INVENTORY_SLOT_BAG_START..=REAGENT_BAG_SLOT).contains(&slot)
            || (BANK_SLOT_BAG_START..BANK_SLOT_BAG_END).contains(&slot))
}

/// Child equipment slots.
#[must_use]
pub fn is_child_equipment_pos(bag: u8, slot: u8) -> bool {
    bag == INVENTORY_SLOT_BAG_0
        && (CHILD_EQUIPMENT_SLOT_START..CHILD_EQUIPMENT_SLOT_END).contains(&slot)
}

/// Account bank tab slots.
#[must_use]
pub fn is_account_bank_pos(bag: u8, slot: u8) -> bool {
    (ACCOUNT_BANK_TAB_START..ACCOUNT_BANK_TAB_END).contains(&bag) && slot < ACCOUNT_BANK_TAB_SLOTS
}

/// Reagent bank slots.
#[must_use]
pub fn is_reagent_bank_pos(bag: u8, slot: u8) -> bool {
    bag == INVENTORY_SLOT_BAG_0 && (REAGENT_BANK_SLOT_START..REAGENT_BANK_SLOT_END).contains(&slot)
}

/// Buyback ring slots.
#[must_use]
pub fn is_buyback_pos(bag: u8, slot: u8) -> bool {
    bag == INVENTORY_SLOT_BAG_0 && (BUYBACK_SLOT_START..BUYBACK_SLOT_END).contains(&slot)
}

/// Profession gear slots.
#[must_use]
pub fn is_profession_gear_pos(bag: u8, slot: u8) -> bool {
    bag == INVENTORY_SLOT_BAG_0 && (PROFESSION_SLOT_START..PROFESSION_SLOT_END).contains(&slot)
}

/// Any recognised region, or a wildcard when `explicit_pos` is false.
#[must_use]
pub fn is_valid_pos(bag: u8, slot: u8, explicit_pos: bool) -> bool {
    if bag == NULL_BAG {
        return !explicit_pos;
    }
    if slot == NULL_SLOT {
        return !explicit_pos && (bag == INVENTORY_SLOT_BAG_0 || is_bag_container(bag));
    }
    Position::from_raw(bag, slot).is_some()
}
