//! # Slot Space Constants
//!
//! Raw layout of the character slot space.
//!
//! **CRITICAL:** These values are shared with the client and the storage
//! schema. Changing a range invalidates every saved inventory.
//!
//! ```text
//! container 0 (the character itself)
//!   0..19    equipment
//!   19..23   bag slots           23       reagent bag slot
//!   24..40   backpack
//!   40..68   bank                68..75   bank bag slots
//!   75..87   buyback ring
//!   87..90   child equipment
//!   90..100  profession gear
//!   100..198 reagent bank
//! container 19..24, 68..75   the bag sitting in that slot
//! container 200..205         account bank tabs
//! ```

use serde::{Deserialize, Serialize};

/// The character's own slot space.
pub const INVENTORY_SLOT_BAG_0: u8 = 0;

/// Wildcard container ("any bag").
pub const NULL_BAG: u8 = 255;

/// Wildcard slot ("any free slot").
pub const NULL_SLOT: u8 = 255;

// =============================================================================
// CONTAINER 0 RANGES (half-open)
// =============================================================================

/// First equipment slot.
pub const EQUIPMENT_SLOT_START: u8 = 0;
/// One past the last equipment slot.
pub const EQUIPMENT_SLOT_END: u8 = 19;

/// First ordinary bag slot.
pub const INVENTORY_SLOT_BAG_START: u8 = 19;
/// One past the last ordinary bag slot.
pub const INVENTORY_SLOT_BAG_END: u8 = 23;
/// The crafting reagent bag slot.
pub const REAGENT_BAG_SLOT: u8 = 23;

/// First backpack slot.
pub const INVENTORY_SLOT_ITEM_START: u8 = 24;
/// One past the last backpack slot.
pub const INVENTORY_SLOT_ITEM_END: u8 = 40;

/// First bank slot.
pub const BANK_SLOT_ITEM_START: u8 = 40;
/// One past the last bank slot.
pub const BANK_SLOT_ITEM_END: u8 = 68;

/// First bank bag slot.
pub const BANK_SLOT_BAG_START: u8 = 68;
/// One past the last bank bag slot.
pub const BANK_SLOT_BAG_END: u8 = 75;

/// First buyback slot.
pub const BUYBACK_SLOT_START: u8 = 75;
/// One past the last buyback slot.
pub const BUYBACK_SLOT_END: u8 = 87;

/// First child equipment slot.
pub const CHILD_EQUIPMENT_SLOT_START: u8 = 87;
/// One past the last child equipment slot.
pub const CHILD_EQUIPMENT_SLOT_END: u8 = 90;

/// First profession gear slot.
pub const PROFESSION_SLOT_START: u8 = 90;
/// One past the last profession gear slot.
pub const PROFESSION_SLOT_END: u8 = 100;

/// First reagent bank slot.
pub const REAGENT_BANK_SLOT_START: u8 = 100;
/// One past the last reagent bank slot.
pub const REAGENT_BANK_SLOT_END: u8 = 198;

/// One past the last valid slot of container 0.
pub const PLAYER_SLOT_END: u8 = REAGENT_BANK_SLOT_END;

// =============================================================================
// CONTAINER IDS
// =============================================================================

/// First account bank tab container id.
pub const ACCOUNT_BANK_TAB_START: u8 = 200;
/// One past the last account bank tab container id.
pub const ACCOUNT_BANK_TAB_END: u8 = 205;
/// Slots per account bank tab.
pub const ACCOUNT_BANK_TAB_SLOTS: u8 = 98;

/// Largest container capacity any bag template may declare.
pub const MAX_BAG_SIZE: u8 = 36;

/// Number of buyback slots.
pub const BUYBACK_SLOT_COUNT: usize = (BUYBACK_SLOT_END - BUYBACK_SLOT_START) as usize;

/// Equipment slots, in raw slot order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EquipSlot {
    /// Head.
    Head = 0,
    /// Neck.
    Neck = 1,
    /// Shoulders.
    Shoulders = 2,
    /// Shirt.
    Body = 3,
    /// Chest.
    Chest = 4,
    /// Waist.
    Waist = 5,
    /// Legs.
    Legs = 6,
    /// Feet.
    Feet = 7,
    /// Wrists.
    Wrists = 8,
    /// Hands.
    Hands = 9,
    /// First ring.
    Finger1 = 10,
    /// Second ring.
    Finger2 = 11,
    /// First trinket.
    Trinket1 = 12,
    /// Second trinket.
    Trinket2 = 13,
    /// Cloak.
    Back = 14,
    /// Main hand weapon.
    MainHand = 15,
    /// Off hand weapon, shield or holdable.
    OffHand = 16,
    /// Ranged weapon or relic.
    Ranged = 17,
    /// Tabard.
    Tabard = 18,
}

impl EquipSlot {
    /// Every equipment slot in raw order.
    pub const ALL: [Self; 19] = [
        Self::Head,
        Self::Neck,
        Self::Shoulders,
        Self::Body,
        Self::Chest,
        Self::Waist,
        Self::Legs,
        Self::Feet,
        Self::Wrists,
        Self::Hands,
        Self::Finger1,
        Self::Finger2,
        Self::Trinket1,
        Self::Trinket2,
        Self::Back,
        Self::MainHand,
        Self::OffHand,
        Self::Ranged,
        Self::Tabard,
    ];

    /// Converts a raw slot into an equipment slot.
    #[inline]
    #[must_use]
    pub fn from_raw(slot: u8) -> Option<Self> {
        Self::ALL.get(usize::from(slot)).copied()
    }

    /// Raw slot index.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// True for the three weapon slots.
    #[inline]
    #[must_use]
    pub const fn is_weapon_slot(self) -> bool {
        matches!(self, Self::MainHand | Self::OffHand | Self::Ranged)
    }
}
