//! # GEARHOLD Shared
//!
//! Identifiers and the character slot space used by every other crate.
//!
//! ## CRITICAL RULE
//!
//! Raw `(bag, slot)` integers only exist at the edges (network, storage).
//! Everything inside the engine talks in [`Position`], which is classified by
//! an exhaustive `match` instead of numeric range checks scattered through
//! the code.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod ids;
pub mod position;

pub use constants::{EquipSlot, NULL_BAG, NULL_SLOT};
pub use ids::{
    CharacterGuid, CreatureEntry, CurrencyId, EnchantmentId, ExtendedCostId, FactionId, GroupId,
    GuildId, ItemGuid, ItemId, ItemSetId, LimitCategoryId, SkillId, SpellId,
};
pub use position::{
    is_account_bank_pos, is_bag_pos, is_bank_pos, is_buyback_pos, is_child_equipment_pos,
    is_equipment_pos, is_inventory_pos, is_profession_gear_pos, is_reagent_bank_pos,
    is_valid_pos, Position,
};
