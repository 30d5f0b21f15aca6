//! # GEARHOLD Inventory
//!
//! Where every item a character owns lives, and what it does while it is
//! there.
//!
//! ## Design Principles
//!
//! 1. **Validate, then mutate** - the [`Planner`] is pure; a [`Player`] only
//!    changes after a plan for the whole request exists
//! 2. **Symmetric effects** - everything applied on equip is removed by the
//!    same code path with the sign flipped
//! 3. **Integer money** - copper in a `u64`, discounts in basis points
//! 4. **Injected content** - templates come through the [`Catalog`] trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use gearhold_inventory::{Anchor, InventoryConfig, ItemGuidAllocator, Player};
//!
//! let mut player = Player::new(catalog, config, guids, profile);
//! let stacks = player.store_new_item(Anchor::Any, 2589, 20)?;
//! for event in player.drain_events() {
//!     session.send(event);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod applier;
pub mod catalog;
pub mod character;
pub mod config;
pub mod error;
pub mod events;
pub mod item;
pub mod loot;
pub mod money;
pub mod planner;
pub mod player;
pub mod stats;
pub mod store;
pub mod template;
pub mod trade;
pub mod vendor;

mod equip;
mod maintenance;
mod swap;

#[cfg(test)]
mod test_support;

pub use applier::Applier;
pub use catalog::{Catalog, EnchantmentDef, ExtendedCost, ItemSetDef, LimitCategory, StaticCatalog};
pub use character::{CharacterProfile, ReputationRank, Team};
pub use config::InventoryConfig;
pub use error::{ContentError, InventoryError, InventoryResult, StoreRejection};
pub use events::{EventOutbox, InventoryEvent};
pub use item::{EnchantSlot, EnchantmentInstance, Item, ItemState};
pub use loot::{LootItem, LootWindow};
pub use money::{Money, BASIS_POINTS};
pub use planner::{Anchor, BankTarget, Placement, PlanResult, Planner};
pub use player::{ItemGuidAllocator, Player, Wallet};
pub use stats::{ItemModKind, PlayerStats, StatTarget};
pub use store::{BuybackEntry, InventoryStore};
pub use template::{Bonding, InventoryType, ItemClass, ItemTemplate};
pub use trade::{complete_trade, TradeOffer};
pub use vendor::{Vendor, VendorItem};
