//! # Inventory Error Types
//!
//! Every rejection the engine can report. These are values, not failures:
//! the caller turns them into a client message and nothing has been mutated
//! by the time one is returned.

use thiserror::Error;

use crate::planner::Placement;

/// Result codes of placement, equip, vendor, loot and trade operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryError {
    /// Item or template does not exist.
    #[error("item not found")]
    ItemNotFound,
    /// The two items cannot trade places.
    #[error("these items can't be swapped")]
    CantSwap,
    /// The item belongs to someone else.
    #[error("you don't own that item")]
    NotOwner,
    /// The item is currently being looted.
    #[error("that item is no longer available")]
    LootGone,
    /// Per-template ownership cap reached.
    #[error("you can't carry any more of those items")]
    ItemMaxCount,
    /// Limit category ownership cap reached.
    #[error("you can't carry any more items of that category")]
    ItemMaxLimitCategoryCountExceeded,
    /// Limit category equip cap reached.
    #[error("you can't equip any more items of that category")]
    ItemMaxLimitCategoryEquippedExceeded,
    /// A unique-equipped copy is already worn.
    #[error("you can only equip one of those")]
    ItemUniqueEquippable,
    /// No room in backpack and bags.
    #[error("inventory is full")]
    InvFull,
    /// No room for one of several items.
    #[error("that bag is full")]
    BagFull,
    /// No room in the bank.
    #[error("bank is full")]
    BankFull,
    /// No room in the reagent bank.
    #[error("reagent bank is full")]
    ReagentBankFull,
    /// Bank bag slot not purchased.
    #[error("you must purchase that bag slot first")]
    NoBankSlot,
    /// Item does not go in that slot.
    #[error("item doesn't go to that slot")]
    WrongSlot,
    /// Item does not fit that container.
    #[error("that item doesn't go in that container")]
    WrongBagType,
    /// Child equipment slot mismatch.
    #[error("that item can only go in a child equipment slot")]
    WrongBagTypeChild,
    /// A bag with contents cannot leave a bag slot.
    #[error("you can only do that with empty bags")]
    DestroyNonemptyBag,
    /// A bag with contents cannot go into another bag.
    #[error("can't put non-empty bags in other bags")]
    BagInBag,
    /// Items cannot stack.
    #[error("this item cannot stack")]
    ItemCantStack,
    /// Item is not equippable there or at all.
    #[error("this item cannot be equipped")]
    NotEquippable,
    /// Class, race or faction can never equip this.
    #[error("you can never use that item")]
    CantEquipEver,
    /// Character level too low.
    #[error("you must reach a higher level to use that item")]
    CantEquipLevel,
    /// Missing proficiency or required spell.
    #[error("no equipment proficiency")]
    ProficiencyNeeded,
    /// Skill rank too low.
    #[error("you aren't skilled enough to use that item")]
    CantEquipSkill,
    /// Reputation rank too low.
    #[error("your reputation is too low to use that item")]
    CantEquipReputation,
    /// Honor rank too low.
    #[error("you don't have the required rank for that item")]
    CantEquipRank,
    /// Character is dead.
    #[error("you are dead")]
    PlayerDead,
    /// Gear swap while in combat.
    #[error("you can't do that while in combat")]
    NotInCombat,
    /// Gear swap during an arena match.
    #[error("you can't do that during an arena match")]
    NotDuringArenaMatch,
    /// Item is on cooldown.
    #[error("item is not ready yet")]
    ItemCooldown,
    /// Weapon swap lockout or casting in progress.
    #[error("you can't do that right now")]
    ClientLockedOut,
    /// Character is stunned.
    #[error("you are stunned")]
    GenericStunned,
    /// Character is charmed or otherwise unable to act.
    #[error("can't do that right now")]
    CantDoThatRightNow,
    /// Split count exceeds the stack.
    #[error("you tried to split more than number in stack")]
    TooFewToSplit,
    /// Split count equals the stack.
    #[error("couldn't split those items")]
    SplitFailed,
    /// Extended cost items or currency are missing.
    #[error("you do not have the required items for that purchase")]
    VendorMissingTurnins,
    /// Purchase count is not a multiple of the vendor stack.
    #[error("you can't buy that quantity")]
    CantBuyQuantity,
    /// A two-handed weapon blocks the off hand.
    #[error("cannot equip that with a two-handed weapon")]
    Equipped2Handed,
    /// Dual wield or titan grip missing.
    #[error("cannot equip item in this slot")]
    TwoHandSkillNotFound,
    /// Every candidate equipment slot is occupied.
    #[error("no equipment slot is available for that item")]
    NoSlotAvailable,
    /// Not enough money.
    #[error("you don't have enough money")]
    NotEnoughMoney,
    /// Money cap would be exceeded.
    #[error("you are carrying too much gold")]
    TooMuchGold,
    /// Not enough honor points.
    #[error("you don't have enough honor points")]
    NotEnoughHonorPoints,
    /// Not enough arena points.
    #[error("you don't have enough arena points")]
    NotEnoughArenaPoints,
    /// Not enough of a currency.
    #[error("you don't have enough currency")]
    NotEnoughCurrency,
    /// Personal arena rating too low.
    #[error("your personal arena rating is too low")]
    ArenaRatingTooLow,
    /// Vendor reputation requirement not met.
    #[error("your reputation is too low")]
    ReputationTooLow,
    /// Required achievement missing.
    #[error("you are missing a required achievement")]
    MissingAchievement,
    /// Guild level too low or no guild.
    #[error("your guild level is too low")]
    GuildLevelTooLow,
    /// Vendor stock exhausted.
    #[error("that item is currently sold out")]
    ItemSoldOut,
    /// Item cannot be sold.
    #[error("you can't sell that item")]
    CantSellItem,
    /// Item cannot go to that bank.
    #[error("that item can't be banked there")]
    NotBankable,
    /// A record that must exist is missing. Logged where detected.
    #[error("internal inconsistency")]
    InternalInconsistency,
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// A placement request that could not be fully satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRejection {
    /// The last blocking result code.
    pub error: InventoryError,
    /// Units that found no destination.
    pub shortfall: u32,
    /// Destinations found before the search gave up.
    pub partial: Vec<Placement>,
}

impl StoreRejection {
    /// A rejection with nothing placed.
    #[must_use]
    pub const fn total(error: InventoryError, shortfall: u32) -> Self {
        Self {
            error,
            shortfall,
            partial: Vec::new(),
        }
    }
}

impl From<StoreRejection> for InventoryError {
    fn from(rejection: StoreRejection) -> Self {
        rejection.error
    }
}

/// Errors loading catalog or configuration files.
#[derive(Error, Debug)]
pub enum ContentError {
    /// TOML did not parse or did not match the schema.
    #[error("invalid content file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Parsed but semantically invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
