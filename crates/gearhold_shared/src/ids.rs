//! # Identifiers
//!
//! Instance identifiers are newtypes so an item guid can never be passed where
//! a character guid is expected. Content ids (templates, spells, enchantments)
//! are plain integers keyed into the read-only catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Item template id (catalog key).
pub type ItemId = u32;

/// Spell id.
pub type SpellId = u32;

/// Enchantment definition id.
pub type EnchantmentId = u32;

/// Item set id.
pub type ItemSetId = u32;

/// Limit category id.
pub type LimitCategoryId = u32;

/// Faction id (reputation).
pub type FactionId = u32;

/// Currency id.
pub type CurrencyId = u32;

/// Extended cost record id.
pub type ExtendedCostId = u32;

/// Skill line id.
pub type SkillId = u16;

/// Creature template entry.
pub type CreatureEntry = u32;

macro_rules! guid_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// The empty guid.
            pub const EMPTY: Self = Self(0);

            /// Returns true if this is the empty guid.
            #[inline]
            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

guid_type!(
    /// Unique id of one item instance.
    ItemGuid
);
guid_type!(
    /// Unique id of one character.
    CharacterGuid
);
guid_type!(
    /// Unique id of a party or raid.
    GroupId
);
guid_type!(
    /// Unique id of a guild.
    GuildId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_guid() {
        assert!(ItemGuid::EMPTY.is_empty());
        assert!(!CharacterGuid(7).is_empty());
        assert_eq!(format!("{:?}", ItemGuid(42)), "ItemGuid(42)");
    }
}
