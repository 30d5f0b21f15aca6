//! # Item Instances
//!
//! A concrete item owned by one character. The template is referenced by
//! entry; everything that can change at runtime (count, position, binding,
//! durability, enchantments, gems, powers) lives here.
//!
//! ## Persistence state
//!
//! [`ItemState`] tells the storage collaborator what to flush:
//!
//! ```text
//! New ──────────────► Removed
//!  │                     ▲
//!  └─(saved)─► Unchanged ─► Changed
//! ```

use gearhold_shared::{CharacterGuid, EnchantmentId, ItemGuid, ItemId, Position};
use std::collections::BTreeMap;

use crate::error::{InventoryError, InventoryResult};
use crate::template::ItemTemplate;

/// Persistence state of an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Matches storage.
    Unchanged,
    /// Created since the last save.
    #[default]
    New,
    /// Modified since the last save.
    Changed,
    /// Deleted; the store no longer holds it.
    Removed,
}

/// Enchantment slot of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnchantSlot {
    /// Permanent enchantment.
    Permanent,
    /// Temporary enchantment (oils, poisons, sharpening stones).
    Temporary,
    /// First gem socket.
    Socket1,
    /// Second gem socket.
    Socket2,
    /// Third gem socket.
    Socket3,
    /// Socket bonus.
    SocketBonus,
    /// Prismatic socket granted by an enchantment.
    Prismatic,
}

impl EnchantSlot {
    /// Slots in application order.
    pub const ALL: [Self; 7] = [
        Self::Permanent,
        Self::Temporary,
        Self::Socket1,
        Self::Socket2,
        Self::Socket3,
        Self::SocketBonus,
        Self::Prismatic,
    ];

    /// Socket slots, in socket order.
    pub const SOCKETS: [Self; 3] = [Self::Socket1, Self::Socket2, Self::Socket3];

    /// Index into the slot array.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Socket slot holding gem `index`.
    #[must_use]
    pub const fn socket(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Socket1),
            1 => Some(Self::Socket2),
            2 => Some(Self::Socket3),
            _ => None,
        }
    }

    /// Gem index of a socket slot.
    #[must_use]
    pub const fn socket_index(self) -> Option<usize> {
        match self {
            Self::Socket1 => Some(0),
            Self::Socket2 => Some(1),
            Self::Socket3 => Some(2),
            _ => None,
        }
    }
}

/// An enchantment placed on an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnchantmentInstance {
    /// Definition.
    pub id: EnchantmentId,
    /// Remaining time, zero for unlimited.
    pub duration_ms: u32,
    /// Remaining charges, zero for unlimited.
    pub charges: u32,
}

impl EnchantmentInstance {
    /// A permanent, unlimited enchantment.
    #[must_use]
    pub const fn permanent(id: EnchantmentId) -> Self {
        Self {
            id,
            duration_ms: 0,
            charges: 0,
        }
    }
}

/// A concrete item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// Unique id.
    pub guid: ItemGuid,
    /// Template id.
    pub entry: ItemId,
    /// Stack count.
    pub count: u32,
    /// Owning character.
    pub owner: CharacterGuid,
    /// Soulbound.
    pub bound: bool,
    /// Persistence state.
    pub state: ItemState,
    /// Current durability.
    pub durability: u32,
    /// Maximum durability, zero for indestructible.
    pub max_durability: u32,
    /// Socketed gem templates, by socket.
    pub gems: [Option<ItemId>; 3],
    /// Artifact power ranks.
    pub artifact_powers: BTreeMap<u32, u8>,
    /// Selected azerite powers.
    pub azerite_powers: Vec<u32>,
    /// Slotted azerite essences and their ranks.
    pub azerite_essences: BTreeMap<u32, u8>,
    /// Child item created alongside this one.
    pub child: Option<ItemGuid>,
    /// Parent of a child item.
    pub parent: Option<ItemGuid>,
    /// A loot window is open on this item.
    pub loot_generated: bool,
    position: Option<Position>,
    enchantments: [Option<EnchantmentInstance>; 7],
    contents: Vec<Option<ItemGuid>>,
}

impl Item {
    /// Creates an unplaced item from its template.
    #[must_use]
    pub fn create(guid: ItemGuid, template: &ItemTemplate, count: u32, owner: CharacterGuid) -> Self {
        let mut enchantments = [None; 7];
        if let Some(bonus) = template.socket_bonus {
            enchantments[EnchantSlot::SocketBonus.index()] = Some(EnchantmentInstance::permanent(bonus));
        }
        Self {
            guid,
            entry: template.id,
            count: count.max(1),
            owner,
            bound: false,
            state: ItemState::New,
            durability: template.max_durability,
            max_durability: template.max_durability,
            gems: [None; 3],
            artifact_powers: BTreeMap::new(),
            azerite_powers: Vec::new(),
            azerite_essences: BTreeMap::new(),
            child: None,
            parent: None,
            loot_generated: false,
            position: None,
            enchantments,
            contents: vec![None; usize::from(template.bag_slots())],
        }
    }

    /// Current position, if placed.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    /// True if durability has run out.
    #[inline]
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.max_durability > 0 && self.durability == 0
    }

    /// True for bags.
    #[inline]
    #[must_use]
    pub fn is_bag(&self) -> bool {
        !self.contents.is_empty()
    }

    /// True for bags holding at least one item.
    #[must_use]
    pub fn is_not_empty_bag(&self) -> bool {
        self.contents.iter().any(Option::is_some)
    }

    /// Bag slots, empty for non-bags.
    #[must_use]
    pub fn contents(&self) -> &[Option<ItemGuid>] {
        &self.contents
    }

    pub(crate) fn contents_mut(&mut self) -> &mut [Option<ItemGuid>] {
        &mut self.contents
    }

    /// Number of free bag slots.
    #[must_use]
    pub fn free_bag_slots(&self) -> usize {
        self.contents.iter().filter(|slot| slot.is_none()).count()
    }

    /// Whether units of `template` can merge onto this stack.
    ///
    /// # Errors
    ///
    /// [`InventoryError::LootGone`] while looted, [`InventoryError::ItemCantStack`]
    /// for a different entry or a full stack.
    pub fn can_be_merged_partly_with(&self, template: &ItemTemplate) -> InventoryResult<()> {
        if self.loot_generated {
            return Err(InventoryError::LootGone);
        }
        if self.entry != template.id || self.count >= template.stack_size() {
            return Err(InventoryError::ItemCantStack);
        }
        Ok(())
    }

    /// True if soulbound to someone other than `owner`.
    #[inline]
    #[must_use]
    pub fn is_bound_not_with(&self, owner: CharacterGuid) -> bool {
        self.bound && self.owner != owner
    }

    /// New unplaced stack of `count` units sharing this item's identity traits.
    #[must_use]
    pub fn clone_split(&self, guid: ItemGuid, count: u32) -> Self {
        Self {
            guid,
            entry: self.entry,
            count,
            owner: self.owner,
            bound: self.bound,
            state: ItemState::New,
            durability: self.durability,
            max_durability: self.max_durability,
            gems: [None; 3],
            artifact_powers: BTreeMap::new(),
            azerite_powers: Vec::new(),
            azerite_essences: BTreeMap::new(),
            child: None,
            parent: None,
            loot_generated: false,
            position: None,
            enchantments: [None; 7],
            contents: Vec::new(),
        }
    }

    /// Enchantment in `slot`.
    #[inline]
    #[must_use]
    pub const fn enchantment(&self, slot: EnchantSlot) -> Option<EnchantmentInstance> {
        self.enchantments[slot.index()]
    }

    pub(crate) fn set_enchantment(&mut self, slot: EnchantSlot, value: Option<EnchantmentInstance>) {
        self.enchantments[slot.index()] = value;
        self.mark_changed();
    }

    /// Occupied enchantment slots, in application order.
    pub fn enchantments(&self) -> impl Iterator<Item = (EnchantSlot, EnchantmentInstance)> + '_ {
        EnchantSlot::ALL
            .into_iter()
            .filter_map(|slot| self.enchantment(slot).map(|e| (slot, e)))
    }

    /// Flags the item for saving unless it has never been saved.
    pub fn mark_changed(&mut self) {
        if self.state == ItemState::Unchanged {
            self.state = ItemState::Changed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::BagKind;

    fn owner() -> CharacterGuid {
        CharacterGuid(1)
    }

    #[test]
    fn test_create_bag() {
        let template = ItemTemplate::new(5, "Pouch").with_container(6, BagKind::General);
        let bag = Item::create(ItemGuid(1), &template, 1, owner());
        assert!(bag.is_bag());
        assert!(!bag.is_not_empty_bag());
        assert_eq!(bag.free_bag_slots(), 6);
        assert_eq!(bag.state, ItemState::New);
    }

    #[test]
    fn test_merge_rules() {
        let cloth = ItemTemplate::new(10, "Cloth").with_max_stack(20);
        let mut stack = Item::create(ItemGuid(1), &cloth, 19, owner());
        assert_eq!(stack.can_be_merged_partly_with(&cloth), Ok(()));

        stack.count = 20;
        assert_eq!(stack.can_be_merged_partly_with(&cloth), Err(InventoryError::ItemCantStack));

        let other = ItemTemplate::new(11, "Silk").with_max_stack(20);
        stack.count = 1;
        assert_eq!(stack.can_be_merged_partly_with(&other), Err(InventoryError::ItemCantStack));

        stack.loot_generated = true;
        assert_eq!(stack.can_be_merged_partly_with(&cloth), Err(InventoryError::LootGone));
    }

    #[test]
    fn test_socket_bonus_seeded() {
        let template = ItemTemplate::new(3, "Helm").with_sockets(
            &[crate::template::SocketColor::Meta],
            Some(77),
        );
        let helm = Item::create(ItemGuid(1), &template, 1, owner());
        assert_eq!(helm.enchantment(EnchantSlot::SocketBonus).map(|e| e.id), Some(77));
        assert_eq!(helm.enchantments().count(), 1);
    }

    #[test]
    fn test_broken_and_binding() {
        let template = ItemTemplate::new(3, "Boots").with_durability(40);
        let mut boots = Item::create(ItemGuid(1), &template, 1, owner());
        assert!(!boots.is_broken());
        boots.durability = 0;
        assert!(boots.is_broken());

        boots.bound = true;
        assert!(!boots.is_bound_not_with(owner()));
        assert!(boots.is_bound_not_with(CharacterGuid(2)));
    }

    #[test]
    fn test_clone_split_is_fresh() {
        let cloth = ItemTemplate::new(10, "Cloth").with_max_stack(20);
        let mut stack = Item::create(ItemGuid(1), &cloth, 12, owner());
        stack.state = ItemState::Unchanged;
        let half = stack.clone_split(ItemGuid(2), 5);
        assert_eq!(half.count, 5);
        assert_eq!(half.entry, 10);
        assert_eq!(half.state, ItemState::New);
        assert_eq!(half.position(), None);
    }
}
