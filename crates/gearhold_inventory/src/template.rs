//! # Item Templates
//!
//! Static, read-only description of an item kind. Templates come from the
//! [`Catalog`](crate::catalog::Catalog) and are never mutated at runtime.
//!
//! Fields default to the most permissive value so content files only list
//! what differs: a template with just an id and a name is a plain,
//! unstackable, unbound piece of junk.

use gearhold_shared::{EnchantmentId, FactionId, ItemId, ItemSetId, LimitCategoryId, SkillId, SpellId};
use serde::{Deserialize, Serialize};

use crate::character::ReputationRank;
use crate::money::Money;
use crate::stats::ItemModKind;

/// Top-level item class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemClass {
    /// Potions, food, scrolls.
    Consumable,
    /// Bags.
    Container,
    /// Weapons.
    Weapon,
    /// Socketable gems.
    Gem,
    /// Armor, jewelry, shields.
    Armor,
    /// Spell reagents.
    Reagent,
    /// Arrows and bullets.
    Projectile,
    /// Crafting materials.
    TradeGoods,
    /// Recipes.
    Recipe,
    /// Quivers and ammo pouches.
    Quiver,
    /// Quest items.
    Quest,
    /// Keys.
    Key,
    /// Everything else.
    #[default]
    Miscellaneous,
}

/// Weapon subclass: polearm.
pub const WEAPON_SUBCLASS_POLEARM: u32 = 6;

/// Where an item wants to be worn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryType {
    /// Not equippable.
    #[default]
    NonEquip,
    /// Head.
    Head,
    /// Neck.
    Neck,
    /// Shoulders.
    Shoulders,
    /// Shirt.
    Body,
    /// Chest.
    Chest,
    /// Robe (chest slot).
    Robe,
    /// Waist.
    Waist,
    /// Legs.
    Legs,
    /// Feet.
    Feet,
    /// Wrists.
    Wrists,
    /// Hands.
    Hands,
    /// Either ring slot.
    Finger,
    /// Either trinket slot.
    Trinket,
    /// Cloak.
    Cloak,
    /// One-handed weapon, either hand.
    Weapon,
    /// Shield.
    Shield,
    /// Two-handed weapon.
    TwoHandWeapon,
    /// Main-hand only weapon.
    WeaponMainHand,
    /// Off-hand only weapon.
    WeaponOffHand,
    /// Held in off hand.
    Holdable,
    /// Bow, gun, crossbow.
    Ranged,
    /// Wand.
    RangedRight,
    /// Thrown weapon.
    Thrown,
    /// Relic.
    Relic,
    /// Tabard.
    Tabard,
    /// Bag.
    Bag,
    /// Quiver.
    Quiver,
    /// Ammunition.
    Ammo,
    /// Profession tool.
    ProfessionTool,
    /// Profession accessory.
    ProfessionGear,
}

impl InventoryType {
    /// True for ranged weapon types that may sit in the main hand.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::Ranged | Self::RangedRight | Self::Thrown)
    }

    /// True for types that carry weapon damage in a hand.
    #[must_use]
    pub const fn is_wielded(self) -> bool {
        matches!(
            self,
            Self::Weapon | Self::TwoHandWeapon | Self::WeaponMainHand | Self::WeaponOffHand
        ) || self.is_ranged()
    }
}

/// Item quality tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemQuality {
    /// Gray.
    Poor,
    /// White.
    #[default]
    Common,
    /// Green.
    Uncommon,
    /// Blue.
    Rare,
    /// Purple.
    Epic,
    /// Orange.
    Legendary,
    /// Gold.
    Artifact,
    /// Heirloom.
    Heirloom,
}

/// When an item becomes soulbound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bonding {
    /// Never.
    #[default]
    None,
    /// On pickup.
    OnAcquire,
    /// On equip.
    OnEquip,
    /// On use.
    OnUse,
    /// Quest item, bound on pickup.
    Quest,
}

impl Bonding {
    /// Binds as soon as the item is stored.
    #[must_use]
    pub const fn binds_on_store(self) -> bool {
        matches!(self, Self::OnAcquire | Self::Quest)
    }
}

/// Template flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemFlags(u32);

impl ItemFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Only one copy may be equipped.
    pub const UNIQUE_EQUIPPABLE: Self = Self(1 << 0);
    /// May be equipped or removed in combat.
    pub const COMBAT_SWAPPABLE: Self = Self(1 << 1);
    /// Currency token; lives in the hidden currency container.
    pub const CURRENCY_TOKEN: Self = Self(1 << 2);
    /// Crafting reagent; accepted by reagent bags and the reagent bank.
    pub const CRAFTING_REAGENT: Self = Self(1 << 3);
    /// Off-hand weapon usable without dual wield.
    pub const ALWAYS_ALLOW_DUAL_WIELD: Self = Self(1 << 4);
    /// Horde characters only.
    pub const HORDE_ONLY: Self = Self(1 << 5);
    /// Alliance characters only.
    pub const ALLIANCE_ONLY: Self = Self(1 << 6);
    /// Cannot be placed in the account bank.
    pub const NO_ACCOUNT_BANK: Self = Self(1 << 7);

    /// Creates flags from raw value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Checks if a specific flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Combines two flag sets.
    #[inline]
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }
}

/// Bag family mask: which specialized containers accept an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BagFamily(u32);

impl BagFamily {
    /// Goes in no specialized bag.
    pub const NONE: Self = Self(0);
    /// Arrows.
    pub const ARROWS: Self = Self(1 << 0);
    /// Bullets.
    pub const BULLETS: Self = Self(1 << 1);
    /// Soul shards.
    pub const SOUL_SHARDS: Self = Self(1 << 2);
    /// Leatherworking supplies.
    pub const LEATHERWORKING: Self = Self(1 << 3);
    /// Inscription supplies.
    pub const INSCRIPTION: Self = Self(1 << 4);
    /// Herbs.
    pub const HERBS: Self = Self(1 << 5);
    /// Enchanting supplies.
    pub const ENCHANTING: Self = Self(1 << 6);
    /// Engineering supplies.
    pub const ENGINEERING: Self = Self(1 << 7);
    /// Keys.
    pub const KEYS: Self = Self(1 << 8);
    /// Gems.
    pub const GEMS: Self = Self(1 << 9);
    /// Mining supplies.
    pub const MINING: Self = Self(1 << 10);

    /// Creates a mask from raw value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// True if no family bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if the masks share a family.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combines two masks.
    #[inline]
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// What a bag accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BagKind {
    /// Anything.
    #[default]
    General,
    /// Only items sharing a family bit.
    Family(BagFamily),
    /// Only crafting reagents.
    Reagent,
}

/// Container part of a bag template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Number of slots.
    pub slots: u8,
    /// What goes inside.
    #[serde(default)]
    pub kind: BagKind,
}

impl ContainerSpec {
    /// True if `template` may be placed in this bag.
    #[must_use]
    pub fn accepts(&self, template: &ItemTemplate) -> bool {
        match self.kind {
            BagKind::General => true,
            BagKind::Family(mask) => template.bag_family.intersects(mask),
            BagKind::Reagent => template.is_crafting_reagent(),
        }
    }

    /// True for family and reagent bags.
    #[must_use]
    pub const fn is_specialized(&self) -> bool {
        !matches!(self.kind, BagKind::General)
    }
}

/// Weapon damage and speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Minimum damage per hit.
    pub min_damage: u32,
    /// Maximum damage per hit.
    pub max_damage: u32,
    /// Swing time in milliseconds.
    pub delay_ms: u32,
}

/// When an item spell fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellTrigger {
    /// Applied while equipped.
    #[default]
    OnEquip,
    /// Cast on use.
    OnUse,
    /// Proc on melee hit while equipped.
    ChanceOnHit,
}

/// A spell attached to a template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemSpell {
    /// Spell id.
    pub spell: SpellId,
    /// Trigger.
    #[serde(default)]
    pub trigger: SpellTrigger,
    /// Shapeshift forms the aura is active in, as a bit mask. Zero means any.
    #[serde(default)]
    pub form_mask: u32,
    /// The client lists this passive explicitly.
    #[serde(default)]
    pub visible_passive: bool,
}

impl ItemSpell {
    /// True if the aura may be active in `form`.
    #[must_use]
    pub const fn allowed_in_form(&self, form: u8) -> bool {
        self.form_mask == 0 || (form < 32 && self.form_mask & (1 << form) != 0)
    }
}

/// Socket color on a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketColor {
    /// Meta socket.
    Meta,
    /// Red socket.
    Red,
    /// Yellow socket.
    Yellow,
    /// Blue socket.
    Blue,
}

impl SocketColor {
    /// Color bit used in gem masks.
    #[must_use]
    pub const fn mask(self) -> u8 {
        match self {
            Self::Meta => 1,
            Self::Red => 2,
            Self::Yellow => 4,
            Self::Blue => 8,
        }
    }
}

/// Properties of a gem template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GemProperties {
    /// Enchantment the gem grants while socketed.
    pub enchantment: EnchantmentId,
    /// Color mask (see [`SocketColor::mask`]).
    pub colors: u8,
}

/// A skill gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillRequirement {
    /// Skill line.
    pub skill: SkillId,
    /// Minimum rank.
    pub rank: u16,
}

/// A reputation gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReputationRequirement {
    /// Faction.
    pub faction: FactionId,
    /// Minimum rank.
    pub rank: ReputationRank,
}

/// Item paired with a parent (the child goes to a child equipment slot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildItemSpec {
    /// Template of the child.
    pub entry: ItemId,
    /// Child equipment slot index.
    pub slot: u8,
}

/// Which power system, if any, the item drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPowerKind {
    /// None.
    #[default]
    None,
    /// Artifact weapon with power ranks.
    Artifact,
    /// Primary azerite item holding essences.
    AzeriteItem,
    /// Azerite-empowered armor with selected powers.
    AzeriteEmpowered,
}

/// One stat line on a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStat {
    /// Modifier kind.
    pub kind: ItemModKind,
    /// Amount.
    pub value: i32,
}

/// Static description of an item kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTemplate {
    /// Template id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Class.
    pub class: ItemClass,
    /// Class-specific subclass.
    pub subclass: u32,
    /// Equip slot kind.
    pub inventory_type: InventoryType,
    /// Quality.
    pub quality: ItemQuality,
    /// Item level.
    pub item_level: u16,
    /// Units per stack.
    pub max_stack: u32,
    /// Most copies a character may own. Zero means unlimited.
    pub max_count: u32,
    /// Cross-template limit category.
    pub limit_category: Option<LimitCategoryId>,
    /// Binding rule.
    pub bonding: Bonding,
    /// Specialized bags this item fits.
    pub bag_family: BagFamily,
    /// Container part, for bags.
    pub container: Option<ContainerSpec>,
    /// Minimum character level.
    pub required_level: u8,
    /// Weapon or armor proficiency skill.
    pub proficiency: Option<SkillId>,
    /// Profession skill gate.
    pub required_skill: Option<SkillRequirement>,
    /// Spell that must be known.
    pub required_spell: Option<SpellId>,
    /// Reputation gate.
    pub required_reputation: Option<ReputationRequirement>,
    /// Minimum honor rank.
    pub required_honor_rank: u8,
    /// Allowed classes as a bit mask. Zero means all.
    pub allowable_class: u32,
    /// Allowed races as a bit mask. Zero means all.
    pub allowable_race: u32,
    /// Stat lines.
    pub stats: Vec<ItemStat>,
    /// Armor value.
    pub armor: u32,
    /// Weapon damage.
    pub weapon: Option<WeaponStats>,
    /// Attached spells.
    pub spells: Vec<ItemSpell>,
    /// Item set membership.
    pub item_set: Option<ItemSetId>,
    /// Socket colors, in socket order.
    pub sockets: Vec<SocketColor>,
    /// Enchantment granted when every socket matches.
    pub socket_bonus: Option<EnchantmentId>,
    /// Gem properties, for gems.
    pub gem: Option<GemProperties>,
    /// Flags.
    pub flags: ItemFlags,
    /// Paired child item.
    pub child_item: Option<ChildItemSpec>,
    /// Maximum durability. Zero means indestructible.
    pub max_durability: u32,
    /// Vendor price for `buy_count` units.
    pub buy_price: Money,
    /// Vendor payout per unit.
    pub sell_price: Money,
    /// Units per vendor purchase.
    pub buy_count: u32,
    /// Repair cost per lost durability point.
    pub repair_cost_per_point: Money,
    /// Power system.
    pub power_kind: ItemPowerKind,
}

impl Default for ItemTemplate {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            class: ItemClass::default(),
            subclass: 0,
            inventory_type: InventoryType::default(),
            quality: ItemQuality::default(),
            item_level: 1,
            max_stack: 1,
            max_count: 0,
            limit_category: None,
            bonding: Bonding::default(),
            bag_family: BagFamily::NONE,
            container: None,
            required_level: 0,
            proficiency: None,
            required_skill: None,
            required_spell: None,
            required_reputation: None,
            required_honor_rank: 0,
            allowable_class: 0,
            allowable_race: 0,
            stats: Vec::new(),
            armor: 0,
            weapon: None,
            spells: Vec::new(),
            item_set: None,
            sockets: Vec::new(),
            socket_bonus: None,
            gem: None,
            flags: ItemFlags::NONE,
            child_item: None,
            max_durability: 0,
            buy_price: Money::ZERO,
            sell_price: Money::ZERO,
            buy_count: 1,
            repair_cost_per_point: Money::ZERO,
            power_kind: ItemPowerKind::None,
        }
    }
}

impl ItemTemplate {
    /// Creates a plain template.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets class and subclass.
    #[must_use]
    pub fn with_class(mut self, class: ItemClass, subclass: u32) -> Self {
        self.class = class;
        self.subclass = subclass;
        self
    }

    /// Sets the inventory type.
    #[must_use]
    pub fn with_inventory_type(mut self, inventory_type: InventoryType) -> Self {
        self.inventory_type = inventory_type;
        self
    }

    /// Sets the stack size.
    #[must_use]
    pub fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack.max(1);
        self
    }

    /// Sets the ownership cap.
    #[must_use]
    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    /// Sets the limit category.
    #[must_use]
    pub fn with_limit_category(mut self, category: LimitCategoryId) -> Self {
        self.limit_category = Some(category);
        self
    }

    /// Sets the binding rule.
    #[must_use]
    pub fn with_bonding(mut self, bonding: Bonding) -> Self {
        self.bonding = bonding;
        self
    }

    /// Makes this a bag.
    #[must_use]
    pub fn with_container(mut self, slots: u8, kind: BagKind) -> Self {
        self.class = ItemClass::Container;
        self.inventory_type = InventoryType::Bag;
        self.container = Some(ContainerSpec { slots, kind });
        self
    }

    /// Sets the bag family mask.
    #[must_use]
    pub fn with_bag_family(mut self, family: BagFamily) -> Self {
        self.bag_family = family;
        self
    }

    /// Adds a stat line.
    #[must_use]
    pub fn with_stat(mut self, kind: ItemModKind, value: i32) -> Self {
        self.stats.push(ItemStat { kind, value });
        self
    }

    /// Sets armor.
    #[must_use]
    pub fn with_armor(mut self, armor: u32) -> Self {
        self.armor = armor;
        self
    }

    /// Sets weapon damage.
    #[must_use]
    pub fn with_weapon(mut self, min_damage: u32, max_damage: u32, delay_ms: u32) -> Self {
        self.weapon = Some(WeaponStats {
            min_damage,
            max_damage,
            delay_ms,
        });
        self
    }

    /// Adds an item spell.
    #[must_use]
    pub fn with_spell(mut self, spell: ItemSpell) -> Self {
        self.spells.push(spell);
        self
    }

    /// Sets item set membership.
    #[must_use]
    pub fn with_item_set(mut self, set: ItemSetId) -> Self {
        self.item_set = Some(set);
        self
    }

    /// Sets sockets and the socket bonus.
    #[must_use]
    pub fn with_sockets(mut self, sockets: &[SocketColor], bonus: Option<EnchantmentId>) -> Self {
        self.sockets = sockets.to_vec();
        self.socket_bonus = bonus;
        self
    }

    /// Makes this a gem.
    #[must_use]
    pub fn with_gem(mut self, enchantment: EnchantmentId, colors: u8) -> Self {
        self.class = ItemClass::Gem;
        self.gem = Some(GemProperties { enchantment, colors });
        self
    }

    /// Adds flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ItemFlags) -> Self {
        self.flags = self.flags.with(flags);
        self
    }

    /// Sets the paired child item.
    #[must_use]
    pub fn with_child(mut self, entry: ItemId, slot: u8) -> Self {
        self.child_item = Some(ChildItemSpec { entry, slot });
        self
    }

    /// Sets maximum durability.
    #[must_use]
    pub fn with_durability(mut self, max_durability: u32) -> Self {
        self.max_durability = max_durability;
        self
    }

    /// Sets vendor prices.
    #[must_use]
    pub fn with_prices(mut self, buy_price: Money, sell_price: Money) -> Self {
        self.buy_price = buy_price;
        self.sell_price = sell_price;
        self
    }

    /// Sets units per purchase.
    #[must_use]
    pub fn with_buy_count(mut self, buy_count: u32) -> Self {
        self.buy_count = buy_count.max(1);
        self
    }

    /// Sets repair cost per durability point.
    #[must_use]
    pub fn with_repair_cost(mut self, per_point: Money) -> Self {
        self.repair_cost_per_point = per_point;
        self
    }

    /// Sets the minimum level.
    #[must_use]
    pub fn with_required_level(mut self, level: u8) -> Self {
        self.required_level = level;
        self
    }

    /// Sets the proficiency skill.
    #[must_use]
    pub fn with_proficiency(mut self, skill: SkillId) -> Self {
        self.proficiency = Some(skill);
        self
    }

    /// Sets a profession skill gate.
    #[must_use]
    pub fn with_required_skill(mut self, skill: SkillId, rank: u16) -> Self {
        self.required_skill = Some(SkillRequirement { skill, rank });
        self
    }

    /// Sets a required spell.
    #[must_use]
    pub fn with_required_spell(mut self, spell: SpellId) -> Self {
        self.required_spell = Some(spell);
        self
    }

    /// Sets a reputation gate.
    #[must_use]
    pub fn with_required_reputation(mut self, faction: FactionId, rank: ReputationRank) -> Self {
        self.required_reputation = Some(ReputationRequirement { faction, rank });
        self
    }

    /// Sets the minimum honor rank.
    #[must_use]
    pub fn with_required_honor_rank(mut self, rank: u8) -> Self {
        self.required_honor_rank = rank;
        self
    }

    /// Sets class and race masks.
    #[must_use]
    pub fn with_allowable(mut self, class_mask: u32, race_mask: u32) -> Self {
        self.allowable_class = class_mask;
        self.allowable_race = race_mask;
        self
    }

    /// Sets the power system.
    #[must_use]
    pub fn with_power_kind(mut self, kind: ItemPowerKind) -> Self {
        self.power_kind = kind;
        self
    }

    /// Sets item level.
    #[must_use]
    pub fn with_item_level(mut self, item_level: u16) -> Self {
        self.item_level = item_level;
        self
    }

    /// True if this template is a bag.
    #[inline]
    #[must_use]
    pub const fn is_bag(&self) -> bool {
        self.container.is_some()
    }

    /// Bag capacity, zero for non-bags.
    #[inline]
    #[must_use]
    pub fn bag_slots(&self) -> u8 {
        self.container.map_or(0, |c| c.slots)
    }

    /// True for crafting reagents.
    #[inline]
    #[must_use]
    pub const fn is_crafting_reagent(&self) -> bool {
        self.flags.has(ItemFlags::CRAFTING_REAGENT)
    }

    /// True for currency tokens.
    #[inline]
    #[must_use]
    pub const fn is_currency_token(&self) -> bool {
        self.flags.has(ItemFlags::CURRENCY_TOKEN)
    }

    /// True if the item may be equipped or removed in combat.
    ///
    /// Weapons, shields, holdables and relics always may.
    #[must_use]
    pub fn can_change_equip_state_in_combat(&self) -> bool {
        self.flags.has(ItemFlags::COMBAT_SWAPPABLE)
            || self.class == ItemClass::Weapon
            || matches!(
                self.inventory_type,
                InventoryType::Shield | InventoryType::Holdable | InventoryType::Relic
            )
    }

    /// True for two-handed weapons.
    #[inline]
    #[must_use]
    pub fn is_two_handed(&self) -> bool {
        self.inventory_type == InventoryType::TwoHandWeapon
    }

    /// True if the template has colored sockets or a socket bonus.
    #[inline]
    #[must_use]
    pub fn has_sockets(&self) -> bool {
        !self.sockets.is_empty()
    }

    /// Stack size clamped to at least one.
    #[inline]
    #[must_use]
    pub fn stack_size(&self) -> u32 {
        self.max_stack.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_template_defaults() {
        let template = ItemTemplate::new(7, "Rock");
        assert_eq!(template.stack_size(), 1);
        assert_eq!(template.buy_count, 1);
        assert!(!template.is_bag());
        assert!(!template.can_change_equip_state_in_combat());
    }

    #[test]
    fn test_bag_family_acceptance() {
        let arrow = ItemTemplate::new(1, "Arrow").with_bag_family(BagFamily::ARROWS);
        let herb = ItemTemplate::new(2, "Herb")
            .with_bag_family(BagFamily::HERBS)
            .with_flags(ItemFlags::CRAFTING_REAGENT);
        let quiver = ContainerSpec { slots: 8, kind: BagKind::Family(BagFamily::ARROWS) };
        let reagent = ContainerSpec { slots: 8, kind: BagKind::Reagent };

        assert!(quiver.accepts(&arrow));
        assert!(!quiver.accepts(&herb));
        assert!(reagent.accepts(&herb));
        assert!(!reagent.accepts(&arrow));
        assert!(quiver.is_specialized());
    }

    #[test]
    fn test_form_mask() {
        let any = ItemSpell { spell: 1, ..ItemSpell::default() };
        let bear = ItemSpell { spell: 2, form_mask: 1 << 5, ..ItemSpell::default() };
        assert!(any.allowed_in_form(0));
        assert!(bear.allowed_in_form(5));
        assert!(!bear.allowed_in_form(0));
    }
}
