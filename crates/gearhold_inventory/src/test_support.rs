//! Shared fixtures for unit tests.

use gearhold_shared::{CharacterGuid, ItemId};
use std::sync::Arc;

use crate::catalog::StaticCatalog;
use crate::character::CharacterProfile;
use crate::config::InventoryConfig;
use crate::money::Money;
use crate::player::{ItemGuidAllocator, Player};
use crate::stats::ItemModKind;
use crate::template::{BagFamily, BagKind, Bonding, InventoryType, ItemClass, ItemFlags, ItemTemplate};

pub const OWNER: CharacterGuid = CharacterGuid(7);

pub const CLOTH: ItemId = 100;
pub const HELM: ItemId = 200;
pub const SWORD: ItemId = 300;
pub const GREATSWORD: ItemId = 301;
pub const SHIELD: ItemId = 302;
pub const POUCH: ItemId = 400;
pub const BIG_BAG: ItemId = 401;
pub const QUIVER: ItemId = 402;
pub const ARROW: ItemId = 403;
pub const HERB: ItemId = 404;
pub const ARTIFACT: ItemId = 500;
pub const ARTIFACT_OFF_HAND: ItemId = 501;

pub fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_template(
            ItemTemplate::new(CLOTH, "Linen Cloth")
                .with_class(ItemClass::TradeGoods, 0)
                .with_max_stack(20)
                .with_prices(Money::from_copper(20), Money::from_copper(5)),
        )
        .with_template(
            ItemTemplate::new(HELM, "Iron Helm")
                .with_class(ItemClass::Armor, 4)
                .with_inventory_type(InventoryType::Head)
                .with_bonding(Bonding::OnEquip)
                .with_stat(ItemModKind::Stamina, 10)
                .with_armor(100)
                .with_durability(50)
                .with_repair_cost(Money::from_copper(2))
                .with_prices(Money::from_copper(1_000), Money::from_copper(250)),
        )
        .with_template(
            ItemTemplate::new(SWORD, "Short Sword")
                .with_class(ItemClass::Weapon, 7)
                .with_inventory_type(InventoryType::Weapon)
                .with_weapon(10, 20, 2_000)
                .with_durability(40),
        )
        .with_template(
            ItemTemplate::new(GREATSWORD, "Greatsword")
                .with_class(ItemClass::Weapon, 8)
                .with_inventory_type(InventoryType::TwoHandWeapon)
                .with_weapon(30, 50, 3_500)
                .with_stat(ItemModKind::Strength, 15),
        )
        .with_template(
            ItemTemplate::new(SHIELD, "Buckler")
                .with_class(ItemClass::Armor, 6)
                .with_inventory_type(InventoryType::Shield)
                .with_armor(40),
        )
        .with_template(
            ItemTemplate::new(POUCH, "Small Pouch")
                .with_class(ItemClass::Container, 0)
                .with_inventory_type(InventoryType::Bag)
                .with_container(4, BagKind::General),
        )
        .with_template(
            ItemTemplate::new(BIG_BAG, "Traveler's Backpack")
                .with_class(ItemClass::Container, 0)
                .with_inventory_type(InventoryType::Bag)
                .with_container(16, BagKind::General),
        )
        .with_template(
            ItemTemplate::new(QUIVER, "Light Quiver")
                .with_class(ItemClass::Quiver, 2)
                .with_inventory_type(InventoryType::Quiver)
                .with_container(4, BagKind::Family(BagFamily::ARROWS)),
        )
        .with_template(
            ItemTemplate::new(ARROW, "Rough Arrow")
                .with_class(ItemClass::Projectile, 2)
                .with_inventory_type(InventoryType::Ammo)
                .with_bag_family(BagFamily::ARROWS)
                .with_max_stack(200),
        )
        .with_template(
            ItemTemplate::new(HERB, "Peacebloom")
                .with_class(ItemClass::TradeGoods, 9)
                .with_bag_family(BagFamily::HERBS)
                .with_flags(ItemFlags::CRAFTING_REAGENT)
                .with_max_stack(20),
        )
        .with_template(
            ItemTemplate::new(ARTIFACT, "Ashbringer")
                .with_class(ItemClass::Weapon, 7)
                .with_inventory_type(InventoryType::WeaponMainHand)
                .with_weapon(40, 60, 2_600)
                .with_child(ARTIFACT_OFF_HAND, 0),
        )
        .with_template(
            ItemTemplate::new(ARTIFACT_OFF_HAND, "Ashbringer Ward")
                .with_class(ItemClass::Armor, 6)
                .with_inventory_type(InventoryType::Shield)
                .with_armor(25),
        )
}

pub fn profile() -> CharacterProfile {
    CharacterProfile::new(OWNER, 60, 1, 1)
}

pub fn player_with(catalog: StaticCatalog, profile: CharacterProfile) -> Player {
    Player::new(
        Arc::new(catalog),
        Arc::new(InventoryConfig::default()),
        Arc::new(ItemGuidAllocator::default()),
        profile,
    )
}

pub fn player() -> Player {
    player_with(catalog(), profile())
}
