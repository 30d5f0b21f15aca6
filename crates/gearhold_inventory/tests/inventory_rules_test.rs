//! Integration tests for inventory rules that span several operations.

use gearhold_inventory::{
    Anchor, CharacterProfile, InventoryConfig, InventoryError, InventoryEvent, Item, ItemGuidAllocator, Money,
    Player, StaticCatalog, Vendor, VendorItem,
};
use gearhold_shared::{CharacterGuid, EquipSlot, Position};
use std::sync::Arc;

const CATALOG: &str = r#"
    [[items]]
    id = 100
    name = "Linen Cloth"
    class = "trade_goods"
    max_stack = 20
    buy_price = 20
    sell_price = 5

    [[items]]
    id = 200
    name = "Iron Helm"
    class = "armor"
    inventory_type = "head"
    bonding = "on_equip"
    armor = 100
    max_durability = 50
    buy_price = 1000
    sell_price = 250
    repair_cost_per_point = 2
    stats = [{ kind = "stamina", value = 10 }]

    [[items]]
    id = 300
    name = "Short Sword"
    class = "weapon"
    subclass = 7
    inventory_type = "weapon"
    max_durability = 40
    weapon = { min_damage = 10, max_damage = 20, delay_ms = 2000 }
    stats = [{ kind = "strength", value = 4 }]

    [[items]]
    id = 400
    name = "Small Pouch"
    class = "container"
    inventory_type = "bag"
    container = { slots = 4, kind = "general" }

    [[items]]
    id = 600
    name = "Unique Token"
    max_stack = 20
    max_count = 10

    [[items]]
    id = 700
    name = "Peacebloom"
    class = "trade_goods"
    max_stack = 20
    flags = 8
"#;

const CLOTH: u32 = 100;
const HELM: u32 = 200;
const SWORD: u32 = 300;
const POUCH: u32 = 400;
const TOKEN: u32 = 600;
const HERB: u32 = 700;

fn player() -> Player {
    let catalog = StaticCatalog::from_toml_str(CATALOG).unwrap();
    Player::new(
        Arc::new(catalog),
        Arc::new(InventoryConfig::default()),
        Arc::new(ItemGuidAllocator::default()),
        CharacterProfile::new(CharacterGuid(1), 60, 1, 1),
    )
}

fn snapshot(player: &Player) -> Vec<(Position, Item)> {
    player.store().iter_placed().map(|(p, item)| (p, item.clone())).collect()
}

fn total_units(player: &Player, entry: u32) -> u32 {
    player.store().count_item(entry, true, None)
}

#[test]
fn test_positions_stay_consistent() {
    let mut player = player();
    player.equip_new_item(Some(Position::BagSlot(0)), POUCH).unwrap();
    player.store_new_item(Anchor::Any, CLOTH, 35).unwrap();
    let helm = player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0];
    player.equip_item(None, helm).unwrap();
    player
        .split_item(Position::Backpack(0), Position::Bag { container: 19, index: 3 }, 7)
        .unwrap();
    player.store_item(Anchor::Any, helm).unwrap();

    player.store().verify_consistency().unwrap();
    assert_eq!(total_units(&player, CLOTH), 35);
    for (position, item) in player.store().iter_placed() {
        assert_eq!(item.position(), Some(position));
        assert_eq!(player.store().guid_at(position), Some(item.guid));
    }
}

#[test]
fn test_stacks_never_exceed_their_size() {
    let mut player = player();
    let stacks = player.store_new_item(Anchor::Any, CLOTH, 47).unwrap();
    assert_eq!(stacks.len(), 3);
    assert!(player.store().iter().all(|item| item.count <= 20));
    assert_eq!(total_units(&player, CLOTH), 47);
}

#[test]
fn test_ownership_ceiling_stores_nothing() {
    let mut player = player();
    player.store_new_item(Anchor::Any, TOKEN, 8).unwrap();
    assert_eq!(
        player.store_new_item(Anchor::Any, TOKEN, 5),
        Err(InventoryError::ItemMaxCount)
    );
    assert_eq!(total_units(&player, TOKEN), 8);
}

#[test]
fn test_split_rules() {
    let mut player = player();
    player.store_new_item(Anchor::Any, CLOTH, 10).unwrap();
    let target = Position::Backpack(4);

    assert_eq!(player.split_item(Position::Backpack(0), target, 0), Err(InventoryError::SplitFailed));
    assert_eq!(player.split_item(Position::Backpack(0), target, 10), Err(InventoryError::SplitFailed));
    assert_eq!(player.split_item(Position::Backpack(0), target, 11), Err(InventoryError::TooFewToSplit));

    let piece = player.split_item(Position::Backpack(0), target, 4).unwrap();
    assert_eq!(player.store().get(piece).unwrap().count, 4);
    assert_eq!(player.store().item_at(Position::Backpack(0)).unwrap().count, 6);
}

#[test]
fn test_failed_swap_changes_nothing() {
    let mut player = player();
    player.store_new_item(Anchor::Any, HELM, 1).unwrap();
    player.drain_events();
    let before = snapshot(&player);
    let stats = player.stats().clone();

    let result = player.swap_item(Position::Backpack(0), Position::Equipment(EquipSlot::MainHand));
    assert!(result.is_err());
    assert_eq!(snapshot(&player), before);
    assert_eq!(player.stats(), &stats);
    assert!(matches!(player.drain_events().as_slice(), [InventoryEvent::EquipError { .. }]));
}

#[test]
fn test_equip_and_unequip_are_symmetric() {
    let mut player = player();
    let bare = player.stats().clone();
    let helm = player.equip_new_item(None, HELM).unwrap();
    assert_ne!(player.stats(), &bare);

    player.store_item(Anchor::Any, helm).unwrap();
    assert_eq!(player.stats(), &bare);
}

#[test]
fn test_level_scaling_round_trip() {
    let mut player = player();
    player.equip_new_item(None, HELM).unwrap();
    player.equip_new_item(None, SWORD).unwrap();
    let full = player.stats().clone();

    player.set_effective_level(20);
    player.set_effective_level(35);
    player.set_effective_level(60);
    assert_eq!(player.stats(), &full);
}

#[test]
fn test_vendor_charges_nothing_when_full() {
    let mut player = player();
    for _ in 0..16 {
        player.store_new_item(Anchor::Any, HELM, 1).unwrap();
    }
    player.give_money(Money::from_copper(1_000)).unwrap();
    let mut vendor = Vendor::new(None).with_item(VendorItem::limited(SWORD, 3));

    assert_eq!(player.buy_item(&mut vendor, 0, 1, Anchor::Any), Err(InventoryError::InvFull));
    assert_eq!(player.wallet().money(), Money::from_copper(1_000));
    assert_eq!(vendor.items[0].current_count, 3);
}

#[test]
fn test_buyback_keeps_the_newest_sales() {
    let mut player = player();
    let mut sold = Vec::new();
    for now in 1..=13 {
        let helm = player.store_new_item(Anchor::Any, HELM, 1).unwrap()[0];
        assert_eq!(player.sell_item(helm, 0, now), Ok(Money::from_copper(250)));
        sold.push(helm);
    }

    assert!(!player.store().contains(sold[0]));
    assert!(sold[1..].iter().all(|guid| player.store().contains(*guid)));
    assert_eq!(player.wallet().money(), Money::from_copper(250 * 13));
}

#[test]
fn test_reagents_move_into_the_reagent_bank() {
    let mut player = player();
    player.set_bank_access(0, true, 0);
    let herbs = player.store_new_item(Anchor::Any, HERB, 12).unwrap()[0];
    let from = Position::Backpack(0);
    assert_eq!(player.store().guid_at(from), Some(herbs));

    player.swap_item(from, Position::ReagentBank(0)).unwrap();
    assert_eq!(player.store().guid_at(Position::ReagentBank(0)), Some(herbs));
    assert!(player.store().item_at(from).is_none());

    let piece = player.split_item(Position::ReagentBank(0), Position::ReagentBank(5), 4).unwrap();
    assert_eq!(player.store().item_at(Position::ReagentBank(5)).unwrap().count, 4);

    // Splitting onto a stack of the same herb merges into it.
    player.split_item(Position::ReagentBank(0), Position::ReagentBank(5), 3).unwrap();
    assert_eq!(player.store().get(piece).unwrap().count, 7);
    assert_eq!(player.store().get(herbs).unwrap().count, 5);
    assert_eq!(total_units(&player, HERB), 12);
    player.store().verify_consistency().unwrap();
}

#[test]
fn test_reagent_bank_refuses_other_goods() {
    let mut player = player();
    player.set_bank_access(0, true, 0);
    player.store_new_item(Anchor::Any, CLOTH, 5).unwrap();
    let before = snapshot(&player);
    player.drain_events();

    assert_eq!(
        player.swap_item(Position::Backpack(0), Position::ReagentBank(0)),
        Err(InventoryError::WrongBagType)
    );
    assert_eq!(
        player.split_item(Position::Backpack(0), Position::ReagentBank(1), 2),
        Err(InventoryError::WrongBagType)
    );
    assert_eq!(snapshot(&player), before);
    assert!(matches!(
        player.drain_events()[0],
        InventoryEvent::EquipError { error: InventoryError::WrongBagType, .. }
    ));
}

#[test]
fn test_locked_reagent_bank_takes_nothing() {
    let mut player = player();
    player.store_new_item(Anchor::Any, HERB, 5).unwrap();
    let before = snapshot(&player);

    assert_eq!(
        player.swap_item(Position::Backpack(0), Position::ReagentBank(0)),
        Err(InventoryError::NoBankSlot)
    );
    assert_eq!(snapshot(&player), before);
}

#[test]
fn test_account_bank_moves_respect_purchased_tabs() {
    let mut player = player();
    player.set_bank_access(0, false, 1);
    let cloth = player.store_new_item(Anchor::Any, CLOTH, 10).unwrap()[0];
    let first = Position::AccountBank { tab: 0, index: 0 };
    let second = Position::AccountBank { tab: 0, index: 3 };

    player.swap_item(Position::Backpack(0), first).unwrap();
    assert_eq!(player.store().guid_at(first), Some(cloth));

    player.split_item(first, second, 4).unwrap();
    assert_eq!(player.store().item_at(first).unwrap().count, 6);
    assert_eq!(player.store().item_at(second).unwrap().count, 4);

    let before = snapshot(&player);
    assert_eq!(
        player.swap_item(first, Position::AccountBank { tab: 1, index: 0 }),
        Err(InventoryError::WrongBagType)
    );
    assert_eq!(snapshot(&player), before);
    player.store().verify_consistency().unwrap();
}

#[test]
fn test_storing_zero_units_changes_nothing() {
    let mut player = player();

    assert_eq!(player.store_new_item(Anchor::Any, CLOTH, 0), Err(InventoryError::ItemNotFound));
    assert!(snapshot(&player).is_empty());
    assert_eq!(total_units(&player, CLOTH), 0);
}
