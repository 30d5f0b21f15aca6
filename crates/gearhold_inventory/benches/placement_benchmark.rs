//! Benchmark for placement planning.
//!
//! Run with: cargo bench --package gearhold_inventory --bench placement_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gearhold_inventory::template::BagKind;
use gearhold_inventory::{
    Anchor, CharacterProfile, InventoryConfig, ItemGuidAllocator, ItemTemplate, Player, StaticCatalog,
};
use gearhold_shared::{CharacterGuid, Position};
use std::sync::Arc;

const CLOTH: u32 = 100;
const BAG: u32 = 400;

fn loaded_player() -> Player {
    let catalog = StaticCatalog::new()
        .with_template(ItemTemplate::new(CLOTH, "Linen Cloth").with_max_stack(20))
        .with_template(
            ItemTemplate::new(BAG, "Traveler's Backpack").with_container(16, BagKind::General),
        );
    let mut player = Player::new(
        Arc::new(catalog),
        Arc::new(InventoryConfig::default()),
        Arc::new(ItemGuidAllocator::default()),
        CharacterProfile::new(CharacterGuid(1), 60, 1, 1),
    );
    for slot in 0..4 {
        player.equip_new_item(Some(Position::BagSlot(slot)), BAG).unwrap();
    }
    // Partial stacks everywhere so the merge pass has work to do.
    for _ in 0..70 {
        player.store_new_item(Anchor::Any, CLOTH, 13).unwrap();
    }
    player
}

fn benchmark_plan_new_stack(c: &mut Criterion) {
    let player = loaded_player();

    c.bench_function("plan_store_new_merge_and_free", |b| {
        b.iter(|| {
            let plan = player.planner().can_store_new(black_box(Anchor::Any), CLOTH, black_box(100));
            black_box(plan)
        });
    });
}

fn benchmark_batch_check(c: &mut Criterion) {
    let player = loaded_player();
    let items: Vec<_> = player.store().iter().filter(|item| item.entry == CLOTH).take(6).collect();

    c.bench_function("can_store_items_six", |b| {
        b.iter(|| black_box(player.planner().can_store_items(black_box(&items), &[])));
    });
}

criterion_group!(benches, benchmark_plan_new_stack, benchmark_batch_check);
criterion_main!(benches);
