//! Benchmark for ledger hot paths.
//!
//! Run with: cargo bench --package backpack_economy --bench ledger_benchmark

use backpack_economy::catalog::{HEALTH_POTION_RECIPE, HERB};
use backpack_economy::{CraftingEngine, ItemCatalog, Ledger, DEFAULT_CRAFT_TTL};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn filled_ledger() -> Ledger {
    let mut ledger = Ledger::new(100);

    // 20 holders with 5 items each
    for holder in 0..20 {
        for item in 1..=5 {
            ledger
                .create(&format!("player_{holder}"), item, 1_000, 1_000_000, 0)
                .unwrap();
        }
    }

    ledger
}

fn benchmark_has(c: &mut Criterion) {
    let ledger = filled_ledger();

    c.bench_function("ledger_has_hit", |b| {
        b.iter(|| black_box(ledger.has(black_box("player_7"), 3, 10)));
    });

    c.bench_function("ledger_has_miss", |b| {
        b.iter(|| black_box(ledger.has(black_box("nobody"), 3, 10)));
    });
}

fn benchmark_consume(c: &mut Criterion) {
    c.bench_function("ledger_consume", |b| {
        let mut ledger = filled_ledger();
        b.iter(|| {
            if !ledger.consume("player_3", 2, 10) {
                ledger.create("player_3", 2, 1_000, 1_000_000, 10).unwrap();
            }
        });
    });
}

fn benchmark_craft(c: &mut Criterion) {
    let engine = CraftingEngine::new(ItemCatalog::standard(), DEFAULT_CRAFT_TTL);

    c.bench_function("craft_health_potion", |b| {
        b.iter(|| {
            let mut ledger = Ledger::new(100);
            ledger.create("alice", HERB, 2, 3600, 0).unwrap();
            black_box(engine.craft(&mut ledger, "alice", HEALTH_POTION_RECIPE, 0))
        });
    });
}

criterion_group!(benches, benchmark_has, benchmark_consume, benchmark_craft);
criterion_main!(benches);
