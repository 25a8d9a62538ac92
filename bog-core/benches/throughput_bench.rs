//! Benchmark: sustained per-tick throughput of the QG -> OMS pipeline (§4.5,
//! §4.7), and the UER's per-event fill/position update (§4.4).
//!
//! Measures how many full generate+reconcile ticks and fill-processing
//! events the core can sustain a second, end to end, against a populated
//! book and a resting-order ladder.

use bog_core::book::OrderBookReplica;
use bog_core::core::order::Side;
use bog_core::core::position::Position;
use bog_core::oms::{Oms, OmsParams};
use bog_core::oss::OrderStateStore;
use bog_core::qg::{QuoteGenerator, SandboxParams, SandboxQuoteGenerator};
use bog_core::uer::{UserEvent, UserEventReducer};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn populated_book() -> OrderBookReplica {
    let mut book = OrderBookReplica::new("BTC-PERP", 20);
    let bids: Vec<(f64, f64)> = (0..20).map(|i| (100.0 - i as f64 * 0.1, 1.0)).collect();
    let asks: Vec<(f64, f64)> = (0..20).map(|i| (100.1 + i as f64 * 0.1, 1.0)).collect();
    book.refresh(&bids, &asks, 0, 0).unwrap();
    book
}

fn bench_full_tick(c: &mut Criterion) {
    c.bench_function("full_tick_generate_and_reconcile", |b| {
        let book = populated_book();
        let position = Position::flat("BTC-PERP", 0);
        let oms = Oms::new(OmsParams {
            sensitivity: 0.2,
            max_position: 1_000_000.0,
            total_orders: 10,
            lost_in_flight_ms: 3_000,
        });
        let mut qg = SandboxQuoteGenerator::new(SandboxParams {
            total_orders: 10,
            max_position: 100_000.0,
            minimum_spread_bps: 5.0,
            tick_size: 0.01,
            symbol: "BTC-PERP".to_string(),
        });
        let mut oss = OrderStateStore::new();
        let mut now = 0u64;
        b.iter(|| {
            now += 1;
            let proposed = qg.generate(black_box(&book), &position, now);
            oms.reconcile(&mut oss, proposed, book.mid().unwrap(), &position, now);
        });
    });
}

fn bench_fill_processing(c: &mut Criterion) {
    c.bench_function("uer_fill_then_position_snapshot", |b| {
        let mut oss = OrderStateStore::new();
        let mut position = Position::flat("BTC-PERP", 0);
        let mut now = 0u64;
        b.iter(|| {
            now += 1;
            let mut uer = UserEventReducer::new(&mut oss, &mut position);
            uer.process(UserEvent::Fill {
                side: Side::Buy,
                price: 100.0,
                size: black_box(0.01),
                ts: now,
            });
        });
    });
}

criterion_group!(benches, bench_full_tick, bench_fill_processing);
criterion_main!(benches);
