//! Benchmarks for position arithmetic.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_core::types::{PositionSet, PriceSnapshot, TraderId};
use rust_decimal::Decimal;

fn generate_prices(size: usize) -> Vec<Decimal> {
    (0..size)
        .map(|i| Decimal::new(10_000 + (i as i64 * 37) % 5_000, 2))
        .collect()
}

fn benchmark_increase(c: &mut Criterion) {
    let mut group = c.benchmark_group("increase");

    for size in [100, 1000, 10000].iter() {
        let prices = generate_prices(*size);

        group.bench_with_input(BenchmarkId::new("single_symbol", size), &prices, |b, prices| {
            b.iter(|| {
                let mut set = PositionSet::new(TraderId::new());
                for price in prices {
                    set.increase("AAPL", 10, black_box(*price)).ok();
                }
                set
            })
        });
    }

    group.finish();
}

fn benchmark_valuate(c: &mut Criterion) {
    let mut group = c.benchmark_group("valuate");

    for size in [10, 100, 1000].iter() {
        let mut set = PositionSet::new(TraderId::new());
        let mut snapshot = PriceSnapshot::new();
        for (i, price) in generate_prices(*size).into_iter().enumerate() {
            let symbol = format!("SYM{}", i);
            set.increase(&symbol, 5, price).ok();
            snapshot.insert(symbol, price);
        }

        group.bench_with_input(BenchmarkId::new("positions", size), &set, |b, set| {
            b.iter(|| set.valuate(black_box(&snapshot)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_increase, benchmark_valuate);
criterion_main!(benches);
