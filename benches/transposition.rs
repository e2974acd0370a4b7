//! Criterion benchmarks for the probe/store hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ttable::transposition::{Bound, TranspositionTable};

/// Deterministic pseudo-random key sequence; the table only cares about bit
/// dispersion, not cryptographic quality.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn keys(count: usize) -> Vec<u64> {
    let mut state = 0x5EED;
    (0..count).map(|_| splitmix64(&mut state)).collect()
}

const OPS: usize = 100_000;

fn store(c: &mut Criterion) {
    let keys = keys(OPS);
    let mut group = c.benchmark_group("transposition");
    let _ = group.throughput(Throughput::Elements(OPS as u64));
    let _ = group.bench_function("store", |b| {
        let mut table = TranspositionTable::new(1 << 16);
        b.iter(|| {
            table.advance_generation();
            for (i, &key) in keys.iter().enumerate() {
                table.store(key, (i % 64) as u8, (i % 100) as i32, 0, Bound::Exact, None);
            }
        });
    });
    group.finish();
}

fn probe(c: &mut Criterion) {
    let keys = keys(OPS);
    let mut table = TranspositionTable::new(1 << 16);
    for (i, &key) in keys.iter().enumerate() {
        table.store(key, (i % 64) as u8, (i % 100) as i32, 0, Bound::Exact, None);
    }

    let mut group = c.benchmark_group("transposition");
    let _ = group.throughput(Throughput::Elements(OPS as u64));
    let _ = group.bench_function("probe", |b| {
        b.iter(|| {
            for &key in &keys {
                let _ = black_box(table.probe(key, 0));
            }
        });
    });
    group.finish();
}

criterion_group! {
    name = transposition;
    config = Criterion::default().sample_size(20);
    targets = store, probe
}

criterion_main!(transposition);
