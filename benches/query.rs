use std::sync::Arc;

use criterion::{black_box, Criterion};
use criterion::{criterion_group, criterion_main};

use cadence::element::Pedometer;
use cadence::{MemoryStore, SeriesConfig, TimeSeries, Timestamp};

const ELEMENTS: i64 = 100_000;

fn pedometer_series() -> TimeSeries<Pedometer> {
    let mut series = TimeSeries::open(Arc::new(MemoryStore::new()), SeriesConfig::default());
    for i in 0..ELEMENTS {
        series.insert(Pedometer::new(Timestamp::from_secs(i), i as f64 * 1.2, i * 2).with_pace(0.3, 2.0));
    }
    series
}

fn bench_query(c: &mut Criterion) {
    let series = pedometer_series();
    let mut group = c.benchmark_group("query");
    group.bench_function("value_at_interpolated", |b| {
        let mut i = 0_i64;
        b.iter(|| {
            i = (i + 7_919) % ELEMENTS;
            black_box(series.value_at(Timestamp::from_millis(i * 1_000 + 500)))
        });
    });
    group.bench_function("value_at_extrapolated", |b| {
        b.iter(|| black_box(series.value_at(Timestamp::from_secs(ELEMENTS * 2))));
    });
    group.bench_function("range_1h", |b| {
        b.iter(|| black_box(series.range(Timestamp::from_secs(40_000)..Timestamp::from_secs(43_600)).len()));
    });
    group.finish();
}

criterion_group!(benches, bench_query);
criterion_main!(benches);
