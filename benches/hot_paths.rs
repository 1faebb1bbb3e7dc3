//! Criterion benchmarks for the per-frame and load-time paths.
//!
//! Run with: cargo bench --bench hot_paths

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lvt_map::choropleth;
use lvt_map::data::{parse_dataset, Dataset};
use lvt_map::map::{self, TerminalMap, Viewport};

/// A `side` x `side` grid of square parcels with spread-out land values
fn synthetic_geojson(side: usize) -> String {
    let size = 0.001;
    let mut features = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let lon = -2.5 + col as f64 * size;
            let lat = 57.0 + row as f64 * size;
            let value = ((row * side + col) * 37 % 4000) as f64;
            features.push(format!(
                r#"{{"type":"Feature","geometry":{{"type":"Polygon","coordinates":[[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}},"properties":{{"Label":"SCT{id:07}","Land_Value_per_m2":{value},"Area":100,"Council_Tax_Amount":900}}}}"#,
                x0 = lon,
                y0 = lat,
                x1 = lon + size,
                y1 = lat + size,
                id = row * side + col,
                value = value,
            ));
        }
    }
    format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features.join(","))
}

fn dataset(side: usize) -> Dataset {
    let mut bytes = synthetic_geojson(side).into_bytes();
    parse_dataset(&mut bytes).expect("synthetic data parses")
}

fn rendered_map(dataset: &Dataset, cols: u16, rows: u16) -> TerminalMap {
    let mut surface = TerminalMap::new(Viewport::new(-2.45, 57.05, 2000.0, 0, 0));
    surface.resize(cols, rows);
    map::render(dataset, &mut surface, (8, 8));
    surface
}

// ---------------------------------------------------------------------------
// Benchmark: GeoJSON parsing
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let json = synthetic_geojson(100);

    group.bench_function("features_10k", |b| {
        b.iter(|| {
            let mut bytes = json.clone().into_bytes();
            black_box(parse_dataset(&mut bytes).expect("parses"))
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: frame rasterisation and hit-testing
// ---------------------------------------------------------------------------

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let ds = dataset(100);
    let surface = rendered_map(&ds, 160, 48);

    group.bench_function("fitted_160x48", |b| {
        b.iter(|| black_box(surface.frame(black_box(160), black_box(48))));
    });

    group.bench_function("region_at_center", |b| {
        b.iter(|| black_box(surface.region_at(black_box(80), black_box(24))));
    });

    group.finish();
}

fn bench_bucket(c: &mut Criterion) {
    c.bench_function("bucket", |b| {
        b.iter(|| {
            for v in [0.0, 150.0, 450.0, 1700.0, 9000.0] {
                black_box(choropleth::bucket(black_box(Some(v))));
            }
        });
    });
}

criterion_group!(benches, bench_parse, bench_frame, bench_bucket);
criterion_main!(benches);
