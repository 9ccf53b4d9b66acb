use criterion::{Criterion, criterion_group, criterion_main};
use quire_engine::render::to_markup;
use quire_engine::sanitize::sanitize_markup;
mod common;

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");
    group.sample_size(10);

    let clean = common::generate_markup(100);
    let messy = common::generate_messy_markup(100);

    group.bench_function("clean_markup", |b| {
        b.iter(|| sanitize_markup(std::hint::black_box(&clean)));
    });

    group.bench_function("messy_markup", |b| {
        b.iter(|| sanitize_markup(std::hint::black_box(&messy)));
    });

    let tree = sanitize_markup(&clean);
    group.bench_function("render", |b| {
        b.iter(|| to_markup(std::hint::black_box(&tree)));
    });

    group.finish();
}

criterion_group!(benches, bench_sanitize);
criterion_main!(benches);
