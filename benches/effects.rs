use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stream_effects::detection::{non_max_suppression, BoundingBox};
use stream_effects::effects::{
    background_blur, cartoon, edge_art, BlurParams, CartoonParams, EdgeParams,
};
use stream_effects::ml::SegmentationMask;
use stream_effects::telemetry::ProcessingStats;

fn noisy_frame(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.random(), rng.random(), rng.random()]))
}

fn benchmark_renderers(c: &mut Criterion) {
    let mut group = c.benchmark_group("renderers");
    group.sample_size(10);

    for &(width, height) in &[(320u32, 240u32), (640, 480)] {
        let frame = noisy_frame(width, height, 7);
        let label = format!("{}x{}", width, height);

        let mask = SegmentationMask::new(
            256,
            256,
            (0..256 * 256).map(|i| if i % 256 < 128 { 1.0 } else { 0.0 }).collect(),
        )
        .unwrap_or_else(|e| panic!("mask: {}", e));
        let blur = BlurParams::default();
        group.bench_with_input(BenchmarkId::new("blur", &label), &frame, |b, frame| {
            b.iter(|| background_blur::render(black_box(frame), &mask, &blur))
        });

        let edges = EdgeParams::default();
        group.bench_with_input(BenchmarkId::new("edge_art", &label), &frame, |b, frame| {
            b.iter(|| edge_art::render(black_box(frame), &edges))
        });

        let toon = CartoonParams::default();
        group.bench_with_input(BenchmarkId::new("cartoon", &label), &frame, |b, frame| {
            b.iter(|| cartoon::render(black_box(frame), &toon))
        });
    }

    group.finish();
}

fn benchmark_nms(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let boxes: Vec<BoundingBox> = (0..200)
        .map(|_| {
            let x = rng.random_range(0.0..600.0f32);
            let y = rng.random_range(0.0..400.0f32);
            BoundingBox::new(x, y, x + 40.0, y + 40.0)
        })
        .collect();
    let scores: Vec<f32> = (0..200).map(|_| rng.random()).collect();

    c.bench_function("nms_200", |b| {
        b.iter(|| non_max_suppression(black_box(&boxes), black_box(&scores), 0.5))
    });
}

fn benchmark_telemetry(c: &mut Criterion) {
    let mut stats = ProcessingStats::new();
    for i in 0..100u64 {
        stats.update(std::time::Duration::from_micros(10_000 + i));
    }

    c.bench_function("stats_snapshot", |b| b.iter(|| black_box(stats.snapshot())));
}

criterion_group!(benches, benchmark_renderers, benchmark_nms, benchmark_telemetry);
criterion_main!(benches);
