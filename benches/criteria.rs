use bayescmp::compare::waic;
use bayescmp::entropy::entropy;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Normal;

fn bench_waic(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let log_lik = Array2::from_shape_fn((2000, 50), |_| {
        -1.0 + 0.1 * rng.sample::<f64, _>(Normal::standard())
    });
    c.bench_function("waic_2000x50", |b| {
        b.iter(|| waic(black_box(log_lik.view())))
    });
}

fn bench_entropy(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let raw: Vec<f64> = (0..1000).map(|_| rng.gen_range(0.01..1.0)).collect();
    let total: f64 = raw.iter().sum();
    let pmf: Vec<f64> = raw.iter().map(|v| v / total).collect();
    c.bench_function("entropy_1000", |b| b.iter(|| entropy(black_box(&pmf))));
}

criterion_group!(benches, bench_waic, bench_entropy);
criterion_main!(benches);
