//! Criterion benchmarks for the denoising kernels and the preview cache.
//!
//! Run with: cargo bench -p denoise_core
//! Run specific: cargo bench -p denoise_core -- bench_gaussian

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use rand::prelude::*;

use denoise_core::kernels::{diffusion, gaussian, nlmeans, wavelet};
use denoise_core::{
    DenoiseParams, DiffusionParams, GaussianParams, NonLocalMeansParams, ParameterFingerprint,
    PixelBuffer, PreviewCache, WaveletParams,
};

fn random_plane(rows: usize, cols: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.gen())
}

fn bench_gaussian(c: &mut Criterion) {
    let mut group = c.benchmark_group("gaussian");

    for size in [64, 128, 256] {
        let input = random_plane(size, size, 42);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("blur", size), &size, |b, _| {
            b.iter(|| gaussian::gaussian_blur(black_box(input.view()), 1.5))
        });
    }

    group.finish();
}

fn bench_diffusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("diffusion");
    let input = random_plane(128, 128, 7);
    let params = DiffusionParams::default();

    group.throughput(Throughput::Elements((128 * 128) as u64));
    group.bench_function("perona_malik_128", |b| {
        b.iter(|| diffusion::anisotropic_diffusion(black_box(input.view()), &params))
    });

    group.finish();
}

fn bench_nlmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("nlmeans");
    group.sample_size(10);

    let input = random_plane(64, 64, 99);
    let params = NonLocalMeansParams::default();
    let table = nlmeans::ExpTable::new();

    group.throughput(Throughput::Elements((64 * 64) as u64));
    group.bench_function("nlm_64", |b| {
        b.iter(|| nlmeans::non_local_means(black_box(input.view()), &params, &table))
    });

    group.finish();
}

fn bench_wavelet(c: &mut Criterion) {
    let mut group = c.benchmark_group("wavelet");
    let input = random_plane(256, 256, 11);
    let params = WaveletParams::default();

    group.throughput(Throughput::Elements((256 * 256) as u64));
    group.bench_function("haar_256", |b| {
        b.iter(|| wavelet::wavelet_threshold(black_box(input.view()), &params))
    });

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("preview_cache");

    let keys: Vec<ParameterFingerprint> = (0..100)
        .map(|i| {
            ParameterFingerprint::new(
                &DenoiseParams::Gaussian(GaussianParams {
                    sigma: 0.1 + i as f32 * 0.05,
                }),
                0,
            )
        })
        .collect();
    let image = PixelBuffer::filled(256, 256, 128);

    group.bench_function("put_get_cycle", |b| {
        let mut cache = PreviewCache::new(100);
        b.iter(|| {
            for key in &keys {
                cache.put(key.clone(), image.clone());
            }
            for key in &keys {
                black_box(cache.get(key));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_gaussian,
    bench_diffusion,
    bench_nlmeans,
    bench_wavelet,
    bench_cache
);
criterion_main!(benches);
