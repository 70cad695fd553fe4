//! Criterion benchmarks for mcpaint critical paths
//!
//! Benchmarks the image pipeline:
//! - Area-averaging downscale
//! - Channel reduction and quantization
//! - Scanning a grid into a recording world

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, Rgb, RgbImage};
use mcpaint::builder::ImageBuilder;
use mcpaint::preprocess::{preprocess, resize_area, ChannelMode, Quantizer};
use mcpaint::registry::PaletteRegistry;
use mcpaint::validate::{validate, RenderParams};
use mcpaint::world::{RecordingWorld, TilePos};

// =============================================================================
// Test Data Generators
// =============================================================================

/// Generate a gradient image with some per-channel variation
fn make_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    })
}

fn registry() -> PaletteRegistry {
    PaletteRegistry::from_toml(
        r#"
[image]
height = 100
default_colormap = "one_value.grayscale"
building_time_delay = 0.0

[image.size]
min = 8
max = 512
default = 128

[image.blocks]
"one_value.grayscale" = [[35, 15], [35, 7], [35, 8], [35, 0]]
"#,
    )
    .expect("benchmark registry")
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize_area");
    for &(w, h) in &[(640u32, 480u32), (1920, 1080)] {
        let img = make_image(w, h);
        group.throughput(Throughput::Elements((w * h) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}x{}", w, h)), &img, |b, img| {
            b.iter(|| resize_area(black_box(img), 128, 96))
        });
    }
    group.finish();
}

fn bench_quantize(c: &mut Criterion) {
    let quantizer = Quantizer::new(16).expect("non-empty palette");
    c.bench_function("quantize_all_values", |b| {
        b.iter(|| {
            (0..=255u8).map(|v| quantizer.quantize(ChannelMode::Luma.reduce([v, v / 2, 255 - v]))).sum::<u32>()
        })
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let img = DynamicImage::ImageRgb8(make_image(1024, 768));
    c.bench_function("preprocess_1024x768_to_256", |b| {
        b.iter(|| preprocess(black_box(&img), 256, 4, ChannelMode::Luma))
    });
}

fn bench_scan(c: &mut Criterion) {
    let registry = registry();
    let config = validate(&registry, RenderParams { max_size: Some(256), ..Default::default() })
        .expect("valid params");
    let builder = ImageBuilder::new(&registry, config);
    let grid = builder.quantize(&DynamicImage::ImageRgb8(make_image(256, 256))).expect("grid");

    c.bench_function("scan_256x256", |b| {
        b.iter(|| {
            let mut world = RecordingWorld::new(TilePos::default());
            builder.build_grid(&mut world, black_box(&grid)).expect("scan");
            world.commands().len()
        })
    });
}

criterion_group!(benches, bench_resize, bench_quantize, bench_preprocess, bench_scan);
criterion_main!(benches);
