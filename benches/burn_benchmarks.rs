//! Benchmarks for layout, compositing and full burns.
//!
//! Run with: cargo bench
//!
//! The media benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::hint::black_box;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use criterion::Criterion;
use image::{Rgba, RgbaImage};
use subburn::{
    BurnOptions, Compositor, Cue, Effect, EncoderOptions, FfmpegLogLevel, GlyphRasterizer, LineMask,
    SubtitleStyle, TextMeasure, burn_subtitles, composite_frame, wrap,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

const LONG_TEXT: &str = "The quick brown fox jumps over the lazy dog while the \
    narrator keeps talking for long enough that the caption has to wrap onto \
    several lines before it fits";

/// Fixed-advance glyphs so the numbers do not depend on installed fonts.
struct BlockRasterizer;

impl TextMeasure for BlockRasterizer {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }
}

impl GlyphRasterizer for BlockRasterizer {
    fn rasterize_line(&self, text: &str, font_size: f32) -> LineMask {
        let width = self.measure(text, font_size).round() as u32;
        let height = font_size.ceil() as u32;
        LineMask {
            width,
            height,
            left: 0,
            ascent: (font_size * 0.8).round() as i32,
            coverage: vec![255; (width * height) as usize],
        }
    }
}

fn frame_1080p() -> RgbaImage {
    RgbaImage::from_pixel(1920, 1080, Rgba([40, 40, 40, 255]))
}

fn benchmark_wrap(criterion: &mut Criterion) {
    criterion.bench_function("wrap long caption", |bencher| {
        bencher.iter(|| {
            wrap(black_box(LONG_TEXT), 1536.0, |line| {
                BlockRasterizer.measure(line, 43.2)
            })
        });
    });
}

fn benchmark_composite(criterion: &mut Criterion) {
    let source = frame_1080p();
    let cues = vec![Cue::new("1", 0.0, 10.0, LONG_TEXT)];
    let style = SubtitleStyle::default();

    criterion.bench_function("composite_frame 1080p (outline)", |bencher| {
        bencher.iter(|| {
            composite_frame(
                black_box(&source),
                5.0,
                &cues,
                &style,
                10.0,
                &BlockRasterizer,
            )
        });
    });

    let mut compositor = Compositor::new(1920, 1080, style.clone(), Some(Arc::new(BlockRasterizer)));
    criterion.bench_function("Compositor 1080p (cached overlay)", |bencher| {
        bencher.iter(|| compositor.composite(black_box(&source), 5.0, &cues, 10.0));
    });

    let glow = SubtitleStyle {
        effect: Effect::Glow,
        ..SubtitleStyle::default()
    };
    criterion.bench_function("composite_frame 1080p (glow)", |bencher| {
        bencher.iter(|| {
            composite_frame(black_box(&source), 5.0, &cues, &glow, 10.0, &BlockRasterizer)
        });
    });
}

fn benchmark_burn(criterion: &mut Criterion) {
    subburn::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let dir = std::env::temp_dir().join("subburn-bench");
    let _ = std::fs::create_dir_all(&dir);
    let output = dir.join("burned.mp4");
    let cues = vec![
        Cue::new("1", 0.5, 2.0, "Benchmark cue one"),
        Cue::new("2", 2.5, 4.5, "Benchmark cue two"),
    ];

    let mut group = criterion.benchmark_group("burn");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));
    group.bench_function("burn sample video at 10 fps", |bencher| {
        bencher.iter(|| {
            let _ = burn_subtitles(
                SAMPLE_VIDEO,
                &output,
                cues.clone(),
                SubtitleStyle::default(),
                BurnOptions::new().with_encoder(EncoderOptions::default().with_fps(10)),
            );
        });
    });
    group.finish();
}

criterion::criterion_group!(benches, benchmark_wrap, benchmark_composite, benchmark_burn);
criterion::criterion_main!(benches);
