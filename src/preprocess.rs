//! Image preprocessing: downscaling, channel reduction and quantization
//!
//! Turns a decoded raster image into a grid of palette indices:
//! - Downscale with area averaging so neither side exceeds `max_size`
//! - Reduce every pixel to one 8-bit value ([`ChannelMode`])
//! - Bin the value into `palette_length` equal-width buckets

use image::{DynamicImage, GenericImageView, RgbImage};
use std::path::Path;
use thiserror::Error;

use crate::registry::PaletteKind;

/// Error type for preprocessing
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreprocessError {
    /// The image file could not be read
    #[error("Cannot read image '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The image data could not be decoded
    #[error("Cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
    /// Quantization needs at least one bucket
    #[error("Palette must contain at least one block")]
    EmptyPalette,
    /// The target size must leave at least one block per side
    #[error("Maximum image size must be at least 1")]
    ZeroSize,
}

/// How each RGB pixel is reduced to a single 8-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// BT.601 luma: 0.299 R + 0.587 G + 0.114 B
    Luma,
    /// Brightest channel: max(R, G, B)
    Value,
}

impl From<PaletteKind> for ChannelMode {
    fn from(kind: PaletteKind) -> Self {
        match kind {
            PaletteKind::SingleValue => ChannelMode::Luma,
            PaletteKind::MultiValue => ChannelMode::Value,
        }
    }
}

impl ChannelMode {
    /// Reduce one RGB pixel.
    pub fn reduce(self, [r, g, b]: [u8; 3]) -> u8 {
        match self {
            // 14-bit fixed point weights; they sum to 1 << 14 so gray stays exact
            ChannelMode::Luma => {
                ((r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14) as u8
            }
            ChannelMode::Value => r.max(g).max(b),
        }
    }
}

/// Equal-width binning of `[0, 256)` into palette indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantizer {
    palette_length: u32,
}

impl Quantizer {
    /// Returns `None` for an empty palette.
    pub fn new(palette_length: usize) -> Option<Self> {
        if palette_length == 0 {
            return None;
        }
        let palette_length = u32::try_from(palette_length).unwrap_or(u32::MAX);
        Some(Self { palette_length })
    }

    /// `floor(value / (256 / palette_length))`, computed exactly in integers.
    pub fn quantize(&self, value: u8) -> u32 {
        ((value as u64 * self.palette_length as u64) / 256) as u32
    }

    pub fn palette_length(&self) -> u32 {
        self.palette_length
    }
}

/// A row-major grid of palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedImage {
    width: u32,
    height: u32,
    source_dimensions: (u32, u32),
    indices: Vec<u32>,
}

impl QuantizedImage {
    /// Build a grid from rows of indices; rows must all have the same length.
    pub fn from_rows(rows: &[Vec<u32>]) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        let (width, height) = (width as u32, rows.len() as u32);
        Some(Self {
            width,
            height,
            source_dimensions: (width, height),
            indices: rows.concat(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions of the image before downscaling.
    pub fn source_dimensions(&self) -> (u32, u32) {
        self.source_dimensions
    }

    pub fn get(&self, row: u32, col: u32) -> Option<u32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.indices.get((row * self.width + col) as usize).copied()
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        // chunks panics on 0; an empty grid has no rows either way
        self.indices.chunks(self.width.max(1) as usize)
    }

    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.rows().map(<[u32]>::to_vec).collect()
    }
}

/// Load and decode an image from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage, PreprocessError> {
    let bytes = std::fs::read(path)
        .map_err(|source| PreprocessError::Io { path: path.display().to_string(), source })?;
    let image = image::load_from_memory(&bytes)?;
    let (width, height) = image.dimensions();
    tracing::info!(path = %path.display(), width, height, "Image has been loaded");
    Ok(image)
}

/// Output dimensions after fitting `(width, height)` into `max_size`.
///
/// Width is the long side only when strictly greater than height, so square
/// images are treated as height-dominant. The short side is rounded and never
/// drops below 1. A `max_size` of 0 is treated as 1.
pub fn target_dimensions(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let max_size = max_size.max(1);
    let scale_short = |short: u32, long: u32| -> u32 {
        let scaled = (max_size as f64 * short as f64 / long as f64).round() as u32;
        scaled.clamp(1, max_size)
    };

    if width > height && width > max_size {
        (max_size, scale_short(height, width))
    } else if height >= width && height > max_size {
        (scale_short(width, height), max_size)
    } else {
        (width, height)
    }
}

/// Per-output-pixel source contributions along one axis.
///
/// Each output cell covers `src / dst` source cells; the weight of a source
/// cell is the fraction of the output footprint it overlaps, so every row of
/// weights sums to 1.
fn area_weights(src: u32, dst: u32) -> Vec<Vec<(usize, f32)>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|out| {
            let start = out as f64 * scale;
            let end = (start + scale).min(src as f64);
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src);
            (first..last)
                .filter_map(|i| {
                    let overlap = end.min(i as f64 + 1.0) - start.max(i as f64);
                    (overlap > 1e-9).then_some((i as usize, (overlap / scale) as f32))
                })
                .collect()
        })
        .collect()
}

/// Downscale an RGB image with area averaging.
pub fn resize_area(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    if (src_w, src_h) == (width, height) || width == 0 || height == 0 {
        return image.clone();
    }

    let x_weights = area_weights(src_w, width);
    let y_weights = area_weights(src_h, height);
    let src = image.as_raw();

    // Horizontal pass into a float buffer of src_h rows x width columns
    let mut horizontal = vec![[0f32; 3]; (src_h * width) as usize];
    for y in 0..src_h as usize {
        let row = &src[y * src_w as usize * 3..(y + 1) * src_w as usize * 3];
        for (x, weights) in x_weights.iter().enumerate() {
            let mut acc = [0f32; 3];
            for &(sx, w) in weights {
                for c in 0..3 {
                    acc[c] += row[sx * 3 + c] as f32 * w;
                }
            }
            horizontal[y * width as usize + x] = acc;
        }
    }

    let mut out = RgbImage::new(width, height);
    for (y, weights) in y_weights.iter().enumerate() {
        for x in 0..width as usize {
            let mut acc = [0f32; 3];
            for &(sy, w) in weights {
                let px = horizontal[sy * width as usize + x];
                for c in 0..3 {
                    acc[c] += px[c] * w;
                }
            }
            let pixel = image::Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8));
            out.put_pixel(x as u32, y as u32, pixel);
        }
    }
    out
}

/// Convert an image into a grid of palette indices.
pub fn preprocess(
    image: &DynamicImage,
    max_size: u32,
    palette_length: usize,
    mode: ChannelMode,
) -> Result<QuantizedImage, PreprocessError> {
    let quantizer = Quantizer::new(palette_length).ok_or(PreprocessError::EmptyPalette)?;
    if max_size == 0 {
        return Err(PreprocessError::ZeroSize);
    }

    let rgb = image.to_rgb8();
    let source_dimensions = rgb.dimensions();
    let (width, height) = target_dimensions(source_dimensions.0, source_dimensions.1, max_size);

    let rgb = if (width, height) != source_dimensions {
        let resized = resize_area(&rgb, width, height);
        tracing::info!(
            "Image has been downscaled from {:?} to {:?}",
            source_dimensions,
            (width, height)
        );
        resized
    } else {
        tracing::info!(
            "Image has not been downscaled as it is already appropriate with shape {:?}",
            source_dimensions
        );
        rgb
    };

    let indices = rgb.pixels().map(|p| quantizer.quantize(mode.reduce(p.0))).collect();
    tracing::info!(?mode, palette_length, "Image has been preprocessed");

    Ok(QuantizedImage { width, height, source_dimensions, indices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb};

    #[test]
    fn test_quantize_range_and_monotonic() {
        for len in 1..=20usize {
            let q = Quantizer::new(len).unwrap();
            let mut prev = 0;
            for v in 0..=255u8 {
                let idx = q.quantize(v);
                assert!(idx < len as u32, "len={} v={} idx={}", len, v, idx);
                assert!(idx >= prev);
                prev = idx;
            }
            assert_eq!(q.quantize(0), 0);
            assert_eq!(q.quantize(255), len as u32 - 1);
        }
    }

    #[test]
    fn test_quantize_bucket_edges() {
        let q = Quantizer::new(4).unwrap();
        assert_eq!(q.quantize(63), 0);
        assert_eq!(q.quantize(64), 1);
        assert_eq!(q.quantize(127), 1);
        assert_eq!(q.quantize(128), 2);
        assert_eq!(q.quantize(192), 3);
    }

    #[test]
    fn test_quantize_single_block() {
        let q = Quantizer::new(1).unwrap();
        assert!((0..=255u8).all(|v| q.quantize(v) == 0));
        assert!(Quantizer::new(0).is_none());
    }

    #[test]
    fn test_luma_keeps_gray_exact() {
        for v in 0..=255u8 {
            assert_eq!(ChannelMode::Luma.reduce([v, v, v]), v);
        }
        assert_eq!(ChannelMode::Luma.reduce([255, 0, 0]), 76);
        assert_eq!(ChannelMode::Luma.reduce([0, 255, 0]), 150);
        assert_eq!(ChannelMode::Luma.reduce([0, 0, 255]), 29);
    }

    #[test]
    fn test_value_is_max_channel() {
        assert_eq!(ChannelMode::Value.reduce([10, 200, 30]), 200);
        assert_eq!(ChannelMode::Value.reduce([0, 0, 0]), 0);
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(1000, 500, 100), (100, 50));
        assert_eq!(target_dimensions(500, 1000, 100), (50, 100));
        assert_eq!(target_dimensions(300, 200, 128), (128, 85));
        assert_eq!(target_dimensions(64, 32, 64), (64, 32));
        assert_eq!(target_dimensions(10, 20, 64), (10, 20));
        assert_eq!(target_dimensions(1000, 1, 100), (100, 1));
    }

    #[test]
    fn test_target_dimensions_square_is_height_dominant() {
        assert_eq!(target_dimensions(200, 200, 100), (100, 100));
        assert_eq!(target_dimensions(201, 200, 100), (100, 100));
    }

    #[test]
    fn test_target_dimensions_long_side_is_max() {
        for (w, h) in [(513, 17), (17, 513), (1920, 1080), (1080, 1920), (999, 999)] {
            for max in [8, 31, 64, 512] {
                let (tw, th) = target_dimensions(w, h, max);
                assert_eq!(tw.max(th), max, "{}x{} -> {}", w, h, max);
                assert!(tw <= max && th <= max);
            }
        }
    }

    #[test]
    fn test_area_weights_sum_to_one() {
        for (src, dst) in [(10, 3), (7, 7), (100, 64), (3, 1)] {
            for weights in area_weights(src, dst) {
                let sum: f32 = weights.iter().map(|(_, w)| w).sum();
                assert!((sum - 1.0).abs() < 1e-4, "{}->{}: {}", src, dst, sum);
            }
        }
    }

    #[test]
    fn test_resize_area_averages_blocks() {
        // 4x2 -> 2x1: each output pixel averages a 2x2 block
        let mut img = RgbImage::new(4, 2);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = if x < 2 { Rgb([0, 0, 0]) } else { Rgb([200, 100, 50]) };
            if x == 0 && y == 0 {
                *p = Rgb([40, 40, 40]);
            }
        }
        let out = resize_area(&img, 2, 1);
        assert_eq!(out.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([200, 100, 50]));
    }

    #[test]
    fn test_resize_area_fractional_footprint() {
        // 3 -> 2: output 0 covers src 0 fully and half of src 1
        let img = RgbImage::from_raw(3, 1, vec![0, 0, 0, 90, 90, 90, 180, 180, 180]).unwrap();
        let out = resize_area(&img, 2, 1);
        assert_eq!(out.get_pixel(0, 0), &Rgb([30, 30, 30]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([150, 150, 150]));
    }

    #[test]
    fn test_preprocess_gray_grid() {
        let values = [[0u8, 64], [128, 255]];
        let img = GrayImage::from_fn(2, 2, |x, y| Luma([values[y as usize][x as usize]]));
        let grid = preprocess(&DynamicImage::ImageLuma8(img), 64, 4, ChannelMode::Luma).unwrap();
        assert_eq!(grid.to_rows(), vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(grid.source_dimensions(), (2, 2));
    }

    #[test]
    fn test_preprocess_downscales() {
        let img = RgbImage::from_pixel(300, 120, Rgb([255, 255, 255]));
        let grid = preprocess(&DynamicImage::ImageRgb8(img), 100, 3, ChannelMode::Luma).unwrap();
        assert_eq!((grid.width(), grid.height()), (100, 40));
        assert_eq!(grid.source_dimensions(), (300, 120));
        assert!(grid.rows().all(|row| row.iter().all(|&i| i == 2)));
    }

    #[test]
    fn test_preprocess_single_block_palette_is_solid() {
        let img = RgbImage::from_fn(5, 3, |x, y| Rgb([(x * 50) as u8, (y * 80) as u8, 7]));
        let grid = preprocess(&DynamicImage::ImageRgb8(img), 64, 1, ChannelMode::Value).unwrap();
        assert!(grid.rows().all(|row| row.iter().all(|&i| i == 0)));
    }

    #[test]
    fn test_preprocess_empty_palette() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert!(matches!(
            preprocess(&img, 64, 0, ChannelMode::Luma),
            Err(PreprocessError::EmptyPalette)
        ));
    }

    #[test]
    fn test_zero_max_size() {
        assert_eq!(target_dimensions(4, 2, 0), (1, 1));
        assert_eq!(target_dimensions(1, 1, 0), (1, 1));

        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 2));
        assert!(matches!(preprocess(&img, 0, 4, ChannelMode::Luma), Err(PreprocessError::ZeroSize)));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(QuantizedImage::from_rows(&[vec![0, 1], vec![2]]).is_none());
        let grid = QuantizedImage::from_rows(&[vec![0, 1], vec![2, 3]]).unwrap();
        assert_eq!(grid.get(1, 0), Some(2));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn test_load_image_missing_file() {
        let err = load_image(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, PreprocessError::Io { .. }));
    }
}
