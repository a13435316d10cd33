//! Deterministic fallback embeddings
//!
//! Used when the vision model cannot be initialized. Two layers:
//! - [`PixelSignatureEmbedder`]: colour histograms and brightness statistics
//!   computed from decoded pixels
//! - [`reference_vector`]: a pseudo-random vector derived from the image
//!   reference string, for inputs that cannot be decoded at all

use crate::model::ImageEmbedder;
use image::{imageops::FilterType, DynamicImage};
use pixmatch_core::{Error, Result};
use sha2::{Digest, Sha256};

/// Histogram bins per RGB channel
pub const HISTOGRAM_BINS: usize = 16;

/// Side of the brightness grid
pub const GRID_SIZE: usize = 4;

/// Images are downsampled to this square before statistics are taken
const THUMBNAIL_SIZE: u32 = 64;

/// 3 histograms + brightness grid + mean and std of brightness
pub const PIXEL_SIGNATURE_DIM: usize = 3 * HISTOGRAM_BINS + GRID_SIZE * GRID_SIZE + 2;

/// Embedder over raw pixel statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelSignatureEmbedder;

impl ImageEmbedder for PixelSignatureEmbedder {
    fn name(&self) -> &str {
        "pixel-signature"
    }

    fn dimension(&self) -> usize {
        PIXEL_SIGNATURE_DIM
    }

    fn embed_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let image = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
        pixel_signature(&image)
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> f32 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
}

/// Content signature of a decoded image, [`PIXEL_SIGNATURE_DIM`] values
pub fn pixel_signature(image: &DynamicImage) -> Result<Vec<f32>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::Decode("image has no pixels".to_string()));
    }

    let thumb = image
        .resize_exact(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle)
        .to_rgb8();
    let (width, height) = thumb.dimensions();
    let total = (width * height) as f32;

    let mut histogram = [0.0f32; 3 * HISTOGRAM_BINS];
    let mut grid_sum = [0.0f32; GRID_SIZE * GRID_SIZE];
    let mut grid_count = [0u32; GRID_SIZE * GRID_SIZE];
    let mut brightness = Vec::with_capacity(total as usize);

    for (x, y, pixel) in thumb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        for (channel, value) in [r, g, b].into_iter().enumerate() {
            let bin = value as usize * HISTOGRAM_BINS / 256;
            histogram[channel * HISTOGRAM_BINS + bin] += 1.0;
        }

        let l = luma(r, g, b);
        let cell_x = x as usize * GRID_SIZE / width as usize;
        let cell_y = y as usize * GRID_SIZE / height as usize;
        grid_sum[cell_y * GRID_SIZE + cell_x] += l;
        grid_count[cell_y * GRID_SIZE + cell_x] += 1;
        brightness.push(l);
    }

    let mean = brightness.iter().sum::<f32>() / total;
    let variance = brightness.iter().map(|l| (l - mean).powi(2)).sum::<f32>() / total;

    let mut signature = Vec::with_capacity(PIXEL_SIGNATURE_DIM);
    signature.extend(histogram.iter().map(|count| count / total));
    signature.extend(
        grid_sum
            .iter()
            .zip(grid_count.iter())
            .map(|(sum, count)| if *count == 0 { 0.0 } else { sum / *count as f32 }),
    );
    signature.push(mean);
    signature.push(variance.sqrt());

    Ok(signature)
}

/// Pseudo-random vector in [-1, 1] derived from a reference string
///
/// SHA-256 in counter mode: the same reference and dimension always give
/// bit-identical output, on every platform.
pub fn reference_vector(reference: &str, dim: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(dim);
    let mut counter: u32 = 0;

    while out.len() < dim {
        let mut hasher = Sha256::new();
        hasher.update(reference.as_bytes());
        hasher.update(counter.to_le_bytes());
        let digest = hasher.finalize();

        for chunk in digest.chunks_exact(4) {
            if out.len() == dim {
                break;
            }
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            out.push((word as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32);
        }
        counter += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn solid_png(color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(32, 24, Rgb(color));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_signature_dimension() {
        let v = PixelSignatureEmbedder.embed_bytes(&solid_png([200, 10, 10])).unwrap();
        assert_eq!(v.len(), PIXEL_SIGNATURE_DIM);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_signature_histograms_sum_to_one() {
        let v = PixelSignatureEmbedder.embed_bytes(&solid_png([10, 120, 250])).unwrap();
        for channel in 0..3 {
            let sum: f32 = v[channel * HISTOGRAM_BINS..(channel + 1) * HISTOGRAM_BINS]
                .iter()
                .sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
        // solid colour: no brightness spread
        assert!(v[PIXEL_SIGNATURE_DIM - 1] < 1e-4);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let bytes = solid_png([90, 90, 30]);
        let a = PixelSignatureEmbedder.embed_bytes(&bytes).unwrap();
        let b = PixelSignatureEmbedder.embed_bytes(&bytes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_colours_differ() {
        let red = PixelSignatureEmbedder.embed_bytes(&solid_png([250, 0, 0])).unwrap();
        let blue = PixelSignatureEmbedder.embed_bytes(&solid_png([0, 0, 250])).unwrap();
        assert_ne!(red, blue);
    }

    #[test]
    fn test_garbage_bytes_is_decode_error() {
        let err = PixelSignatureEmbedder.embed_bytes(b"definitely not a png").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_reference_vector_deterministic() {
        let a = reference_vector("assets/products/mug-1.jpg", 512);
        let b = reference_vector("assets/products/mug-1.jpg", 512);
        assert_eq!(a.len(), 512);
        assert_eq!(
            a.iter().map(|x| x.to_bits()).collect::<Vec<_>>(),
            b.iter().map(|x| x.to_bits()).collect::<Vec<_>>()
        );
        assert!(a.iter().all(|x| (-1.0..=1.0).contains(x)));
    }

    #[test]
    fn test_reference_vector_varies_with_reference() {
        let a = reference_vector("a.jpg", 66);
        let b = reference_vector("b.jpg", 66);
        assert_ne!(a, b);
    }

    #[test]
    fn test_reference_vector_prefix_stable() {
        // a longer vector extends, never reshuffles, a shorter one
        let short = reference_vector("x", 10);
        let long = reference_vector("x", 20);
        assert_eq!(&long[..10], &short[..]);
    }
}
