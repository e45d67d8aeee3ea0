//! Grayscale raster operations used by the CPU backend.
//!
//! All functions allocate a fresh output image and never mutate their input.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};

/// Resize to `width x height` with bilinear filtering. Same-size input is returned as a copy.
pub fn resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// BT.601 luma in 14-bit fixed point.
pub fn to_luma(image: &RgbImage) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const ROUND: u32 = 1 << 13;

    let mut gray = GrayImage::new(image.width(), image.height());
    for (out, pixel) in gray.pixels_mut().zip(image.pixels()) {
        let [r, g, b] = pixel.0;
        let y = (u32::from(r) * R + u32::from(g) * G + u32::from(b) * B + ROUND) >> 14;
        *out = Luma([y as u8]);
    }
    gray
}

/// Normalized 1-D Gaussian weights.
pub fn gaussian_kernel(size: u32, sigma: f64) -> Vec<f32> {
    let radius = (size / 2) as i64;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| (w / sum) as f32).collect()
}

/// Separable Gaussian blur with reflect-101 borders (`dcb|abcdefgh|gfe`).
pub fn gaussian_blur(image: &GrayImage, size: u32, sigma: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    if size <= 1 || w == 0 || h == 0 {
        return image.clone();
    }
    let kernel = gaussian_kernel(size, sigma);
    let radius = (kernel.len() / 2) as isize;
    let src = image.as_raw();

    let mut horizontal = vec![0f32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x as isize + k as isize - radius, w);
                acc += weight * f32::from(row[sx]);
            }
            horizontal[y * w + x] = acc;
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - radius, h);
                acc += weight * horizontal[sy * w + x];
            }
            out[y * w + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
}

fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let folded = index.rem_euclid(period);
    if folded >= len as isize {
        (period - folded) as usize
    } else {
        folded as usize
    }
}

/// Pixel-wise `|a - b|`. Both images must have the same dimensions.
pub fn abs_diff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let mut out = GrayImage::new(a.width(), a.height());
    for ((o, pa), pb) in out.pixels_mut().zip(a.pixels()).zip(b.pixels()) {
        *o = Luma([pa.0[0].abs_diff(pb.0[0])]);
    }
    out
}

/// 255 where the value exceeds `cutoff`, 0 elsewhere.
pub fn threshold(image: &GrayImage, cutoff: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > cutoff { 255 } else { 0 };
    }
    out
}

/// Max filter with a `size x size` rectangle, applied `iterations` times.
///
/// Samples outside the frame are ignored, so borders never grow foreground on their own.
pub fn dilate(image: &GrayImage, size: u32, iterations: u32) -> GrayImage {
    let mut current = image.clone();
    if size <= 1 {
        return current;
    }
    for _ in 0..iterations {
        current = max_filter_rows(&current, size);
        current = max_filter_columns(&current, size);
    }
    current
}

fn max_filter_rows(image: &GrayImage, size: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let radius = size / 2;
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            let max = (lo..=hi).map(|sx| image.get_pixel(sx, y).0[0]).max().unwrap_or(0);
            out.put_pixel(x, y, Luma([max]));
        }
    }
    out
}

fn max_filter_columns(image: &GrayImage, size: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let radius = size / 2;
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(height - 1);
        for x in 0..width {
            let max = (lo..=hi).map(|sy| image.get_pixel(x, sy).0[0]).max().unwrap_or(0);
            out.put_pixel(x, y, Luma([max]));
        }
    }
    out
}

pub fn mean(image: &GrayImage) -> f64 {
    let raw = image.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let sum: u64 = raw.iter().map(|&v| u64::from(v)).sum();
    sum as f64 / raw.len() as f64
}

pub fn count_nonzero(image: &GrayImage) -> usize {
    image.as_raw().iter().filter(|&&v| v != 0).count()
}
