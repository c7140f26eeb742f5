//! Separable linear filters over `Plane<f32>`.
//!
//! A 2D filter with a separable kernel `K = k_y * k_x^T` runs as a horizontal
//! pass followed by a vertical pass. Kernels are applied as correlations with
//! tap `i` at offset `i - len / 2`, which also anchors even-length box kernels
//! the same way an OpenCV-style `filter2D` does.

use crate::image::Plane;

mod gradient;

pub use gradient::{central_gradient, sobel_xy};

/// How samples outside the plane are synthesized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Border {
    /// Samples outside the plane read as zero.
    Zero,
    /// Samples outside the plane repeat the nearest edge sample.
    Replicate,
}

#[inline]
fn sample(line: &[f32], idx: isize, border: Border) -> f32 {
    if idx >= 0 && (idx as usize) < line.len() {
        return line[idx as usize];
    }
    match border {
        Border::Zero => 0.0,
        Border::Replicate => line[idx.clamp(0, line.len() as isize - 1) as usize],
    }
}

/// Exact kernel sums are accumulated up to this radius.
const EXACT_SUM_RADIUS: usize = 1 << 16;
/// Mass of a continuous Gaussian within three standard deviations.
const MASS_WITHIN_3_SIGMA: f64 = 0.997_300_203_936_74;

/// Gaussian taps of radius `min(ceil(3 * sigma), max_radius)`, normalized
/// over the untruncated kernel.
fn gaussian_taps(sigma: f32, max_radius: usize) -> Vec<f32> {
    let sigma = f64::from(sigma);
    let radius = ((3.0 * sigma).ceil() as usize).max(1);
    let denom = 2.0 * sigma * sigma;
    let weight = |offset: f64| (-offset * offset / denom).exp();
    let full_sum = if radius <= EXACT_SUM_RADIUS {
        (0..=2 * radius)
            .map(|i| weight(i as f64 - radius as f64))
            .sum::<f64>()
    } else {
        sigma * (2.0 * std::f64::consts::PI).sqrt() * MASS_WITHIN_3_SIGMA
    };
    let kept = radius.min(max_radius.max(1));
    (0..=kept.saturating_mul(2))
        .map(|i| (weight(i as f64 - kept as f64) / full_sum) as f32)
        .collect()
}

/// Builds a normalized 1D Gaussian kernel with radius `ceil(3 * sigma)`.
///
/// The kernel is materialized in full; [`gaussian_blur`] truncates it to
/// the plane instead.
pub fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    gaussian_taps(sigma, usize::MAX)
}

/// Correlates every row with `kernel_x`, then every column with `kernel_y`.
pub fn convolve_separable(
    src: &Plane<f32>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    border: Border,
) -> Plane<f32> {
    let width = src.width();
    let height = src.height();
    if src.is_empty() {
        return src.clone();
    }

    let half_x = (kernel_x.len() / 2) as isize;
    let mut horizontal = Plane::filled(width, height, 0.0f32);
    for y in 0..height {
        let row = src.row(y);
        for x in 0..width {
            let mut acc = 0.0f32;
            for (ki, &kv) in kernel_x.iter().enumerate() {
                acc += sample(row, x as isize + ki as isize - half_x, border) * kv;
            }
            horizontal.set(x, y, acc);
        }
    }

    let half_y = (kernel_y.len() / 2) as isize;
    let mut dst = Plane::filled(width, height, 0.0f32);
    let mut column = vec![0.0f32; height];
    for x in 0..width {
        for (y, slot) in column.iter_mut().enumerate() {
            *slot = horizontal.at(x, y);
        }
        for y in 0..height {
            let mut acc = 0.0f32;
            for (ki, &kv) in kernel_y.iter().enumerate() {
                acc += sample(&column, y as isize + ki as isize - half_y, border) * kv;
            }
            dst.set(x, y, acc);
        }
    }

    dst
}

/// Separable Gaussian blur with zero padding at the borders.
///
/// Taps farther out than the plane extent only ever read padding, so the
/// kernel is cut there while keeping the weights of the full kernel.
pub fn gaussian_blur(src: &Plane<f32>, sigma: f32) -> Plane<f32> {
    let kernel = gaussian_taps(sigma, src.width().max(src.height()));
    convolve_separable(src, &kernel, &kernel, Border::Zero)
}

/// Uniform `size x size` mean filter normalized by `size²`.
pub fn box_filter(src: &Plane<f32>, size: usize) -> Plane<f32> {
    let size = size.max(1);
    let kernel = vec![1.0 / size as f32; size];
    convolve_separable(src, &kernel, &kernel, Border::Replicate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel_1d(1.6);
        assert_eq!(kernel.len(), 2 * 5 + 1);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..kernel.len() / 2 {
            assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-7);
        }
    }

    #[test]
    fn box_filter_preserves_constant_plane() {
        let plane = Plane::filled(9, 6, 42.0f32);
        for size in [1, 2, 3, 5] {
            let out = box_filter(&plane, size);
            assert!(out.data().iter().all(|&v| (v - 42.0).abs() < 1e-4));
        }
    }

    #[test]
    fn box_filter_averages_impulse() {
        let mut plane = Plane::filled(7, 7, 0.0f32);
        plane.set(3, 3, 9.0);
        let out = box_filter(&plane, 3);
        for y in 2..=4 {
            for x in 2..=4 {
                assert!((out.at(x, y) - 1.0).abs() < 1e-6);
            }
        }
        assert!(out.at(1, 3).abs() < 1e-6);
    }

    #[test]
    fn gaussian_blur_zero_pads_borders() {
        let plane = Plane::filled(12, 12, 100.0f32);
        let out = gaussian_blur(&plane, 1.0);
        assert!((out.at(6, 6) - 100.0).abs() < 1e-3);
        assert!(out.at(0, 0) < 50.0);
    }

    #[test]
    fn gaussian_blur_truncates_kernel_to_plane() {
        let mut plane = Plane::filled(12, 10, 0.0f32);
        plane.set(4, 5, 100.0);
        plane.set(9, 2, 40.0);
        let full = gaussian_kernel_1d(5.0);
        assert!(full.len() > 2 * 12 + 1);
        let expected = convolve_separable(&plane, &full, &full, Border::Zero);
        let out = gaussian_blur(&plane, 5.0);
        for (got, want) in out.data().iter().zip(expected.data()) {
            assert!((got - want).abs() < 1e-4, "got {got}, want {want}");
        }
    }

    #[test]
    fn gaussian_blur_survives_huge_sigma() {
        let plane = Plane::filled(16, 16, 200.0f32);
        for sigma in [1e6f32, 1e13, f32::INFINITY] {
            let out = gaussian_blur(&plane, sigma);
            assert_eq!((out.width(), out.height()), (16, 16));
            assert!(out.data().iter().all(|v| v.is_finite() && *v >= 0.0 && *v < 1.0));
        }
    }
}
