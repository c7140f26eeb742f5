//! First-order image gradients.

use crate::filter::{convolve_separable, Border};
use crate::image::Plane;

const SOBEL_DERIV: [f32; 3] = [-1.0, 0.0, 1.0];
const SOBEL_SMOOTH: [f32; 3] = [1.0, 2.0, 1.0];

/// Central-difference gradient `(dx, dy)` over the whole plane.
///
/// Interior samples use `(f[i+1] - f[i-1]) / 2`; the first and last sample of
/// each line use one-sided differences. Lines of length one have zero gradient.
pub fn central_gradient(src: &Plane<f32>) -> (Plane<f32>, Plane<f32>) {
    let width = src.width();
    let height = src.height();
    let mut dx = Plane::filled(width, height, 0.0f32);
    let mut dy = Plane::filled(width, height, 0.0f32);

    if width > 1 {
        for y in 0..height {
            let row = src.row(y);
            dx.set(0, y, row[1] - row[0]);
            for x in 1..width - 1 {
                dx.set(x, y, (row[x + 1] - row[x - 1]) * 0.5);
            }
            dx.set(width - 1, y, row[width - 1] - row[width - 2]);
        }
    }

    if height > 1 {
        for x in 0..width {
            dy.set(x, 0, src.at(x, 1) - src.at(x, 0));
            for y in 1..height - 1 {
                dy.set(x, y, (src.at(x, y + 1) - src.at(x, y - 1)) * 0.5);
            }
            dy.set(x, height - 1, src.at(x, height - 1) - src.at(x, height - 2));
        }
    }

    (dx, dy)
}

/// Unnormalized 3x3 Sobel gradients with replicated borders.
///
/// Positive `gx` means intensity increasing to the right, positive `gy`
/// increasing downward.
pub fn sobel_xy(src: &Plane<f32>) -> (Plane<f32>, Plane<f32>) {
    let gx = convolve_separable(src, &SOBEL_DERIV, &SOBEL_SMOOTH, Border::Replicate);
    let gy = convolve_separable(src, &SOBEL_SMOOTH, &SOBEL_DERIV, Border::Replicate);
    (gx, gy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_gradient_of_linear_ramp() {
        let data: Vec<f32> = (0..5)
            .flat_map(|y| (0..6).map(move |x| 3.0 * x as f32 + y as f32))
            .collect();
        let plane = Plane::new(data, 6, 5).unwrap();
        let (dx, dy) = central_gradient(&plane);
        assert!(dx.data().iter().all(|&v| (v - 3.0).abs() < 1e-5));
        assert!(dy.data().iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn sobel_of_constant_plane_is_zero() {
        let plane = Plane::filled(8, 8, 128.0f32);
        let (gx, gy) = sobel_xy(&plane);
        assert!(gx.data().iter().all(|v| v.abs() < 1e-6));
        assert!(gy.data().iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn sobel_interior_of_ramp_is_eight_per_unit() {
        let data: Vec<f32> = (0..10)
            .flat_map(|_| (0..10).map(|x| x as f32))
            .collect();
        let plane = Plane::new(data, 10, 10).unwrap();
        let (gx, gy) = sobel_xy(&plane);
        for y in 1..9 {
            for x in 1..9 {
                assert!((gx.at(x, y) - 8.0).abs() < 1e-4);
                assert!(gy.at(x, y).abs() < 1e-4);
            }
        }
    }
}
