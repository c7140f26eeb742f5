//! Resampling helpers for octave construction and descriptor patches.
//!
//! Octave downsampling uses a 2x2 box filter, `dst = (a + b + c + d) / 4`, so
//! each level is exactly `floor(w / 2) x floor(h / 2)` of its parent. Patch
//! resampling is bilinear with half-pixel centres.

use crate::image::{ImageView, Plane};

/// Halves a plane in both dimensions by averaging 2x2 blocks.
///
/// Planes narrower or shorter than two pixels produce an empty plane.
pub fn downsample_half(src: &Plane<f32>) -> Plane<f32> {
    let dst_width = src.width() / 2;
    let dst_height = src.height() / 2;
    let mut dst = Plane::filled(dst_width, dst_height, 0.0f32);

    for y in 0..dst_height {
        let row0 = src.row(y * 2);
        let row1 = src.row(y * 2 + 1);
        for x in 0..dst_width {
            let a = row0[2 * x];
            let b = row0[2 * x + 1];
            let c = row1[2 * x];
            let d = row1[2 * x + 1];
            dst.set(x, y, (a + b + c + d) * 0.25);
        }
    }

    dst
}

/// Resizes a view to `dst_width x dst_height` with bilinear interpolation.
///
/// Destination pixel centres map to `(x + 0.5) * scale - 0.5` in the source;
/// coordinates are clamped to the valid range before interpolation.
pub fn resize_bilinear(src: ImageView<'_, f32>, dst_width: usize, dst_height: usize) -> Plane<f32> {
    let mut dst = Plane::filled(dst_width, dst_height, 0.0f32);
    let src_width = src.width();
    let src_height = src.height();
    if dst_width == 0 || dst_height == 0 {
        return dst;
    }

    let scale_x = src_width as f32 / dst_width as f32;
    let scale_y = src_height as f32 / dst_height as f32;
    let max_x = (src_width - 1) as f32;
    let max_y = (src_height - 1) as f32;

    for y in 0..dst_height {
        let sy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, max_y);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_height - 1);
        let fy = sy - y0 as f32;
        let (Some(row0), Some(row1)) = (src.row(y0), src.row(y1)) else {
            continue;
        };
        for x in 0..dst_width {
            let sx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, max_x);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_width - 1);
            let fx = sx - x0 as f32;

            let top = row0[x0] * (1.0 - fx) + row0[x1] * fx;
            let bottom = row1[x0] * (1.0 - fx) + row1[x1] * fx;
            dst.set(x, y, top * (1.0 - fy) + bottom * fy);
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::{downsample_half, resize_bilinear};
    use crate::image::Plane;

    #[test]
    fn downsample_half_floors_odd_dimensions() {
        let plane = Plane::filled(7, 5, 2.0f32);
        let half = downsample_half(&plane);
        assert_eq!((half.width(), half.height()), (3, 2));
        assert!(half.data().iter().all(|&v| (v - 2.0).abs() < 1e-6));
    }

    #[test]
    fn downsample_half_averages_blocks() {
        let data: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let plane = Plane::new(data, 4, 4).unwrap();
        let half = downsample_half(&plane);
        assert_eq!(half.row(0), &[2.5, 4.5]);
        assert_eq!(half.row(1), &[10.5, 12.5]);
    }

    #[test]
    fn downsample_half_of_single_pixel_is_empty() {
        let plane = Plane::filled(1, 9, 1.0f32);
        assert!(downsample_half(&plane).is_empty());
    }

    #[test]
    fn resize_bilinear_preserves_constant() {
        let plane = Plane::filled(25, 25, 7.5f32);
        let out = resize_bilinear(plane.view(), 16, 16);
        assert_eq!((out.width(), out.height()), (16, 16));
        assert!(out.data().iter().all(|&v| (v - 7.5).abs() < 1e-5));
    }

    #[test]
    fn resize_bilinear_identity_size_copies() {
        let data: Vec<f32> = (0..9).map(|v| v as f32).collect();
        let plane = Plane::new(data.clone(), 3, 3).unwrap();
        let out = resize_bilinear(plane.view(), 3, 3);
        for (a, b) in out.data().iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
