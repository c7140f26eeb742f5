//! Rotation-naive 128-bin gradient histogram descriptors.
//!
//! Each keypoint samples a `(2r + 1)` square of Sobel magnitude and
//! orientation, with `r = floor(6 * size / sigma)`, resampled to 16x16 and
//! split into a 4x4 grid of 4x4 cells. Every cell contributes an 8-bin
//! histogram of 45 degree bins weighted by magnitude, stored at
//! `cell_row * 32 + cell_col * 8 + bin`.

use crate::features::{FeatureSet, Keypoint};
use crate::filter::sobel_xy;
use crate::image::pyramid::resize_bilinear;
use crate::image::Plane;
use crate::trace::{trace_event, trace_span};
use crate::util::math::{l2_norm_eps, orientation_deg};

/// Number of components in a descriptor.
pub const DESCRIPTOR_LEN: usize = 128;

const PATCH_SIZE: usize = 16;
const CELL_SIZE: usize = 4;
const CELLS: usize = PATCH_SIZE / CELL_SIZE;
const BINS: usize = 8;
const BIN_WIDTH_DEG: f32 = 360.0 / BINS as f32;
const CLIP: f32 = 0.2;
const NORM_EPS: f32 = 1e-7;

/// Unit-norm gradient histogram.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    values: [f32; DESCRIPTOR_LEN],
}

impl Descriptor {
    /// Wraps raw values without normalizing them.
    pub fn from_array(values: [f32; DESCRIPTOR_LEN]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Sum of squared differences.
    pub fn ssd(&self, other: &Descriptor) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    pub fn dot(&self, other: &Descriptor) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }
}

/// Per-pixel gradient magnitude and orientation of a grayscale plane.
struct GradientField {
    magnitude: Plane<f32>,
    orientation: Plane<f32>,
}

impl GradientField {
    fn new(gray: &Plane<f32>) -> Self {
        let (gx, gy) = sobel_xy(gray);
        Self {
            magnitude: gx.zip_map(&gy, |dx, dy| (dx * dx + dy * dy).sqrt()),
            orientation: gx.zip_map(&gy, orientation_deg),
        }
    }

    /// Histogram for a keypoint, or `None` when its window leaves the image.
    fn histogram(&self, kp: &Keypoint, sigma: f32) -> Option<[f32; DESCRIPTOR_LEN]> {
        let x = kp.x as i64;
        let y = kp.y as i64;
        let radius = (6.0 * kp.size / sigma) as i64;
        let width = self.magnitude.width() as i64;
        let height = self.magnitude.height() as i64;
        let x0 = x.checked_sub(radius)?;
        let y0 = y.checked_sub(radius)?;
        if x0 < 0
            || y0 < 0
            || x.checked_add(radius)? >= width
            || y.checked_add(radius)? >= height
        {
            return None;
        }

        let x0 = x0 as usize;
        let y0 = y0 as usize;
        let side = (2 * radius + 1) as usize;
        let mag = resize_bilinear(
            self.magnitude.view().roi(x0, y0, side, side).ok()?,
            PATCH_SIZE,
            PATCH_SIZE,
        );
        let ori = resize_bilinear(
            self.orientation.view().roi(x0, y0, side, side).ok()?,
            PATCH_SIZE,
            PATCH_SIZE,
        );

        let mut hist = [0.0f32; DESCRIPTOR_LEN];
        for py in 0..PATCH_SIZE {
            let cell_row = py / CELL_SIZE;
            for px in 0..PATCH_SIZE {
                let cell_col = px / CELL_SIZE;
                let angle = ori.at(px, py);
                if !(0.0..360.0).contains(&angle) {
                    continue;
                }
                let bin = ((angle / BIN_WIDTH_DEG) as usize).min(BINS - 1);
                hist[cell_row * CELLS * BINS + cell_col * BINS + bin] += mag.at(px, py);
            }
        }
        Some(hist)
    }
}

/// Normalizes, clips at 0.2 and renormalizes in place.
///
/// Returns false for a histogram with no gradient energy.
fn normalize_clip(hist: &mut [f32; DESCRIPTOR_LEN]) -> bool {
    if hist.iter().all(|&v| v == 0.0) {
        return false;
    }
    let norm = l2_norm_eps(hist, NORM_EPS);
    for v in hist.iter_mut() {
        *v = (*v / norm).min(CLIP);
    }
    let norm = l2_norm_eps(hist, NORM_EPS);
    for v in hist.iter_mut() {
        *v /= norm;
    }
    true
}

/// Computes descriptors for `keypoints` on the full-resolution gray plane.
///
/// Keypoints whose sampling window leaves the image, or whose window holds
/// no gradient, are dropped together with their descriptor so the returned
/// set stays aligned.
pub fn compute_descriptors(gray: &Plane<f32>, keypoints: &[Keypoint], sigma: f32) -> FeatureSet {
    let _span = trace_span!("compute_descriptors", keypoints = keypoints.len()).entered();
    if keypoints.is_empty() || gray.is_empty() {
        return FeatureSet::default();
    }

    let field = GradientField::new(gray);
    let mut kept = Vec::with_capacity(keypoints.len());
    let mut descriptors = Vec::with_capacity(keypoints.len());
    for kp in keypoints {
        let Some(mut hist) = field.histogram(kp, sigma) else {
            continue;
        };
        if !normalize_clip(&mut hist) {
            continue;
        }
        kept.push(*kp);
        descriptors.push(Descriptor::from_array(hist));
    }

    trace_event!(
        "descriptors",
        kept = descriptors.len(),
        dropped = keypoints.len() - descriptors.len()
    );
    FeatureSet::from_parts(kept, descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clip_yields_unit_norm() {
        let mut hist = [0.0f32; DESCRIPTOR_LEN];
        hist[0] = 10.0;
        hist[1] = 1.0;
        hist[2] = 1.0;
        assert!(normalize_clip(&mut hist));
        let norm: f32 = hist.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(hist[0] > hist[1]);
    }

    #[test]
    fn normalize_clip_rejects_zero_histogram() {
        let mut hist = [0.0f32; DESCRIPTOR_LEN];
        assert!(!normalize_clip(&mut hist));
    }

    #[test]
    fn keypoint_near_border_is_skipped() {
        let gray = Plane::filled(32, 32, 0.0f32);
        let kp = Keypoint {
            x: 3.0,
            y: 16.0,
            size: 1.6,
            octave: 0,
        };
        let field = GradientField::new(&gray);
        assert!(field.histogram(&kp, 1.6).is_none());
    }

    #[test]
    fn oversized_window_is_skipped() {
        let gray = Plane::filled(32, 32, 0.0f32);
        let field = GradientField::new(&gray);
        for size in [1e30f32, f32::INFINITY] {
            let kp = Keypoint {
                x: 16.0,
                y: 16.0,
                size,
                octave: 3,
            };
            assert!(field.histogram(&kp, 1.6).is_none());
        }
    }

    #[test]
    fn horizontal_ramp_fills_zero_degree_bins() {
        let data: Vec<f32> = (0..32 * 32).map(|i| (i % 32) as f32).collect();
        let gray = Plane::new(data, 32, 32).unwrap();
        let kp = Keypoint {
            x: 16.0,
            y: 16.0,
            size: 1.6,
            octave: 0,
        };
        let field = GradientField::new(&gray);
        let hist = field.histogram(&kp, 1.6).unwrap();
        for (idx, &v) in hist.iter().enumerate() {
            if idx % BINS == 0 {
                assert!(v > 0.0, "bin {idx} should be populated");
            } else {
                assert_eq!(v, 0.0, "bin {idx} should be empty");
            }
        }
    }

    #[test]
    fn ssd_and_dot_agree() {
        let mut a = [0.0f32; DESCRIPTOR_LEN];
        let mut b = [0.0f32; DESCRIPTOR_LEN];
        a[0] = 1.0;
        b[1] = 1.0;
        let a = Descriptor::from_array(a);
        let b = Descriptor::from_array(b);
        assert_eq!(a.ssd(&b), 2.0);
        assert_eq!(a.dot(&b), 0.0);
        assert_eq!(a.norm(), 1.0);
    }
}
