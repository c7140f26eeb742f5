//! Scale-space extremum localization.
//!
//! Candidates are scanned octave-major, then scale, row and column. A sample
//! survives when it clears the contrast threshold, is the maximum (positive
//! values) or minimum (negative values) of its 3x3x3 neighbourhood, and passes
//! the Hessian edge-response test on its own DoG plane. The scan stops at
//! `max_keypoints` in discovery order; candidates are never ranked.

use crate::features::scale_space::Octave;
use crate::features::FeatureConfig;
use crate::image::Plane;
use crate::trace::{trace_debug, trace_event, trace_span};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Keypoint in input-image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    /// Column, already rescaled by `2^octave`.
    pub x: f32,
    /// Row, already rescaled by `2^octave`.
    pub y: f32,
    /// `sigma * k^scale * 2^octave`.
    pub size: f32,
    /// Octave the keypoint was found in.
    pub octave: usize,
}

/// Edge-response and extremum test thresholds shared by every plane.
#[derive(Clone, Copy)]
struct ExtremumTest {
    contrast_threshold: f32,
    edge_ratio_limit: f32,
}

impl ExtremumTest {
    fn new(cfg: &FeatureConfig) -> Self {
        let r = cfg.edge_threshold;
        Self {
            contrast_threshold: cfg.contrast_threshold,
            edge_ratio_limit: (r + 1.0) * (r + 1.0) / r,
        }
    }

    fn accepts(
        &self,
        prev: &Plane<f32>,
        cur: &Plane<f32>,
        next: &Plane<f32>,
        x: usize,
        y: usize,
    ) -> bool {
        let value = cur.at(x, y);
        if value.abs() <= self.contrast_threshold {
            return false;
        }
        if !is_extremum(prev, cur, next, x, y, value) {
            return false;
        }

        let dxx = cur.at(x + 1, y) + cur.at(x - 1, y) - 2.0 * value;
        let dyy = cur.at(x, y + 1) + cur.at(x, y - 1) - 2.0 * value;
        let dxy = ((cur.at(x + 1, y + 1) + cur.at(x - 1, y - 1))
            - (cur.at(x - 1, y + 1) + cur.at(x + 1, y - 1)))
            * 0.25;
        let trace = dxx + dyy;
        let det = dxx * dyy - dxy * dxy;
        if det <= 0.0 {
            return false;
        }
        trace * trace / det < self.edge_ratio_limit
    }
}

/// Non-strict extremum test over the 27 samples around `(x, y)`, centre
/// included: maxima need `value > 0`, minima `value < 0`.
fn is_extremum(
    prev: &Plane<f32>,
    cur: &Plane<f32>,
    next: &Plane<f32>,
    x: usize,
    y: usize,
    value: f32,
) -> bool {
    let maximum = value > 0.0;
    for plane in [prev, cur, next] {
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                let other = plane.at(nx, ny);
                if maximum && other > value {
                    return false;
                }
                if !maximum && other < value {
                    return false;
                }
            }
        }
    }
    true
}

fn keypoint_at(
    cfg: &FeatureConfig,
    octave_idx: usize,
    scale_idx: usize,
    x: usize,
    y: usize,
) -> Keypoint {
    let factor = (1usize << octave_idx) as f32;
    Keypoint {
        x: x as f32 * factor,
        y: y as f32 * factor,
        size: cfg.sigma * cfg.k.powi(scale_idx as i32) * factor,
        octave: octave_idx,
    }
}

#[allow(clippy::too_many_arguments)]
fn scan_row(
    test: ExtremumTest,
    cfg: &FeatureConfig,
    planes: (&Plane<f32>, &Plane<f32>, &Plane<f32>),
    octave_idx: usize,
    scale_idx: usize,
    y: usize,
    out: &mut Vec<Keypoint>,
    limit: usize,
) {
    let (prev, cur, next) = planes;
    for x in 1..cur.width() - 1 {
        if out.len() >= limit {
            return;
        }
        if test.accepts(prev, cur, next, x, y) {
            out.push(keypoint_at(cfg, octave_idx, scale_idx, x, y));
        }
    }
}

/// Finds keypoints in a DoG pyramid, capped at `cfg.max_keypoints`.
pub fn find_keypoints(dog: &[Octave], cfg: &FeatureConfig) -> Vec<Keypoint> {
    let _span = trace_span!("find_keypoints", octaves = dog.len()).entered();
    let test = ExtremumTest::new(cfg);
    let limit = cfg.max_keypoints;
    let mut keypoints = Vec::new();

    'octaves: for (octave_idx, octave) in dog.iter().enumerate() {
        let planes = octave.planes();
        if planes.len() < 3 || octave.width() < 3 || octave.height() < 3 {
            continue;
        }
        let before = keypoints.len();
        for scale_idx in 1..planes.len() - 1 {
            if keypoints.len() >= limit {
                break 'octaves;
            }
            let triple = (&planes[scale_idx - 1], &planes[scale_idx], &planes[scale_idx + 1]);
            scan_plane(test, cfg, triple, octave_idx, scale_idx, &mut keypoints, limit);
        }
        trace_debug!(
            "octave_keypoints",
            octave = octave_idx,
            count = keypoints.len() - before
        );
    }

    keypoints.truncate(limit);
    trace_event!("keypoints", count = keypoints.len());
    keypoints
}

#[cfg(not(feature = "rayon"))]
fn scan_plane(
    test: ExtremumTest,
    cfg: &FeatureConfig,
    triple: (&Plane<f32>, &Plane<f32>, &Plane<f32>),
    octave_idx: usize,
    scale_idx: usize,
    out: &mut Vec<Keypoint>,
    limit: usize,
) {
    scan_plane_seq(test, cfg, triple, octave_idx, scale_idx, out, limit);
}

#[cfg(feature = "rayon")]
fn scan_plane(
    test: ExtremumTest,
    cfg: &FeatureConfig,
    triple: (&Plane<f32>, &Plane<f32>, &Plane<f32>),
    octave_idx: usize,
    scale_idx: usize,
    out: &mut Vec<Keypoint>,
    limit: usize,
) {
    if !cfg.parallel {
        scan_plane_seq(test, cfg, triple, octave_idx, scale_idx, out, limit);
        return;
    }
    // Rows are independent; concatenating them in row order keeps the
    // discovery order of the sequential scan before the cap is applied.
    let height = triple.1.height();
    let rows: Vec<Vec<Keypoint>> = (1..height - 1)
        .into_par_iter()
        .map(|y| {
            let mut row = Vec::new();
            scan_row(test, cfg, triple, octave_idx, scale_idx, y, &mut row, usize::MAX);
            row
        })
        .collect();
    for row in rows {
        if out.len() >= limit {
            break;
        }
        out.extend(row.into_iter().take(limit - out.len()));
    }
}

fn scan_plane_seq(
    test: ExtremumTest,
    cfg: &FeatureConfig,
    triple: (&Plane<f32>, &Plane<f32>, &Plane<f32>),
    octave_idx: usize,
    scale_idx: usize,
    out: &mut Vec<Keypoint>,
    limit: usize,
) {
    let height = triple.1.height();
    for y in 1..height - 1 {
        if out.len() >= limit {
            return;
        }
        scan_row(test, cfg, triple, octave_idx, scale_idx, y, out, limit);
    }
}
