//! Exhaustive sliding-window scans.
//!
//! Offsets are visited in row-major order and a new best must be strictly
//! better than the running one, so the first offset wins ties.

use crate::image::Plane;
use crate::template::{TemplateMatch, TemplatePlan};

/// Window scoring rule used by the scans.
pub(crate) trait WindowScore {
    /// Score of the window whose top-left corner is `(x, y)`.
    fn score_at(image: &Plane<f32>, plan: &TemplatePlan, x: usize, y: usize) -> f64;

    /// Returns true when `candidate` strictly beats `best`.
    fn better(candidate: f64, best: f64) -> bool;
}

/// Sum of squared differences; lower is better.
pub(crate) struct SsdScore;

/// Zero-mean normalized cross-correlation; higher is better.
pub(crate) struct NccScore;

impl WindowScore for SsdScore {
    fn score_at(image: &Plane<f32>, plan: &TemplatePlan, x: usize, y: usize) -> f64 {
        let tpl_width = plan.width();
        let values = plan.values();
        let mut sum = 0.0f64;
        for ty in 0..plan.height() {
            let img_row = &image.row(y + ty)[x..x + tpl_width];
            let tpl_row = &values[ty * tpl_width..(ty + 1) * tpl_width];
            for (&i, &t) in img_row.iter().zip(tpl_row) {
                let d = f64::from(i) - f64::from(t);
                sum += d * d;
            }
        }
        sum
    }

    fn better(candidate: f64, best: f64) -> bool {
        candidate < best
    }
}

impl WindowScore for NccScore {
    fn score_at(image: &Plane<f32>, plan: &TemplatePlan, x: usize, y: usize) -> f64 {
        let tpl_width = plan.width();
        let tpl_height = plan.height();
        let count = (tpl_width * tpl_height) as f64;

        let mut sum = 0.0f64;
        for ty in 0..tpl_height {
            sum += image.row(y + ty)[x..x + tpl_width]
                .iter()
                .map(|&v| f64::from(v))
                .sum::<f64>();
        }
        let mean = sum / count;

        let zero_mean = plan.zero_mean();
        let mut dot = 0.0f64;
        let mut energy = 0.0f64;
        for ty in 0..tpl_height {
            let img_row = &image.row(y + ty)[x..x + tpl_width];
            let tpl_row = &zero_mean[ty * tpl_width..(ty + 1) * tpl_width];
            for (&i, &t) in img_row.iter().zip(tpl_row) {
                let c = f64::from(i) - mean;
                dot += c * t;
                energy += c * c;
            }
        }

        let denom = (energy * plan.energy()).sqrt();
        if denom <= f64::EPSILON {
            return 0.0;
        }
        (dot / denom).clamp(-1.0, 1.0)
    }

    fn better(candidate: f64, best: f64) -> bool {
        candidate > best
    }
}

/// Best offset over a row of placements.
pub(crate) fn scan_row<S: WindowScore>(
    image: &Plane<f32>,
    plan: &TemplatePlan,
    y: usize,
) -> Option<(usize, f64)> {
    let max_x = image.width() - plan.width();
    let mut best: Option<(usize, f64)> = None;
    for x in 0..=max_x {
        let score = S::score_at(image, plan, x, y);
        if best.map_or(true, |(_, b)| S::better(score, b)) {
            best = Some((x, score));
        }
    }
    best
}

/// Folds per-row bests in row order, keeping the earliest on ties.
pub(crate) fn reduce_rows<S: WindowScore>(
    rows: impl IntoIterator<Item = (usize, Option<(usize, f64)>)>,
) -> Option<TemplateMatch> {
    let mut best: Option<(usize, usize, f64)> = None;
    for (y, row_best) in rows {
        let Some((x, score)) = row_best else {
            continue;
        };
        if best.map_or(true, |(_, _, b)| S::better(score, b)) {
            best = Some((x, y, score));
        }
    }
    best.map(|(x, y, score)| TemplateMatch {
        x,
        y,
        score: score as f32,
    })
}

/// Sequential full scan; the caller guarantees the template fits.
pub(crate) fn scan_full<S: WindowScore>(
    image: &Plane<f32>,
    plan: &TemplatePlan,
) -> Option<TemplateMatch> {
    let max_y = image.height() - plan.height();
    reduce_rows::<S>((0..=max_y).map(|y| (y, scan_row::<S>(image, plan, y))))
}

/// Score of every valid placement, row-major.
pub(crate) fn score_map<S: WindowScore>(image: &Plane<f32>, plan: &TemplatePlan) -> Plane<f32> {
    let out_width = image.width() - plan.width() + 1;
    let out_height = image.height() - plan.height() + 1;
    let mut out = Plane::filled(out_width, out_height, 0.0f32);
    for y in 0..out_height {
        for x in 0..out_width {
            out.set(x, y, S::score_at(image, plan, x, y) as f32);
        }
    }
    out
}
