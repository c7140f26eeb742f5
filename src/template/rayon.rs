//! Row-parallel scans (feature-gated).
//!
//! Rows are scored independently and reduced in row order with the same
//! strict comparison as the sequential scan, so both paths pick the same
//! offset.

use crate::image::Plane;
use crate::template::scan::{reduce_rows, scan_row, WindowScore};
use crate::template::{TemplateMatch, TemplatePlan};
use rayon::prelude::*;

/// Row-parallel full scan; the caller guarantees the template fits.
pub(crate) fn scan_full_par<S: WindowScore>(
    image: &Plane<f32>,
    plan: &TemplatePlan,
) -> Option<TemplateMatch> {
    let max_y = image.height() - plan.height();
    let rows: Vec<(usize, Option<(usize, f64)>)> = (0..=max_y)
        .into_par_iter()
        .map(|y| (y, scan_row::<S>(image, plan, y)))
        .collect();
    reduce_rows::<S>(rows)
}

/// Row-parallel score map.
pub(crate) fn score_map_par<S: WindowScore>(image: &Plane<f32>, plan: &TemplatePlan) -> Plane<f32> {
    let out_width = image.width() - plan.width() + 1;
    let out_height = image.height() - plan.height() + 1;
    let mut out = Plane::filled(out_width, out_height, 0.0f32);
    out.data_mut()
        .par_chunks_mut(out_width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = S::score_at(image, plan, x, y) as f32;
            }
        });
    out
}
