//! Harris and Hessian-eigenvalue corner detection.
//!
//! Both detectors threshold a per-pixel response without any suppression
//! pass, so adjacent corner pixels cluster and the mask is as dense as the
//! response allows. The two thresholds are deliberately different:
//!
//! - Harris marks `response > threshold * max(response)`, a relative cutoff
//!   recomputed on every call.
//! - Hessian marks `λ2 > threshold`, an absolute cutoff on the smaller
//!   eigenvalue.

mod mask;
mod response;

pub use mask::{draw_corners, CornerMask};
pub use response::{
    harris_response, harris_response_from_gradients, min_eigen_response,
    min_eigen_response_from_gradients,
};

use crate::filter::central_gradient;
use crate::image::{Plane, Raster};
use crate::trace::{trace_event, trace_span};
use crate::util::{FeatMatchError, FeatMatchResult};

/// Corner detector parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerConfig {
    /// Harris sensitivity constant; typical range 0.04 to 0.06.
    pub k: f32,
    /// Harris: fraction of the maximum response. Hessian: absolute `λ2` cutoff.
    pub threshold: f32,
    /// Edge length of the uniform smoothing window.
    pub window_size: usize,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            k: 0.04,
            threshold: 0.01,
            window_size: 3,
        }
    }
}

impl CornerConfig {
    /// Checks that every field is usable.
    pub fn validate(&self) -> FeatMatchResult<()> {
        if !self.k.is_finite() {
            return Err(FeatMatchError::InvalidParameter {
                name: "k",
                reason: "must be finite",
            });
        }
        if !self.threshold.is_finite() {
            return Err(FeatMatchError::InvalidParameter {
                name: "threshold",
                reason: "must be finite",
            });
        }
        if self.window_size == 0 {
            return Err(FeatMatchError::InvalidParameter {
                name: "window_size",
                reason: "must be >= 1",
            });
        }
        Ok(())
    }
}

/// Partial update of a `CornerConfig`; `None` keeps the current value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerUpdate {
    pub k: Option<f32>,
    pub threshold: Option<f32>,
    pub window_size: Option<usize>,
}

impl CornerUpdate {
    fn apply(&self, cfg: CornerConfig) -> CornerConfig {
        CornerConfig {
            k: self.k.unwrap_or(cfg.k),
            threshold: self.threshold.unwrap_or(cfg.threshold),
            window_size: self.window_size.unwrap_or(cfg.window_size),
        }
    }
}

/// Corner detector owning its configuration.
#[derive(Clone, Debug, Default)]
pub struct CornerDetector {
    cfg: CornerConfig,
}

impl CornerDetector {
    /// Creates a detector with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: CornerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CornerConfig {
        &self.cfg
    }

    /// Applies a partial update; on error the previous configuration stays.
    pub fn configure(&mut self, update: CornerUpdate) -> FeatMatchResult<()> {
        let next = update.apply(self.cfg);
        next.validate()?;
        self.cfg = next;
        Ok(())
    }

    /// Harris corners of `image`.
    pub fn detect(&self, image: &Raster) -> CornerMask {
        let _span = trace_span!("corner_detect", method = "harris").entered();
        if image.is_empty() {
            return CornerMask::empty();
        }
        let (dx, dy) = central_gradient(&image.to_gray());
        let mask = self.harris_mask(&dx, &dy);
        trace_event!("harris_corners", count = mask.count());
        mask
    }

    /// Hessian smaller-eigenvalue corners of `image`.
    pub fn detect_hessian(&self, image: &Raster) -> CornerMask {
        let _span = trace_span!("corner_detect", method = "hessian").entered();
        if image.is_empty() {
            return CornerMask::empty();
        }
        let (dx, dy) = central_gradient(&image.to_gray());
        let mask = self.hessian_mask(&dx, &dy);
        trace_event!("hessian_corners", count = mask.count());
        mask
    }

    /// Harris and Hessian masks sharing one gradient pass.
    pub fn detect_dual(&self, image: &Raster) -> (CornerMask, CornerMask) {
        let _span = trace_span!("corner_detect", method = "dual").entered();
        if image.is_empty() {
            return (CornerMask::empty(), CornerMask::empty());
        }
        let (dx, dy) = central_gradient(&image.to_gray());
        let harris = self.harris_mask(&dx, &dy);
        let hessian = self.hessian_mask(&dx, &dy);
        trace_event!(
            "dual_corners",
            harris = harris.count(),
            hessian = hessian.count()
        );
        (harris, hessian)
    }

    fn harris_mask(&self, dx: &Plane<f32>, dy: &Plane<f32>) -> CornerMask {
        let response = harris_response_from_gradients(dx, dy, self.cfg.k, self.cfg.window_size);
        match response.max_value() {
            Some(max) => CornerMask::from_threshold(&response, self.cfg.threshold * max),
            None => CornerMask::empty(),
        }
    }

    fn hessian_mask(&self, dx: &Plane<f32>, dy: &Plane<f32>) -> CornerMask {
        let response = min_eigen_response_from_gradients(dx, dy, self.cfg.window_size);
        CornerMask::from_threshold(&response, self.cfg.threshold)
    }
}
