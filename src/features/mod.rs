//! Scale-space keypoints, gradient histogram descriptors and matching.
//!
//! [`FeatureEngine::extract`] runs the full pipeline on one image:
//! Gaussian pyramid, DoG pyramid, extremum localization and descriptor
//! computation. The pyramids are rebuilt on every call and dropped at the
//! end of it.
//!
//! # Example
//! ```
//! use featmatch::{FeatureEngine, MatchStrategy, Raster};
//!
//! let image = Raster::filled(32, 32, featmatch::Channels::Gray, 0);
//! let engine = FeatureEngine::new();
//! let features = engine.extract(&image);
//! assert!(features.is_empty());
//! let matches = engine.match_descriptors(&features, &features, MatchStrategy::ssd());
//! assert!(matches.is_empty());
//! ```

mod descriptor;
mod keypoint;
mod matching;
mod render;
pub mod scale_space;

pub use descriptor::{compute_descriptors, Descriptor, DESCRIPTOR_LEN};
pub use keypoint::{find_keypoints, Keypoint};
pub use matching::{
    match_descriptors, DescriptorMatch, MatchStrategy, DEFAULT_MAX_SSD, DEFAULT_MIN_NCC,
    DEFAULT_RATIO, RATIO_MATCH_CAP,
};
pub use render::{draw_keypoints, draw_matches};
pub use scale_space::{Octave, ScaleSpace};

use std::time::{Duration, Instant};

use crate::image::Raster;
use crate::trace::{trace_event, trace_span};
use crate::util::{FeatMatchError, FeatMatchResult};

/// Default cap on keypoints per image.
pub const DEFAULT_MAX_KEYPOINTS: usize = 500;

/// Smallest blur any scale may use.
pub const MIN_SCALE_SIGMA: f32 = 1e-3;
/// Largest blur any scale may use.
pub const MAX_SCALE_SIGMA: f32 = 1e4;

/// Feature extraction parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureConfig {
    /// Blur of the first scale in every octave.
    pub sigma: f32,
    /// Blur multiplier between consecutive scales.
    pub k: f32,
    /// Requested number of octaves; tiny images may get fewer.
    pub num_octaves: usize,
    /// Gaussian planes per octave.
    pub num_scales: usize,
    /// Minimum `|DoG|` for a candidate.
    pub contrast_threshold: f32,
    /// Principal curvature ratio `r` of the edge test.
    pub edge_threshold: f32,
    /// Keypoints kept per image, in scan order.
    pub max_keypoints: usize,
    /// Scan DoG rows and match descriptors in parallel when the `rayon`
    /// feature is enabled.
    pub parallel: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sigma: 1.6,
            k: 2.0,
            num_octaves: 4,
            num_scales: 5,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            max_keypoints: DEFAULT_MAX_KEYPOINTS,
            parallel: false,
        }
    }
}

impl FeatureConfig {
    /// Checks that every field is usable.
    pub fn validate(&self) -> FeatMatchResult<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(FeatMatchError::InvalidParameter {
                name: "sigma",
                reason: "must be finite and > 0",
            });
        }
        if !(self.k.is_finite() && self.k > 0.0) {
            return Err(FeatMatchError::InvalidParameter {
                name: "k",
                reason: "must be finite and > 0",
            });
        }
        if self.num_octaves == 0 {
            return Err(FeatMatchError::InvalidParameter {
                name: "num_octaves",
                reason: "must be >= 1",
            });
        }
        if self.num_scales < 2 {
            return Err(FeatMatchError::InvalidParameter {
                name: "num_scales",
                reason: "must be >= 2",
            });
        }
        if !(self.contrast_threshold.is_finite() && self.contrast_threshold >= 0.0) {
            return Err(FeatMatchError::InvalidParameter {
                name: "contrast_threshold",
                reason: "must be finite and >= 0",
            });
        }
        if !(self.edge_threshold.is_finite() && self.edge_threshold > 0.0) {
            return Err(FeatMatchError::InvalidParameter {
                name: "edge_threshold",
                reason: "must be finite and > 0",
            });
        }
        let (lo, hi) = (f64::from(MIN_SCALE_SIGMA), f64::from(MAX_SCALE_SIGMA));
        if !(lo..=hi).contains(&f64::from(self.sigma)) {
            return Err(FeatMatchError::InvalidParameter {
                name: "sigma",
                reason: "must lie in [1e-3, 1e4]",
            });
        }
        // Blur grows or shrinks monotonically, so the last scale bounds them all.
        let last = f64::from(self.sigma) * f64::from(self.k).powf((self.num_scales - 1) as f64);
        if !(lo..=hi).contains(&last) {
            return Err(FeatMatchError::InvalidParameter {
                name: "k",
                reason: "sigma * k^(num_scales - 1) must lie in [1e-3, 1e4]",
            });
        }
        Ok(())
    }
}

/// Partial update of a `FeatureConfig`; `None` keeps the current value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FeatureUpdate {
    pub sigma: Option<f32>,
    pub k: Option<f32>,
    pub num_octaves: Option<usize>,
    pub num_scales: Option<usize>,
    pub contrast_threshold: Option<f32>,
    pub edge_threshold: Option<f32>,
}

impl FeatureUpdate {
    fn apply(&self, cfg: FeatureConfig) -> FeatureConfig {
        FeatureConfig {
            sigma: self.sigma.unwrap_or(cfg.sigma),
            k: self.k.unwrap_or(cfg.k),
            num_octaves: self.num_octaves.unwrap_or(cfg.num_octaves),
            num_scales: self.num_scales.unwrap_or(cfg.num_scales),
            contrast_threshold: self.contrast_threshold.unwrap_or(cfg.contrast_threshold),
            edge_threshold: self.edge_threshold.unwrap_or(cfg.edge_threshold),
            ..cfg
        }
    }
}

/// Keypoints paired one-to-one with their descriptors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSet {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub(crate) fn from_parts(keypoints: Vec<Keypoint>, descriptors: Vec<Descriptor>) -> Self {
        debug_assert_eq!(keypoints.len(), descriptors.len());
        Self {
            keypoints,
            descriptors,
        }
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Number of keypoint/descriptor pairs.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Iterates aligned pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Keypoint, &Descriptor)> {
        self.keypoints.iter().zip(self.descriptors.iter())
    }

    /// Splits into keypoints and descriptors.
    pub fn into_parts(self) -> (Vec<Keypoint>, Vec<Descriptor>) {
        (self.keypoints, self.descriptors)
    }
}

/// Keypoint extractor and descriptor matcher owning its configuration.
#[derive(Clone, Debug, Default)]
pub struct FeatureEngine {
    cfg: FeatureConfig,
}

impl FeatureEngine {
    /// Creates an engine with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: FeatureConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }

    /// Applies a partial update; on error the previous configuration stays.
    pub fn configure(&mut self, update: FeatureUpdate) -> FeatMatchResult<()> {
        let next = update.apply(self.cfg);
        next.validate()?;
        self.cfg = next;
        Ok(())
    }

    /// Builds the Gaussian and DoG pyramids of `image` without localizing.
    pub fn scale_space(&self, image: &Raster) -> ScaleSpace {
        ScaleSpace::build(&image.to_gray(), &self.cfg)
    }

    /// Extracts keypoints and descriptors; an absent image yields an empty set.
    pub fn extract(&self, image: &Raster) -> FeatureSet {
        let _span = trace_span!("extract_features", width = image.width(), height = image.height())
            .entered();
        if image.is_empty() {
            return FeatureSet::default();
        }

        let gray = image.to_gray();
        let space = ScaleSpace::build(&gray, &self.cfg);
        let keypoints = find_keypoints(space.dog(), &self.cfg);
        let features = compute_descriptors(&gray, &keypoints, self.cfg.sigma);
        trace_event!(
            "features",
            keypoints = keypoints.len(),
            described = features.len()
        );
        features
    }

    /// Like [`extract`](Self::extract), also returning the wall-clock time spent.
    pub fn extract_timed(&self, image: &Raster) -> (FeatureSet, Duration) {
        let start = Instant::now();
        let features = self.extract(image);
        (features, start.elapsed())
    }

    /// Matches the descriptors of two feature sets.
    pub fn match_descriptors(
        &self,
        query: &FeatureSet,
        train: &FeatureSet,
        strategy: MatchStrategy,
    ) -> Vec<DescriptorMatch> {
        matching::match_descriptors_with(
            query.descriptors(),
            train.descriptors(),
            strategy,
            self.cfg.parallel,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_keeps_unspecified_fields() {
        let mut engine = FeatureEngine::new();
        engine
            .configure(FeatureUpdate {
                k: Some(1.5),
                ..FeatureUpdate::default()
            })
            .unwrap();
        let cfg = engine.config();
        assert_eq!(cfg.k, 1.5);
        assert_eq!(cfg.sigma, 1.6);
        assert_eq!(cfg.num_scales, 5);
    }

    #[test]
    fn configure_rejects_single_scale() {
        let mut engine = FeatureEngine::new();
        let err = engine
            .configure(FeatureUpdate {
                num_scales: Some(1),
                sigma: Some(2.0),
                ..FeatureUpdate::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            FeatMatchError::InvalidParameter {
                name: "num_scales",
                reason: "must be >= 2",
            }
        );
        assert_eq!(*engine.config(), FeatureConfig::default());
    }

    #[test]
    fn configure_rejects_runaway_blur() {
        let mut engine = FeatureEngine::new();
        let err = engine
            .configure(FeatureUpdate {
                k: Some(1e13),
                ..FeatureUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            FeatMatchError::InvalidParameter { name: "k", .. }
        ));
        let err = engine
            .configure(FeatureUpdate {
                k: Some(1e-3),
                num_scales: Some(8),
                ..FeatureUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            FeatMatchError::InvalidParameter { name: "k", .. }
        ));
        assert_eq!(*engine.config(), FeatureConfig::default());
    }

    #[test]
    fn absent_image_yields_empty_set() {
        let engine = FeatureEngine::new();
        let (features, _) = engine.extract_timed(&Raster::empty());
        assert!(features.is_empty());
        assert_eq!(engine.scale_space(&Raster::empty()).num_octaves(), 0);
    }
}
