//! featmatch is a CPU-first library of classical feature detectors and matchers.
//!
//! It provides Harris and Hessian-eigenvalue corner masks, a scale-space
//! keypoint extractor with 128-bin gradient histogram descriptors, descriptor
//! matching by SSD, NCC or ratio test, and brute-force SSD/NCC template
//! localization. Parallel scans are available through the `rayon` feature,
//! image file loading through `image-io` and spans through `tracing`.
//!
//! All inputs are caller-supplied [`Raster`]s on the 0..255 scale; a
//! zero-sized raster stands for an absent image and yields an empty result.

mod trace;

pub mod corners;
pub mod draw;
pub mod features;
mod filter;
pub mod image;
pub mod lowlevel;
pub mod template;
pub mod util;

pub use corners::{draw_corners, CornerConfig, CornerDetector, CornerMask, CornerUpdate};
pub use draw::Rgb;
pub use features::{
    draw_keypoints, draw_matches, Descriptor, DescriptorMatch, FeatureConfig, FeatureEngine,
    FeatureSet, FeatureUpdate, Keypoint, MatchStrategy,
};
pub use image::{Channels, ImageView, Plane, Raster};
pub use template::{TemplateConfig, TemplateMatch, TemplateMatcher, TemplateMethod};
pub use util::{FeatMatchError, FeatMatchResult};
