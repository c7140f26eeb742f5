//! Low-level building blocks for custom pipelines.
//!
//! These functions expose the filters, response maps, pyramid stages and
//! matching primitives the detectors are built from. Most users should
//! prefer `CornerDetector`, `FeatureEngine` and `TemplateMatcher`.

pub use crate::corners::{
    harris_response, harris_response_from_gradients, min_eigen_response,
    min_eigen_response_from_gradients,
};
pub use crate::features::scale_space::{build_dog_pyramid, build_gaussian_pyramid};
pub use crate::features::{
    compute_descriptors, find_keypoints, match_descriptors, Octave, ScaleSpace, DESCRIPTOR_LEN,
};
pub use crate::filter::{
    box_filter, central_gradient, convolve_separable, gaussian_blur, gaussian_kernel_1d,
    sobel_xy, Border,
};
pub use crate::image::pyramid::{downsample_half, resize_bilinear};
pub use crate::template::TemplatePlan;
