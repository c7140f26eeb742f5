//! Error types for featmatch.

use thiserror::Error;

/// Result alias for featmatch operations.
pub type FeatMatchResult<T> = std::result::Result<T, FeatMatchError>;

/// Errors that can occur when building inputs or running featmatch algorithms.
///
/// Empty inputs are not errors: detectors and matchers return empty results
/// for them. Only malformed buffers, invalid configuration and degenerate
/// template geometry are reported here.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FeatMatchError {
    /// Width or height is zero or overflows the addressable size.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the described image.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Requested region does not fit inside the image.
    #[error(
        "roi {width}x{height} at ({x}, {y}) out of bounds for {img_width}x{img_height} image"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Unsupported channel count for an interleaved raster.
    #[error("unsupported channel count: {got}")]
    UnsupportedChannels { got: usize },
    /// Two inputs were expected to share a channel layout.
    #[error("channel mismatch: expected {expected}, got {got}")]
    ChannelMismatch { expected: usize, got: usize },
    /// Template does not fit inside the search image in at least one dimension.
    #[error(
        "template {tpl_width}x{tpl_height} larger than search image {img_width}x{img_height}"
    )]
    TemplateTooLarge {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// An index into a keypoint or descriptor sequence is out of range.
    #[error("index {index} out of bounds for {context} (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// A configuration value is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    /// Image decoding or encoding failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
