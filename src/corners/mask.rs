//! Boolean corner masks and their overlay rendering.

use crate::draw::Rgb;
use crate::image::{Plane, Raster};
use crate::util::{FeatMatchError, FeatMatchResult};

/// One flag per pixel marking "corner here".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CornerMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl CornerMask {
    /// The mask returned for an absent image.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            bits: Vec::new(),
        }
    }

    /// Marks every sample of `response` strictly above `cutoff`.
    pub(crate) fn from_threshold(response: &Plane<f32>, cutoff: f32) -> Self {
        Self {
            width: response.width(),
            height: response.height(),
            bits: response.data().iter().map(|&v| v > cutoff).collect(),
        }
    }

    /// Returns the mask width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the mask height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns true when the mask covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns whether `(x, y)` is a corner; out-of-bounds reads are `false`.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    /// Row-major flags.
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Number of corner pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Iterates corner coordinates `(x, y)` in row-major order.
    pub fn corners(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(move |(idx, _)| (idx % width, idx / width))
    }
}

/// Paints every corner pixel of `mask` onto an RGB copy of `image`.
pub fn draw_corners(image: &Raster, mask: &CornerMask, color: Rgb) -> FeatMatchResult<Raster> {
    if image.width() != mask.width() || image.height() != mask.height() {
        return Err(FeatMatchError::InvalidDimensions {
            width: mask.width(),
            height: mask.height(),
        });
    }
    let mut out = image.to_rgb();
    for (x, y) in mask.corners() {
        out.put_pixel(x as i64, y as i64, color);
    }
    Ok(out)
}
