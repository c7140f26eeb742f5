//! Image views, owned planes and caller-facing rasters.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. ROI slices are zero-copy
//! views into the same backing slice and retain the original stride.
//!
//! `Plane<T>` is the owned single-channel working buffer every algorithm
//! produces (gradients, blurred levels, DoG planes). `Raster` is the 8-bit,
//! gray or RGB input handed over by the caller.

use crate::util::{FeatMatchError, FeatMatchResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;
mod raster;

pub use raster::{Channels, Raster};

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> FeatMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> FeatMatchResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(FeatMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> FeatMatchResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(FeatMatchError::InvalidDimensions { width, height });
        }

        let out_of_bounds = FeatMatchError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(FeatMatchError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self
            .data
            .get(start..)
            .ok_or(FeatMatchError::BufferTooSmall {
                needed: start.saturating_add(1),
                got: self.data.len(),
            })?;

        ImageView::new(data, width, height, self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> FeatMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(FeatMatchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(FeatMatchError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(FeatMatchError::InvalidDimensions { width, height })?;
    Ok(needed)
}

/// Owned contiguous single-channel plane.
///
/// Planes may be zero-sized; that is how an absent input propagates through
/// the algorithms without becoming an error.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Copy> Plane<T> {
    /// Wraps a row-major buffer of exactly `width * height` samples.
    pub fn new(data: Vec<T>, width: usize, height: usize) -> FeatMatchResult<Self> {
        let needed = width
            .checked_mul(height)
            .ok_or(FeatMatchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(FeatMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(FeatMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a plane with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Returns the plane width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the plane height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns true when the plane holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the row-major samples.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the row-major samples mutably.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns the sample at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Returns row `y` as a slice.
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    #[inline]
    pub(crate) fn at(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    #[inline]
    pub(crate) fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.width + x] = value;
    }

    /// Returns a borrowed view of the plane.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Applies `f` to every sample.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Plane<U> {
        Plane {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Combines two planes of identical size sample by sample.
    pub(crate) fn zip_map<U: Copy, V: Copy>(
        &self,
        other: &Plane<U>,
        f: impl Fn(T, U) -> V,
    ) -> Plane<V> {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        Plane {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl Plane<f32> {
    /// Maximum sample, or `None` for an empty plane.
    pub fn max_value(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::max)
    }

    /// Copies a view into an owned plane.
    pub fn from_view(view: ImageView<'_, f32>) -> Self {
        let mut data = Vec::with_capacity(view.width() * view.height());
        for y in 0..view.height() {
            if let Some(row) = view.row(y) {
                data.extend_from_slice(row);
            }
        }
        Self {
            data,
            width: view.width(),
            height: view.height(),
        }
    }
}
