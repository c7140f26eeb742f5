//! Interleaved 8-bit rasters supplied by the caller.

use crate::draw::Rgb;
use crate::image::Plane;
use crate::util::{FeatMatchError, FeatMatchResult};

/// Channel layout of a `Raster`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channels {
    /// One luminance sample per pixel.
    Gray,
    /// Interleaved red, green, blue samples.
    Rgb,
}

impl Channels {
    /// Number of samples per pixel.
    pub fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }

    /// Maps a sample count back to a layout.
    pub fn from_count(count: usize) -> FeatMatchResult<Self> {
        match count {
            1 => Ok(Channels::Gray),
            3 => Ok(Channels::Rgb),
            got => Err(FeatMatchError::UnsupportedChannels { got }),
        }
    }
}

/// Owned 8-bit image with one or three interleaved channels.
///
/// A raster with zero width or height stands for an absent image; every
/// algorithm answers it with an empty result.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: Channels,
}

impl Raster {
    /// Creates a raster from interleaved row-major samples.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: Channels,
    ) -> FeatMatchResult<Self> {
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels.count()))
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
            channels,
        })
    }

    /// Creates a single-channel raster.
    pub fn gray(data: Vec<u8>, width: usize, height: usize) -> FeatMatchResult<Self> {
        Self::new(data, width, height, Channels::Gray)
    }

    /// Creates an interleaved RGB raster.
    pub fn rgb(data: Vec<u8>, width: usize, height: usize) -> FeatMatchResult<Self> {
        Self::new(data, width, height, Channels::Rgb)
    }

    /// The absent image.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            channels: Channels::Gray,
        }
    }

    /// Creates a raster with every pixel set to `value` in all channels.
    pub fn filled(width: usize, height: usize, channels: Channels, value: u8) -> Self {
        Self {
            data: vec![value; width * height * channels.count()],
            width,
            height,
            channels,
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the channel layout.
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Returns true for a zero-sized (absent) raster.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the samples of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels.count();
        let start = (y * self.width + x) * c;
        self.data.get(start..start + c)
    }

    /// Writes a colour at `(x, y)`; out-of-bounds coordinates are ignored.
    ///
    /// Gray rasters receive the luma of the colour.
    pub fn put_pixel(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let c = self.channels.count();
        let start = (y as usize * self.width + x as usize) * c;
        match self.channels {
            Channels::Gray => self.data[start] = color.luma(),
            Channels::Rgb => self.data[start..start + 3].copy_from_slice(&color.to_array()),
        }
    }

    /// Converts to a float luminance plane on the 0..255 scale.
    ///
    /// RGB uses the Rec. 601 weights `0.299 R + 0.587 G + 0.114 B`.
    pub fn to_gray(&self) -> Plane<f32> {
        let data = match self.channels {
            Channels::Gray => self.data.iter().map(|&v| f32::from(v)).collect(),
            Channels::Rgb => self
                .data
                .chunks_exact(3)
                .map(|px| {
                    0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2])
                })
                .collect(),
        };
        Plane {
            data,
            width: self.width,
            height: self.height,
        }
    }

    /// Returns an RGB copy, replicating gray samples into all three channels.
    pub fn to_rgb(&self) -> Raster {
        match self.channels {
            Channels::Rgb => self.clone(),
            Channels::Gray => Raster {
                data: self.data.iter().flat_map(|&v| [v, v, v]).collect(),
                width: self.width,
                height: self.height,
                channels: Channels::Rgb,
            },
        }
    }

    /// Copies `src` into this raster with its top-left corner at `(x0, y0)`.
    ///
    /// Both rasters must share a channel layout; pixels falling outside are
    /// clipped.
    pub fn blit(&mut self, src: &Raster, x0: usize, y0: usize) -> FeatMatchResult<()> {
        if src.channels != self.channels {
            return Err(FeatMatchError::ChannelMismatch {
                expected: self.channels.count(),
                got: src.channels.count(),
            });
        }
        let c = self.channels.count();
        for y in 0..src.height {
            let dy = y0 + y;
            if dy >= self.height {
                break;
            }
            let copy_w = src.width.min(self.width.saturating_sub(x0));
            if copy_w == 0 {
                break;
            }
            let src_start = y * src.width * c;
            let dst_start = (dy * self.width + x0) * c;
            self.data[dst_start..dst_start + copy_w * c]
                .copy_from_slice(&src.data[src_start..src_start + copy_w * c]);
        }
        Ok(())
    }
}
