//! Convenience helpers for decoding and encoding rasters via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Channels, Raster};
use crate::util::{FeatMatchError, FeatMatchResult};
use std::path::Path;

/// Creates a raster from a dynamic image, keeping gray images single-channel.
pub fn raster_from_dynamic_image(img: &image::DynamicImage) -> FeatMatchResult<Raster> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    match img {
        image::DynamicImage::ImageLuma8(gray) => Raster::gray(gray.as_raw().clone(), width, height),
        other => Raster::rgb(other.to_rgb8().into_raw(), width, height),
    }
}

/// Converts a raster into a dynamic image.
pub fn raster_to_dynamic_image(raster: &Raster) -> FeatMatchResult<image::DynamicImage> {
    let width = raster.width() as u32;
    let height = raster.height() as u32;
    let data = raster.data().to_vec();
    let invalid = FeatMatchError::InvalidDimensions {
        width: raster.width(),
        height: raster.height(),
    };
    match raster.channels() {
        Channels::Gray => image::GrayImage::from_raw(width, height, data)
            .map(image::DynamicImage::ImageLuma8)
            .ok_or(invalid),
        Channels::Rgb => image::RgbImage::from_raw(width, height, data)
            .map(image::DynamicImage::ImageRgb8)
            .ok_or(invalid),
    }
}

/// Loads an image from disk as a gray or RGB raster.
pub fn load_raster<P: AsRef<Path>>(path: P) -> FeatMatchResult<Raster> {
    let img = image::open(path).map_err(|err| FeatMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    raster_from_dynamic_image(&img)
}

/// Encodes a raster to disk; the format follows the file extension.
pub fn save_raster<P: AsRef<Path>>(raster: &Raster, path: P) -> FeatMatchResult<()> {
    let img = raster_to_dynamic_image(raster)?;
    img.save(path).map_err(|err| FeatMatchError::ImageIo {
        reason: err.to_string(),
    })
}
