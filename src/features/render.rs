//! Keypoint and match overlays.

use crate::draw::{draw_circle, draw_line, Rgb};
use crate::features::{DescriptorMatch, Keypoint};
use crate::image::{Channels, Raster};
use crate::util::{FeatMatchError, FeatMatchResult};

/// Draws every keypoint as a green circle of radius `size / 2` on an RGB copy.
pub fn draw_keypoints(image: &Raster, keypoints: &[Keypoint]) -> Raster {
    let mut out = image.to_rgb();
    for kp in keypoints {
        let center = (kp.x.round() as i64, kp.y.round() as i64);
        let radius = (kp.size * 0.5).round().max(1.0) as i64;
        draw_circle(&mut out, center, radius, Rgb::GREEN, 1);
    }
    out
}

fn keypoint_at<'a>(
    keypoints: &'a [Keypoint],
    index: usize,
    context: &'static str,
) -> FeatMatchResult<&'a Keypoint> {
    keypoints.get(index).ok_or(FeatMatchError::IndexOutOfBounds {
        index,
        len: keypoints.len(),
        context,
    })
}

/// Places both images side by side and joins every matched pair with a line.
///
/// The composite is `w1 + w2` wide and `max(h1, h2)` tall; `query_idx`
/// indexes `kp1` and `train_idx` indexes `kp2`. Only matched keypoints are
/// marked.
pub fn draw_matches(
    img1: &Raster,
    kp1: &[Keypoint],
    img2: &Raster,
    kp2: &[Keypoint],
    matches: &[DescriptorMatch],
) -> FeatMatchResult<Raster> {
    let left = img1.to_rgb();
    let right = img2.to_rgb();
    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut canvas = Raster::filled(width, height, Channels::Rgb, 0);
    canvas.blit(&left, 0, 0)?;
    canvas.blit(&right, left.width(), 0)?;

    let offset = left.width() as f32;
    for (i, m) in matches.iter().enumerate() {
        let a = keypoint_at(kp1, m.query_idx, "query keypoints")?;
        let b = keypoint_at(kp2, m.train_idx, "train keypoints")?;
        let color = Rgb::palette(i);
        let p0 = (a.x.round() as i64, a.y.round() as i64);
        let p1 = ((b.x + offset).round() as i64, b.y.round() as i64);
        draw_circle(&mut canvas, p0, 3, color, 1);
        draw_circle(&mut canvas, p1, 3, color, 1);
        draw_line(&mut canvas, p0, p1, color, 1);
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_matches_builds_side_by_side_canvas() {
        let img1 = Raster::filled(10, 8, Channels::Gray, 50);
        let img2 = Raster::filled(6, 12, Channels::Rgb, 80);
        let out = draw_matches(&img1, &[], &img2, &[], &[]).unwrap();
        assert_eq!((out.width(), out.height()), (16, 12));
        assert_eq!(out.pixel(0, 0), Some(&[50u8, 50, 50][..]));
        assert_eq!(out.pixel(10, 0), Some(&[80u8, 80, 80][..]));
        assert_eq!(out.pixel(0, 10), Some(&[0u8, 0, 0][..]));
    }

    #[test]
    fn draw_matches_rejects_bad_index() {
        let img = Raster::filled(8, 8, Channels::Gray, 0);
        let kp = Keypoint {
            x: 4.0,
            y: 4.0,
            size: 1.6,
            octave: 0,
        };
        let m = DescriptorMatch {
            query_idx: 0,
            train_idx: 2,
            distance: 0.0,
        };
        let err = draw_matches(&img, &[kp], &img, &[kp], &[m]).unwrap_err();
        assert_eq!(
            err,
            FeatMatchError::IndexOutOfBounds {
                index: 2,
                len: 1,
                context: "train keypoints",
            }
        );
    }

    #[test]
    fn draw_keypoints_marks_circle() {
        let img = Raster::filled(20, 20, Channels::Gray, 0);
        let kp = Keypoint {
            x: 10.0,
            y: 10.0,
            size: 8.0,
            octave: 0,
        };
        let out = draw_keypoints(&img, &[kp]);
        assert_eq!(out.channels(), Channels::Rgb);
        assert_eq!(out.pixel(14, 10), Some(&[0u8, 255, 0][..]));
        assert_eq!(out.pixel(10, 10), Some(&[0u8, 0, 0][..]));
    }
}
