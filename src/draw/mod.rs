//! Raster annotation primitives used by the visualization helpers.
//!
//! All drawing clips silently at the raster bounds.

use crate::image::Raster;

/// 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);

    /// Returns the samples as `[r, g, b]`.
    pub fn to_array(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }

    /// Rec. 601 luma of the colour, rounded.
    pub fn luma(self) -> u8 {
        let y = 0.299 * f32::from(self.0) + 0.587 * f32::from(self.1) + 0.114 * f32::from(self.2);
        y.round().clamp(0.0, 255.0) as u8
    }

    /// Deterministic colour for the `index`-th item of a drawing.
    pub fn palette(index: usize) -> Rgb {
        const PALETTE: [Rgb; 6] = [
            Rgb(255, 0, 0),
            Rgb(0, 255, 0),
            Rgb(0, 128, 255),
            Rgb(255, 255, 0),
            Rgb(255, 0, 255),
            Rgb(0, 255, 255),
        ];
        PALETTE[index % PALETTE.len()]
    }
}

fn stamp(img: &mut Raster, x: i64, y: i64, color: Rgb, thickness: usize) {
    if thickness <= 1 {
        img.put_pixel(x, y, color);
        return;
    }
    let lo = -((thickness as i64 - 1) / 2);
    let hi = thickness as i64 / 2;
    for oy in lo..=hi {
        for ox in lo..=hi {
            img.put_pixel(x + ox, y + oy, color);
        }
    }
}

/// Draws a line with Bresenham's algorithm.
///
/// Thickness above one stamps a square brush at every step.
pub fn draw_line(img: &mut Raster, p0: (i64, i64), p1: (i64, i64), color: Rgb, thickness: usize) {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        stamp(img, x0, y0, color, thickness);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draws a rectangle outline between two inclusive corners.
pub fn draw_rect(
    img: &mut Raster,
    top_left: (i64, i64),
    bottom_right: (i64, i64),
    color: Rgb,
    thickness: usize,
) {
    let (x0, y0) = top_left;
    let (x1, y1) = bottom_right;
    let (lx0, lx1) = (x0.min(x1), x0.max(x1));
    let (ly0, ly1) = (y0.min(y1), y0.max(y1));

    draw_line(img, (lx0, ly0), (lx1, ly0), color, thickness);
    draw_line(img, (lx0, ly1), (lx1, ly1), color, thickness);
    draw_line(img, (lx0, ly0), (lx0, ly1), color, thickness);
    draw_line(img, (lx1, ly0), (lx1, ly1), color, thickness);
}

/// Draws a circle outline with the midpoint algorithm.
pub fn draw_circle(
    img: &mut Raster,
    center: (i64, i64),
    radius: i64,
    color: Rgb,
    thickness: usize,
) {
    let (cx, cy) = center;
    if radius <= 0 {
        stamp(img, cx, cy, color, thickness);
        return;
    }

    let mut x = radius;
    let mut y = 0i64;
    let mut err = 1 - radius;
    while x >= y {
        for (px, py) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            stamp(img, cx + px, cy + py, color, thickness);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}
