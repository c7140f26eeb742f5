//! Per-pixel corner response maps.

use crate::filter::{box_filter, central_gradient};
use crate::image::Plane;

/// Box-smoothed products of a gradient pair: `(Sxx, Sxy, Syy)`.
fn smoothed_tensor(
    gx: &Plane<f32>,
    gy: &Plane<f32>,
    window_size: usize,
) -> (Plane<f32>, Plane<f32>, Plane<f32>) {
    let ixx = gx.map(|v| v * v);
    let ixy = gx.zip_map(gy, |a, b| a * b);
    let iyy = gy.map(|v| v * v);
    (
        box_filter(&ixx, window_size),
        box_filter(&ixy, window_size),
        box_filter(&iyy, window_size),
    )
}

/// Harris response `det(M) - k * trace(M)²` of the box-smoothed structure
/// tensor built from precomputed first-order gradients.
pub fn harris_response_from_gradients(
    dx: &Plane<f32>,
    dy: &Plane<f32>,
    k: f32,
    window_size: usize,
) -> Plane<f32> {
    let (sxx, sxy, syy) = smoothed_tensor(dx, dy, window_size);
    let mut response = Plane::filled(dx.width(), dx.height(), 0.0f32);
    for (idx, out) in response.data_mut().iter_mut().enumerate() {
        let a = sxx.data()[idx];
        let b = syy.data()[idx];
        let c = sxy.data()[idx];
        let det = a * b - c * c;
        let trace = a + b;
        *out = det - k * trace * trace;
    }
    response
}

/// Harris response of a grayscale plane.
///
/// Positive values mark corners, negative values edges, values near zero flat
/// regions.
pub fn harris_response(gray: &Plane<f32>, k: f32, window_size: usize) -> Plane<f32> {
    let (dx, dy) = central_gradient(gray);
    harris_response_from_gradients(&dx, &dy, k, window_size)
}

/// Smaller eigenvalue of the box-smoothed Hessian built from precomputed
/// first-order gradients.
///
/// Second-order partials come from a further central-difference pass:
/// `dxx = d/dx(dx)`, `dxy = d/dy(dx)`, `dyy = d/dy(dy)`.
pub fn min_eigen_response_from_gradients(
    dx: &Plane<f32>,
    dy: &Plane<f32>,
    window_size: usize,
) -> Plane<f32> {
    let (dxx, dxy) = central_gradient(dx);
    let (_, dyy) = central_gradient(dy);
    let sxx = box_filter(&dxx, window_size);
    let sxy = box_filter(&dxy, window_size);
    let syy = box_filter(&dyy, window_size);

    let mut response = Plane::filled(dx.width(), dx.height(), 0.0f32);
    for (idx, out) in response.data_mut().iter_mut().enumerate() {
        let a = sxx.data()[idx];
        let b = syy.data()[idx];
        let c = sxy.data()[idx];
        let trace = a + b;
        let det = a * b - c * c;
        // The discriminant is (a - b)² + 4c² analytically; clamp rounding noise.
        let disc = (trace * trace - 4.0 * det).max(0.0);
        *out = (trace - disc.sqrt()) * 0.5;
    }
    response
}

/// Smaller Hessian eigenvalue (`λ2`) of a grayscale plane.
pub fn min_eigen_response(gray: &Plane<f32>, window_size: usize) -> Plane<f32> {
    let (dx, dy) = central_gradient(gray);
    min_eigen_response_from_gradients(&dx, &dy, window_size)
}
