//! Angle helpers for gradient orientation histograms.

/// Wraps an angle in degrees to the range [0, 360).
pub(crate) fn wrap_360(angle_deg: f32) -> f32 {
    let mut wrapped = angle_deg % 360.0;
    if wrapped < 0.0 {
        wrapped += 360.0;
    }
    if wrapped >= 360.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Gradient orientation in degrees in [0, 360).
pub(crate) fn orientation_deg(dx: f32, dy: f32) -> f32 {
    wrap_360(dy.atan2(dx).to_degrees())
}

/// Euclidean norm of a slice with a small stabilizing term under the root.
pub(crate) fn l2_norm_eps(values: &[f32], eps: f32) -> f32 {
    let sum_sq: f32 = values.iter().map(|v| v * v).sum();
    (sum_sq + eps).sqrt()
}
