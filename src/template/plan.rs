//! Template plan precomputation for SSD and NCC scoring.

use crate::image::Plane;
use crate::util::{FeatMatchError, FeatMatchResult};

/// Precomputed statistics and zero-mean buffer for one template.
///
/// A flat template is accepted: its NCC energy is zero and every NCC score
/// against it is reported as 0.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f64,
    energy: f64,
    values: Vec<f32>,
    zero_mean: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan from a grayscale template plane.
    pub fn from_plane(tpl: &Plane<f32>) -> FeatMatchResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        if tpl.is_empty() {
            return Err(FeatMatchError::InvalidDimensions { width, height });
        }

        let values = tpl.data().to_vec();
        let count = values.len() as f64;
        let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / count;
        let zero_mean: Vec<f64> = values.iter().map(|&v| f64::from(v) - mean).collect();
        let energy = zero_mean.iter().map(|v| v * v).sum();

        Ok(Self {
            width,
            height,
            mean,
            energy,
            values,
            zero_mean,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared zero-mean samples.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Raw samples in row-major order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn zero_mean(&self) -> &[f64] {
        &self.zero_mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_statistics() {
        let tpl = Plane::new(vec![1.0, 3.0, 5.0, 7.0], 2, 2).unwrap();
        let plan = TemplatePlan::from_plane(&tpl).unwrap();
        assert_eq!(plan.mean(), 4.0);
        assert_eq!(plan.zero_mean(), &[-3.0, -1.0, 1.0, 3.0]);
        assert_eq!(plan.energy(), 20.0);
    }

    #[test]
    fn flat_template_has_zero_energy() {
        let plan = TemplatePlan::from_plane(&Plane::filled(3, 3, 9.0f32)).unwrap();
        assert_eq!(plan.energy(), 0.0);
    }

    #[test]
    fn empty_template_is_rejected() {
        let err = TemplatePlan::from_plane(&Plane::filled(0, 4, 0.0f32)).unwrap_err();
        assert_eq!(
            err,
            FeatMatchError::InvalidDimensions {
                width: 0,
                height: 4
            }
        );
    }
}
