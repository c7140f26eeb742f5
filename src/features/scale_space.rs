//! Gaussian and difference-of-Gaussian pyramids.
//!
//! Octave 0 is the input resolution and every following octave halves the
//! unblurred base of the previous one. Within an octave, scale `s` is the base
//! blurred with `sigma * k^s`; every scale is blurred from the octave base, not
//! incrementally. DoG plane `s` is `gaussian[s + 1] - gaussian[s]`.

use crate::features::FeatureConfig;
use crate::filter::gaussian_blur;
use crate::image::pyramid::downsample_half;
use crate::image::Plane;
use crate::trace::{trace_debug, trace_span};

/// Planes of one resolution level, ordered by increasing blur.
#[derive(Clone, Debug)]
pub struct Octave {
    planes: Vec<Plane<f32>>,
    width: usize,
    height: usize,
}

impl Octave {
    fn new(planes: Vec<Plane<f32>>, width: usize, height: usize) -> Self {
        Self {
            planes,
            width,
            height,
        }
    }

    /// Planes of this octave.
    pub fn planes(&self) -> &[Plane<f32>] {
        &self.planes
    }

    /// Number of planes.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Returns true when the octave holds no planes.
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Width shared by every plane of the octave.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height shared by every plane of the octave.
    pub fn height(&self) -> usize {
        self.height
    }
}

/// Builds the Gaussian pyramid of a grayscale plane.
///
/// Octaves stop early when halving would produce an empty plane, so fewer
/// than `num_octaves` octaves are returned for tiny inputs.
pub fn build_gaussian_pyramid(gray: &Plane<f32>, cfg: &FeatureConfig) -> Vec<Octave> {
    let mut octaves = Vec::with_capacity(cfg.num_octaves);
    if gray.is_empty() {
        return octaves;
    }

    let mut base = gray.clone();
    for octave_idx in 0..cfg.num_octaves {
        if octave_idx > 0 {
            let next = downsample_half(&base);
            if next.is_empty() {
                break;
            }
            base = next;
        }

        let mut planes = Vec::with_capacity(cfg.num_scales);
        let mut sigma = cfg.sigma;
        for _ in 0..cfg.num_scales {
            planes.push(gaussian_blur(&base, sigma));
            sigma *= cfg.k;
        }
        octaves.push(Octave::new(planes, base.width(), base.height()));
    }

    octaves
}

/// Builds the DoG pyramid: one fewer plane per octave than the Gaussian one.
pub fn build_dog_pyramid(gaussian: &[Octave]) -> Vec<Octave> {
    gaussian
        .iter()
        .map(|octave| {
            let planes = octave
                .planes
                .windows(2)
                .map(|pair| pair[1].zip_map(&pair[0], |hi, lo| hi - lo))
                .collect();
            Octave::new(planes, octave.width, octave.height)
        })
        .collect()
}

/// Gaussian and DoG pyramids built for one extraction call.
#[derive(Clone, Debug)]
pub struct ScaleSpace {
    gaussian: Vec<Octave>,
    dog: Vec<Octave>,
}

impl ScaleSpace {
    /// Builds both pyramids from a grayscale plane.
    pub fn build(gray: &Plane<f32>, cfg: &FeatureConfig) -> Self {
        let _span = trace_span!("build_scale_space", width = gray.width(), height = gray.height())
            .entered();
        let gaussian = build_gaussian_pyramid(gray, cfg);
        let dog = build_dog_pyramid(&gaussian);
        for (idx, octave) in dog.iter().enumerate() {
            trace_debug!(
                "dog_octave",
                octave = idx,
                width = octave.width(),
                height = octave.height(),
                planes = octave.len()
            );
        }
        Self { gaussian, dog }
    }

    /// Gaussian octaves.
    pub fn gaussian(&self) -> &[Octave] {
        &self.gaussian
    }

    /// DoG octaves.
    pub fn dog(&self) -> &[Octave] {
        &self.dog
    }

    /// Number of octaves actually built.
    pub fn num_octaves(&self) -> usize {
        self.gaussian.len()
    }
}
