//! Python bindings for the featmatch detectors and matchers.
//!
//! Images cross the boundary as uint8 numpy arrays: `(height, width)` for
//! gray and `(height, width, 3)` for RGB. Annotated outputs are always RGB.

use numpy::{
    PyArray1, PyArray2, PyArray3, PyArrayMethods, PyReadonlyArrayDyn, PyUntypedArrayMethods,
};
use pyo3::exceptions::{PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use featmatch::{
    Channels, CornerConfig, CornerDetector as RustCornerDetector, CornerMask, CornerUpdate,
    DescriptorMatch as RustDescriptorMatch, FeatMatchError, FeatureConfig,
    FeatureEngine as RustFeatureEngine, FeatureSet, FeatureUpdate, Keypoint as RustKeypoint,
    MatchStrategy, Raster, TemplateConfig, TemplateMatch as RustTemplateMatch,
    TemplateMatcher as RustTemplateMatcher, TemplateMethod,
};

/// Convert a FeatMatchError to a Python exception.
fn to_py_err(err: FeatMatchError) -> PyErr {
    match err {
        FeatMatchError::IndexOutOfBounds { .. } => PyIndexError::new_err(err.to_string()),
        FeatMatchError::InvalidParameter { .. } => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn raster_from_array(pixels: &PyReadonlyArrayDyn<'_, u8>) -> PyResult<Raster> {
    let shape = pixels.shape();
    let (height, width, channels) = match shape {
        &[h, w] => (h, w, Channels::Gray),
        &[h, w, c] => (h, w, Channels::from_count(c).map_err(to_py_err)?),
        _ => {
            return Err(PyValueError::new_err(
                "image must be (height, width) or (height, width, 3)",
            ))
        }
    };
    let data = pixels.as_slice()?.to_vec();
    Raster::new(data, width, height, channels).map_err(to_py_err)
}

fn raster_to_array<'py>(
    py: Python<'py>,
    raster: &Raster,
) -> PyResult<Bound<'py, PyArray3<u8>>> {
    let rgb = raster.to_rgb();
    PyArray1::from_vec(py, rgb.data().to_vec()).reshape([rgb.height(), rgb.width(), 3])
}

fn mask_to_array<'py>(
    py: Python<'py>,
    mask: &CornerMask,
) -> PyResult<Bound<'py, PyArray2<bool>>> {
    PyArray1::from_vec(py, mask.as_slice().to_vec()).reshape([mask.height(), mask.width()])
}

fn parse_template_method(method: &str) -> PyResult<TemplateMethod> {
    match method.to_lowercase().as_str() {
        "ssd" => Ok(TemplateMethod::Ssd),
        "ncc" => Ok(TemplateMethod::Ncc),
        _ => Err(PyValueError::new_err("method must be 'ssd' or 'ncc'")),
    }
}

/// Corner detector with Harris and Hessian-eigenvalue responses.
#[pyclass]
pub struct CornerDetector {
    inner: RustCornerDetector,
}

#[pymethods]
impl CornerDetector {
    /// Create a detector.
    ///
    /// Args:
    ///     k: Harris sensitivity constant (default: 0.04)
    ///     threshold: Harris fraction of max response / Hessian absolute cutoff (default: 0.01)
    ///     window_size: Smoothing window edge length (default: 3)
    #[new]
    #[pyo3(signature = (k = 0.04, threshold = 0.01, window_size = 3))]
    fn new(k: f32, threshold: f32, window_size: usize) -> PyResult<Self> {
        let cfg = CornerConfig {
            k,
            threshold,
            window_size,
        };
        cfg.validate().map_err(to_py_err)?;
        Ok(Self {
            inner: RustCornerDetector::new().with_config(cfg),
        })
    }

    /// Update any subset of the parameters.
    #[pyo3(signature = (k = None, threshold = None, window_size = None))]
    fn configure(
        &mut self,
        k: Option<f32>,
        threshold: Option<f32>,
        window_size: Option<usize>,
    ) -> PyResult<()> {
        self.inner
            .configure(CornerUpdate {
                k,
                threshold,
                window_size,
            })
            .map_err(to_py_err)
    }

    /// Harris corner mask as a bool array.
    fn detect<'py>(
        &self,
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray2<bool>>> {
        let raster = raster_from_array(&image)?;
        let mask = self.inner.detect(&raster);
        mask_to_array(py, &mask)
    }

    /// Hessian smaller-eigenvalue corner mask as a bool array.
    fn detect_hessian<'py>(
        &self,
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray2<bool>>> {
        let raster = raster_from_array(&image)?;
        let mask = self.inner.detect_hessian(&raster);
        mask_to_array(py, &mask)
    }

    /// Harris and Hessian masks from one gradient pass.
    #[allow(clippy::type_complexity)]
    fn detect_dual<'py>(
        &self,
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
    ) -> PyResult<(
        Bound<'py, PyArray2<bool>>,
        Bound<'py, PyArray2<bool>>,
    )> {
        let raster = raster_from_array(&image)?;
        let (harris, hessian) = self.inner.detect_dual(&raster);
        Ok((mask_to_array(py, &harris)?, mask_to_array(py, &hessian)?))
    }

    fn __repr__(&self) -> String {
        let cfg = self.inner.config();
        format!(
            "CornerDetector(k={}, threshold={}, window_size={})",
            cfg.k, cfg.threshold, cfg.window_size
        )
    }
}

/// Scale-space keypoint.
#[pyclass]
#[derive(Clone)]
pub struct Keypoint {
    #[pyo3(get)]
    pub x: f32,
    #[pyo3(get)]
    pub y: f32,
    #[pyo3(get)]
    pub size: f32,
    #[pyo3(get)]
    pub octave: usize,
}

#[pymethods]
impl Keypoint {
    fn __repr__(&self) -> String {
        format!(
            "Keypoint(x={:.1}, y={:.1}, size={:.3}, octave={})",
            self.x, self.y, self.size, self.octave
        )
    }
}

impl From<&RustKeypoint> for Keypoint {
    fn from(kp: &RustKeypoint) -> Self {
        Self {
            x: kp.x,
            y: kp.y,
            size: kp.size,
            octave: kp.octave,
        }
    }
}

/// Accepted descriptor pair.
#[pyclass]
#[derive(Clone)]
pub struct DescriptorMatch {
    #[pyo3(get)]
    pub query_idx: usize,
    #[pyo3(get)]
    pub train_idx: usize,
    /// SSD, NCC score or Euclidean distance depending on the method.
    #[pyo3(get)]
    pub distance: f32,
}

#[pymethods]
impl DescriptorMatch {
    fn __repr__(&self) -> String {
        format!(
            "DescriptorMatch(query_idx={}, train_idx={}, distance={:.4})",
            self.query_idx, self.train_idx, self.distance
        )
    }
}

impl From<&RustDescriptorMatch> for DescriptorMatch {
    fn from(m: &RustDescriptorMatch) -> Self {
        Self {
            query_idx: m.query_idx,
            train_idx: m.train_idx,
            distance: m.distance,
        }
    }
}

impl From<&DescriptorMatch> for RustDescriptorMatch {
    fn from(m: &DescriptorMatch) -> Self {
        Self {
            query_idx: m.query_idx,
            train_idx: m.train_idx,
            distance: m.distance,
        }
    }
}

/// Keypoints and their aligned descriptors.
#[pyclass]
pub struct Features {
    inner: FeatureSet,
}

#[pymethods]
impl Features {
    /// Keypoints in extraction order.
    #[getter]
    fn keypoints(&self) -> Vec<Keypoint> {
        self.inner.keypoints().iter().map(Keypoint::from).collect()
    }

    /// Descriptors as a float32 array of shape (n, 128).
    #[getter]
    fn descriptors<'py>(
        &self,
        py: Python<'py>,
    ) -> PyResult<Bound<'py, PyArray2<f32>>> {
        let flat: Vec<f32> = self
            .inner
            .descriptors()
            .iter()
            .flat_map(|d| d.as_slice().iter().copied())
            .collect();
        PyArray1::from_vec(py, flat)
            .reshape([self.inner.len(), featmatch::features::DESCRIPTOR_LEN])
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!("Features(n={})", self.inner.len())
    }
}

/// Keypoint extractor and descriptor matcher.
#[pyclass]
pub struct FeatureEngine {
    inner: RustFeatureEngine,
}

#[pymethods]
impl FeatureEngine {
    /// Create an engine.
    ///
    /// Args:
    ///     sigma: Base blur (default: 1.6)
    ///     k: Inter-scale blur multiplier (default: 2.0)
    ///     num_octaves: Octave count (default: 4)
    ///     num_scales: Gaussian planes per octave (default: 5)
    ///     contrast_threshold: Minimum |DoG| (default: 0.04)
    ///     edge_threshold: Edge response ratio r (default: 10.0)
    ///     max_keypoints: Keypoint cap (default: 500)
    ///     parallel: Parallel DoG scan (default: True)
    #[new]
    #[pyo3(signature = (
        sigma = 1.6,
        k = 2.0,
        num_octaves = 4,
        num_scales = 5,
        contrast_threshold = 0.04,
        edge_threshold = 10.0,
        max_keypoints = 500,
        parallel = true
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        sigma: f32,
        k: f32,
        num_octaves: usize,
        num_scales: usize,
        contrast_threshold: f32,
        edge_threshold: f32,
        max_keypoints: usize,
        parallel: bool,
    ) -> PyResult<Self> {
        let cfg = FeatureConfig {
            sigma,
            k,
            num_octaves,
            num_scales,
            contrast_threshold,
            edge_threshold,
            max_keypoints,
            parallel,
        };
        cfg.validate().map_err(to_py_err)?;
        Ok(Self {
            inner: RustFeatureEngine::new().with_config(cfg),
        })
    }

    /// Update any subset of the pyramid and rejection parameters.
    #[pyo3(signature = (
        sigma = None,
        k = None,
        num_octaves = None,
        num_scales = None,
        contrast_threshold = None,
        edge_threshold = None
    ))]
    fn configure(
        &mut self,
        sigma: Option<f32>,
        k: Option<f32>,
        num_octaves: Option<usize>,
        num_scales: Option<usize>,
        contrast_threshold: Option<f32>,
        edge_threshold: Option<f32>,
    ) -> PyResult<()> {
        self.inner
            .configure(FeatureUpdate {
                sigma,
                k,
                num_octaves,
                num_scales,
                contrast_threshold,
                edge_threshold,
            })
            .map_err(to_py_err)
    }

    /// Extract keypoints and descriptors.
    fn extract(&self, image: PyReadonlyArrayDyn<'_, u8>) -> PyResult<Features> {
        let raster = raster_from_array(&image)?;
        let inner = self.inner.extract(&raster);
        Ok(Features { inner })
    }

    /// Extract features and report the elapsed seconds.
    fn extract_timed(
        &self,
        image: PyReadonlyArrayDyn<'_, u8>,
    ) -> PyResult<(Features, f64)> {
        let raster = raster_from_array(&image)?;
        let (inner, elapsed) = self.inner.extract_timed(&raster);
        Ok((Features { inner }, elapsed.as_secs_f64()))
    }

    /// Match two feature sets.
    ///
    /// Args:
    ///     method: "ssd", "ncc" or "ratio" (default: "ssd")
    ///     threshold: SSD maximum or NCC minimum
    ///         (default: 100.0 for ssd, 0.8 for ncc)
    ///     unbounded: Accept every best pair regardless of threshold (default: False)
    ///     ratio: Ratio for the ratio test (default: 0.75)
    #[pyo3(name = "match", signature = (query, train, method = "ssd", threshold = None, unbounded = false, ratio = 0.75))]
    fn match_features(
        &self,
        query: &Features,
        train: &Features,
        method: &str,
        threshold: Option<f32>,
        unbounded: bool,
        ratio: f32,
    ) -> PyResult<Vec<DescriptorMatch>> {
        let pick = |default: f32| {
            if unbounded {
                None
            } else {
                Some(threshold.unwrap_or(default))
            }
        };
        let strategy = match method.to_lowercase().as_str() {
            "ssd" => MatchStrategy::Ssd {
                max_distance: pick(featmatch::features::DEFAULT_MAX_SSD),
            },
            "ncc" => MatchStrategy::Ncc {
                min_score: pick(featmatch::features::DEFAULT_MIN_NCC),
            },
            "ratio" => MatchStrategy::Ratio { ratio },
            _ => {
                return Err(PyValueError::new_err(
                    "method must be 'ssd', 'ncc' or 'ratio'",
                ))
            }
        };
        let matches = self
            .inner
            .match_descriptors(&query.inner, &train.inner, strategy);
        Ok(matches.iter().map(DescriptorMatch::from).collect())
    }

    fn __repr__(&self) -> String {
        let cfg = self.inner.config();
        format!(
            "FeatureEngine(sigma={}, k={}, num_octaves={}, num_scales={}, contrast_threshold={}, edge_threshold={})",
            cfg.sigma, cfg.k, cfg.num_octaves, cfg.num_scales, cfg.contrast_threshold, cfg.edge_threshold
        )
    }
}

/// Best template placement.
#[pyclass]
#[derive(Clone)]
pub struct TemplateMatch {
    #[pyo3(get)]
    pub x: usize,
    #[pyo3(get)]
    pub y: usize,
    /// SSD sum or NCC score.
    #[pyo3(get)]
    pub score: f32,
}

#[pymethods]
impl TemplateMatch {
    fn __repr__(&self) -> String {
        format!(
            "TemplateMatch(x={}, y={}, score={:.4})",
            self.x, self.y, self.score
        )
    }
}

impl From<RustTemplateMatch> for TemplateMatch {
    fn from(m: RustTemplateMatch) -> Self {
        Self {
            x: m.x,
            y: m.y,
            score: m.score,
        }
    }
}

/// Brute-force SSD/NCC template matcher.
#[pyclass]
pub struct TemplateMatcher {
    inner: RustTemplateMatcher,
}

#[pymethods]
impl TemplateMatcher {
    #[new]
    #[pyo3(signature = (parallel = true))]
    fn new(parallel: bool) -> Self {
        Self {
            inner: RustTemplateMatcher::new().with_config(TemplateConfig { parallel }),
        }
    }

    /// Best placement, or None when either image is empty.
    #[pyo3(signature = (image, template, method = "ssd"))]
    fn locate(
        &self,
        image: PyReadonlyArrayDyn<'_, u8>,
        template: PyReadonlyArrayDyn<'_, u8>,
        method: &str,
    ) -> PyResult<Option<TemplateMatch>> {
        let method = parse_template_method(method)?;
        let image = raster_from_array(&image)?;
        let template = raster_from_array(&template)?;
        let found = self
            .inner
            .locate(&image, &template, method)
            .map_err(to_py_err)?;
        Ok(found.map(TemplateMatch::from))
    }

    /// Annotated RGB copy of the image with the best placement outlined.
    #[pyo3(name = "match", signature = (image, template, method = "ssd"))]
    fn match_image<'py>(
        &self,
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
        template: PyReadonlyArrayDyn<'py, u8>,
        method: &str,
    ) -> PyResult<Option<Bound<'py, PyArray3<u8>>>> {
        let method = parse_template_method(method)?;
        let image = raster_from_array(&image)?;
        let template = raster_from_array(&template)?;
        let annotated = self
            .inner
            .match_and_annotate(&image, &template, method)
            .map_err(to_py_err)?;
        annotated.map(|r| raster_to_array(py, &r)).transpose()
    }

    /// Score of every valid placement as a float32 array.
    #[pyo3(signature = (image, template, method = "ssd"))]
    fn score_map<'py>(
        &self,
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
        template: PyReadonlyArrayDyn<'py, u8>,
        method: &str,
    ) -> PyResult<Bound<'py, PyArray2<f32>>> {
        let method = parse_template_method(method)?;
        let image = raster_from_array(&image)?;
        let template = raster_from_array(&template)?;
        let map = self
            .inner
            .score_map(&image, &template, method)
            .map_err(to_py_err)?;
        PyArray1::from_vec(py, map.data().to_vec()).reshape([map.height(), map.width()])
    }

    fn __repr__(&self) -> String {
        format!("TemplateMatcher(parallel={})", self.inner.config().parallel)
    }
}

/// Draw keypoints as green circles on an RGB copy of the image.
#[pyfunction]
fn draw_keypoints<'py>(
    py: Python<'py>,
    image: PyReadonlyArrayDyn<'py, u8>,
    features: &Features,
) -> PyResult<Bound<'py, PyArray3<u8>>> {
    let raster = raster_from_array(&image)?;
    let out = featmatch::draw_keypoints(&raster, features.inner.keypoints());
    raster_to_array(py, &out)
}

/// Draw matches between two images on a side-by-side composite.
#[pyfunction]
fn draw_matches<'py>(
    py: Python<'py>,
    image1: PyReadonlyArrayDyn<'py, u8>,
    features1: &Features,
    image2: PyReadonlyArrayDyn<'py, u8>,
    features2: &Features,
    matches: Vec<DescriptorMatch>,
) -> PyResult<Bound<'py, PyArray3<u8>>> {
    let img1 = raster_from_array(&image1)?;
    let img2 = raster_from_array(&image2)?;
    let matches: Vec<RustDescriptorMatch> = matches.iter().map(RustDescriptorMatch::from).collect();
    let out = featmatch::draw_matches(
        &img1,
        features1.inner.keypoints(),
        &img2,
        features2.inner.keypoints(),
        &matches,
    )
    .map_err(to_py_err)?;
    raster_to_array(py, &out)
}

/// Python module for featmatch.
#[pymodule]
fn _featmatch(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<CornerDetector>()?;
    m.add_class::<Keypoint>()?;
    m.add_class::<DescriptorMatch>()?;
    m.add_class::<Features>()?;
    m.add_class::<FeatureEngine>()?;
    m.add_class::<TemplateMatch>()?;
    m.add_class::<TemplateMatcher>()?;
    m.add_function(wrap_pyfunction!(draw_keypoints, m)?)?;
    m.add_function(wrap_pyfunction!(draw_matches, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
