//! Brute-force template matching by SSD or zero-mean NCC.
//!
//! Both methods visit every top-left offset at which the template fits
//! entirely inside the image. Nothing is pruned: the cost is
//! `O(image_pixels * template_pixels)`.

mod plan;
#[cfg(feature = "rayon")]
mod rayon;
mod scan;

pub use plan::TemplatePlan;

use crate::draw::{draw_rect, Rgb};
use crate::image::{Plane, Raster};
use crate::trace::{trace_event, trace_span};
use crate::util::{FeatMatchError, FeatMatchResult};
use scan::{NccScore, SsdScore, WindowScore};

/// Rectangle thickness used by [`TemplateMatcher::annotate`].
pub const RECT_THICKNESS: usize = 2;

/// Window comparison method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemplateMethod {
    /// Sum of squared differences, minimized.
    #[default]
    Ssd,
    /// Zero-mean normalized cross-correlation, maximized.
    Ncc,
}

impl TemplateMethod {
    /// Rectangle colour for this method: red for SSD, green for NCC.
    pub fn color(self) -> Rgb {
        match self {
            TemplateMethod::Ssd => Rgb::RED,
            TemplateMethod::Ncc => Rgb::GREEN,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TemplateMethod::Ssd => "ssd",
            TemplateMethod::Ncc => "ncc",
        }
    }
}

/// Template matcher parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TemplateConfig {
    /// Scan rows in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
}

/// Best placement found by a scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateMatch {
    /// Left edge of the window.
    pub x: usize,
    /// Top edge of the window.
    pub y: usize,
    /// SSD sum or NCC score at the window.
    pub score: f32,
}

/// Sliding-window matcher owning its configuration.
#[derive(Clone, Debug, Default)]
pub struct TemplateMatcher {
    cfg: TemplateConfig,
}

impl TemplateMatcher {
    /// Creates a matcher with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: TemplateConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &TemplateConfig {
        &self.cfg
    }

    /// Finds the best placement of `template` inside `image`.
    ///
    /// Returns `Ok(None)` when either raster is absent and
    /// `TemplateTooLarge` when the template does not fit.
    pub fn locate(
        &self,
        image: &Raster,
        template: &Raster,
        method: TemplateMethod,
    ) -> FeatMatchResult<Option<TemplateMatch>> {
        let _span = trace_span!(
            "template_match",
            method = method.name(),
            img_width = image.width(),
            img_height = image.height(),
            tpl_width = template.width(),
            tpl_height = template.height()
        )
        .entered();
        let Some((gray, plan)) = prepare(image, template)? else {
            return Ok(None);
        };

        let found = match method {
            TemplateMethod::Ssd => self.scan::<SsdScore>(&gray, &plan),
            TemplateMethod::Ncc => self.scan::<NccScore>(&gray, &plan),
        };
        if let Some(m) = found {
            trace_event!("template_best", x = m.x, y = m.y, score = m.score);
        }
        Ok(found)
    }

    /// Score of every valid placement as a `(W - w + 1) x (H - h + 1)` plane.
    ///
    /// An absent input yields an empty plane.
    pub fn score_map(
        &self,
        image: &Raster,
        template: &Raster,
        method: TemplateMethod,
    ) -> FeatMatchResult<Plane<f32>> {
        let _span = trace_span!("template_score_map", method = method.name()).entered();
        let Some((gray, plan)) = prepare(image, template)? else {
            return Ok(Plane::filled(0, 0, 0.0));
        };
        Ok(match method {
            TemplateMethod::Ssd => self.map::<SsdScore>(&gray, &plan),
            TemplateMethod::Ncc => self.map::<NccScore>(&gray, &plan),
        })
    }

    /// Draws the match rectangle on an RGB copy of `image`.
    pub fn annotate(
        image: &Raster,
        found: &TemplateMatch,
        tpl_width: usize,
        tpl_height: usize,
        method: TemplateMethod,
    ) -> Raster {
        let mut out = image.to_rgb();
        let x0 = found.x as i64;
        let y0 = found.y as i64;
        draw_rect(
            &mut out,
            (x0, y0),
            (x0 + tpl_width as i64 - 1, y0 + tpl_height as i64 - 1),
            method.color(),
            RECT_THICKNESS,
        );
        out
    }

    /// Locates the template and returns an annotated copy of `image`.
    ///
    /// The output has the dimensions of `image` and carries exactly one
    /// rectangle. Absent inputs yield `Ok(None)`.
    pub fn match_and_annotate(
        &self,
        image: &Raster,
        template: &Raster,
        method: TemplateMethod,
    ) -> FeatMatchResult<Option<Raster>> {
        Ok(self.locate(image, template, method)?.map(|found| {
            Self::annotate(image, &found, template.width(), template.height(), method)
        }))
    }

    #[cfg(feature = "rayon")]
    fn scan<S: WindowScore>(
        &self,
        gray: &Plane<f32>,
        plan: &TemplatePlan,
    ) -> Option<TemplateMatch> {
        if self.cfg.parallel {
            self::rayon::scan_full_par::<S>(gray, plan)
        } else {
            scan::scan_full::<S>(gray, plan)
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn scan<S: WindowScore>(
        &self,
        gray: &Plane<f32>,
        plan: &TemplatePlan,
    ) -> Option<TemplateMatch> {
        scan::scan_full::<S>(gray, plan)
    }

    #[cfg(feature = "rayon")]
    fn map<S: WindowScore>(&self, gray: &Plane<f32>, plan: &TemplatePlan) -> Plane<f32> {
        if self.cfg.parallel {
            self::rayon::score_map_par::<S>(gray, plan)
        } else {
            scan::score_map::<S>(gray, plan)
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn map<S: WindowScore>(&self, gray: &Plane<f32>, plan: &TemplatePlan) -> Plane<f32> {
        scan::score_map::<S>(gray, plan)
    }
}

/// Converts both rasters to gray and checks that the template fits.
fn prepare(
    image: &Raster,
    template: &Raster,
) -> FeatMatchResult<Option<(Plane<f32>, TemplatePlan)>> {
    if image.is_empty() || template.is_empty() {
        return Ok(None);
    }
    if template.width() > image.width() || template.height() > image.height() {
        return Err(FeatMatchError::TemplateTooLarge {
            tpl_width: template.width(),
            tpl_height: template.height(),
            img_width: image.width(),
            img_height: image.height(),
        });
    }
    let plan = TemplatePlan::from_plane(&template.to_gray())?;
    Ok(Some((image.to_gray(), plan)))
}
