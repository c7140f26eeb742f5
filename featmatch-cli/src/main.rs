use clap::Parser;
use featmatch::image::io::{load_raster, save_raster};
use featmatch::{
    draw_corners, draw_keypoints, draw_matches, CornerConfig, CornerDetector, FeatureConfig,
    FeatureEngine, MatchStrategy, Raster, Rgb, TemplateConfig, TemplateMatcher, TemplateMethod,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "featmatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaskConfig {
    #[default]
    Corners,
    Features,
    Template,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CornerMethodConfig {
    #[default]
    Harris,
    Hessian,
    Dual,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CornerConfigJson {
    method: CornerMethodConfig,
    k: f32,
    threshold: f32,
    window_size: usize,
}

impl Default for CornerConfigJson {
    fn default() -> Self {
        let cfg = CornerConfig::default();
        Self {
            method: CornerMethodConfig::Harris,
            k: cfg.k,
            threshold: cfg.threshold,
            window_size: cfg.window_size,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StrategyConfig {
    #[default]
    Ssd,
    Ncc,
    Ratio,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FeatureConfigJson {
    sigma: f32,
    k: f32,
    num_octaves: usize,
    num_scales: usize,
    contrast_threshold: f32,
    edge_threshold: f32,
    max_keypoints: usize,
    parallel: bool,
    strategy: StrategyConfig,
    max_distance: Option<f32>,
    min_score: Option<f32>,
    ratio: f32,
}

impl Default for FeatureConfigJson {
    fn default() -> Self {
        let cfg = FeatureConfig::default();
        Self {
            sigma: cfg.sigma,
            k: cfg.k,
            num_octaves: cfg.num_octaves,
            num_scales: cfg.num_scales,
            contrast_threshold: cfg.contrast_threshold,
            edge_threshold: cfg.edge_threshold,
            max_keypoints: cfg.max_keypoints,
            parallel: cfg.parallel,
            strategy: StrategyConfig::Ssd,
            max_distance: Some(featmatch::features::DEFAULT_MAX_SSD),
            min_score: Some(featmatch::features::DEFAULT_MIN_NCC),
            ratio: featmatch::features::DEFAULT_RATIO,
        }
    }
}

impl FeatureConfigJson {
    fn engine_config(&self) -> FeatureConfig {
        FeatureConfig {
            sigma: self.sigma,
            k: self.k,
            num_octaves: self.num_octaves,
            num_scales: self.num_scales,
            contrast_threshold: self.contrast_threshold,
            edge_threshold: self.edge_threshold,
            max_keypoints: self.max_keypoints,
            parallel: self.parallel,
        }
    }

    fn strategy(&self) -> MatchStrategy {
        match self.strategy {
            StrategyConfig::Ssd => MatchStrategy::Ssd {
                max_distance: self.max_distance,
            },
            StrategyConfig::Ncc => MatchStrategy::Ncc {
                min_score: self.min_score,
            },
            StrategyConfig::Ratio => MatchStrategy::Ratio { ratio: self.ratio },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TemplateMethodConfig {
    #[default]
    Ssd,
    Ncc,
}

impl From<&TemplateMethodConfig> for TemplateMethod {
    fn from(value: &TemplateMethodConfig) -> Self {
        match value {
            TemplateMethodConfig::Ssd => TemplateMethod::Ssd,
            TemplateMethodConfig::Ncc => TemplateMethod::Ncc,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TemplateConfigJson {
    method: TemplateMethodConfig,
    parallel: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    task: TaskConfig,
    image_path: String,
    /// Second image for feature matching, or the template for template matching.
    second_path: Option<String>,
    /// Annotated PNG destination.
    annotated_path: Option<String>,
    /// JSON summary destination; stdout when absent.
    output_path: Option<String>,
    corners: CornerConfigJson,
    features: FeatureConfigJson,
    template: TemplateConfigJson,
}

#[derive(Debug, Serialize)]
struct CornerSummary {
    width: usize,
    height: usize,
    harris: Option<usize>,
    hessian: Option<usize>,
}

#[derive(Debug, Serialize)]
struct KeypointRecord {
    x: f32,
    y: f32,
    size: f32,
    octave: usize,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    query_idx: usize,
    train_idx: usize,
    distance: f32,
}

#[derive(Debug, Serialize)]
struct FeatureSummary {
    keypoints: Vec<KeypointRecord>,
    elapsed_ms: f64,
    matches: Option<Vec<MatchRecord>>,
}

#[derive(Debug, Serialize)]
struct TemplateSummary {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    score: f32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Output {
    Corners(CornerSummary),
    Features(FeatureSummary),
    Template(Option<TemplateSummary>),
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn run_corners(config: &Config, image: &Raster) -> CliResult<(Output, Option<Raster>)> {
    let detector = CornerDetector::new().with_config(CornerConfig {
        k: config.corners.k,
        threshold: config.corners.threshold,
        window_size: config.corners.window_size,
    });
    detector.config().validate()?;

    let (harris, hessian) = match config.corners.method {
        CornerMethodConfig::Harris => (Some(detector.detect(image)), None),
        CornerMethodConfig::Hessian => (None, Some(detector.detect_hessian(image))),
        CornerMethodConfig::Dual => {
            let (h, l) = detector.detect_dual(image);
            (Some(h), Some(l))
        }
    };

    let mut annotated = image.to_rgb();
    if let Some(mask) = &hessian {
        annotated = draw_corners(&annotated, mask, Rgb::BLUE)?;
    }
    if let Some(mask) = &harris {
        annotated = draw_corners(&annotated, mask, Rgb::RED)?;
    }

    let summary = CornerSummary {
        width: image.width(),
        height: image.height(),
        harris: harris.as_ref().map(|m| m.count()),
        hessian: hessian.as_ref().map(|m| m.count()),
    };
    Ok((Output::Corners(summary), Some(annotated)))
}

fn run_features(config: &Config, image: &Raster) -> CliResult<(Output, Option<Raster>)> {
    let cfg = config.features.engine_config();
    cfg.validate()?;
    let engine = FeatureEngine::new().with_config(cfg);
    let (features, elapsed) = engine.extract_timed(image);
    info!(
        keypoints = features.len(),
        elapsed_ms = elapsed.as_secs_f64() * 1e3,
        "extracted features"
    );

    let keypoints = features
        .keypoints()
        .iter()
        .map(|kp| KeypointRecord {
            x: kp.x,
            y: kp.y,
            size: kp.size,
            octave: kp.octave,
        })
        .collect();

    let (matches, annotated) = match &config.second_path {
        Some(path) => {
            let other = load_raster(path)?;
            let other_features = engine.extract(&other);
            let matches =
                engine.match_descriptors(&features, &other_features, config.features.strategy());
            let annotated = draw_matches(
                image,
                features.keypoints(),
                &other,
                other_features.keypoints(),
                &matches,
            )?;
            let records = matches
                .iter()
                .map(|m| MatchRecord {
                    query_idx: m.query_idx,
                    train_idx: m.train_idx,
                    distance: m.distance,
                })
                .collect();
            (Some(records), annotated)
        }
        None => (None, draw_keypoints(image, features.keypoints())),
    };

    let summary = FeatureSummary {
        keypoints,
        elapsed_ms: elapsed.as_secs_f64() * 1e3,
        matches,
    };
    Ok((Output::Features(summary), Some(annotated)))
}

fn run_template(config: &Config, image: &Raster) -> CliResult<(Output, Option<Raster>)> {
    let Some(path) = &config.second_path else {
        return Err("second_path must name the template for the template task".into());
    };
    let template = load_raster(path)?;
    let method = TemplateMethod::from(&config.template.method);
    let matcher = TemplateMatcher::new().with_config(TemplateConfig {
        parallel: config.template.parallel,
    });

    let Some(found) = matcher.locate(image, &template, method)? else {
        return Ok((Output::Template(None), None));
    };
    let annotated =
        TemplateMatcher::annotate(image, &found, template.width(), template.height(), method);
    let summary = TemplateSummary {
        x: found.x,
        y: found.y,
        width: template.width(),
        height: template.height(),
        score: found.score,
    };
    Ok((Output::Template(Some(summary)), Some(annotated)))
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("featmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }

    let image = load_raster(&config.image_path)?;
    let (output, annotated) = match config.task {
        TaskConfig::Corners => run_corners(&config, &image)?,
        TaskConfig::Features => run_features(&config, &image)?,
        TaskConfig::Template => run_template(&config, &image)?,
    };

    if let (Some(path), Some(raster)) = (&config.annotated_path, &annotated) {
        save_raster(raster, path)?;
    }

    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
