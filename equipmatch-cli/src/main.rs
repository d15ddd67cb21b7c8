use clap::Parser;
use equipmatch::{
    ensure_batch_size, Annotator, BatchDetector, BoundingRegion, CategoryDecision, DetectConfig,
    DetectionResult, ProbeImage, TemplateLibrary, DEFAULT_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

/// Upload cap of a single detection run.
const DEFAULT_MAX_BATCH: usize = 5;

#[derive(Parser, Debug)]
#[command(author, version, about = "Equipmatch CLI (JSON config driven)")]
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

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    template_dir: String,
    images: Vec<String>,
    output_dir: Option<String>,
    threshold: f64,
    max_batch: usize,
    parallel: bool,
    annotate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_dir: "templates".to_string(),
            images: Vec::new(),
            output_dir: None,
            threshold: DEFAULT_THRESHOLD,
            max_batch: DEFAULT_MAX_BATCH,
            parallel: false,
            annotate: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct RegionRecord {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl From<BoundingRegion> for RegionRecord {
    fn from(value: BoundingRegion) -> Self {
        Self {
            x: value.x,
            y: value.y,
            width: value.width,
            height: value.height,
        }
    }
}

#[derive(Debug, Serialize)]
struct CategoryRecord {
    category: String,
    detected: bool,
    score: Option<f64>,
    template: Option<String>,
    region: Option<RegionRecord>,
}

impl From<&CategoryDecision> for CategoryRecord {
    fn from(value: &CategoryDecision) -> Self {
        Self {
            category: value.category().to_string(),
            detected: value.detected(),
            score: value.score(),
            template: value.template().map(str::to_string),
            region: value.region().map(RegionRecord::from),
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageRecord {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    categories: Vec<CategoryRecord>,
}

impl ImageRecord {
    fn detected(path: &str, result: &DetectionResult) -> Self {
        Self {
            path: path.to_string(),
            error: None,
            categories: result.decisions().map(CategoryRecord::from).collect(),
        }
    }

    fn failed(path: &str, error: String) -> Self {
        Self {
            path: path.to_string(),
            error: Some(error),
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    images: Vec<ImageRecord>,
}

/// Overlay file name for the image at `position` in the config list.
///
/// The position prefix keeps `a/photo.jpg` and `b/photo.png` apart.
fn annotated_path(dir: &Path, position: usize, image_path: &str) -> PathBuf {
    let stem = Path::new(image_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    dir.join(format!("{position}_{stem}_annotated.png"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("equipmatch=info".parse()?),
            )
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
    if config.images.is_empty() {
        return Err("images must list at least one file".into());
    }
    ensure_batch_size(config.images.len(), config.max_batch)?;

    let detect_config = DetectConfig::default()
        .with_threshold(config.threshold)
        .with_parallel(config.parallel);
    detect_config.validate()?;

    let (library, report) = TemplateLibrary::load_with_report(&config.template_dir)?;
    for path in &report.failed {
        tracing::warn!(path = %path.display(), "template could not be decoded");
    }
    for name in &report.duplicates {
        tracing::warn!(template = %name, "duplicate template name ignored");
    }
    if library.is_empty() {
        tracing::warn!(dir = %config.template_dir, "template library is empty");
    }

    // Decode failures are reported per image and do not stop the batch.
    let mut probes = Vec::with_capacity(config.images.len());
    let mut slots = Vec::with_capacity(config.images.len());
    for path in &config.images {
        match ProbeImage::open(path) {
            Ok(probe) => {
                slots.push(Ok(probes.len()));
                probes.push(probe);
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "image could not be decoded");
                slots.push(Err(err.to_string()));
            }
        }
    }

    let detector = BatchDetector::new(detect_config);
    let results = detector.detect(&probes, &library);

    let output_dir = config.output_dir.as_deref().map(Path::new);
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)?;
    }
    let annotator = match (config.annotate, output_dir) {
        (true, Some(_)) => Some(Annotator::new()?),
        _ => None,
    };

    let mut images = Vec::with_capacity(slots.len());
    for (position, (path, slot)) in config.images.iter().zip(slots).enumerate() {
        let idx = match slot {
            Ok(idx) => idx,
            Err(error) => {
                images.push(ImageRecord::failed(path, error));
                continue;
            }
        };
        let result = &results[idx];
        if let (Some(annotator), Some(dir)) = (&annotator, output_dir) {
            let overlay = annotator.render(probes[idx].color(), result);
            overlay.save(annotated_path(dir, position, path))?;
        }
        images.push(ImageRecord::detected(path, result));
    }

    let json = serde_json::to_string_pretty(&Output { images })?;
    match output_dir {
        Some(dir) => fs::write(dir.join("report.json"), json)?,
        None => println!("{json}"),
    }

    Ok(())
}
