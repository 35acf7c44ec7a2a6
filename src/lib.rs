use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub mod document;
pub mod filename;
pub mod ident;
pub mod label;
pub mod logging;
pub mod names;
pub mod pipeline;
pub mod placement;
pub mod rasterize;
pub mod settings;

pub use names::NameSource;
pub use pipeline::{AnnotateOptions, Annotator, Artifact, Failure, RunSummary};
pub use rasterize::RasterizerKind;

/// One run as requested on the command line. `None` fields fall back to the
/// loaded settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub names: NameSource,
    pub template: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub font_style: Option<String>,
    pub font_size: Option<f64>,
    pub font_scale: Option<f64>,
    pub baseline: Option<f64>,
    pub out_dir: Option<PathBuf>,
    pub rasterizer: Option<RasterizerKind>,
    pub rasterize_timeout_secs: Option<u64>,
    pub debug: bool,
}

pub fn run(config: Config) -> Result<RunSummary> {
    let settings = resolve_settings(&config)?;
    debug!(?settings, "resolved settings");
    debug!(origin = ?config.names.origin, "name source");

    let template = fs::read_to_string(&config.template)
        .with_context(|| format!("failed to read template: {}", config.template.display()))?;
    let options = AnnotateOptions {
        style: settings.style.clone(),
        font_scale: settings.font_scale,
        baseline: settings.baseline,
    };

    let rasterizer = rasterize::probe(
        settings.rasterizer,
        rasterize::ExternalTool {
            program: settings.rasterizer_program.clone(),
            timeout: settings.rasterize_timeout,
            verbose: config.debug,
        },
    );

    fs::create_dir_all(&settings.out_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            settings.out_dir.display()
        )
    })?;

    let mut annotator = Annotator::new(template, options, &settings.out_dir, rasterizer)
        .with_context(|| format!("invalid template: {}", config.template.display()))?;
    Ok(annotator.run(config.names.records()))
}

fn resolve_settings(config: &Config) -> Result<settings::Settings> {
    let mut settings = settings::load_settings(config.settings_path.as_deref())?;
    if let Some(style) = config.font_style.as_ref() {
        settings.style.font_family = style.clone();
    }
    if let Some(size) = config.font_size {
        settings.style.font_size = size;
    }
    if let Some(scale) = config.font_scale {
        settings.font_scale = scale;
    }
    if let Some(y) = config.baseline {
        settings.baseline = placement::Baseline::Fixed(y);
    }
    if let Some(dir) = config.out_dir.as_ref() {
        settings.out_dir = dir.clone();
    }
    if let Some(kind) = config.rasterizer {
        settings.rasterizer = kind;
    }
    if let Some(secs) = config.rasterize_timeout_secs {
        settings.rasterize_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    settings.validate()?;
    Ok(settings)
}
