use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::label::LabelStyle;
use crate::placement::Baseline;
use crate::rasterize::{DEFAULT_INKSCAPE, RasterizerKind};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub style: LabelStyle,
    pub font_scale: f64,
    pub baseline: Baseline,
    pub out_dir: PathBuf,
    pub rasterizer: RasterizerKind,
    pub rasterizer_program: String,
    pub rasterize_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            style: LabelStyle::default(),
            font_scale: 0.92,
            baseline: Baseline::default(),
            out_dir: PathBuf::from("out"),
            rasterizer: RasterizerKind::Auto,
            rasterizer_program: DEFAULT_INKSCAPE.to_string(),
            rasterize_timeout: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    font: Option<FontSettings>,
    label: Option<LabelSettings>,
    output: Option<OutputSettings>,
    rasterizer: Option<RasterizerSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FontSettings {
    style: Option<String>,
    size: Option<f64>,
    scale: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LabelSettings {
    baseline: Option<f64>,
    baseline_ratio: Option<f64>,
    line_height: Option<f64>,
    letter_spacing: Option<f64>,
    word_spacing: Option<f64>,
    fill: Option<String>,
    fill_opacity: Option<f64>,
    stroke: Option<String>,
    stroke_width: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSettings {
    dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RasterizerSettings {
    backend: Option<String>,
    program: Option<String>,
    timeout_secs: Option<u64>,
}

/// Loads the embedded defaults, then `settings.toml` and `settings.local.toml`
/// from the working directory, then `extra_path`. Later files win.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults)?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            settings.merge_file(&path)?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        let parsed: SettingsFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        self.merge(parsed)
            .with_context(|| format!("invalid settings: {}", path.display()))
    }

    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(font) = incoming.font {
            if let Some(style) = font.style {
                if !style.trim().is_empty() {
                    self.style.font_family = style;
                }
            }
            if let Some(size) = font.size {
                self.style.font_size = size;
            }
            if let Some(scale) = font.scale {
                self.font_scale = scale;
            }
        }
        if let Some(label) = incoming.label {
            match (label.baseline, label.baseline_ratio) {
                (Some(_), Some(_)) => bail!("set either label.baseline or label.baseline_ratio"),
                (Some(y), None) => self.baseline = Baseline::Fixed(y),
                (None, Some(ratio)) => self.baseline = Baseline::HeightRatio(ratio),
                (None, None) => {}
            }
            if let Some(value) = label.line_height {
                self.style.line_height = value;
            }
            if let Some(value) = label.letter_spacing {
                self.style.letter_spacing = value;
            }
            if let Some(value) = label.word_spacing {
                self.style.word_spacing = value;
            }
            if let Some(fill) = label.fill {
                if !fill.trim().is_empty() {
                    self.style.fill = fill;
                }
            }
            if let Some(value) = label.fill_opacity {
                self.style.fill_opacity = value;
            }
            if let Some(stroke) = label.stroke {
                if !stroke.trim().is_empty() {
                    self.style.stroke = stroke;
                }
            }
            if let Some(value) = label.stroke_width {
                self.style.stroke_width = value;
            }
        }
        if let Some(output) = incoming.output {
            if let Some(dir) = output.dir {
                if !dir.trim().is_empty() {
                    self.out_dir = PathBuf::from(dir);
                }
            }
        }
        if let Some(rasterizer) = incoming.rasterizer {
            if let Some(backend) = rasterizer.backend {
                self.rasterizer = backend.parse().map_err(|err: String| anyhow!(err))?;
            }
            if let Some(program) = rasterizer.program {
                if !program.trim().is_empty() {
                    self.rasterizer_program = program;
                }
            }
            if let Some(secs) = rasterizer.timeout_secs {
                self.rasterize_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
        }
        Ok(())
    }

    /// Checks the numbers that feed placement and the style string.
    ///
    /// Zero or negative values are allowed and only produce odd placement;
    /// NaN or infinity would leak into the document and is rejected.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("font size", self.style.font_size),
            ("font scale", self.font_scale),
            ("line height", self.style.line_height),
            ("letter spacing", self.style.letter_spacing),
            ("word spacing", self.style.word_spacing),
            ("fill opacity", self.style.fill_opacity),
            ("stroke width", self.style.stroke_width),
        ];
        for (name, value) in checks {
            if !value.is_finite() {
                bail!("{} must be a finite number, got {}", name, value);
            }
        }
        let baseline = match self.baseline {
            Baseline::Fixed(y) => y,
            Baseline::HeightRatio(ratio) => ratio,
        };
        if !baseline.is_finite() {
            bail!("baseline must be a finite number, got {}", baseline);
        }
        Ok(())
    }
}
