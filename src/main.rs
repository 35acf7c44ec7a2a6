use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use svg_name_annotator::{Config, NameSource, RasterizerKind};

/// Exit status when the name source is neither a names file nor a usable name.
const EXIT_BAD_NAME_SOURCE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "svg-name-annotator",
    version,
    about = "Annotate names into a template SVG",
    after_help = "Example:\n  svg-name-annotator -n \"Misaka Mikoto\"   annotates template.svg with \"Misaka Mikoto\""
)]
struct Cli {
    /// A single name, or a file with one name per line (# starts a comment)
    #[arg(short = 'n', long = "name", default_value = "names.txt")]
    name: String,

    /// Template SVG file to be annotated
    #[arg(short = 't', long = "template", default_value = "template.svg")]
    template: PathBuf,

    /// Font family for the name(s); must be known to the rasterizer
    #[arg(long = "font-style")]
    font_style: Option<String>,

    /// Font size for the name(s) in px
    #[arg(long = "font-size")]
    font_size: Option<f64>,

    /// Average glyph width as a multiple of the font size
    #[arg(long = "font-scale", hide = true)]
    font_scale: Option<f64>,

    /// Fixed y coordinate of the name's baseline
    #[arg(long = "baseline")]
    baseline: Option<f64>,

    /// Output directory
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,

    /// PNG rasterizer: auto, inkscape, resvg or none
    #[arg(long = "rasterizer")]
    rasterizer: Option<RasterizerKind>,

    /// Kill an external rasterizer call after this many seconds (0 = never)
    #[arg(long = "rasterize-timeout")]
    rasterize_timeout: Option<u64>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let started = Instant::now();
    let cli = Cli::parse();
    if let Err(err) = svg_name_annotator::logging::init(cli.debug) {
        eprintln!("error: {:#}", err);
        return ExitCode::FAILURE;
    }

    let names = match NameSource::resolve(&cli.name) {
        Ok(names) => names,
        Err(err) => {
            eprintln!("{:#}", err);
            if Path::new(&cli.name).exists() {
                return ExitCode::FAILURE;
            }
            return ExitCode::from(EXIT_BAD_NAME_SOURCE);
        }
    };
    tracing::debug!(?cli, "parsed arguments");

    let config = Config {
        names,
        template: cli.template,
        settings_path: cli.read_settings,
        font_style: cli.font_style,
        font_size: cli.font_size,
        font_scale: cli.font_scale,
        baseline: cli.baseline,
        out_dir: cli.out,
        rasterizer: cli.rasterizer,
        rasterize_timeout_secs: cli.rasterize_timeout,
        debug: cli.debug,
    };

    let code = match svg_name_annotator::run(config) {
        Ok(summary) if summary.failures.is_empty() => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!(
                "{} of {} name(s) failed",
                summary.failures.len(),
                summary.failures.len() + summary.artifacts.len()
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    };
    println!("Total time: {:.3?}", started.elapsed());
    code
}
