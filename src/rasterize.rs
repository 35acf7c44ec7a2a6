use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tiny_skia::Pixmap;
use tracing::debug;
use usvg::{Options, Tree, fontdb};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(target_os = "windows")]
pub const DEFAULT_INKSCAPE: &str = "inkscape.com";

#[cfg(not(target_os = "windows"))]
pub const DEFAULT_INKSCAPE: &str = "inkscape";

/// One finished SVG artifact to turn into a PNG.
#[derive(Debug, Clone, Copy)]
pub struct RasterJob<'a> {
    pub svg_path: &'a Path,
    pub png_path: &'a Path,
    /// Id of the injected label inside `svg_path`.
    pub label_id: &'a str,
}

pub trait Rasterizer {
    fn name(&self) -> &str;

    /// Rejects file stems this backend cannot pass through, before anything
    /// is written for the name.
    fn check_file_stem(&self, _stem: &str) -> Result<()> {
        Ok(())
    }

    fn rasterize(&self, job: &RasterJob<'_>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterizerKind {
    /// Inkscape when it is installed, otherwise SVG output only.
    #[default]
    Auto,
    Inkscape,
    Resvg,
    None,
}

impl FromStr for RasterizerKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(RasterizerKind::Auto),
            "inkscape" => Ok(RasterizerKind::Inkscape),
            "resvg" => Ok(RasterizerKind::Resvg),
            "none" | "off" => Ok(RasterizerKind::None),
            other => Err(format!(
                "unknown rasterizer '{}' (expected auto, inkscape, resvg or none)",
                other
            )),
        }
    }
}

/// Settings shared by the external rasterizer backends.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    pub program: String,
    pub timeout: Option<Duration>,
    pub verbose: bool,
}

/// Picks the rasterizer for the whole run. Called once, before any name is
/// processed; a missing tool is reported here and nowhere else.
pub fn probe(kind: RasterizerKind, tool: ExternalTool) -> Option<Box<dyn Rasterizer>> {
    match kind {
        RasterizerKind::None => None,
        RasterizerKind::Resvg => Some(Box::new(ResvgRasterizer::new())),
        RasterizerKind::Auto | RasterizerKind::Inkscape => {
            if command_exists(&tool.program) {
                debug!("rasterizer: {}", tool.program);
                Some(Box::new(InkscapeRasterizer::new(tool)))
            } else {
                eprintln!("warning: \"{}\" is not installed!", tool.program);
                eprintln!("warning: output will only be in SVG...");
                None
            }
        }
    }
}

/// Drives the Inkscape command line: first centers the label on the page and
/// saves the SVG in place, then exports the PNG.
pub struct InkscapeRasterizer {
    tool: ExternalTool,
}

impl InkscapeRasterizer {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }

    fn align_command(&self, job: &RasterJob<'_>) -> Command {
        let mut command = Command::new(&self.tool.program);
        command
            .arg(format!(
                "--actions=select-by-id:{};object-align:hcenter page;export-filename:{};export-do",
                job.label_id,
                job.svg_path.display()
            ))
            .arg(job.svg_path);
        command
    }

    fn export_command(&self, job: &RasterJob<'_>) -> Command {
        let mut command = Command::new(&self.tool.program);
        command
            .arg(job.svg_path)
            .arg("--export-type=png")
            .arg(format!("--export-filename={}", job.png_path.display()));
        command
    }

    fn run(&self, mut command: Command, step: &str) -> Result<()> {
        debug!("> {:?}", command);
        if !self.tool.verbose {
            command.stdout(Stdio::null());
        }
        let mut child = command
            .spawn()
            .with_context(|| format!("failed to run {} ({})", self.tool.program, step))?;
        let status = wait_with_timeout(&mut child, self.tool.timeout)
            .with_context(|| format!("{} ({})", self.tool.program, step))?;
        if !status.success() {
            bail!("{} ({}) exited with {}", self.tool.program, step, status);
        }
        Ok(())
    }
}

impl Rasterizer for InkscapeRasterizer {
    fn name(&self) -> &str {
        &self.tool.program
    }

    /// The SVG path is embedded in the `;`-separated `--actions` list.
    fn check_file_stem(&self, stem: &str) -> Result<()> {
        if stem.contains(';') {
            bail!(
                "file name '{}' contains ';', which {} cannot take in --actions",
                stem,
                self.tool.program
            );
        }
        Ok(())
    }

    fn rasterize(&self, job: &RasterJob<'_>) -> Result<()> {
        self.run(self.align_command(job), "align")?;
        self.run(self.export_command(job), "png export")
    }
}

/// Renders in-process. The label is drawn where it was placed; there is no
/// measured re-centering as with Inkscape.
pub struct ResvgRasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl ResvgRasterizer {
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self {
            fontdb: Arc::new(db),
        }
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for ResvgRasterizer {
    fn name(&self) -> &str {
        "resvg"
    }

    fn rasterize(&self, job: &RasterJob<'_>) -> Result<()> {
        let data = fs::read(job.svg_path)
            .with_context(|| format!("failed to read svg: {}", job.svg_path.display()))?;
        let options = Options {
            resources_dir: job.svg_path.parent().map(Path::to_path_buf),
            fontdb: self.fontdb.clone(),
            ..Options::default()
        };
        let tree = Tree::from_data(&data, &options).with_context(|| "failed to parse SVG")?;
        let size = tree.size().to_int_size();
        let mut pixmap =
            Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
        let mut pixmap_mut = pixmap.as_mut();
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
        let rgba: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|pixel| {
                let color = pixel.demultiply();
                [color.red(), color.green(), color.blue(), color.alpha()]
            })
            .collect();
        let image = image::RgbaImage::from_raw(size.width(), size.height(), rgba)
            .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
        image
            .save_with_format(job.png_path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write png: {}", job.png_path.display()))
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus> {
    let Some(timeout) = timeout else {
        return child.wait().with_context(|| "failed to wait for process");
    };
    let started = Instant::now();
    loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| "failed to wait for process")?
        {
            return Ok(status);
        }
        if started.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            bail!("timed out after {:?}", timeout);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn command_exists(cmd: &str) -> bool {
    match Command::new(cmd)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => true,
        Err(err) => err.kind() != std::io::ErrorKind::NotFound,
    }
}
