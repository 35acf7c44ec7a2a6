use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::document::SvgDocument;
use crate::filename::{self, OutputNames};
use crate::ident;
use crate::label::{self, Label, LabelStyle};
use crate::names::NameRecord;
use crate::placement::{self, Baseline};
use crate::rasterize::{RasterJob, Rasterizer};

/// Everything about the label that does not depend on the name.
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    pub style: LabelStyle,
    pub font_scale: f64,
    pub baseline: Baseline,
}

/// Files written for one name.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub label: Label,
    pub svg_path: PathBuf,
    pub png_path: Option<PathBuf>,
    /// Set when the file stem was taken earlier in the run and a suffix was
    /// added.
    pub renamed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub artifacts: Vec<Artifact>,
    pub skipped: usize,
    pub failures: Vec<Failure>,
}

pub struct Annotator {
    template: String,
    options: AnnotateOptions,
    out_dir: PathBuf,
    rasterizer: Option<Box<dyn Rasterizer>>,
    output_names: OutputNames,
}

impl Annotator {
    /// Checks that `template` parses before any name is processed; each name
    /// later gets its own fresh parse of the same text.
    pub fn new(
        template: String,
        options: AnnotateOptions,
        out_dir: impl Into<PathBuf>,
        rasterizer: Option<Box<dyn Rasterizer>>,
    ) -> Result<Self> {
        SvgDocument::parse(&template).with_context(|| "template is not a usable SVG document")?;
        Ok(Self {
            template,
            options,
            out_dir: out_dir.into(),
            rasterizer,
            output_names: OutputNames::new(),
        })
    }

    /// Builds the annotated document for `name` in memory.
    pub fn render(&self, name: &str, docname: &str) -> Result<(SvgDocument, Label)> {
        let mut document = SvgDocument::parse(&self.template)?;
        let id = ident::allocate(&document);
        let width = document.canvas_dimension("width")?;
        let x = placement::compute_x(
            width,
            placement::label_length(name),
            self.options.style.font_size,
            self.options.font_scale,
        );
        let y = self.options.baseline.resolve(&document)?;
        debug!(text = name, id = %id, width, x, y, "placing label");
        let label = Label {
            id,
            text: name.to_string(),
            style: self.options.style.to_style_string(),
            x,
            y,
        };
        let label = label::inject(&mut document, label, docname)?;
        Ok((document, label))
    }

    /// Writes `<base>.svg` for `name` and, when a rasterizer is available,
    /// `<base>.png`.
    pub fn annotate(&mut self, name: &str) -> Result<Artifact> {
        let base = filename::derive_base_name(name);
        filename::validate_base_name(&base)?;
        if let Some(rasterizer) = self.rasterizer.as_ref() {
            rasterizer.check_file_stem(&base)?;
        }
        let stem = self.output_names.available(&base);
        let renamed = stem != base;
        let svg_file = filename::svg_file_name(&stem);

        let (document, label) = self.render(name, &svg_file)?;
        let svg_path = self.out_dir.join(&svg_file);
        if renamed {
            eprintln!(
                "warning: {} is already used in this run, writing \"{}\" to {}",
                filename::svg_file_name(&base),
                name,
                svg_file
            );
        }
        println!("Annotating \"{}\" to {}", name, svg_path.display());
        fs::write(&svg_path, document.to_bytes()?)
            .with_context(|| format!("failed to write svg: {}", svg_path.display()))?;
        self.output_names.reserve(&stem);

        let mut png_path = None;
        if let Some(rasterizer) = self.rasterizer.as_ref() {
            let path = self.out_dir.join(filename::png_file_name(&stem));
            let job = RasterJob {
                svg_path: &svg_path,
                png_path: &path,
                label_id: &label.id,
            };
            rasterizer.rasterize(&job).with_context(|| {
                format!(
                    "{} failed to rasterize {}",
                    rasterizer.name(),
                    svg_path.display()
                )
            })?;
            png_path = Some(path);
        }

        Ok(Artifact {
            name: name.to_string(),
            label,
            svg_path,
            png_path,
            renamed,
        })
    }

    /// Processes every record in order. A failing name is reported and
    /// counted; the remaining names are still processed.
    pub fn run<'a>(&mut self, records: impl IntoIterator<Item = NameRecord<'a>>) -> RunSummary {
        let mut summary = RunSummary::default();
        for record in records {
            let name = match record {
                NameRecord::Name(name) => name,
                NameRecord::Comment(line) => {
                    debug!("skipping comment: {}", line);
                    summary.skipped += 1;
                    continue;
                }
                NameRecord::Blank => {
                    summary.skipped += 1;
                    continue;
                }
            };
            match self.annotate(name) {
                Ok(artifact) => summary.artifacts.push(artifact),
                Err(err) => {
                    eprintln!("error: failed to annotate \"{}\": {:#}", name, err);
                    summary.failures.push(Failure {
                        name: name.to_string(),
                        error: format!("{:#}", err),
                    });
                }
            }
        }
        summary
    }
}
