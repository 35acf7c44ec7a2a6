use anyhow::Result;

use crate::document::SvgDocument;

/// Baseline of the name line on the stock certificate template.
pub const DEFAULT_BASELINE: f64 = 214.18192;

/// Approximate left edge that centers `label_len` glyphs on a canvas of
/// `canvas_width`, assuming every glyph is `font_size * font_scale` wide.
///
/// No font metrics are consulted and inputs are not range-checked; a zero or
/// negative width yields an off-canvas but finite offset.
pub fn compute_x(canvas_width: f64, label_len: usize, font_size: f64, font_scale: f64) -> f64 {
    (canvas_width - label_len as f64 * font_size * font_scale) / 2.0
}

/// Glyph count used for placement: one per Unicode scalar value.
pub fn label_length(text: &str) -> usize {
    text.chars().count()
}

/// Where the label's `y` comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// A fixed coordinate, independent of the template.
    Fixed(f64),
    /// A fraction of the canvas height.
    HeightRatio(f64),
}

impl Default for Baseline {
    fn default() -> Self {
        Baseline::Fixed(DEFAULT_BASELINE)
    }
}

impl Baseline {
    pub fn resolve(&self, document: &SvgDocument) -> Result<f64> {
        match *self {
            Baseline::Fixed(y) => Ok(y),
            Baseline::HeightRatio(ratio) => Ok(document.canvas_dimension("height")? * ratio),
        }
    }
}
