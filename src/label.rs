use anyhow::Result;
use quick_xml::events::BytesStart;

use crate::document::SvgDocument;

pub const SODIPODI_NS: &str = "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd";

/// Presentation of the injected name, rendered into the label's `style`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_family: String,
    pub font_size: f64,
    pub line_height: f64,
    pub letter_spacing: f64,
    pub word_spacing: f64,
    pub fill: String,
    pub fill_opacity: f64,
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_family: "cmmi10".to_string(),
            font_size: 14.0,
            line_height: 1.25,
            letter_spacing: 0.0,
            word_spacing: 4.0,
            fill: "#000000".to_string(),
            fill_opacity: 1.0,
            stroke: "none".to_string(),
            stroke_width: 0.75094575,
        }
    }
}

impl LabelStyle {
    pub fn to_style_string(&self) -> String {
        format!(
            "font-style:normal;font-weight:normal;font-size:{}px;line-height:{};font-family:{};letter-spacing:{}px;word-spacing:{}px;fill:{};fill-opacity:{};stroke:{};stroke-width:{}",
            self.font_size,
            self.line_height,
            self.font_family,
            self.letter_spacing,
            self.word_spacing,
            self.fill,
            self.fill_opacity,
            self.stroke,
            self.stroke_width
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: String,
    pub text: String,
    pub style: String,
    pub x: f64,
    pub y: f64,
}

/// Appends `label` as a `<text>` element at the end of the canvas and records
/// `docname` on the canvas as `sodipodi:docname`.
pub fn inject(document: &mut SvgDocument, label: Label, docname: &str) -> Result<Label> {
    let y = label.y.to_string();
    let x = label.x.to_string();
    let mut start = BytesStart::new("text");
    start.push_attribute(("id", label.id.as_str()));
    start.push_attribute(("xml:space", "preserve"));
    start.push_attribute(("style", label.style.as_str()));
    start.push_attribute(("y", y.as_str()));
    start.push_attribute(("x", x.as_str()));
    document.append_to_canvas(start, &label.text)?;

    document.ensure_namespace("sodipodi", SODIPODI_NS)?;
    document.set_canvas_attribute("sodipodi:docname", docname)?;
    Ok(label)
}
