use anyhow::{Context, Result, anyhow, bail};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;

/// An SVG document held as a flat list of XML events around its root `<svg>`
/// element (the canvas).
///
/// Content outside the canvas and every child of the canvas is kept exactly as
/// it was read, so serializing an untouched document reproduces its input.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    prolog: Vec<Event<'static>>,
    canvas: BytesStart<'static>,
    children: Vec<Event<'static>>,
    canvas_end: BytesEnd<'static>,
    epilog: Vec<Event<'static>>,
    ids: HashSet<String>,
}

impl SvgDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);

        let mut prolog = Vec::new();
        let mut children = Vec::new();
        let mut epilog = Vec::new();
        let mut ids = HashSet::new();
        let mut canvas: Option<BytesStart<'static>> = None;
        let mut canvas_end: Option<BytesEnd<'static>> = None;
        let mut depth = 0usize;

        loop {
            let event = reader.read_event().map_err(|err| {
                anyhow!(
                    "failed to parse svg at byte {}: {}",
                    reader.buffer_position(),
                    err
                )
            })?;
            match event {
                Event::Eof => break,
                Event::Start(start) => {
                    index_id(&start, &mut ids)?;
                    if depth == 0 {
                        ensure_root(&start, canvas.is_some())?;
                        canvas = Some(start.into_owned());
                    } else {
                        children.push(Event::Start(start.into_owned()));
                    }
                    depth += 1;
                }
                Event::Empty(start) => {
                    index_id(&start, &mut ids)?;
                    if depth == 0 {
                        ensure_root(&start, canvas.is_some())?;
                        canvas_end = Some(BytesEnd::new(element_name(&start)));
                        canvas = Some(start.into_owned());
                    } else {
                        children.push(Event::Empty(start.into_owned()));
                    }
                }
                Event::End(end) => match depth {
                    0 => bail!("unexpected closing tag at byte {}", reader.buffer_position()),
                    1 => {
                        depth = 0;
                        canvas_end = Some(end.into_owned());
                    }
                    _ => {
                        depth -= 1;
                        children.push(Event::End(end.into_owned()));
                    }
                },
                other => {
                    let other = other.into_owned();
                    if canvas.is_none() {
                        prolog.push(other);
                    } else if canvas_end.is_none() {
                        children.push(other);
                    } else {
                        epilog.push(other);
                    }
                }
            }
        }

        let canvas = canvas.ok_or_else(|| anyhow!("document has no <svg> root element"))?;
        let canvas_end = canvas_end.ok_or_else(|| anyhow!("<svg> root element is not closed"))?;
        Ok(Self {
            prolog,
            canvas,
            children,
            canvas_end,
            epilog,
            ids,
        })
    }

    /// Whether any element in the document carries `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn canvas_attribute(&self, name: &str) -> Result<Option<String>> {
        match self.canvas.try_get_attribute(name)? {
            Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
            None => Ok(None),
        }
    }

    /// Reads a numeric canvas attribute such as `width` or `height`.
    ///
    /// Only plain user units are accepted (an explicit `px` suffix is allowed);
    /// physical units like `mm` are rejected rather than guessed.
    pub fn canvas_dimension(&self, name: &str) -> Result<f64> {
        let raw = self
            .canvas_attribute(name)?
            .ok_or_else(|| anyhow!("canvas has no {} attribute", name))?;
        parse_user_units(&raw)
            .ok_or_else(|| anyhow!("canvas {} '{}' is not a number in user units", name, raw))
    }

    /// Replaces `name` on the canvas in place, or appends it when missing.
    /// Other attributes are carried over untouched.
    pub fn set_canvas_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        let mut updated = BytesStart::new(element_name(&self.canvas));
        let mut replaced = false;
        for attr in self.canvas.attributes() {
            let attr = attr.with_context(|| "malformed attribute on <svg> root element")?;
            if attr.key.as_ref() == name.as_bytes() {
                updated.push_attribute((name, value));
                replaced = true;
            } else {
                updated.push_attribute(attr);
            }
        }
        if !replaced {
            updated.push_attribute((name, value));
        }
        self.canvas = updated;
        Ok(())
    }

    /// Declares `xmlns:<prefix>` on the canvas unless it is already declared.
    pub fn ensure_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        let key = format!("xmlns:{}", prefix);
        if self.canvas_attribute(&key)?.is_none() {
            self.set_canvas_attribute(&key, uri)?;
        }
        Ok(())
    }

    /// Appends `<start>text</start>` as the last child of the canvas.
    ///
    /// `text` is escaped on the way in, so markup in it stays character data.
    pub fn append_to_canvas(&mut self, start: BytesStart<'static>, text: &str) -> Result<()> {
        index_id(&start, &mut self.ids)?;
        let end = BytesEnd::new(element_name(&start));
        self.children.push(Event::Start(start));
        self.children
            .push(Event::Text(BytesText::new(text).into_owned()));
        self.children.push(Event::End(end));
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.prolog {
            writer.write_event(event)?;
        }
        writer.write_event(Event::Start(self.canvas.borrow()))?;
        for event in &self.children {
            writer.write_event(event)?;
        }
        writer.write_event(Event::End(self.canvas_end.borrow()))?;
        for event in &self.epilog {
            writer.write_event(event)?;
        }
        Ok(writer.into_inner())
    }

    pub fn serialize(&self) -> Result<String> {
        String::from_utf8(self.to_bytes()?).with_context(|| "serialized svg is not valid UTF-8")
    }
}

fn ensure_root(start: &BytesStart<'_>, seen_root: bool) -> Result<()> {
    if seen_root {
        bail!("document has more than one root element");
    }
    if start.local_name().as_ref() != b"svg" {
        bail!(
            "root element is <{}>, expected <svg>",
            String::from_utf8_lossy(start.name().as_ref())
        );
    }
    Ok(())
}

fn index_id(start: &BytesStart<'_>, ids: &mut HashSet<String>) -> Result<()> {
    if let Some(attr) = start.try_get_attribute("id")? {
        ids.insert(attr.unescape_value()?.into_owned());
    }
    Ok(())
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn parse_user_units(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim_end();
    number.parse::<f64>().ok().filter(|value| value.is_finite())
}
