use anyhow::{Result, bail};
use std::collections::HashSet;

/// Filename stem for a name: all whitespace dropped, then the first `&`
/// removed. Later ampersands are kept.
pub fn derive_base_name(label: &str) -> String {
    let compact: String = label.chars().filter(|ch| !ch.is_whitespace()).collect();
    compact.replacen('&', "", 1)
}

/// Rejects stems that cannot be used as a single file name in the output
/// directory.
pub fn validate_base_name(base: &str) -> Result<()> {
    if base.is_empty() {
        bail!("name produces an empty file name");
    }
    if base == "." || base == ".." {
        bail!("'{}' is not a usable file name", base);
    }
    if let Some(ch) = base
        .chars()
        .find(|ch| *ch == '/' || *ch == '\\' || ch.is_control())
    {
        bail!("file name '{}' contains reserved character {:?}", base, ch);
    }
    Ok(())
}

/// Stems written during one run.
///
/// A stem seen before (compared case-insensitively) gets a `-2`, `-3`, ...
/// suffix so earlier artifacts are never overwritten.
#[derive(Debug, Default)]
pub struct OutputNames {
    used: HashSet<String>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// First stem derived from `base` that is not taken yet. Nothing is
    /// recorded until [`OutputNames::reserve`] is called.
    pub fn available(&self, base: &str) -> String {
        if !self.used.contains(&base.to_lowercase()) {
            return base.to_string();
        }
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{}-{}", base, suffix);
            if !self.used.contains(&candidate.to_lowercase()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub fn reserve(&mut self, stem: &str) {
        self.used.insert(stem.to_lowercase());
    }
}

pub fn svg_file_name(base: &str) -> String {
    format!("{}.svg", base)
}

pub fn png_file_name(base: &str) -> String {
    format!("{}.png", base)
}
