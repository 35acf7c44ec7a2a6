use anyhow::{Context, Result, bail};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the names came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Literal,
    File(PathBuf),
}

/// The raw name records of one run, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSource {
    pub origin: Origin,
    lines: Vec<String>,
}

/// One line of the name source after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRecord<'a> {
    Name(&'a str),
    Comment(&'a str),
    Blank,
}

impl<'a> NameRecord<'a> {
    pub fn classify(line: &'a str) -> Self {
        if line.is_empty() {
            NameRecord::Blank
        } else if line.starts_with('#') {
            NameRecord::Comment(line)
        } else {
            NameRecord::Name(line)
        }
    }
}

impl NameSource {
    /// Interprets `arg` as a names file when it is one, otherwise as a single
    /// literal name.
    ///
    /// A value that carries a file extension but names no existing file is an
    /// error rather than a literal, so a mistyped path does not end up
    /// printed on an image.
    pub fn resolve(arg: &str) -> Result<Self> {
        let path = Path::new(arg);
        if path.is_file() {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read names file: {}", path.display()))?;
            let content = decode_lossy(&bytes, path);
            return Ok(Self {
                origin: Origin::File(path.to_path_buf()),
                lines: split_lines(&content),
            });
        }
        if looks_like_file_path(path) {
            bail!("{} does not exist!", arg);
        }
        Ok(Self::literal(arg))
    }

    pub fn literal(name: &str) -> Self {
        Self {
            origin: Origin::Literal,
            lines: vec![name.to_string()],
        }
    }

    pub fn records(&self) -> impl Iterator<Item = NameRecord<'_>> {
        self.lines.iter().map(|line| NameRecord::classify(line))
    }
}

/// Folds `\r\n` and lone `\r` line endings into `\n`.
pub fn normalize_newlines(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Decodes a names file as UTF-8, replacing invalid bytes with U+FFFD so the
/// remaining lines are still processed.
fn decode_lossy(bytes: &[u8], path: &Path) -> String {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(content) => content.to_string(),
        Cow::Owned(content) => {
            let lines = split_lines(&content)
                .iter()
                .enumerate()
                .filter(|(_, line)| line.contains(char::REPLACEMENT_CHARACTER))
                .map(|(index, _)| (index + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            eprintln!(
                "warning: {} is not valid UTF-8, invalid bytes replaced on line(s) {}",
                path.display(),
                lines
            );
            content
        }
    }
}

fn split_lines(content: &str) -> Vec<String> {
    normalize_newlines(content)
        .split('\n')
        .map(str::to_string)
        .collect()
}

fn looks_like_file_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| !ext.is_empty() && !ext.chars().any(char::is_whitespace))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn file_with(content: &str) -> NameSource {
        NameSource {
            origin: Origin::File(PathBuf::from("names.txt")),
            lines: split_lines(content),
        }
    }

    fn names(source: &NameSource) -> Vec<&str> {
        source
            .records()
            .filter_map(|record| match record {
                NameRecord::Name(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let source = file_with("# skip\nAlice\n\nBob");
        assert_eq!(names(&source), ["Alice", "Bob"]);
        let records: Vec<_> = source.records().collect();
        assert_eq!(
            records,
            [
                NameRecord::Comment("# skip"),
                NameRecord::Name("Alice"),
                NameRecord::Blank,
                NameRecord::Name("Bob"),
            ]
        );
    }

    #[test]
    fn whitespace_only_lines_are_names() {
        let source = file_with("Alice\n  \n #not a comment\n");
        assert_eq!(names(&source), ["Alice", "  ", " #not a comment"]);
    }

    #[test]
    fn normalizes_every_line_ending() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n\nd\r\n"), "a\nb\nc\n\nd\n");
        let source = file_with("Alice\r\n\r\nBob\r\nCarol\r");
        assert_eq!(names(&source), ["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn resolves_existing_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("names.txt");
        fs::write(&path, "# header\nMisaka Mikoto\nShirai Kuroko\n").expect("write");
        let source = NameSource::resolve(path.to_str().expect("utf8 path")).expect("resolve");
        assert_eq!(source.origin, Origin::File(path.clone()));
        assert_eq!(names(&source), ["Misaka Mikoto", "Shirai Kuroko"]);
    }

    #[test]
    fn invalid_utf8_lines_are_decoded_lossily() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("latin1.txt");
        fs::write(&path, b"Jos\xe9\nBob\n").expect("write");
        let source = NameSource::resolve(path.to_str().expect("utf8 path")).expect("resolve");
        assert_eq!(source.origin, Origin::File(path.clone()));
        assert_eq!(names(&source), ["Jos\u{FFFD}", "Bob"]);
    }

    #[test]
    fn missing_file_with_extension_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing.txt");
        let err = NameSource::resolve(path.to_str().expect("utf8 path")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn other_values_are_literal_names() {
        for value in ["Misaka Mikoto", "Dr. Who", "Li", "#hashtag"] {
            let source = NameSource::resolve(value).expect("resolve");
            assert_eq!(source, NameSource::literal(value));
        }
        assert_eq!(
            names(&NameSource::resolve("Dr. Who").expect("resolve")),
            ["Dr. Who"]
        );
        assert!(names(&NameSource::resolve("#hashtag").expect("resolve")).is_empty());
    }
}
