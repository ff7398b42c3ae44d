//! Splits raw model output into named files
//!
//! Two formats are understood:
//! - `Sections`: a bare filename line starts a file, following lines are its content
//! - `Json`: `{"files": {"index.html": "..."}}` or a flat object of the same shape
//!
//! Output that names no file at all becomes a single `index.html`.

use std::sync::OnceLock;

use pagesmith_core::FileSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_FILE: &str = "index.html";

/// Extensions recognized as static-site assets in filename lines.
const ASSET_EXTENSIONS: &[&str] = &[
    "html",
    "htm",
    "css",
    "js",
    "mjs",
    "json",
    "svg",
    "txt",
    "md",
    "xml",
    "webmanifest",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Sections,
    Json,
}

pub fn parse_generated_files(raw: &str, format: OutputFormat) -> FileSet {
    let files = match format {
        OutputFormat::Sections => parse_sections(raw),
        OutputFormat::Json => match parse_json(raw) {
            Some(files) => files,
            None => {
                warn!("Model output is not a JSON file manifest, falling back to sections");
                parse_sections(raw)
            }
        },
    };

    if files.is_empty() {
        debug!("No file names found in model output, using {}", DEFAULT_FILE);
        return single_file(raw);
    }

    files
}

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(
            r"^[A-Za-z0-9_\-./]*[A-Za-z0-9_\-]\.(?:{})$",
            ASSET_EXTENSIONS.join("|")
        );
        Regex::new(&pattern).expect("filename pattern is valid")
    })
}

/// Returns the file name announced by `line`, if any.
///
/// Indented lines never start a file. Heading markers, a `File:` prefix and
/// surrounding backticks or bold markers are ignored.
pub fn filename_from_line(line: &str) -> Option<String> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }

    let mut candidate = line.trim_end().trim_start_matches('#').trim();
    for prefix in ["File:", "file:", "FILE:", "Filename:", "filename:"] {
        if let Some(rest) = candidate.strip_prefix(prefix) {
            candidate = rest.trim();
        }
    }
    // Markers nest in either order, e.g. **`app.js`**: or `app.js:`
    loop {
        let trimmed = candidate
            .trim_end_matches(':')
            .trim_matches(['`', '*'])
            .trim();
        if trimmed == candidate {
            break;
        }
        candidate = trimmed;
    }
    let candidate = candidate.trim_start_matches("./");

    if candidate.starts_with('/') || candidate.contains("..") {
        return None;
    }

    if filename_pattern().is_match(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn parse_sections(raw: &str) -> FileSet {
    let mut files = FileSet::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in raw.lines() {
        if is_fence(line) {
            continue;
        }

        if let Some(name) = filename_from_line(line) {
            if let Some((path, lines)) = current.take() {
                files.insert(path, join_content(&lines));
            }
            current = Some((name, Vec::new()));
            continue;
        }

        if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((path, lines)) = current {
        files.insert(path, join_content(&lines));
    }

    files
}

fn join_content(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());

    match (start, end) {
        (Some(start), Some(end)) => {
            let mut content = lines[start..=end].join("\n");
            content.push('\n');
            content
        }
        _ => String::new(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    Wrapped { files: FileSet },
    Flat(FileSet),
}

fn parse_json(raw: &str) -> Option<FileSet> {
    let body: String = raw.lines().filter(|l| !is_fence(l)).collect::<Vec<_>>().join("\n");
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }

    let files = match serde_json::from_str::<Manifest>(&body[start..=end]).ok()? {
        Manifest::Wrapped { files } => files,
        Manifest::Flat(files) => files,
    };

    let files: FileSet = files
        .into_iter()
        .filter(|(path, _)| filename_from_line(path).as_deref() == Some(path.as_str()))
        .collect();

    if files.is_empty() {
        None
    } else {
        Some(files)
    }
}

fn single_file(raw: &str) -> FileSet {
    let content = raw.trim();
    let content = if content.to_lowercase().contains("<html") {
        content.to_string()
    } else {
        format!("<!DOCTYPE html><html><body><pre>{content}</pre></body></html>")
    };

    let mut files = FileSet::new();
    files.insert(DEFAULT_FILE, content);
    files
}
