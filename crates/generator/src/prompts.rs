//! Prompt composition for static web app generation

use pagesmith_core::FileSet;

use crate::parser::OutputFormat;
use crate::GenerationRequest;

/// Upper bound on the existing-files excerpt included in a prompt.
pub const EXISTING_FILES_CHAR_LIMIT: usize = 6000;

const TRUNCATION_MARKER: &str = "\n...(truncated)";

pub const SYSTEM_PROMPT: &str = r#"You are an expert front-end engineer.
Generate minimal, self-contained static web apps (HTML, CSS, JavaScript) for the described task.

RULES:
1. Output ONLY raw code. No explanations, no prose, no markdown code fences.
2. Start every file with a line containing only its file name (for example: index.html).
3. The entry point must be index.html.
4. Use relative paths between files so the app works when served from a sub-path."#;

pub const JSON_SYSTEM_PROMPT: &str = r#"You are an expert front-end engineer.
Generate minimal, self-contained static web apps (HTML, CSS, JavaScript) for the described task.
You MUST output ONLY valid JSON. No markdown, no explanations, no code fences.
The JSON must have the shape {"files": {"<file name>": "<file content>"}} and include index.html.
Use relative paths between files so the app works when served from a sub-path."#;

pub fn system_prompt(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Sections => SYSTEM_PROMPT,
        OutputFormat::Json => JSON_SYSTEM_PROMPT,
    }
}

pub fn user_prompt(request: &GenerationRequest) -> String {
    let checks = if request.checks.is_empty() {
        "(none)".to_string()
    } else {
        request.checks.join("\n")
    };

    let attachments = render_attachments(&request.attachments);
    let existing = existing_files_excerpt(&request.existing_files, EXISTING_FILES_CHAR_LIMIT);

    let instruction = if request.round > 1 {
        "Revise the existing files to satisfy the new brief. Output every file that changes, in full."
    } else {
        "Build the app from scratch."
    };

    format!(
        r#"### Task Brief
{brief}

### Validation Checks
{checks}

### Attachments
{attachments}

### Round Number
{round}

### Existing Files
{existing}

### Instructions
{instruction}"#,
        brief = request.brief.trim(),
        round = request.round,
    )
}

fn render_attachments(attachments: &FileSet) -> String {
    if attachments.is_empty() {
        return "(none)".to_string();
    }

    attachments
        .iter()
        .map(|(name, content)| format!("- {name}:\n{content}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders existing files, each under a `--- <path> ---` label, cut at
/// `limit` characters.
pub fn existing_files_excerpt(files: &FileSet, limit: usize) -> String {
    if files.is_empty() {
        return "(none)".to_string();
    }

    let rendered = files
        .iter()
        .map(|(path, content)| format!("--- {path} ---\n{content}"))
        .collect::<Vec<_>>()
        .join("\n");

    match rendered.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &rendered[..cut], TRUNCATION_MARKER),
        None => rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            brief: "Build a calculator".to_string(),
            checks: vec!["Has a display".to_string(), "Adds numbers".to_string()],
            attachments: [("sample.json", "[1, 2]")].into_iter().collect(),
            existing_files: FileSet::new(),
            round: 1,
        }
    }

    #[test]
    fn test_user_prompt_contains_all_sections() {
        let prompt = user_prompt(&request());

        assert!(prompt.contains("### Task Brief\nBuild a calculator"));
        assert!(prompt.contains("Has a display\nAdds numbers"));
        assert!(prompt.contains("- sample.json:\n[1, 2]"));
        assert!(prompt.contains("### Round Number\n1"));
        assert!(prompt.contains("### Existing Files\n(none)"));
        assert!(prompt.contains("Build the app from scratch."));
    }

    #[test]
    fn test_user_prompt_for_revision_round() {
        let mut req = request();
        req.round = 2;
        req.existing_files = [("index.html", "<html>v1</html>")].into_iter().collect();

        let prompt = user_prompt(&req);
        assert!(prompt.contains("--- index.html ---\n<html>v1</html>"));
        assert!(prompt.contains("Revise the existing files"));
    }

    #[test]
    fn test_excerpt_truncates_without_error() {
        let files: FileSet = [("index.html", "é".repeat(10_000))].into_iter().collect();
        let excerpt = existing_files_excerpt(&files, EXISTING_FILES_CHAR_LIMIT);

        assert!(excerpt.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            excerpt.chars().count(),
            EXISTING_FILES_CHAR_LIMIT + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_excerpt_labels_each_file() {
        let files: FileSet = [("app.js", "run()"), ("index.html", "<html></html>")]
            .into_iter()
            .collect();
        let excerpt = existing_files_excerpt(&files, EXISTING_FILES_CHAR_LIMIT);

        assert_eq!(excerpt, "--- app.js ---\nrun()\n--- index.html ---\n<html></html>");
    }

    #[test]
    fn test_system_prompt_by_format() {
        assert!(system_prompt(OutputFormat::Sections).contains("only its file name"));
        assert!(system_prompt(OutputFormat::Json).contains("valid JSON"));
    }
}
