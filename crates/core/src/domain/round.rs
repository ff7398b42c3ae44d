use serde::{Deserialize, Serialize};

use super::files::FileSet;

/// One iteration of brief -> generated files -> published repository state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSpec {
    pub number: u32,
    pub brief: String,
    /// Advisory only; passed to the generator, never enforced.
    pub checks: Vec<String>,
    /// Literal files merged verbatim over the generated output.
    pub attachments: FileSet,
}

impl RoundSpec {
    pub fn new(number: u32, brief: impl Into<String>) -> Self {
        Self {
            number,
            brief: brief.into(),
            checks: Vec::new(),
            attachments: FileSet::new(),
        }
    }

    pub fn with_checks(mut self, checks: Vec<String>) -> Self {
        self.checks = checks;
        self
    }

    pub fn with_attachments(mut self, attachments: FileSet) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn is_initial(&self) -> bool {
        self.number <= 1
    }

    /// First non-empty line of the brief, used for repository descriptions.
    pub fn headline(&self) -> &str {
        self.brief
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("Generated app")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_builder() {
        let attachments: FileSet = [("data.json", "{}")].into_iter().collect();
        let round = RoundSpec::new(2, "Fix the bug")
            .with_checks(vec!["Page loads".to_string()])
            .with_attachments(attachments.clone());

        assert_eq!(round.number, 2);
        assert!(!round.is_initial());
        assert_eq!(round.checks, vec!["Page loads".to_string()]);
        assert_eq!(round.attachments, attachments);
    }

    #[test]
    fn test_headline_skips_blank_lines() {
        let round = RoundSpec::new(1, "\n\n  Calculator app  \nwith history");
        assert_eq!(round.headline(), "Calculator app");
        assert_eq!(RoundSpec::new(1, "").headline(), "Generated app");
    }
}
