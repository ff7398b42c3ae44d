//! Wire types for the deploy endpoint

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pagesmith_core::{FileSet, RoundSpec};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{OrchestratorError, Result};

fn default_round() -> u32 {
    1
}

#[derive(Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeployRequest {
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    /// Number of the round carried by the top-level brief.
    #[serde(default = "default_round")]
    pub round: u32,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub attachments: Option<Attachments>,
    #[serde(default)]
    pub evaluation_url: Option<String>,
    /// Further rounds, numbered after `round` in list order.
    #[serde(default, alias = "additional_rounds")]
    pub rounds: Vec<RoundRequest>,
}

impl fmt::Debug for DeployRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployRequest")
            .field("secret", &"<redacted>")
            .field("email", &self.email)
            .field("task", &self.task)
            .field("round", &self.round)
            .field("nonce", &self.nonce)
            .field("evaluation_url", &self.evaluation_url)
            .field("rounds", &(1 + self.rounds.len()))
            .finish()
    }
}

impl DeployRequest {
    pub fn new(secret: impl Into<String>, brief: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            email: None,
            task: None,
            round: default_round(),
            nonce: None,
            brief: brief.into(),
            checks: Vec::new(),
            attachments: None,
            evaluation_url: None,
            rounds: Vec::new(),
        }
    }

    pub fn round_count(&self) -> usize {
        1 + self.rounds.len()
    }

    /// Expands the request into ordered rounds, decoding attachments.
    pub fn round_specs(&self) -> Result<Vec<RoundSpec>> {
        if self.round == 0 {
            return Err(OrchestratorError::InvalidRequest(
                "round must be at least 1".to_string(),
            ));
        }

        let mut specs = Vec::with_capacity(self.round_count());
        specs.push(
            RoundSpec::new(self.round, self.brief.clone())
                .with_checks(self.checks.clone())
                .with_attachments(decode_optional(self.attachments.as_ref())?),
        );

        for (offset, extra) in self.rounds.iter().enumerate() {
            let number = u32::try_from(offset + 1)
                .ok()
                .and_then(|offset| self.round.checked_add(offset))
                .ok_or_else(|| {
                    OrchestratorError::InvalidRequest("round number out of range".to_string())
                })?;

            specs.push(
                RoundSpec::new(number, extra.brief.clone())
                    .with_checks(extra.checks.clone())
                    .with_attachments(decode_optional(extra.attachments.as_ref())?),
            );
        }

        Ok(specs)
    }
}

fn decode_optional(attachments: Option<&Attachments>) -> Result<FileSet> {
    attachments
        .map(Attachments::to_file_set)
        .transpose()
        .map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoundRequest {
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub attachments: Option<Attachments>,
}

/// Attachment files, either inline or as named URLs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum Attachments {
    /// `{"data.csv": "a,b\n1,2"}`
    Map(BTreeMap<String, String>),
    /// `[{"name": "data.csv", "url": "data:text/csv;base64,..."}]`
    List(Vec<AttachmentRef>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttachmentRef {
    pub name: String,
    pub url: String,
}

impl Attachments {
    /// Attachments keyed by repository path. Names must be relative paths
    /// that stay inside the repository.
    pub fn to_file_set(&self) -> Result<FileSet> {
        match self {
            Attachments::Map(files) => files
                .iter()
                .map(|(name, content)| {
                    check_attachment_name(name).map(|()| (name.clone(), content.clone()))
                })
                .collect(),
            Attachments::List(refs) => refs
                .iter()
                .map(|attachment| {
                    check_attachment_name(&attachment.name)?;
                    attachment
                        .content()
                        .map(|content| (attachment.name.clone(), content))
                })
                .collect(),
        }
    }
}

/// Empty segments cover absolute names and doubled separators.
fn check_attachment_name(name: &str) -> Result<()> {
    let escapes = name
        .split(['/', '\\'])
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if escapes {
        return Err(OrchestratorError::InvalidRequest(format!(
            "attachment name {name:?} is not a relative file path"
        )));
    }
    Ok(())
}

impl AttachmentRef {
    /// File content for this attachment.
    ///
    /// `data:` URLs are decoded; any other URL is kept as the content itself.
    /// Base64 payloads that are not UTF-8 text keep the original data URL.
    pub fn content(&self) -> Result<String> {
        let Some(rest) = self.url.strip_prefix("data:") else {
            return Ok(self.url.clone());
        };

        let Some((meta, payload)) = rest.split_once(',') else {
            return Err(OrchestratorError::InvalidRequest(format!(
                "attachment {} has a malformed data URL",
                self.name
            )));
        };

        if !meta.ends_with(";base64") {
            return Ok(payload.to_string());
        }

        let bytes = STANDARD.decode(payload.trim()).map_err(|e| {
            OrchestratorError::InvalidRequest(format!(
                "attachment {} is not valid base64: {}",
                self.name, e
            ))
        })?;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(_) => {
                warn!(attachment = %self.name, "Binary attachment kept as data URL");
                Ok(self.url.clone())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoundResult {
    pub round: u32,
    pub repo_url: String,
    pub pages_url: String,
    pub commit_sha: String,
    /// Whether the callback endpoint acknowledged the result.
    pub notified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeployResponse {
    pub status: String,
    pub email: String,
    pub task: String,
    pub nonce: String,
    pub results: Vec<RoundResult>,
}
