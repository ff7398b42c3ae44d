use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one multi-round generation conversation and the repository backing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskIdentity {
    pub submitter: String,
    pub task: String,
}

impl TaskIdentity {
    pub fn new(submitter: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            submitter: submitter.into(),
            task: task.into(),
        }
    }

    /// Builds an identity from optional caller-supplied values.
    ///
    /// Absent or blank values are replaced with random fallbacks so that every
    /// request can be processed.
    pub fn resolve(submitter: Option<&str>, task: Option<&str>) -> Self {
        let submitter = non_blank(submitter)
            .map(str::to_string)
            .unwrap_or_else(|| format!("anonymous-{}", short_id()));
        let task = non_blank(task)
            .map(str::to_string)
            .unwrap_or_else(|| format!("task-{}", short_id()));

        Self { submitter, task }
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.submitter, self.task)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
