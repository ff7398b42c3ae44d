//! Repository naming

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Host limit on repository name length.
pub const MAX_REPO_NAME_LEN: usize = 100;

const MAX_TASK_PART_LEN: usize = 60;
const FALLBACK_TASK_PART: &str = "app";

/// Lowercases `task`, collapses every run of non-alphanumeric characters to a
/// single `-` and trims dashes from both ends.
pub fn sanitize(task: &str) -> String {
    let mut sanitized = String::with_capacity(task.len());
    let mut pending_dash = false;

    for ch in task.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !sanitized.is_empty() {
                sanitized.push('-');
            }
            pending_dash = false;
            sanitized.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    sanitized
}

/// `<task>-<YYYYMMDDHHMMSS>-<4 hex>`; the random suffix separates names made in the same second.
pub fn repository_name(task: &str, now: DateTime<Utc>) -> String {
    let mut task_part = sanitize(task);
    task_part.truncate(MAX_TASK_PART_LEN);
    let task_part = task_part.trim_end_matches('-');
    let task_part = if task_part.is_empty() {
        FALLBACK_TASK_PART
    } else {
        task_part
    };

    let suffix = &Uuid::new_v4().simple().to_string()[..4];
    let name = format!("{}-{}-{}", task_part, now.format("%Y%m%d%H%M%S"), suffix);
    debug_assert!(name.len() <= MAX_REPO_NAME_LEN);
    name
}
