//! Reassignment result.

use serde::Serialize;

use super::PullRequest;

/// Outcome of replacing one reviewer on an open pull request.
#[derive(Debug, Clone, Serialize)]
pub struct Reassignment {
    #[serde(rename = "pr")]
    pub pull_request: PullRequest,
    pub replaced_by: i64,
}
