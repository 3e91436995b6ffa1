//! Pull request model and its status state machine.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of a pull request.
///
/// `Open` is the only initial state and `Merged` is terminal; the only
/// transition is `Open -> Merged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Merged)
    }

    /// The reviewer set may only change while the PR is open.
    pub fn allows_reviewer_changes(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked pull request together with its current reviewers.
///
/// `assigned_reviewers` is not a column; it is filled from `pr_reviewers`
/// in retrieval (assignment) order.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PullRequest {
    #[serde(rename = "pull_request_id")]
    pub id: i64,

    #[serde(rename = "pull_request_name")]
    pub title: String,

    pub author_id: i64,

    /// Team whose members are eligible reviewers.
    pub team_id: i64,

    pub status: PullRequestStatus,

    #[sqlx(skip)]
    pub assigned_reviewers: Vec<i64>,

    /// Creation timestamp (Unix seconds, UTC).
    #[serde(rename = "createdAt", serialize_with = "super::timestamp::serialize")]
    pub created_at: i64,

    /// Merge timestamp (Unix seconds, UTC), set once on the transition to `MERGED`.
    #[serde(
        rename = "mergedAt",
        serialize_with = "super::timestamp::serialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub merged_at: Option<i64>,
}

impl PullRequest {
    /// Check whether a user currently reviews this PR.
    pub fn has_reviewer(&self, user_id: i64) -> bool {
        self.assigned_reviewers.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: PullRequestStatus, merged_at: Option<i64>) -> PullRequest {
        PullRequest {
            id: 7,
            title: "Add retries".to_string(),
            author_id: 1,
            team_id: 3,
            status,
            assigned_reviewers: vec![2, 3],
            created_at: 1_700_000_000,
            merged_at,
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PullRequestStatus::Open.to_string(), "OPEN");
        assert_eq!(PullRequestStatus::Merged.to_string(), "MERGED");
    }

    #[test]
    fn test_status_state_machine() {
        assert!(!PullRequestStatus::Open.is_terminal());
        assert!(PullRequestStatus::Merged.is_terminal());
        assert!(PullRequestStatus::Open.allows_reviewer_changes());
        assert!(!PullRequestStatus::Merged.allows_reviewer_changes());
    }

    #[test]
    fn test_open_pr_serialization() {
        let json = serde_json::to_value(sample(PullRequestStatus::Open, None)).unwrap();
        assert_eq!(json["pull_request_id"], 7);
        assert_eq!(json["pull_request_name"], "Add retries");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["assigned_reviewers"], serde_json::json!([2, 3]));
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20+00:00");
        assert!(json.get("mergedAt").is_none());
    }

    #[test]
    fn test_merged_pr_serialization() {
        let pr = sample(PullRequestStatus::Merged, Some(1_700_000_060));
        let json = serde_json::to_value(&pr).unwrap();
        assert_eq!(json["status"], "MERGED");
        assert_eq!(json["mergedAt"], "2023-11-14T22:14:20+00:00");
        assert!(pr.status.is_terminal());
        assert!(pr.has_reviewer(3));
        assert!(!pr.has_reviewer(1));
    }
}
