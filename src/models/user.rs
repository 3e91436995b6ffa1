//! User model.

use serde::Serialize;
use sqlx::FromRow;

/// A roster user with their (optional) team affiliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    /// `None` when the user is not a member of any team.
    pub team_name: Option<String>,
    /// Only active users are eligible as reviewers.
    pub is_active: bool,
}
