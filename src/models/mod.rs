//! Data models for the application.
//!
//! These models represent the entities stored in the SQLite database and
//! returned over the HTTP API.
//!
//! Row models derive `FromRow` for SQLx queries and `Serialize` for JSON responses.

pub mod pull_request;
pub mod reassignment;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{PullRequest, PullRequestStatus};
pub use reassignment::Reassignment;
pub use team::{NewTeam, Team, TeamMember};
pub use user::User;

/// Serde helpers rendering stored Unix-second timestamps as RFC 3339 (UTC).
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Serialize, Serializer};

    fn to_utc(secs: i64) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(secs, 0)
    }

    pub fn serialize<S: Serializer>(secs: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        match to_utc(*secs) {
            Some(dt) => dt.to_rfc3339().serialize(serializer),
            None => secs.serialize(serializer),
        }
    }

    pub fn serialize_option<S: Serializer>(
        secs: &Option<i64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match secs {
            Some(secs) => serialize(secs, serializer),
            None => serializer.serialize_none(),
        }
    }
}
