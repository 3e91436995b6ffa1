//! Team roster models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A team member as listed in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub user_id: i64,
    pub username: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A team with its members, ordered by user id.
#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub team_id: i64,
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

/// Input for creating a team or upserting members into an existing one.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTeam {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_team_deserialize() {
        let json = r#"{
            "team_name": "Backend",
            "members": [
                {"user_id": 2, "username": "bob", "is_active": false},
                {"user_id": 3, "username": "carol"}
            ]
        }"#;
        let team: NewTeam = serde_json::from_str(json).unwrap();
        assert_eq!(team.team_name, "Backend");
        assert_eq!(team.members.len(), 2);
        assert!(!team.members[0].is_active);
        assert!(team.members[1].is_active, "is_active defaults to true");
    }

    #[test]
    fn test_new_team_without_members() {
        let team: NewTeam = serde_json::from_str(r#"{"team_name": "Empty"}"#).unwrap();
        assert!(team.members.is_empty());
    }
}
