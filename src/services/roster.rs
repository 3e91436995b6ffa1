//! Team roster management.
//!
//! Teams and users are upserted rather than rejected on conflict, so posting
//! the same team twice is safe and can be used to move users between teams
//! or refresh their names and active flags.

use crate::db::pool::DbPool;
use crate::db::roster;
use crate::error::AppError;
use crate::models::{NewTeam, Team, User};

/// Create a team, or upsert members into the existing team of that name.
///
/// Runs in one transaction: either the team and every member are stored or
/// nothing is.
///
/// # Errors
/// * `InvalidInput` - blank team name or blank username
pub async fn add_team(pool: &DbPool, input: NewTeam) -> Result<Team, AppError> {
    let team_name = input.team_name.trim();
    if team_name.is_empty() {
        return Err(AppError::invalid_input_field(
            "team name must not be empty",
            "team_name",
        ));
    }
    if let Some(member) = input.members.iter().find(|m| m.username.trim().is_empty()) {
        return Err(AppError::invalid_input_field(
            format!("username of user {} must not be empty", member.user_id),
            "username",
        ));
    }

    log::info!(
        "[roster] Adding team '{}' with {} members",
        team_name,
        input.members.len()
    );

    let mut tx = pool.begin().await?;

    let team_id = roster::upsert_team(&mut *tx, team_name).await?;
    for member in &input.members {
        roster::upsert_user(&mut *tx, member).await?;
        roster::upsert_membership(&mut *tx, team_id, member.user_id).await?;
    }
    let members = roster::team_members(&mut *tx, team_id).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "add_team"))?;

    Ok(Team {
        team_id,
        team_name: team_name.to_string(),
        members,
    })
}

/// Fetch a team by name with its members ordered by user id.
///
/// # Errors
/// * `NotFound` - no team has that name
pub async fn get_team(pool: &DbPool, team_name: &str) -> Result<Team, AppError> {
    let team_name = team_name.trim();
    let team_id = roster::find_team_id(pool, team_name)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("Team", team_name))?;

    let members = roster::team_members(pool, team_id).await?;

    Ok(Team {
        team_id,
        team_name: team_name.to_string(),
        members,
    })
}

/// Activate or deactivate a user.
///
/// Deactivation keeps the user's existing review assignments; it only
/// removes them from future reviewer selection.
///
/// # Errors
/// * `NotFound` - the user does not exist
pub async fn set_is_active(pool: &DbPool, user_id: i64, is_active: bool) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;

    if roster::set_user_active(&mut *tx, user_id, is_active).await? == 0 {
        return Err(AppError::not_found_with_id("User", user_id.to_string()));
    }
    let user = roster::find_user(&mut *tx, user_id)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("User", user_id.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "set_is_active"))?;

    log::info!("[roster] User {} is_active={}", user_id, is_active);

    Ok(user)
}
