//! Database queries for teams, users and review load.
//!
//! Single-statement helpers take any SQLite executor so they can run either
//! against the pool or inside an open transaction.

use crate::models::{TeamMember, User};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};
use std::collections::HashMap;

/// Check whether a team with the given id exists.
pub async fn team_exists<'e>(
    executor: impl SqliteExecutor<'e>,
    team_id: i64,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM teams WHERE id = ?")
        .bind(team_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.is_some())
}

/// Check whether a user with the given id exists.
pub async fn user_exists<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.is_some())
}

/// Active members of a team, excluding one user (typically the PR author).
///
/// Ordered by user id so callers see a stable pool before ranking.
pub async fn active_team_members<'e>(
    executor: impl SqliteExecutor<'e>,
    team_id: i64,
    exclude_user_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        SELECT u.id
        FROM users u
        JOIN team_members tm ON tm.user_id = u.id
        WHERE tm.team_id = ? AND u.is_active = 1 AND u.id <> ?
        ORDER BY u.id
        "#,
    )
    .bind(team_id)
    .bind(exclude_user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Current global review load for each of the given users.
///
/// Load is aggregated from `pr_reviewers` on every call; users without any
/// assignment are absent from the map (load 0).
pub async fn review_loads<'e>(
    executor: impl SqliteExecutor<'e>,
    user_ids: &[i64],
) -> Result<HashMap<i64, i64>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT reviewer_id, COUNT(*) FROM pr_reviewers WHERE reviewer_id IN (");
    let mut ids = builder.separated(", ");
    for id in user_ids {
        ids.push_bind(*id);
    }
    builder.push(") GROUP BY reviewer_id");

    let rows: Vec<(i64, i64)> = builder.build_query_as().fetch_all(executor).await?;

    Ok(rows.into_iter().collect())
}

/// Insert a team if missing and return its id.
pub async fn upsert_team<'e>(
    executor: impl SqliteExecutor<'e>,
    name: &str,
) -> Result<i64, sqlx::Error> {
    // DO UPDATE (not DO NOTHING) so RETURNING yields the existing row too.
    sqlx::query_scalar(
        r#"
        INSERT INTO teams (name) VALUES (?)
        ON CONFLICT(name) DO UPDATE SET name = excluded.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await
}

/// Insert a user or refresh their name and active flag.
pub async fn upsert_user<'e>(
    executor: impl SqliteExecutor<'e>,
    member: &TeamMember,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, is_active) VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET name = excluded.name, is_active = excluded.is_active
        "#,
    )
    .bind(member.user_id)
    .bind(&member.username)
    .bind(member.is_active)
    .execute(executor)
    .await?;

    Ok(())
}

/// Put a user on a team, moving them off any previous team.
pub async fn upsert_membership<'e>(
    executor: impl SqliteExecutor<'e>,
    team_id: i64,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO team_members (user_id, team_id) VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET team_id = excluded.team_id
        "#,
    )
    .bind(user_id)
    .bind(team_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Look up a team id by name.
pub async fn find_team_id<'e>(
    executor: impl SqliteExecutor<'e>,
    name: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM teams WHERE name = ?")
        .bind(name)
        .fetch_optional(executor)
        .await
}

/// All members of a team (active or not), ordered by user id.
pub async fn team_members<'e>(
    executor: impl SqliteExecutor<'e>,
    team_id: i64,
) -> Result<Vec<TeamMember>, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(
        r#"
        SELECT u.id AS user_id, u.name AS username, u.is_active
        FROM users u
        JOIN team_members tm ON tm.user_id = u.id
        WHERE tm.team_id = ?
        ORDER BY u.id
        "#,
    )
    .bind(team_id)
    .fetch_all(executor)
    .await
}

/// Update a user's active flag. Returns the number of rows touched.
pub async fn set_user_active<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
    is_active: bool,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Fetch a user together with their team name.
pub async fn find_user<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id AS user_id, u.name AS username, t.name AS team_name, u.is_active
        FROM users u
        LEFT JOIN team_members tm ON tm.user_id = u.id
        LEFT JOIN teams t ON t.id = tm.team_id
        WHERE u.id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}
