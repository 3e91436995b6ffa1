//! Database queries for pull requests and their reviewer assignments.

use crate::models::{PullRequest, PullRequestStatus};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor};
use std::collections::HashMap;

const PR_COLUMNS: &str = "id, title, author_id, team_id, status, created_at, merged_at";

/// Insert a new OPEN pull request and return its id.
pub async fn insert_pull_request<'e>(
    executor: impl SqliteExecutor<'e>,
    title: &str,
    author_id: i64,
    team_id: i64,
    created_at: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO pull_requests (title, author_id, team_id, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(author_id)
    .bind(team_id)
    .bind(PullRequestStatus::Open)
    .bind(created_at)
    .fetch_one(executor)
    .await
}

/// Take the write lock on behalf of a PR row.
///
/// SQLite has no `SELECT ... FOR UPDATE`; a no-op UPDATE is a write, so as
/// the first statement of a transaction it acquires the database write lock
/// (waiting out `busy_timeout`) and holds it until commit or rollback.
/// Returns `false` when the PR does not exist.
pub async fn claim_pull_request<'e>(
    executor: impl SqliteExecutor<'e>,
    pr_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE pull_requests SET status = status WHERE id = ?")
        .bind(pr_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Fetch the PR row alone; `assigned_reviewers` is left empty.
pub async fn find_pull_request_row<'e>(
    executor: impl SqliteExecutor<'e>,
    pr_id: i64,
) -> Result<Option<PullRequest>, sqlx::Error> {
    sqlx::query_as::<_, PullRequest>(&format!(
        "SELECT {} FROM pull_requests WHERE id = ?",
        PR_COLUMNS
    ))
    .bind(pr_id)
    .fetch_optional(executor)
    .await
}

/// Reviewer ids of a PR in assignment order.
pub async fn reviewer_ids<'e>(
    executor: impl SqliteExecutor<'e>,
    pr_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> =
        sqlx::query_as("SELECT reviewer_id FROM pr_reviewers WHERE pr_id = ? ORDER BY rowid")
            .bind(pr_id)
            .fetch_all(executor)
            .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Compose a PR row with its current reviewer set.
pub async fn fetch_pull_request(
    conn: &mut SqliteConnection,
    pr_id: i64,
) -> Result<Option<PullRequest>, sqlx::Error> {
    let Some(mut pr) = find_pull_request_row(&mut *conn, pr_id).await? else {
        return Ok(None);
    };

    pr.assigned_reviewers = reviewer_ids(&mut *conn, pr_id).await?;

    Ok(Some(pr))
}

/// Attach a reviewer to a PR.
pub async fn insert_assignment<'e>(
    executor: impl SqliteExecutor<'e>,
    pr_id: i64,
    reviewer_id: i64,
    assigned_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO pr_reviewers (pr_id, reviewer_id, assigned_at) VALUES (?, ?, ?)")
        .bind(pr_id)
        .bind(reviewer_id)
        .bind(assigned_at)
        .execute(executor)
        .await?;

    Ok(())
}

/// Detach a reviewer from a PR. Returns the number of rows removed.
pub async fn delete_assignment<'e>(
    executor: impl SqliteExecutor<'e>,
    pr_id: i64,
    reviewer_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = ? AND reviewer_id = ?")
        .bind(pr_id)
        .bind(reviewer_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Transition an OPEN PR to MERGED. Returns the number of rows changed
/// (0 when the PR is missing or already merged).
pub async fn mark_merged<'e>(
    executor: impl SqliteExecutor<'e>,
    pr_id: i64,
    merged_at: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE pull_requests SET status = ?, merged_at = ? WHERE id = ? AND status = ?",
    )
    .bind(PullRequestStatus::Merged)
    .bind(merged_at)
    .bind(pr_id)
    .bind(PullRequestStatus::Open)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// PRs on which the user is currently an assigned reviewer, ordered by id,
/// each carrying its full reviewer list.
pub async fn pull_requests_reviewed_by(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<PullRequest>, sqlx::Error> {
    let mut prs = sqlx::query_as::<_, PullRequest>(
        r#"
        SELECT pr.id, pr.title, pr.author_id, pr.team_id, pr.status, pr.created_at, pr.merged_at
        FROM pull_requests pr
        JOIN pr_reviewers r ON r.pr_id = pr.id
        WHERE r.reviewer_id = ?
        ORDER BY pr.id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    if prs.is_empty() {
        return Ok(prs);
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT pr_id, reviewer_id FROM pr_reviewers WHERE pr_id IN (");
    let mut ids = builder.separated(", ");
    for pr in &prs {
        ids.push_bind(pr.id);
    }
    builder.push(") ORDER BY rowid");

    let rows: Vec<(i64, i64)> = builder.build_query_as().fetch_all(&mut *conn).await?;

    let mut by_pr: HashMap<i64, Vec<i64>> = HashMap::new();
    for (pr_id, reviewer_id) in rows {
        by_pr.entry(pr_id).or_default().push(reviewer_id);
    }
    for pr in &mut prs {
        pr.assigned_reviewers = by_pr.remove(&pr.id).unwrap_or_default();
    }

    Ok(prs)
}
