//! Pull request lifecycle store.
//!
//! The transactional boundary around pull request state. Every mutating
//! operation runs in one `sqlx` transaction whose first statement is a write
//! against the PR aggregate, so the connection holds SQLite's write lock for
//! everything it reads and decides afterwards. A transaction dropped on an
//! early `?` return rolls back, so no failure leaves a partial mutation.
//!
//! State machine: `OPEN` (initial) -> `MERGED` (terminal, via [`merge_pull_request`]).

use crate::db::pool::DbPool;
use crate::db::{pull_requests, roster};
use crate::error::AppError;
use crate::models::{PullRequest, Reassignment};
use crate::services::assignment::{self, MAX_REVIEWERS};

/// Input for creating a pull request.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub title: String,
    pub author_id: i64,
    pub team_id: i64,
}

/// Current Unix timestamp (UTC).
fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Create a pull request and attach up to [`MAX_REVIEWERS`] least-loaded
/// active teammates of the author.
///
/// Load is read inside the creating transaction, so it reflects every
/// previously committed assignment. An author without eligible teammates
/// gets a PR with no reviewers.
///
/// # Errors
/// * `InvalidInput` - blank title
/// * `NotFound` - author or team does not exist
pub async fn create_pull_request(
    pool: &DbPool,
    input: NewPullRequest,
) -> Result<PullRequest, AppError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(AppError::invalid_input_field(
            "pull request title must not be empty",
            "pull_request_name",
        ));
    }

    log::info!(
        "[pr] Creating pull request '{}' (author={}, team={})",
        title,
        input.author_id,
        input.team_id
    );

    if !roster::user_exists(pool, input.author_id).await? {
        return Err(AppError::not_found_with_id("User", input.author_id.to_string()));
    }
    if !roster::team_exists(pool, input.team_id).await? {
        return Err(AppError::not_found_with_id("Team", input.team_id.to_string()));
    }

    let created_at = now();
    let mut tx = pool.begin().await?;

    // Writing first takes the write lock before any load is read.
    let pr_id = pull_requests::insert_pull_request(
        &mut *tx,
        title,
        input.author_id,
        input.team_id,
        created_at,
    )
    .await?;

    let members = roster::active_team_members(&mut *tx, input.team_id, input.author_id).await?;
    let loads = roster::review_loads(&mut *tx, &members).await?;
    let reviewers = assignment::select_initial_reviewers(
        assignment::build_candidates(&members, &loads),
        input.author_id,
        MAX_REVIEWERS,
    );

    for reviewer_id in &reviewers {
        pull_requests::insert_assignment(&mut *tx, pr_id, *reviewer_id, created_at).await?;
    }

    let pr = pull_requests::fetch_pull_request(&mut tx, pr_id)
        .await?
        .ok_or_else(|| AppError::internal(format!("pull request {} vanished after insert", pr_id)))?;

    tx.commit()
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "create_pull_request"))?;

    if reviewers.is_empty() {
        log::warn!("[pr] Created pull request {} with no eligible reviewers", pr_id);
    } else {
        log::info!("[pr] Created pull request {} with reviewers {:?}", pr_id, reviewers);
    }

    Ok(pr)
}

/// Merge a pull request.
///
/// Idempotent: merging an already merged PR returns its current state
/// unchanged, including the original `merged_at`.
///
/// # Errors
/// * `NotFound` - the PR does not exist
pub async fn merge_pull_request(pool: &DbPool, pr_id: i64) -> Result<PullRequest, AppError> {
    log::info!("[pr] Merging pull request {}", pr_id);

    let mut tx = pool.begin().await?;

    if !pull_requests::claim_pull_request(&mut *tx, pr_id).await? {
        return Err(AppError::not_found_with_id("PullRequest", pr_id.to_string()));
    }

    let current = pull_requests::find_pull_request_row(&mut *tx, pr_id)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("PullRequest", pr_id.to_string()))?;

    if current.status.is_terminal() {
        log::info!("[pr] Pull request {} already merged, nothing to do", pr_id);
    } else {
        pull_requests::mark_merged(&mut *tx, pr_id, now()).await?;
    }

    let pr = pull_requests::fetch_pull_request(&mut tx, pr_id)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("PullRequest", pr_id.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "merge_pull_request"))?;

    Ok(pr)
}

/// Replace one reviewer of an open pull request with the least-loaded
/// eligible teammate.
///
/// The replacement comes from the PR's own team (as recorded on the PR),
/// is active, and is neither the author, the outgoing reviewer nor another
/// current reviewer. The delete of the old assignment and the insert of the
/// new one commit together or not at all.
///
/// # Errors
/// Checked in this order:
/// * `NotFound` - the PR does not exist
/// * `PrMerged` - the PR is merged
/// * `NotAssigned` - `old_reviewer_id` is not a reviewer of the PR
/// * `NoCandidate` - nobody is eligible to take over
pub async fn reassign_reviewer(
    pool: &DbPool,
    pr_id: i64,
    old_reviewer_id: i64,
) -> Result<Reassignment, AppError> {
    log::info!(
        "[pr] Reassigning reviewer {} on pull request {}",
        old_reviewer_id,
        pr_id
    );

    let mut tx = pool.begin().await?;

    if !pull_requests::claim_pull_request(&mut *tx, pr_id).await? {
        return Err(AppError::not_found_with_id("PullRequest", pr_id.to_string()));
    }

    let pr = pull_requests::fetch_pull_request(&mut tx, pr_id)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("PullRequest", pr_id.to_string()))?;

    if !pr.status.allows_reviewer_changes() {
        log::warn!("[pr] Refusing to reassign on merged pull request {}", pr_id);
        return Err(AppError::PrMerged { pr_id });
    }

    if !pr.has_reviewer(old_reviewer_id) {
        return Err(AppError::NotAssigned {
            pr_id,
            reviewer_id: old_reviewer_id,
        });
    }

    let members = roster::active_team_members(&mut *tx, pr.team_id, pr.author_id).await?;
    let loads = roster::review_loads(&mut *tx, &members).await?;

    let mut excluded = pr.assigned_reviewers.clone();
    excluded.push(pr.author_id);

    let Some(new_reviewer_id) =
        assignment::select_replacement(assignment::build_candidates(&members, &loads), &excluded)
    else {
        log::warn!(
            "[pr] No replacement for reviewer {} on pull request {}",
            old_reviewer_id,
            pr_id
        );
        return Err(AppError::NoCandidate { pr_id });
    };

    pull_requests::delete_assignment(&mut *tx, pr_id, old_reviewer_id).await?;
    pull_requests::insert_assignment(&mut *tx, pr_id, new_reviewer_id, now()).await?;

    let pull_request = pull_requests::fetch_pull_request(&mut tx, pr_id)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("PullRequest", pr_id.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "reassign_reviewer"))?;

    log::info!(
        "[pr] Pull request {}: reviewer {} replaced by {}",
        pr_id,
        old_reviewer_id,
        new_reviewer_id
    );

    Ok(Reassignment {
        pull_request,
        replaced_by: new_reviewer_id,
    })
}

/// Fetch a pull request with its current reviewers.
///
/// # Errors
/// * `NotFound` - the PR does not exist
pub async fn get_pull_request(pool: &DbPool, pr_id: i64) -> Result<PullRequest, AppError> {
    let mut conn = pool.acquire().await?;

    pull_requests::fetch_pull_request(&mut conn, pr_id)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("PullRequest", pr_id.to_string()))
}

/// Pull requests the user currently reviews, ordered by id.
///
/// # Errors
/// * `NotFound` - the user does not exist
pub async fn list_reviews_for_user(
    pool: &DbPool,
    user_id: i64,
) -> Result<Vec<PullRequest>, AppError> {
    let mut conn = pool.acquire().await?;

    if !roster::user_exists(&mut *conn, user_id).await? {
        return Err(AppError::not_found_with_id("User", user_id.to_string()));
    }

    let prs = pull_requests::pull_requests_reviewed_by(&mut conn, user_id).await?;
    log::debug!("[pr] User {} reviews {} pull requests", user_id, prs.len());

    Ok(prs)
}
