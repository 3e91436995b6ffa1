//! REST API routes.
//!
//! Thin axum handlers over the roster and PR lifecycle services. Every
//! failure is rendered as `{"error": {"code": ..., "message": ...}}` with a
//! status derived from the error kind.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{NewTeam, PullRequest, Reassignment, Team, User};
use crate::services::pr_lifecycle::{self, NewPullRequest};
use crate::services::roster;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
}

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ApiError {
    code: String,
    message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(pub AppError);

impl ApiErr {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            e if e.is_conflict() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("[server] Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorEnvelope {
                error: ApiError {
                    code: self.0.code().to_string(),
                    message: self.0.to_string(),
                },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

// ── Request and response types ───────────────────────────────────────────────

#[derive(Deserialize)]
struct TeamQuery {
    team_name: String,
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: i64,
}

#[derive(Deserialize)]
struct PullRequestQuery {
    pull_request_id: i64,
}

#[derive(Deserialize)]
struct SetIsActiveRequest {
    user_id: i64,
    is_active: bool,
}

#[derive(Deserialize)]
struct CreatePullRequestRequest {
    pull_request_name: String,
    author_id: i64,
    team_id: i64,
}

#[derive(Deserialize)]
struct MergePullRequestRequest {
    pull_request_id: i64,
}

#[derive(Deserialize)]
struct ReassignRequest {
    pull_request_id: i64,
    old_user_id: i64,
}

#[derive(Serialize)]
struct TeamResponse {
    team: Team,
}

#[derive(Serialize)]
struct UserResponse {
    user: User,
}

#[derive(Serialize)]
struct PullRequestResponse {
    pr: PullRequest,
}

#[derive(Serialize)]
struct ReviewsResponse {
    user_id: i64,
    pull_requests: Vec<PullRequest>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Build the API routes. Middleware layers are applied by the server.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_reviews))
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .route("/pullRequest/get", get(get_pull_request))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /health: liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /team/add: create a team or upsert its members.
async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiErr> {
    let Json(input) = payload?;
    let team = roster::add_team(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// GET /team/get?team_name=X: fetch a team with its members.
async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<TeamResponse>, ApiErr> {
    let Query(params) = query?;
    let team = roster::get_team(&state.db, &params.team_name).await?;
    Ok(Json(TeamResponse { team }))
}

/// POST /users/setIsActive: toggle reviewer eligibility.
async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErr> {
    let Json(req) = payload?;
    let user = roster::set_is_active(&state.db, req.user_id, req.is_active).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/getReview?user_id=X: PRs the user currently reviews.
async fn get_reviews(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<ReviewsResponse>, ApiErr> {
    let Query(params) = query?;
    let pull_requests = pr_lifecycle::list_reviews_for_user(&state.db, params.user_id).await?;
    Ok(Json(ReviewsResponse {
        user_id: params.user_id,
        pull_requests,
    }))
}

/// POST /pullRequest/create: open a PR and assign reviewers.
async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiErr> {
    let Json(req) = payload?;
    let pr = pr_lifecycle::create_pull_request(
        &state.db,
        NewPullRequest {
            title: req.pull_request_name,
            author_id: req.author_id,
            team_id: req.team_id,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

/// POST /pullRequest/merge: merge a PR (idempotent).
async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let Json(req) = payload?;
    let pr = pr_lifecycle::merge_pull_request(&state.db, req.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}

/// POST /pullRequest/reassign: swap one reviewer for the least-loaded teammate.
async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<Reassignment>, ApiErr> {
    let Json(req) = payload?;
    let result =
        pr_lifecycle::reassign_reviewer(&state.db, req.pull_request_id, req.old_user_id).await?;
    Ok(Json(result))
}

/// GET /pullRequest/get?pull_request_id=X: fetch a PR with its reviewers.
async fn get_pull_request(
    State(state): State<AppState>,
    query: Result<Query<PullRequestQuery>, QueryRejection>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let Query(params) = query?;
    let pr = pr_lifecycle::get_pull_request(&state.db, params.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}
