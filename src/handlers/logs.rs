use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::daily_log::{LogListQuery, LogListResponse, LogWithActivities, UpsertLogRequest};
use crate::services;
use crate::AppState;

/// POST /api/logs — create or replace the day's entry. Submitting twice for
/// the same date edits, never duplicates.
pub async fn upsert_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpsertLogRequest>,
) -> AppResult<Json<LogWithActivities>> {
    let log = services::logs::upsert_log(&state.db, auth_user.id, body).await?;

    tracing::debug!(user_id = %auth_user.id, log_date = %log.log.log_date, "Daily log upserted");

    Ok(Json(log))
}

/// GET /api/logs?limit&offset — paginated history.
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<LogListQuery>,
) -> AppResult<Json<LogListResponse>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let page = services::logs::list_logs(&state.db, auth_user.id, limit, offset).await?;
    Ok(Json(page))
}
