use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::services::trends::{self, TrendData, WindowKind};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChartDataQuery {
    pub view: Option<String>,
}

/// GET /api/logs/chart-data?view=weekly|monthly — chart-ready sleep and
/// activity series over the rolling window.
pub async fn get_chart_data(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ChartDataQuery>,
) -> AppResult<Json<TrendData>> {
    let window = WindowKind::from_param(query.view.as_deref());
    let trend = trends::compute_trend(&state.db, auth_user.id, window).await?;
    Ok(Json(trend))
}
