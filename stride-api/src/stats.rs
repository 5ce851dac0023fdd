use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::get,
};
use stride_core::{AppError, AppState};
use stride_database::impls::movement_stats::movement_summary_report;
use stride_database::impls::user_stats::get_or_create_user_stats;
use stride_database::impls::users::user_exists;
use stride_database::model::stats::{MovementSummaryReport, UserStats};

use crate::RouteMeta;
use crate::extract::{ApiPath, ApiQuery, UserQuery, authorize, existing_user};

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "GET",
        path: "/api/user_stats/{user_id}/",
        desc: "Body-part and activity-type breakdowns for the last week, month and year.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/movement_summary_stats/",
        desc: "Best sets, estimated one-rep maxes and logged strength sets.",
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/user_stats/{user_id}/", get(user_stats))
        .route("/api/movement_summary_stats/", get(movement_summaries))
}

async fn user_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<UserStats>, AppError> {
    authorize(&state, &headers, user_id)?;
    if !user_exists(&state.db, user_id).await? {
        return Err(AppError::not_found("User not found"));
    }

    Ok(Json(get_or_create_user_stats(&state.db, user_id).await?))
}

async fn movement_summaries(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<MovementSummaryReport>, AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    Ok(Json(movement_summary_report(&state.db, user_id).await?))
}
