use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::get,
};
use stride_core::{AppError, AppState};
use stride_database::impls::leaderboard::list_leaderboard;
use stride_database::impls::scoring::list_score_log;
use stride_database::model::scoring::{LeaderboardEntry, ScoreLog};

use crate::RouteMeta;
use crate::extract::{ApiQuery, UserQuery, acting_user};

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "GET",
        path: "/api/leaderboard/",
        desc: "Everyone's scores and ranks, ordered by weekly rank.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/score_log/",
        desc: "A user's points ledger, newest first.",
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/leaderboard/", get(leaderboard))
        .route("/api/score_log/", get(score_log))
}

async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(list_leaderboard(&state.db).await?))
}

async fn score_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<ScoreLog>>, AppError> {
    let user_id = acting_user(&state, &headers, &query)?;
    Ok(Json(list_score_log(&state.db, user_id).await?))
}
