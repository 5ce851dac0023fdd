use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use stride_core::{AppError, AppState};
use stride_database::impls::catalog::{
    list_conditioning, list_equipment, list_mobility_workouts, list_movements,
    list_running_sessions, list_suggested_strength,
};
use stride_database::model::catalog::{
    ConditioningOverview, Equipment, MobilityWorkout, RunningSession, SuggestedStrength,
};

use crate::RouteMeta;

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "GET",
        path: "/api/movements/",
        desc: "Movement catalog with equipment combinations.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/equipment/",
        desc: "Equipment catalog.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/running_sessions/",
        desc: "Prescribed running sessions with intervals.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/mobility/",
        desc: "Mobility workouts with their movements.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/suggested_strength/",
        desc: "Strength templates with their sections.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/conditioning/",
        desc: "Conditioning overviews with their elements.",
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/movements/", get(movements))
        .route("/api/equipment/", get(equipment))
        .route("/api/running_sessions/", get(running_sessions))
        .route("/api/mobility/", get(mobility))
        .route("/api/suggested_strength/", get(suggested_strength))
        .route("/api/conditioning/", get(conditioning))
}

async fn movements(State(state): State<AppState>) -> Result<Response, AppError> {
    let movements = list_movements(&state.db).await?;
    if movements.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No movements found." })),
        )
            .into_response());
    }

    Ok(Json(movements).into_response())
}

async fn equipment(State(state): State<AppState>) -> Result<Json<Vec<Equipment>>, AppError> {
    Ok(Json(list_equipment(&state.db).await?))
}

async fn running_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<RunningSession>>, AppError> {
    Ok(Json(list_running_sessions(&state.db).await?))
}

async fn mobility(State(state): State<AppState>) -> Result<Json<Vec<MobilityWorkout>>, AppError> {
    Ok(Json(list_mobility_workouts(&state.db).await?))
}

async fn suggested_strength(
    State(state): State<AppState>,
) -> Result<Json<Vec<SuggestedStrength>>, AppError> {
    Ok(Json(list_suggested_strength(&state.db).await?))
}

async fn conditioning(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConditioningOverview>>, AppError> {
    Ok(Json(list_conditioning(&state.db).await?))
}
