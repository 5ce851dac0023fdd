use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::put,
};
use serde::Deserialize;
use serde_json::{Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::sections::save_workout_details;
use stride_database::model::workouts::LoggedSectionInput;
use tracing::info;

use crate::RouteMeta;

pub const ROUTES: &[RouteMeta] = &[RouteMeta {
    method: "PUT",
    path: "/api/workout_sections/save-workout-details/",
    desc: "Saves in-progress sets, difficulty and comments.",
}];

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/workout_sections/save-workout-details/",
        put(save_details),
    )
}

#[derive(Debug, Default, Deserialize)]
struct DetailsRequest {
    #[serde(default)]
    sections: Vec<LoggedSectionInput>,
}

async fn save_details(
    State(state): State<AppState>,
    payload: Result<Json<DetailsRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;

    let report = save_workout_details(&state.db, &request.sections).await?;
    info!(
        movements_updated = report.movements_updated,
        sets_saved = report.sets_saved,
        skipped = report.skipped,
        "workout details saved"
    );

    Ok(Json(json!({
        "message": "Workout saved successfully!",
        "movements_updated": report.movements_updated,
        "sets_saved": report.sets_saved,
        "skipped": report.skipped,
    })))
}
