use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::completion::{CompletionOutcome, complete_gym_workout};
use stride_database::model::workouts::LoggedSectionInput;
use stride_utils::time::today_utc;

use crate::extract::{ApiPath, ApiQuery, UserQuery, existing_user};

#[derive(Debug, Default, Deserialize)]
pub struct GymCompletion {
    #[serde(default)]
    pub sections: Vec<LoggedSectionInput>,
}

pub async fn complete_gym(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(workout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<GymCompletion>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    let Json(completion) = payload?;

    match complete_gym_workout(
        &state.db,
        workout_id,
        user_id,
        &completion.sections,
        today_utc(),
    )
    .await?
    {
        CompletionOutcome::Completed { points_awarded } => Ok(Json(json!({
            "message": "Workout completed successfully!",
            "points_awarded": points_awarded,
        }))),
        CompletionOutcome::NotFound => Err(AppError::not_found("Workout not found")),
    }
}
