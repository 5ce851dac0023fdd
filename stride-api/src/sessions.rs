use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    routing::put,
};
use serde_json::{Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::completion::{CompletionOutcome, complete_run, complete_session};
use stride_database::model::sessions::{RunCompletion, SessionFeedback};
use stride_database::model::workouts::ActivityType;
use stride_utils::parse::parse_iso_date;
use stride_utils::time::today_utc;

use crate::RouteMeta;
use crate::extract::{ApiPath, ApiQuery, UserQuery, existing_user};

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "PUT",
        path: "/api/saved_runs/complete-workout/{workout_id}/",
        desc: "Completes a run, logging split times and awarding points.",
    },
    RouteMeta {
        method: "PUT",
        path: "/api/saved_mobility/complete-workout/{workout_id}/",
        desc: "Completes a mobility session.",
    },
    RouteMeta {
        method: "PUT",
        path: "/api/saved_hiit/complete-workout/{workout_id}/",
        desc: "Completes a HIIT session.",
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/saved_runs/complete-workout/{workout_id}/",
            put(complete_running),
        )
        .route(
            "/api/saved_mobility/complete-workout/{workout_id}/",
            put(complete_mobility),
        )
        .route(
            "/api/saved_hiit/complete-workout/{workout_id}/",
            put(complete_hiit),
        )
}

fn completed(outcome: CompletionOutcome, message: &str) -> Result<Json<Value>, AppError> {
    match outcome {
        CompletionOutcome::Completed { points_awarded } => Ok(Json(json!({
            "message": message,
            "points_awarded": points_awarded,
        }))),
        CompletionOutcome::NotFound => Err(AppError::not_found("Workout not found")),
    }
}

async fn complete_running(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(workout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<RunCompletion>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    let Json(completion) = payload?;

    let completed_date = match completion
        .scheduled_date
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
    {
        None => today_utc(),
        Some(raw) => parse_iso_date(raw)
            .ok_or_else(|| AppError::bad_request(format!("Invalid scheduled_date: {raw}")))?,
    };

    let outcome = complete_run(&state.db, workout_id, user_id, &completion, completed_date).await?;
    completed(outcome, "Running workout completed successfully!")
}

async fn complete_feedback_session(
    state: AppState,
    headers: HeaderMap,
    workout_id: i64,
    query: UserQuery,
    payload: Result<Json<SessionFeedback>, JsonRejection>,
    activity: ActivityType,
    message: &str,
) -> Result<Json<Value>, AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    let Json(feedback) = payload?;

    let outcome = complete_session(
        &state.db,
        workout_id,
        user_id,
        activity,
        &feedback,
        today_utc(),
    )
    .await?;
    completed(outcome, message)
}

async fn complete_mobility(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(workout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<SessionFeedback>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    complete_feedback_session(
        state,
        headers,
        workout_id,
        query,
        payload,
        ActivityType::Mobility,
        "Mobility workout completed successfully!",
    )
    .await
}

async fn complete_hiit(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(workout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<SessionFeedback>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    complete_feedback_session(
        state,
        headers,
        workout_id,
        query,
        payload,
        ActivityType::Hiit,
        "HIIT workout completed successfully!",
    )
    .await
}
