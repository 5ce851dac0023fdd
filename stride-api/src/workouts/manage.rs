use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::workouts::{
    RescheduleOutcome, delete_workout, find_owned_workout, find_workout, reschedule_workout,
    update_workout_status,
};
use stride_database::model::workouts::{Workout, WorkoutStatus};
use stride_utils::parse::parse_iso_date;
use stride_utils::time::today_utc;
use tracing::info;

use crate::extract::{ApiPath, ApiQuery, UserQuery, optional_actor};

/// Workout by id, scoped to the caller when one is identified.
async fn load_workout(
    state: &AppState,
    headers: &HeaderMap,
    query: &UserQuery,
    workout_id: i64,
) -> Result<Workout, AppError> {
    let workout = match optional_actor(state, headers, query)? {
        Some(owner_id) => find_owned_workout(&state.db, workout_id, owner_id).await?,
        None => find_workout(&state.db, workout_id).await?,
    };

    workout.ok_or_else(|| AppError::not_found("Workout not found"))
}

/// Statuses a client may set directly.
pub fn settable_status(raw: Option<&str>) -> Option<WorkoutStatus> {
    match raw.and_then(WorkoutStatus::parse) {
        Some(WorkoutStatus::Saved) | None => None,
        status => status,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(workout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(update) = payload?;
    load_workout(&state, &headers, &query, workout_id).await?;

    let status = settable_status(update.status.as_deref()).ok_or_else(|| {
        AppError::bad_request(
            r#"Invalid status. Allowed values are: "Started", "Completed", "Scheduled"."#,
        )
    })?;

    update_workout_status(&state.db, workout_id, status, today_utc())
        .await?
        .ok_or_else(|| AppError::not_found("Workout not found"))?;
    info!(workout_id, status = status.as_str(), "workout status updated");

    Ok(Json(json!({
        "message": format!("Workout status updated to {}", status.as_str()),
    })))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(workout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Value>, AppError> {
    load_workout(&state, &headers, &query, workout_id).await?;

    if !delete_workout(&state.db, workout_id).await? {
        return Err(AppError::not_found("Workout not found"));
    }
    info!(workout_id, "workout deleted");

    Ok(Json(json!({ "message": "Workout deleted successfully" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct DateUpdate {
    pub scheduled_date: Option<String>,
}

pub async fn update_date(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(workout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<DateUpdate>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(update) = payload?;
    let workout = load_workout(&state, &headers, &query, workout_id).await?;
    if workout.is_completed() {
        return Err(AppError::bad_request(
            "Cannot edit the date of a completed workout",
        ));
    }

    let raw = update
        .scheduled_date
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::bad_request("Scheduled date is required"))?;
    let new_date = parse_iso_date(raw)
        .ok_or_else(|| AppError::bad_request(format!("Invalid scheduled_date: {raw}")))?;

    match reschedule_workout(&state.db, workout_id, new_date).await? {
        RescheduleOutcome::Rescheduled {
            notifications_moved,
            ..
        } => {
            info!(workout_id, %new_date, notifications_moved, "workout rescheduled");
            Ok(Json(json!({
                "message": "Scheduled date updated successfully",
                "notifications_moved": notifications_moved,
            })))
        }
        RescheduleOutcome::NotFound => Err(AppError::not_found("Workout not found")),
        RescheduleOutcome::AlreadyCompleted => Err(AppError::bad_request(
            "Cannot edit the date of a completed workout",
        )),
    }
}

#[cfg(test)]
mod tests {
    use stride_database::model::workouts::WorkoutStatus;

    use super::settable_status;

    #[test]
    fn only_progress_statuses_are_settable() {
        assert_eq!(settable_status(Some("Started")), Some(WorkoutStatus::Started));
        assert_eq!(settable_status(Some("Completed")), Some(WorkoutStatus::Completed));
        assert_eq!(settable_status(Some("Scheduled")), Some(WorkoutStatus::Scheduled));
        assert_eq!(settable_status(Some("Saved")), None);
        assert_eq!(settable_status(Some("Done")), None);
        assert_eq!(settable_status(None), None);
    }
}
