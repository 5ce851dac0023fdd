use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde_json::{Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::users::user_exists;
use stride_database::impls::workouts::{self, SaveWorkoutOutcome};
use stride_database::model::workouts::{
    ActivityType, GymSectionInput, HiitInput, MobilityInput, NewWorkout, RunningInput,
    WorkoutPayload, WorkoutStatus,
};
use stride_utils::parse::parse_iso_date;
use tracing::info;

use crate::extract::{authorize, id_from_json};

#[derive(Debug, Default, Deserialize)]
pub struct SaveWorkoutRequest {
    pub activity_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i16>,
    pub complexity: Option<i16>,
    pub status: Option<String>,
    pub scheduled_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GymBody {
    #[serde(default)]
    sections: Vec<GymSectionInput>,
}

/// Reads the activity-specific fields from the top level of the request body.
pub fn build_payload(activity: ActivityType, body: &Value) -> Result<WorkoutPayload, AppError> {
    let invalid = |err: serde_json::Error| {
        AppError::bad_request(format!("Invalid {} workout: {err}", activity.as_str()))
    };

    let payload = match activity {
        ActivityType::Gym => {
            WorkoutPayload::Gym(GymBody::deserialize(body).map_err(invalid)?.sections)
        }
        ActivityType::Running => {
            WorkoutPayload::Running(RunningInput::deserialize(body).map_err(invalid)?)
        }
        ActivityType::Mobility => {
            WorkoutPayload::Mobility(MobilityInput::deserialize(body).map_err(invalid)?)
        }
        ActivityType::Hiit => WorkoutPayload::Hiit(HiitInput::deserialize(body).map_err(invalid)?),
    };

    Ok(payload)
}

fn saved_message(activity: ActivityType) -> &'static str {
    match activity {
        ActivityType::Gym => "Gym workout saved successfully",
        ActivityType::Running => "Running workout saved successfully",
        ActivityType::Mobility => "Mobility workout saved successfully",
        ActivityType::Hiit => "HIIT workout saved successfully",
    }
}

pub async fn save_workout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(body) = payload?;

    let user_id = id_from_json(body.get("user_id"))?;
    authorize(&state, &headers, user_id)?;
    if !user_exists(&state.db, user_id).await? {
        return Err(AppError::bad_request("Invalid user ID"));
    }

    let request = SaveWorkoutRequest::deserialize(&body)
        .map_err(|err| AppError::bad_request(format!("Invalid workout: {err}")))?;

    let raw_type = request.activity_type.as_deref().unwrap_or_default();
    let activity = ActivityType::parse(raw_type)
        .ok_or_else(|| AppError::bad_request(format!("Unsupported workout type: {raw_type}")))?;

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::bad_request("Workout name is required"))?;

    let status = match request.status.as_deref() {
        None => WorkoutStatus::Saved,
        Some(raw) => WorkoutStatus::parse(raw)
            .ok_or_else(|| AppError::bad_request(format!("Invalid status: {raw}")))?,
    };

    let scheduled_date = match request
        .scheduled_date
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
    {
        None => None,
        Some(raw) => Some(
            parse_iso_date(raw)
                .ok_or_else(|| AppError::bad_request(format!("Invalid scheduled_date: {raw}")))?,
        ),
    };

    let workout_payload = build_payload(activity, &body)?;
    let outcome = workouts::save_workout(
        &state.db,
        NewWorkout {
            owner_id: user_id,
            name,
            description: request.description.as_deref(),
            status,
            activity_type: activity,
            complexity: request.complexity,
            duration: request.duration,
            scheduled_date,
        },
        &workout_payload,
    )
    .await?;

    match outcome {
        SaveWorkoutOutcome::Saved(workout_id) => {
            info!(user_id, workout_id, activity = activity.as_str(), "workout saved");
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "message": saved_message(activity),
                    "workout_id": workout_id,
                })),
            ))
        }
        SaveWorkoutOutcome::MovementNotFound(name) => {
            Err(AppError::bad_request(format!("Movement not found: {name}")))
        }
        SaveWorkoutOutcome::ConditioningNotFound(id) => Err(AppError::bad_request(format!(
            "Conditioning overview not found: {id}"
        ))),
        SaveWorkoutOutcome::RunningSessionNotFound(id) => Err(AppError::bad_request(format!(
            "Running session not found: {id}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stride_database::model::workouts::{ActivityType, WorkoutPayload};

    use super::build_payload;

    #[test]
    fn gym_payload_reads_sections() {
        let body = json!({
            "user_id": 1,
            "activity_type": "Gym",
            "sections": [{
                "section_name": "Strong 1",
                "section_type": "single",
                "section_order": 1,
                "movements": [{"movement_name": "Back Squat", "movement_order": 1}]
            }]
        });

        let WorkoutPayload::Gym(sections) = build_payload(ActivityType::Gym, &body).unwrap() else {
            panic!("expected gym payload");
        };
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].movements[0].movement_name, "Back Squat");
    }

    #[test]
    fn running_payload_defaults_to_catalog_intervals() {
        let body = json!({"activity_type": "Running", "running_session_id": 4});

        let WorkoutPayload::Running(running) =
            build_payload(ActivityType::Running, &body).unwrap()
        else {
            panic!("expected running payload");
        };
        assert_eq!(running.running_session_id, Some(4));
        assert!(running.intervals.is_none());
    }

    #[test]
    fn malformed_payload_is_a_bad_request() {
        let body = json!({"sections": "not a list"});
        let err = build_payload(ActivityType::Gym, &body).unwrap_err();
        assert!(err.to_string().starts_with("Invalid Gym workout"));
    }
}
