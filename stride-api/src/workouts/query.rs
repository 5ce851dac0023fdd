use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::workouts::{
    find_owned_workout, list_upcoming_workouts, list_workouts, movement_history,
    populate_workout,
};
use stride_database::model::workouts::{PopulatedWorkout, Workout};
use stride_utils::parse::parse_flag;
use stride_utils::time::today_utc;

use crate::extract::{ApiPath, ApiQuery, UserQuery, acting_user};

pub async fn all_workouts(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<Workout>>, AppError> {
    let user_id = acting_user(&state, &headers, &query)?;
    Ok(Json(list_workouts(&state.db, user_id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub user_id: Option<String>,
    pub upcoming: Option<String>,
    pub limit: Option<String>,
}

pub async fn upcoming_workouts(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UpcomingQuery>,
) -> Result<Json<Vec<Workout>>, AppError> {
    let user_id = acting_user(
        &state,
        &headers,
        &UserQuery {
            user_id: query.user_id,
        },
    )?;

    let upcoming_from = query
        .upcoming
        .as_deref()
        .is_some_and(parse_flag)
        .then(today_utc);
    let limit = query
        .limit
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(0);

    Ok(Json(
        list_upcoming_workouts(&state.db, user_id, upcoming_from, limit).await?,
    ))
}

/// Catalog movement ids referenced anywhere in the workout's sections.
pub fn referenced_movements(workout: &PopulatedWorkout) -> Vec<i64> {
    let mut ids = workout
        .workout_sections
        .iter()
        .flat_map(|section| section.section_movement_details.iter())
        .filter_map(|detail| detail.section_movement.movement_id)
        .collect::<Vec<_>>();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub async fn single_workout(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(workout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = acting_user(&state, &headers, &query)?;

    let workout = find_owned_workout(&state.db, workout_id, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Workout not found"))?;
    let workout = populate_workout(&state.db, workout).await?;
    let history = movement_history(&state.db, user_id, &referenced_movements(&workout)).await?;

    Ok(Json(json!({
        "workout": workout,
        "movement_history": history,
    })))
}
