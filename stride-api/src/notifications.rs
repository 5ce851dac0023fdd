use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::notifications::{
    cancel_notification, clear_all_notifications, clear_notification, list_notifications,
    schedule_notification,
};
use stride_database::impls::users::set_push_token;
use stride_database::impls::workouts::find_owned_workout;
use stride_database::model::notifications::{NewNotification, ScheduledNotification};
use tracing::info;

use crate::RouteMeta;
use crate::extract::{
    ApiPath, ApiQuery, UserQuery, acting_user, authorize, existing_user, id_from_json,
};

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "POST",
        path: "/api/notifications/set_token/",
        desc: "Stores the device's Expo push token.",
    },
    RouteMeta {
        method: "POST",
        path: "/api/notifications/schedule/",
        desc: "Schedules a push reminder.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/notifications/",
        desc: "Delivered notifications the user has not cleared.",
    },
    RouteMeta {
        method: "PATCH",
        path: "/api/notifications/{id}/clear/",
        desc: "Clears one delivered notification.",
    },
    RouteMeta {
        method: "POST",
        path: "/api/notifications/clear-all/",
        desc: "Clears every delivered notification.",
    },
    RouteMeta {
        method: "POST",
        path: "/api/notifications/{id}/cancel/",
        desc: "Cancels a pending notification.",
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/", get(list))
        .route("/api/notifications/set_token/", post(set_token))
        .route("/api/notifications/schedule/", post(schedule))
        .route("/api/notifications/clear-all/", post(clear_all))
        .route("/api/notifications/{id}/clear/", patch(clear))
        .route("/api/notifications/{id}/cancel/", post(cancel))
}

async fn set_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;

    let token = body
        .get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|token| !token.is_empty());
    let (Ok(user_id), Some(token)) = (id_from_json(body.get("user_id")), token) else {
        return Err(AppError::bad_request(
            "Missing 'user_id' or 'token' in request body.",
        ));
    };
    authorize(&state, &headers, user_id)?;

    if !set_push_token(&state.db, user_id, token).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id, "push token saved");

    Ok(Json(json!({ "status": "Token saved successfully!" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleRequest {
    pub workout_id: Option<i64>,
    pub scheduled_datetime: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub body: String,
}

pub fn parse_scheduled_datetime(raw: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::bad_request("scheduled_datetime is required"))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| AppError::bad_request(format!("Invalid scheduled_datetime: {raw}")))
}

async fn schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScheduledNotification>), AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    let Json(request) = payload?;

    let scheduled_datetime = parse_scheduled_datetime(request.scheduled_datetime.as_deref())?;
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| AppError::bad_request("title is required"))?;

    if let Some(workout_id) = request.workout_id
        && find_owned_workout(&state.db, workout_id, user_id)
            .await?
            .is_none()
    {
        return Err(AppError::not_found("Workout not found"));
    }

    let notification = schedule_notification(
        &state.db,
        NewNotification {
            owner_id: user_id,
            workout_id: request.workout_id,
            scheduled_datetime,
            title,
            subtitle: request.subtitle.trim(),
            body: request.body.trim(),
        },
    )
    .await?;
    info!(user_id, notification_id = notification.id, %scheduled_datetime, "notification scheduled");

    Ok((StatusCode::CREATED, Json(notification)))
}

async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<ScheduledNotification>>, AppError> {
    let user_id = acting_user(&state, &headers, &query)?;
    Ok(Json(list_notifications(&state.db, user_id).await?))
}

async fn clear(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = acting_user(&state, &headers, &query)?;
    if !clear_notification(&state.db, id, user_id).await? {
        return Err(AppError::not_found("Notification not found"));
    }

    Ok(Json(json!({ "message": "Notification cleared" })))
}

async fn clear_all(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = acting_user(&state, &headers, &query)?;
    let cleared = clear_all_notifications(&state.db, user_id).await?;

    Ok(Json(json!({ "cleared": cleared })))
}

async fn cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = acting_user(&state, &headers, &query)?;
    if !cancel_notification(&state.db, id, user_id).await? {
        return Err(AppError::not_found("Pending notification not found"));
    }
    info!(user_id, notification_id = id, "notification canceled");

    Ok(Json(json!({ "message": "Notification canceled" })))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::parse_scheduled_datetime;

    #[test]
    fn offsets_are_normalized_to_utc() {
        let parsed = parse_scheduled_datetime(Some("2025-03-01T18:30:00+02:00")).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 16, 30, 0).unwrap());
    }

    #[test]
    fn missing_or_garbage_datetimes_are_rejected() {
        assert!(parse_scheduled_datetime(None).is_err());
        assert!(parse_scheduled_datetime(Some("  ")).is_err());
        assert!(parse_scheduled_datetime(Some("tomorrow evening")).is_err());
    }
}
