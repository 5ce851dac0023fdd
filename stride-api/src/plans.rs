use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde_json::{Map, Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::plans::store_plans;
use stride_database::model::plans::{PlanContext, PlanPart};
use stride_utils::formatting::join_names;
use tracing::info;

use crate::RouteMeta;

pub const ROUTES: &[RouteMeta] = &[RouteMeta {
    method: "POST",
    path: "/api/movement_workout_tracking/store-plans/",
    desc: "Records generated candidate plans and movement usage counts.",
}];

pub const REQUIRED_FIELDS: &[&str] = &[
    "selectedWorkout",
    "selectedTime",
    "complexity",
    "selectedFinish",
    "equipmentFilter",
    "candidatePlans",
    "userEmail",
];

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/movement_workout_tracking/store-plans/",
        post(store),
    )
}

pub fn missing_fields(body: &Map<String, Value>) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !body.contains_key(*field))
        .collect()
}

/// Strings stay as-is, other scalars use their JSON text.
fn text_field(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_owned(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn minutes_field(value: &Value) -> Option<i32> {
    match value {
        Value::Number(number) => number.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

async fn store(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let body = body
        .as_object()
        .ok_or_else(|| AppError::bad_request("Expected a JSON object"))?;

    let missing = missing_fields(body);
    if !missing.is_empty() {
        return Err(AppError::bad_request(format!(
            "Missing fields: {}",
            join_names(missing)
        )));
    }

    let workout_time = minutes_field(&body["selectedTime"])
        .ok_or_else(|| AppError::bad_request("selectedTime must be a number of minutes"))?;
    let candidate_plans: Vec<Vec<PlanPart>> =
        serde_json::from_value(body["candidatePlans"].clone())
            .map_err(|err| AppError::bad_request(format!("Invalid candidatePlans: {err}")))?;

    let workout_type = text_field(&body["selectedWorkout"]);
    let complexity = text_field(&body["complexity"]);
    let finish_type = text_field(&body["selectedFinish"]);

    let stored = store_plans(
        &state.db,
        PlanContext {
            workout_type: &workout_type,
            workout_time,
            complexity: &complexity,
            finish_type: &finish_type,
        },
        &candidate_plans,
    )
    .await?;
    info!(
        request_number = stored.request_number,
        plans = stored.plans_created,
        usage_updated = stored.usage_updated,
        "generated plans stored"
    );

    Ok(Json(json!({
        "message": format!(
            "Request #{}: stored {} plan(s), updated usage {} times",
            stored.request_number, stored.plans_created, stored.usage_updated
        ),
        "userEmail": body["userEmail"],
        "equipmentFilter": body["equipmentFilter"],
    })))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{minutes_field, missing_fields, text_field};

    #[test]
    fn reports_missing_fields_in_order() {
        let body = json!({"selectedWorkout": "Strength", "complexity": 2, "userEmail": "a@b.c"});
        let missing = missing_fields(body.as_object().unwrap());
        assert_eq!(
            missing,
            vec!["selectedTime", "selectedFinish", "equipmentFilter", "candidatePlans"]
        );
    }

    #[test]
    fn lenient_scalar_fields() {
        assert_eq!(minutes_field(&json!(45)), Some(45));
        assert_eq!(minutes_field(&json!("30")), Some(30));
        assert_eq!(minutes_field(&json!("soon")), None);
        assert_eq!(text_field(&json!(2)), "2");
        assert_eq!(text_field(&json!(" Pump ")), "Pump");
    }
}
