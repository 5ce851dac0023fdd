use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use stride_core::{AppError, AppState};
use stride_database::impls::equipment_filters::{
    FilterOutcome, create_filter, delete_filter, find_filter, list_filters, update_filter,
};
use stride_database::model::equipment::SavedEquipmentFilter;
use tracing::info;

use crate::RouteMeta;
use crate::extract::{ApiPath, ApiQuery, UserQuery, existing_user};

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "GET",
        path: "/api/equipment-filters/get_all",
        desc: "A user's saved equipment filters.",
    },
    RouteMeta {
        method: "POST",
        path: "/api/equipment-filters/create",
        desc: "Saves a named equipment filter.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/equipment-filters/{id}/get",
        desc: "One saved equipment filter.",
    },
    RouteMeta {
        method: "PUT",
        path: "/api/equipment-filters/{id}/update",
        desc: "Renames a filter or replaces its equipment.",
    },
    RouteMeta {
        method: "DELETE",
        path: "/api/equipment-filters/{id}/delete",
        desc: "Deletes a saved equipment filter.",
    },
];

const DUPLICATE_NAME: &str = "Filter with this name already exists for this user.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/equipment-filters/get_all", get(list))
        .route("/api/equipment-filters/create", post(create))
        .route("/api/equipment-filters/{id}/get", get(show))
        .route("/api/equipment-filters/{id}/update", put(update))
        .route("/api/equipment-filters/{id}/delete", delete(remove))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub name: Option<String>,
    pub equipment_ids: Option<Vec<String>>,
}

fn saved(outcome: FilterOutcome) -> Result<SavedEquipmentFilter, AppError> {
    match outcome {
        FilterOutcome::Saved(filter) => Ok(filter),
        FilterOutcome::DuplicateName => Err(AppError::bad_request(DUPLICATE_NAME)),
        FilterOutcome::NotFound => Err(AppError::not_found("Filter not found")),
    }
}

async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<SavedEquipmentFilter>>, AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    Ok(Json(list_filters(&state.db, user_id).await?))
}

async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedEquipmentFilter>), AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    let Json(request) = payload?;

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::bad_request("Filter name is required."))?;
    let equipment = request.equipment_ids.unwrap_or_default();

    let filter = saved(create_filter(&state.db, user_id, name, &equipment).await?)?;
    info!(user_id, filter_id = filter.id, "equipment filter created");

    Ok((StatusCode::CREATED, Json(filter)))
}

async fn show(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<SavedEquipmentFilter>, AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;

    let filter = find_filter(&state.db, id, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Filter not found"))?;

    Ok(Json(filter))
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Json<SavedEquipmentFilter>, AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    let Json(request) = payload?;

    let name = match request.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("Filter name cannot be empty.")),
        other => other,
    };

    let filter = saved(
        update_filter(
            &state.db,
            id,
            user_id,
            name,
            request.equipment_ids.as_deref(),
        )
        .await?,
    )?;
    info!(user_id, filter_id = filter.id, "equipment filter updated");

    Ok(Json(filter))
}

async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<StatusCode, AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;

    if !delete_filter(&state.db, id, user_id).await? {
        return Err(AppError::not_found("Filter not found"));
    }
    info!(user_id, filter_id = id, "equipment filter deleted");

    Ok(StatusCode::NO_CONTENT)
}
