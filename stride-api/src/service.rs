use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use stride_core::{AppError, AppState};

use crate::{RouteMeta, route_table};

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "GET",
        path: "/api/",
        desc: "Lists every available endpoint.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/health/",
        desc: "Checks that the database answers.",
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/", get(index))
        .route("/api/health/", get(health))
}

async fn index() -> Json<Value> {
    let routes = route_table()
        .map(|route| {
            json!({
                "method": route.method,
                "path": route.path,
                "description": route.desc,
            })
        })
        .collect::<Vec<_>>();

    Json(json!({ "routes": routes }))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.db.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}
