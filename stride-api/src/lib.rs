pub mod catalog;
pub mod chat;
pub mod equipment_filters;
pub mod extract;
pub mod leaderboard;
pub mod notifications;
pub mod plans;
pub mod sections;
pub mod service;
pub mod sessions;
pub mod stats;
pub mod users;
pub mod workouts;

use axum::Router;
use stride_core::AppState;

pub struct RouteMeta {
    pub method: &'static str,
    pub path: &'static str,
    pub desc: &'static str,
}

pub const ROUTES: &[&[RouteMeta]] = &[
    service::ROUTES,
    users::ROUTES,
    catalog::ROUTES,
    workouts::ROUTES,
    sections::ROUTES,
    sessions::ROUTES,
    leaderboard::ROUTES,
    notifications::ROUTES,
    stats::ROUTES,
    equipment_filters::ROUTES,
    plans::ROUTES,
    chat::ROUTES,
];

pub fn route_table() -> impl Iterator<Item = &'static RouteMeta> {
    ROUTES.iter().flat_map(|group| group.iter())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(service::routes())
        .merge(users::routes())
        .merge(catalog::routes())
        .merge(workouts::routes())
        .merge(sections::routes())
        .merge(sessions::routes())
        .merge(leaderboard::routes())
        .merge(notifications::routes())
        .merge(stats::routes())
        .merge(equipment_filters::routes())
        .merge(plans::routes())
        .merge(chat::routes())
        .with_state(state)
}
