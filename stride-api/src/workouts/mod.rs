pub mod complete;
pub mod manage;
pub mod query;
pub mod save;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use stride_core::AppState;

use crate::RouteMeta;

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "POST",
        path: "/api/saved_workouts/save-workout/",
        desc: "Saves a gym, running, mobility or HIIT workout.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/saved_workouts/get-all-workouts/",
        desc: "All of a user's workouts, newest first.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/saved_workouts/upcoming-workouts/",
        desc: "Scheduled workouts from today on, optionally limited.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/saved_workouts/get-single-workout/{workout_id}/",
        desc: "One workout with its full tree and recent movement history.",
    },
    RouteMeta {
        method: "PATCH",
        path: "/api/saved_workouts/update-workout-status/{workout_id}/",
        desc: "Sets a workout to Started, Completed or Scheduled.",
    },
    RouteMeta {
        method: "DELETE",
        path: "/api/saved_workouts/delete-workout/{workout_id}/",
        desc: "Deletes a workout and everything under it.",
    },
    RouteMeta {
        method: "PATCH",
        path: "/api/saved_workouts/update-workout-date/{workout_id}/",
        desc: "Moves a workout and its pending reminders to a new date.",
    },
    RouteMeta {
        method: "PUT",
        path: "/api/saved_workouts/complete-workout/{workout_id}/",
        desc: "Completes a gym workout, logging sets and awarding points.",
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/saved_workouts/save-workout/", post(save::save_workout))
        .route(
            "/api/saved_workouts/get-all-workouts/",
            get(query::all_workouts),
        )
        .route(
            "/api/saved_workouts/upcoming-workouts/",
            get(query::upcoming_workouts),
        )
        .route(
            "/api/saved_workouts/get-single-workout/{workout_id}/",
            get(query::single_workout),
        )
        .route(
            "/api/saved_workouts/update-workout-status/{workout_id}/",
            patch(manage::update_status),
        )
        .route(
            "/api/saved_workouts/delete-workout/{workout_id}/",
            delete(manage::delete),
        )
        .route(
            "/api/saved_workouts/update-workout-date/{workout_id}/",
            patch(manage::update_date),
        )
        .route(
            "/api/saved_workouts/complete-workout/{workout_id}/",
            put(complete::complete_gym),
        )
}
