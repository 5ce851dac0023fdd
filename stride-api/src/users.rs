use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use serde_json::json;
use stride_core::auth::{hash_password, verify_password};
use stride_core::{AppError, AppState};
use stride_database::impls::leaderboard::get_leaderboard_entry;
use stride_database::impls::user_stats::find_user_stats;
use stride_database::impls::users::{
    create_user, find_user_by_email, find_user_by_id, profile_stats, record_login,
    update_profile, username_taken,
};
use stride_database::model::users::{NewUser, ProfileUpdate, PublicUser};
use stride_utils::time::{start_of_month, today_utc};
use tracing::info;

use crate::RouteMeta;
use crate::extract::{ApiPath, authorize};

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "POST",
        path: "/api/auth/register/",
        desc: "Creates an account and returns a bearer token.",
    },
    RouteMeta {
        method: "POST",
        path: "/api/auth/login/",
        desc: "Checks credentials and returns a bearer token.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/auth/profile/{user_id}/",
        desc: "Public profile fields.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/auth/full-profile/{user_id}/",
        desc: "Profile with leaderboard standing, stats and recent workouts.",
    },
    RouteMeta {
        method: "PATCH",
        path: "/api/auth/update-profile/{user_id}/",
        desc: "Updates name, username or profile image.",
    },
];

const USERNAME_LENGTH: usize = 15;
const MIN_PASSWORD_LENGTH: usize = 8;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register/", post(register))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/profile/{user_id}/", get(profile))
        .route("/api/auth/full-profile/{user_id}/", get(full_profile))
        .route("/api/auth/update-profile/{user_id}/", patch(update))
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// Field-level checks that need no database access.
pub fn validate_registration(request: &RegisterRequest) -> Result<(), String> {
    let email = request.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() || !email.contains('@') {
        return Err("Enter a valid email address.".to_owned());
    }

    if request
        .first_name
        .as_deref()
        .is_none_or(|name| name.trim().is_empty())
    {
        return Err("First name is required.".to_owned());
    }

    let password = request.password.as_deref().unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if password.chars().all(|ch| ch.is_ascii_digit()) {
        return Err("Password cannot be entirely numeric.".to_owned());
    }

    if let Some(confirmation) = request.password_confirmation.as_deref()
        && confirmation != password
    {
        return Err("Passwords do not match.".to_owned());
    }

    Ok(())
}

fn generate_username() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(USERNAME_LENGTH)
        .map(char::from)
        .collect()
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    validate_registration(&request).map_err(AppError::BadRequest)?;

    let email = request.email.as_deref().unwrap_or_default().trim();
    if find_user_by_email(&state.db, email).await?.is_some() {
        return Err(AppError::bad_request("A user with this email already exists."));
    }

    let username = match request
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        Some(name) => {
            if username_taken(&state.db, name, None).await? {
                return Err(AppError::bad_request("This username is already taken."));
            }
            name.to_owned()
        }
        None => generate_username(),
    };

    let password_hash = hash_password(request.password.as_deref().unwrap_or_default())?;
    let user = create_user(
        &state.db,
        NewUser {
            email,
            username: &username,
            first_name: request.first_name.as_deref().unwrap_or_default().trim(),
            last_name: request.last_name.as_deref().unwrap_or_default().trim(),
            password_hash: &password_hash,
        },
    )
    .await?;

    let token = state.tokens.issue(user.id, Utc::now().timestamp())?;
    info!(user_id = user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("User {} registered successfully.", user.email),
            "token": token,
        })),
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;

    let email = request.email.as_deref().map(str::trim).unwrap_or_default();
    let password = request.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Email and password are required." })),
        )
            .into_response());
    }

    let Some(user) = find_user_by_email(&state.db, email).await? else {
        return Err(AppError::forbidden("Invalid credentials"));
    };
    if !verify_password(password, &user.password_hash) {
        return Err(AppError::forbidden("Invalid credentials"));
    }

    record_login(&state.db, user.id).await?;
    let token = state.tokens.issue(user.id, Utc::now().timestamp())?;
    info!(user_id = user.id, "user logged in");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": format!("Welcome back, {}", user.email),
            "token": token,
            "user_id": user.id,
            "user": {
                "email": user.email,
                "first_name": user.first_name,
                "last_name": user.last_name,
            },
        })),
    )
        .into_response())
}

async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<PublicUser>, AppError> {
    authorize(&state, &headers, user_id)?;

    let user = find_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(PublicUser::from(&user)))
}

async fn full_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    authorize(&state, &headers, user_id)?;

    let user = find_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let leaderboard = get_leaderboard_entry(&state.db, user_id).await?;
    let user_stats = find_user_stats(&state.db, user_id).await?;
    let stats = profile_stats(&state.db, user_id, start_of_month(today_utc())).await?;

    Ok(Json(json!({
        "user": PublicUser::from(&user),
        "leaderboard": leaderboard,
        "user_stats": user_stats,
        "stats": stats,
    })))
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    authorize(&state, &headers, user_id)?;
    let Json(mut changes) = payload?;

    if let Some(first_name) = changes.first_name.as_mut() {
        let trimmed = first_name.trim();
        if trimmed.is_empty() {
            return Err(AppError::bad_request("First name cannot be empty."));
        }
        *first_name = trimmed.to_owned();
    }

    if let Some(username) = changes.username.as_mut() {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(AppError::bad_request("Username cannot be empty."));
        }
        if username_taken(&state.db, trimmed, Some(user_id)).await? {
            return Err(AppError::bad_request("This username is already taken."));
        }
        *username = trimmed.to_owned();
    }

    let user = update_profile(&state.db, user_id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(user_id, "profile updated");

    Ok(Json(PublicUser::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::{RegisterRequest, generate_username, validate_registration};

    fn request(password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some("runner@example.com".to_owned()),
            first_name: Some("Sam".to_owned()),
            password: Some(password.to_owned()),
            ..RegisterRequest::default()
        }
    }

    #[test]
    fn accepts_reasonable_registration() {
        assert!(validate_registration(&request("longenough1")).is_ok());
    }

    #[test]
    fn rejects_weak_passwords() {
        assert!(validate_registration(&request("short")).is_err());
        assert!(validate_registration(&request("12345678")).is_err());
    }

    #[test]
    fn rejects_bad_email_and_missing_name() {
        let mut bad_email = request("longenough1");
        bad_email.email = Some("not-an-email".to_owned());
        assert!(validate_registration(&bad_email).is_err());

        let mut no_name = request("longenough1");
        no_name.first_name = Some("  ".to_owned());
        assert!(validate_registration(&no_name).is_err());
    }

    #[test]
    fn confirmation_must_match() {
        let mut mismatch = request("longenough1");
        mismatch.password_confirmation = Some("different1".to_owned());
        assert_eq!(
            validate_registration(&mismatch).unwrap_err(),
            "Passwords do not match."
        );
    }

    #[test]
    fn generated_usernames_are_alphanumeric() {
        let name = generate_username();
        assert_eq!(name.len(), 15);
        assert!(name.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }
}
