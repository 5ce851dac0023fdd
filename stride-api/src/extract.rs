use axum::extract::{FromRequestParts, Path, Query};
use axum::http::{HeaderMap, header::AUTHORIZATION, request::Parts};
use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stride_core::auth::bearer_token;
use stride_core::{AppError, AppState};
use stride_database::impls::users::user_exists;

/// [`Path`] whose rejection renders as an [`AppError`] body.
#[derive(Clone, Copy, Debug)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// [`Query`] whose rejection renders as an [`AppError`] body.
#[derive(Clone, Copy, Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `?user_id=` as sent by the mobile client.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

pub fn parse_user_id(raw: Option<&str>) -> Result<i64, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("user_id is required"))?;

    raw.parse::<i64>()
        .map_err(|_| AppError::bad_request("Invalid user ID"))
}

/// Body ids arrive as numbers or numeric strings.
pub fn id_from_json(value: Option<&Value>) -> Result<i64, AppError> {
    match value {
        None | Some(Value::Null) => Err(AppError::bad_request("user_id is required")),
        Some(Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| AppError::bad_request("Invalid user ID")),
        Some(Value::String(raw)) => parse_user_id(Some(raw)),
        Some(_) => Err(AppError::bad_request("Invalid user ID")),
    }
}

/// Verifies the bearer token when one is sent. Its subject must be `user_id`.
pub fn authorize(state: &AppState, headers: &HeaderMap, user_id: i64) -> Result<(), AppError> {
    match token_subject(state, headers)? {
        Some(subject) if subject != user_id => Err(AppError::forbidden(
            "Token does not belong to this user",
        )),
        _ => Ok(()),
    }
}

/// Subject of the bearer token, `None` when no Authorization header is sent.
pub fn token_subject(state: &AppState, headers: &HeaderMap) -> Result<Option<i64>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| AppError::forbidden("Invalid authorization header"))?;

    let claims = state
        .tokens
        .verify(token, Utc::now().timestamp())
        .map_err(|err| AppError::forbidden(format!("Invalid token: {err}")))?;

    Ok(Some(claims.sub))
}

/// Parses and authorizes the query `user_id`.
pub fn acting_user(
    state: &AppState,
    headers: &HeaderMap,
    query: &UserQuery,
) -> Result<i64, AppError> {
    let user_id = parse_user_id(query.user_id.as_deref())?;
    authorize(state, headers, user_id)?;
    Ok(user_id)
}

/// Like [`acting_user`], then 404 when the account does not exist.
pub async fn existing_user(
    state: &AppState,
    headers: &HeaderMap,
    query: &UserQuery,
) -> Result<i64, AppError> {
    let user_id = acting_user(state, headers, query)?;
    if !user_exists(&state.db, user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    Ok(user_id)
}

/// Owner to scope a workout lookup by: the query `user_id`, else the token subject.
pub fn optional_actor(
    state: &AppState,
    headers: &HeaderMap,
    query: &UserQuery,
) -> Result<Option<i64>, AppError> {
    if query
        .user_id
        .as_deref()
        .is_some_and(|raw| !raw.trim().is_empty())
    {
        return acting_user(state, headers, query).map(Some);
    }

    token_subject(state, headers)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{id_from_json, parse_user_id};

    #[test]
    fn query_ids_are_validated() {
        assert_eq!(parse_user_id(Some("12")).unwrap(), 12);
        assert_eq!(parse_user_id(Some(" 7 ")).unwrap(), 7);
        assert_eq!(
            parse_user_id(None).unwrap_err().to_string(),
            "user_id is required"
        );
        assert_eq!(
            parse_user_id(Some("abc")).unwrap_err().to_string(),
            "Invalid user ID"
        );
    }

    #[test]
    fn body_ids_accept_numbers_and_strings() {
        assert_eq!(id_from_json(Some(&json!(5))).unwrap(), 5);
        assert_eq!(id_from_json(Some(&json!("9"))).unwrap(), 9);
        assert!(id_from_json(Some(&json!(null))).is_err());
        assert!(id_from_json(Some(&json!(["x"]))).is_err());
        assert!(id_from_json(None).is_err());
    }
}
