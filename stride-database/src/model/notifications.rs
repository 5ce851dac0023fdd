use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ScheduledNotification {
    pub id: i64,
    #[serde(rename = "owner")]
    pub owner_id: Option<i64>,
    #[serde(rename = "workout")]
    pub workout_id: Option<i64>,
    pub scheduled_datetime: DateTime<Utc>,
    pub sent: bool,
    pub canceled: bool,
    pub cleared_by_user: bool,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewNotification<'a> {
    pub owner_id: i64,
    pub workout_id: Option<i64>,
    pub scheduled_datetime: DateTime<Utc>,
    pub title: &'a str,
    pub subtitle: &'a str,
    pub body: &'a str,
}

/// Pending notification joined with the owner's push token.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct DueNotification {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub expo_push_token: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub body: String,
}
