use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full account row, including the password hash. Never serialized.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub expo_push_token: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub first_login: Option<DateTime<Utc>>,
}

/// Fields safe to return to clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub first_login: Option<DateTime<Utc>>,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image: user.profile_image.clone(),
            date_joined: user.date_joined,
            last_login: user.last_login,
            first_login: user.first_login,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub profile_image: Option<String>,
}

/// Summary of a completed workout shown on the profile page.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct RecentWorkout {
    pub id: i64,
    pub name: Option<String>,
    pub completed_date: Option<chrono::NaiveDate>,
    pub duration: Option<i16>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProfileStats {
    pub workouts_this_month: i64,
    pub workouts_all_time: i64,
    pub most_recent_completed: Option<RecentWorkout>,
    pub recent_workouts: Vec<RecentWorkout>,
    pub leaderboard: ScoreTotals,
    pub leaderboard_rank: i64,
}

#[derive(Clone, Copy, Debug, Default, Serialize, sqlx::FromRow)]
pub struct ScoreTotals {
    pub total_score: i32,
    pub weekly_score: i32,
    pub monthly_score: i32,
}
