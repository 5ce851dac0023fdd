use chrono::NaiveDate;
use tracing::warn;

use crate::cache::invalidate_leaderboard;
use crate::database::Database;
use crate::model::users::{
    NewUser, ProfileStats, ProfileUpdate, RecentWorkout, ScoreTotals, UserRecord,
};

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, password_hash, \
     profile_image, expo_push_token, date_joined, last_login, first_login";

pub async fn find_user_by_id(db: &Database, user_id: i64) -> anyhow::Result<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(user)
}

/// Email lookups are case-insensitive.
pub async fn find_user_by_email(db: &Database, email: &str) -> anyhow::Result<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email.trim())
    .fetch_optional(db.pool())
    .await?;

    Ok(user)
}

pub async fn user_exists(db: &Database, user_id: i64) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(db.pool())
        .await?;

    Ok(exists)
}

/// Returns `true` when another account already uses `username`.
pub async fn username_taken(
    db: &Database,
    username: &str,
    except_user_id: Option<i64>,
) -> anyhow::Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM users
             WHERE username = $1 AND ($2::BIGINT IS NULL OR id <> $2)
         )",
    )
    .bind(username)
    .bind(except_user_id)
    .fetch_one(db.pool())
    .await?;

    Ok(taken)
}

/// Create the account and its leaderboard row together.
pub async fn create_user(db: &Database, new_user: NewUser<'_>) -> anyhow::Result<UserRecord> {
    let mut tx = db.begin().await?;

    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "INSERT INTO users (email, username, first_name, last_name, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(new_user.email.trim())
    .bind(new_user.username)
    .bind(new_user.first_name)
    .bind(new_user.last_name)
    .bind(new_user.password_hash)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO leaderboards (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if let Err(err) = invalidate_leaderboard(db.cache()).await {
        warn!(?err, user_id = user.id, "failed to invalidate leaderboard cache");
    }

    Ok(user)
}

pub async fn record_login(db: &Database, user_id: i64) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE users
         SET last_login = NOW(), first_login = COALESCE(first_login, NOW())
         WHERE id = $1",
    )
    .bind(user_id)
    .execute(db.pool())
    .await?;

    Ok(())
}

/// Apply the provided fields; absent fields keep their value.
pub async fn update_profile(
    db: &Database,
    user_id: i64,
    update: &ProfileUpdate,
) -> anyhow::Result<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        "UPDATE users SET
             first_name = COALESCE($2, first_name),
             last_name = COALESCE($3, last_name),
             username = COALESCE($4, username),
             profile_image = COALESCE($5, profile_image)
         WHERE id = $1
         RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(update.first_name.as_deref().map(str::trim))
    .bind(update.last_name.as_deref().map(str::trim))
    .bind(update.username.as_deref().map(str::trim))
    .bind(update.profile_image.as_deref())
    .fetch_optional(db.pool())
    .await?;

    Ok(user)
}

/// Returns `false` when the user does not exist.
pub async fn set_push_token(db: &Database, user_id: i64, token: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("UPDATE users SET expo_push_token = $2 WHERE id = $1")
        .bind(user_id)
        .bind(token.trim())
        .execute(db.pool())
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Workout counts, recent completions and leaderboard position for the profile page.
pub async fn profile_stats(
    db: &Database,
    user_id: i64,
    month_start: NaiveDate,
) -> anyhow::Result<ProfileStats> {
    let (workouts_this_month, workouts_all_time): (i64, i64) = sqlx::query_as(
        "SELECT
             COUNT(*) FILTER (WHERE completed_date >= $2),
             COUNT(*)
         FROM workouts
         WHERE owner_id = $1 AND status = 'Completed'",
    )
    .bind(user_id)
    .bind(month_start)
    .fetch_one(db.pool())
    .await?;

    let recent_workouts: Vec<RecentWorkout> = sqlx::query_as(
        "SELECT id, name, completed_date, duration
         FROM workouts
         WHERE owner_id = $1 AND status = 'Completed'
         ORDER BY completed_date DESC NULLS LAST, id DESC
         LIMIT 2",
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;

    let leaderboard: ScoreTotals = sqlx::query_as(
        "SELECT total_score, weekly_score, monthly_score FROM leaderboards WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?
    .unwrap_or_default();

    let higher: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM leaderboards WHERE total_score > $1")
            .bind(leaderboard.total_score)
            .fetch_one(db.pool())
            .await?;

    Ok(ProfileStats {
        workouts_this_month,
        workouts_all_time,
        most_recent_completed: recent_workouts.first().cloned(),
        recent_workouts,
        leaderboard,
        leaderboard_rank: higher + 1,
    })
}
