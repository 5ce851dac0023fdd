use chrono::{DateTime, Utc};

use crate::database::Database;
use crate::model::notifications::{DueNotification, NewNotification, ScheduledNotification};

const NOTIFICATION_COLUMNS: &str = "id, owner_id, workout_id, scheduled_datetime, sent, canceled, \
     cleared_by_user, title, subtitle, body, created_at, updated_at";

pub async fn schedule_notification(
    db: &Database,
    notification: NewNotification<'_>,
) -> anyhow::Result<ScheduledNotification> {
    let row = sqlx::query_as::<_, ScheduledNotification>(&format!(
        "INSERT INTO scheduled_notifications
             (owner_id, workout_id, scheduled_datetime, title, subtitle, body)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(notification.owner_id)
    .bind(notification.workout_id)
    .bind(notification.scheduled_datetime)
    .bind(notification.title)
    .bind(notification.subtitle)
    .bind(notification.body)
    .fetch_one(db.pool())
    .await?;

    Ok(row)
}

/// Sent, visible notifications, newest first.
pub async fn list_notifications(
    db: &Database,
    owner_id: i64,
) -> anyhow::Result<Vec<ScheduledNotification>> {
    let rows = sqlx::query_as::<_, ScheduledNotification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM scheduled_notifications
         WHERE owner_id = $1 AND sent = TRUE AND canceled = FALSE AND cleared_by_user = FALSE
         ORDER BY scheduled_datetime DESC, id DESC"
    ))
    .bind(owner_id)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}

/// Returns `false` when the notification is not the owner's.
pub async fn clear_notification(db: &Database, id: i64, owner_id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE scheduled_notifications SET cleared_by_user = TRUE, updated_at = NOW()
         WHERE id = $1 AND owner_id = $2",
    )
    .bind(id)
    .bind(owner_id)
    .execute(db.pool())
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn clear_all_notifications(db: &Database, owner_id: i64) -> anyhow::Result<u64> {
    let result = sqlx::query(
        "UPDATE scheduled_notifications SET cleared_by_user = TRUE, updated_at = NOW()
         WHERE owner_id = $1 AND sent = TRUE AND cleared_by_user = FALSE",
    )
    .bind(owner_id)
    .execute(db.pool())
    .await?;

    Ok(result.rows_affected())
}

/// Cancel a pending notification. Returns `false` when it is not the owner's
/// or was already sent.
pub async fn cancel_notification(db: &Database, id: i64, owner_id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE scheduled_notifications SET canceled = TRUE, updated_at = NOW()
         WHERE id = $1 AND owner_id = $2 AND sent = FALSE",
    )
    .bind(id)
    .bind(owner_id)
    .execute(db.pool())
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Pending notifications due at `now` whose owner has a push token, in id
/// order after `after_id`.
pub async fn due_notifications(
    db: &Database,
    now: DateTime<Utc>,
    after_id: i64,
    limit: i64,
) -> anyhow::Result<Vec<DueNotification>> {
    let rows = sqlx::query_as::<_, DueNotification>(
        "SELECT n.id, n.owner_id, u.expo_push_token, n.title, n.subtitle, n.body
         FROM scheduled_notifications n
         JOIN users u ON u.id = n.owner_id
         WHERE n.scheduled_datetime <= $1 AND n.sent = FALSE AND n.canceled = FALSE
           AND n.id > $2
           AND NULLIF(TRIM(u.expo_push_token), '') IS NOT NULL
         ORDER BY n.id ASC
         LIMIT $3",
    )
    .bind(now)
    .bind(after_id)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}

pub async fn mark_notification_sent(db: &Database, id: i64) -> anyhow::Result<()> {
    sqlx::query("UPDATE scheduled_notifications SET sent = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(db.pool())
        .await?;

    Ok(())
}
