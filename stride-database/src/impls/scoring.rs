use sqlx::PgConnection;

use crate::database::Database;
use crate::model::scoring::{ScoreKey, ScoreLog, ScoreType};

/// Award `score_type` once per key. Runs on the caller's transaction; returns
/// `false` when the ledger already holds this award.
///
/// The user's leaderboard row is created if needed and locked before the ledger
/// check, so concurrent completions of the same workout serialize here.
pub async fn award(
    conn: &mut PgConnection,
    user_id: i64,
    score_type: ScoreType,
    key: ScoreKey,
) -> anyhow::Result<bool> {
    sqlx::query("INSERT INTO leaderboards (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("SELECT user_id FROM leaderboards WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let (workout_id, section_movement_id) = match key {
        ScoreKey::Workout(id) => (Some(id), None),
        ScoreKey::SectionMovement(id) => (None, Some(id)),
    };

    let already_awarded: bool = match key {
        ScoreKey::Workout(id) => {
            sqlx::query_scalar(
                "SELECT EXISTS (
                     SELECT 1 FROM score_logs
                     WHERE user_id = $1 AND score_type = $2 AND workout_id = $3
                 )",
            )
            .bind(user_id)
            .bind(score_type.label())
            .bind(id)
            .fetch_one(&mut *conn)
            .await?
        }
        ScoreKey::SectionMovement(id) => {
            sqlx::query_scalar(
                "SELECT EXISTS (
                     SELECT 1 FROM score_logs
                     WHERE user_id = $1 AND score_type = $2 AND section_movement_id = $3
                 )",
            )
            .bind(user_id)
            .bind(score_type.label())
            .bind(id)
            .fetch_one(&mut *conn)
            .await?
        }
    };

    if already_awarded {
        return Ok(false);
    }

    let points = score_type.points();

    sqlx::query(
        "INSERT INTO score_logs (user_id, score_type, score_value, workout_id, section_movement_id)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(score_type.label())
    .bind(points)
    .bind(workout_id)
    .bind(section_movement_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "UPDATE leaderboards SET
             total_score = total_score + $2,
             weekly_score = weekly_score + $2,
             monthly_score = monthly_score + $2,
             last_updated = NOW()
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(points)
    .execute(&mut *conn)
    .await?;

    Ok(true)
}

/// The user's ledger, newest first.
pub async fn list_score_log(db: &Database, user_id: i64) -> anyhow::Result<Vec<ScoreLog>> {
    let rows = sqlx::query_as::<_, ScoreLog>(
        "SELECT id, user_id, score_type, score_value, timestamp, workout_id, section_movement_id
         FROM score_logs
         WHERE user_id = $1
         ORDER BY timestamp DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}
