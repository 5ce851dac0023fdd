use std::collections::BTreeSet;

use chrono::NaiveDate;
use sqlx::PgConnection;
use stride_utils::strength::is_tracked_set;
use tracing::{info, warn};

use crate::cache::invalidate_leaderboard;
use crate::database::Database;
use crate::impls::movement_stats::{NewStrengthSet, insert_strength_set, recalc_movement_summaries};
use crate::impls::scoring::award;
use crate::model::scoring::{ScoreKey, ScoreType};
use crate::model::sessions::{RunCompletion, SessionFeedback};
use crate::model::workouts::{ActivityType, LoggedSectionInput, WorkoutStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed { points_awarded: i32 },
    NotFound,
}

/// Tally of submitted split times for the full-splits bonus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplitTally {
    pub submitted: usize,
    pub missing: usize,
    pub unlogged: usize,
}

impl SplitTally {
    pub fn record(&mut self, actual_time: Option<i32>) {
        self.submitted += 1;
        if actual_time.is_none_or(|time| time == 0) {
            self.unlogged += 1;
        }
    }

    pub fn record_missing(&mut self) {
        self.missing += 1;
    }

    /// At least one split submitted, none missing, and every one carries a time.
    pub fn fully_logged(&self) -> bool {
        self.submitted > 0 && self.missing == 0 && self.unlogged == 0
    }
}

/// Lock the workout for completion when it belongs to `owner_id` and has the
/// expected activity.
async fn lock_workout(
    conn: &mut PgConnection,
    workout_id: i64,
    owner_id: i64,
    activity: Option<ActivityType>,
) -> anyhow::Result<bool> {
    let found: Option<Option<String>> = sqlx::query_scalar(
        "SELECT activity_type FROM workouts WHERE id = $1 AND owner_id = $2 FOR UPDATE",
    )
    .bind(workout_id)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(match (found, activity) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(stored), Some(expected)) => stored.as_deref() == Some(expected.as_str()),
    })
}

async fn mark_completed(
    conn: &mut PgConnection,
    workout_id: i64,
    completed_date: NaiveDate,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE workouts SET status = $2, completed_date = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(workout_id)
    .bind(WorkoutStatus::Completed.as_str())
    .bind(completed_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn award_points(
    conn: &mut PgConnection,
    user_id: i64,
    score_type: ScoreType,
    key: ScoreKey,
) -> anyhow::Result<i32> {
    if award(conn, user_id, score_type, key).await? {
        Ok(score_type.points())
    } else {
        Ok(0)
    }
}

async fn after_commit(db: &Database, points_awarded: i32) {
    if points_awarded == 0 {
        return;
    }
    if let Err(err) = invalidate_leaderboard(db.cache()).await {
        warn!(?err, "failed to invalidate leaderboard cache");
    }
}

/// Complete a gym workout: status, sets, strength records and points in one
/// transaction; movement summaries are refreshed afterwards.
pub async fn complete_gym_workout(
    db: &Database,
    workout_id: i64,
    user_id: i64,
    sections: &[LoggedSectionInput],
    today: NaiveDate,
) -> anyhow::Result<CompletionOutcome> {
    let mut tx = db.begin().await?;

    if !lock_workout(&mut *tx, workout_id, user_id, None).await? {
        return Ok(CompletionOutcome::NotFound);
    }

    mark_completed(&mut *tx, workout_id, today).await?;
    let mut points_awarded = award_points(
        &mut *tx,
        user_id,
        ScoreType::WorkoutCompletion,
        ScoreKey::Workout(workout_id),
    )
    .await?;

    // Strength records for this workout are rebuilt from the submitted sets.
    let cleared: Vec<i64> =
        sqlx::query_scalar("DELETE FROM strength_sets WHERE workout_id = $1 RETURNING movement_id")
            .bind(workout_id)
            .fetch_all(&mut *tx)
            .await?;

    let mut touched_movements: BTreeSet<i64> = cleared.into_iter().collect();

    for section in sections {
        for logged in &section.movements {
            let catalog_movement: Option<Option<i64>> = sqlx::query_scalar(
                "SELECT sm.movement_id
                 FROM section_movements sm
                 JOIN sections s ON s.id = sm.section_id
                 WHERE sm.id = $1 AND s.id = $2 AND s.workout_id = $3",
            )
            .bind(logged.movement_id)
            .bind(section.section_id)
            .bind(workout_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(catalog_movement) = catalog_movement else {
                warn!(
                    workout_id,
                    section_id = section.section_id,
                    section_movement_id = logged.movement_id,
                    "section movement not part of workout; skipping"
                );
                continue;
            };

            if let Some(difficulty) = logged.movement_difficulty {
                sqlx::query("UPDATE section_movements SET movement_difficulty = $2 WHERE id = $1")
                    .bind(logged.movement_id)
                    .bind(difficulty)
                    .execute(&mut *tx)
                    .await?;
            }

            let mut has_tracked_set = false;
            for set in &logged.sets {
                let reps = set.reps.unwrap_or(0);
                let weight = set.weight.unwrap_or(0.0);

                upsert_set(&mut *tx, logged.movement_id, set.set_number, reps, weight).await?;

                if let Some(movement_id) = catalog_movement {
                    insert_strength_set(
                        &mut *tx,
                        NewStrengthSet {
                            owner_id: user_id,
                            movement_id,
                            workout_id: Some(workout_id),
                            performed_date: today,
                            set_number: set.set_number,
                            reps,
                            weight,
                            rpe: logged.movement_difficulty.map_or(0.0, f64::from),
                        },
                    )
                    .await?;
                    touched_movements.insert(movement_id);
                }

                has_tracked_set |= is_tracked_set(reps, weight);
            }

            if has_tracked_set {
                points_awarded += award_points(
                    &mut *tx,
                    user_id,
                    ScoreType::MovementScore,
                    ScoreKey::SectionMovement(logged.movement_id),
                )
                .await?;
            }
        }
    }

    tx.commit().await?;
    after_commit(db, points_awarded).await;

    for movement_id in touched_movements {
        if let Err(err) = recalc_movement_summaries(db, user_id, Some(movement_id)).await {
            warn!(?err, user_id, movement_id, "movement summary refresh failed");
        }
    }

    info!(workout_id, user_id, points_awarded, "gym workout completed");
    Ok(CompletionOutcome::Completed { points_awarded })
}

/// Insert a set, or overwrite reps/weight of the existing set with the same number.
pub(crate) async fn upsert_set(
    conn: &mut PgConnection,
    section_movement_id: i64,
    set_number: Option<i16>,
    reps: i16,
    weight: f64,
) -> anyhow::Result<()> {
    let updated = sqlx::query(
        "UPDATE sets SET reps = $3, weight = $4
         WHERE section_movement_id = $1 AND set_number IS NOT DISTINCT FROM $2",
    )
    .bind(section_movement_id)
    .bind(set_number)
    .bind(reps)
    .bind(weight)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        sqlx::query(
            "INSERT INTO sets (section_movement_id, set_number, reps, weight) VALUES ($1, $2, $3, $4)",
        )
        .bind(section_movement_id)
        .bind(set_number)
        .bind(reps)
        .bind(weight)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Complete a running workout and log its split times.
pub async fn complete_run(
    db: &Database,
    workout_id: i64,
    user_id: i64,
    completion: &RunCompletion,
    completed_date: NaiveDate,
) -> anyhow::Result<CompletionOutcome> {
    let mut tx = db.begin().await?;

    if !lock_workout(&mut *tx, workout_id, user_id, Some(ActivityType::Running)).await? {
        return Ok(CompletionOutcome::NotFound);
    }

    mark_completed(&mut *tx, workout_id, completed_date).await?;
    let mut points_awarded = award_points(
        &mut *tx,
        user_id,
        ScoreType::WorkoutCompletion,
        ScoreKey::Workout(workout_id),
    )
    .await?;

    sqlx::query(
        "UPDATE saved_running_sessions SET
             rpe = COALESCE($2, rpe),
             comments = COALESCE($3, comments),
             updated_at = NOW()
         WHERE workout_id = $1",
    )
    .bind(workout_id)
    .bind(completion.rpe)
    .bind(completion.comments.as_deref())
    .execute(&mut *tx)
    .await?;

    let mut tally = SplitTally::default();

    for interval in &completion.intervals {
        let belongs: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM saved_running_intervals i
                 JOIN saved_running_sessions s ON s.id = i.saved_session_id
                 WHERE i.id = $1 AND s.workout_id = $2
             )",
        )
        .bind(interval.id)
        .bind(workout_id)
        .fetch_one(&mut *tx)
        .await?;

        if !belongs {
            warn!(workout_id, interval_id = interval.id, "interval not found; skipping");
            tally.record_missing();
            continue;
        }

        for split in &interval.split_times {
            let stored: Option<Option<i32>> = sqlx::query_scalar(
                "UPDATE saved_running_split_times SET
                     actual_time = COALESCE($3, actual_time),
                     comments = COALESCE($4, comments)
                 WHERE id = $1 AND saved_interval_id = $2
                 RETURNING actual_time",
            )
            .bind(split.id)
            .bind(interval.id)
            .bind(split.actual_time)
            .bind(split.comments.as_deref())
            .fetch_optional(&mut *tx)
            .await?;

            match stored {
                Some(actual_time) => tally.record(actual_time),
                None => {
                    warn!(workout_id, split_id = split.id, "split time not found; skipping");
                    tally.record_missing();
                }
            }
        }
    }

    if tally.fully_logged() {
        points_awarded += award_points(
            &mut *tx,
            user_id,
            ScoreType::FullRunningSplits,
            ScoreKey::Workout(workout_id),
        )
        .await?;
    }

    tx.commit().await?;
    after_commit(db, points_awarded).await;

    info!(workout_id, user_id, points_awarded, splits = tally.submitted, "run completed");
    Ok(CompletionOutcome::Completed { points_awarded })
}

/// Complete a mobility or HIIT workout, storing the session feedback.
pub async fn complete_session(
    db: &Database,
    workout_id: i64,
    user_id: i64,
    activity: ActivityType,
    feedback: &SessionFeedback,
    today: NaiveDate,
) -> anyhow::Result<CompletionOutcome> {
    let session_table = match activity {
        ActivityType::Mobility => "saved_mobility_sessions",
        ActivityType::Hiit => "saved_hiit_workouts",
        ActivityType::Gym | ActivityType::Running => {
            anyhow::bail!("{} workouts have their own completion flow", activity.as_str())
        }
    };

    let mut tx = db.begin().await?;

    if !lock_workout(&mut *tx, workout_id, user_id, Some(activity)).await? {
        return Ok(CompletionOutcome::NotFound);
    }

    mark_completed(&mut *tx, workout_id, today).await?;
    let points_awarded = award_points(
        &mut *tx,
        user_id,
        ScoreType::WorkoutCompletion,
        ScoreKey::Workout(workout_id),
    )
    .await?;

    sqlx::query(&format!(
        "UPDATE {session_table} SET
             rpe = COALESCE($2, rpe),
             comments = COALESCE($3, comments),
             updated_at = NOW()
         WHERE workout_id = $1"
    ))
    .bind(workout_id)
    .bind(feedback.rpe)
    .bind(feedback.comments.as_deref())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    after_commit(db, points_awarded).await;

    info!(workout_id, user_id, activity = activity.as_str(), points_awarded, "session completed");
    Ok(CompletionOutcome::Completed { points_awarded })
}

#[cfg(test)]
mod tests {
    use super::SplitTally;

    #[test]
    fn splits_need_a_time_each() {
        let mut tally = SplitTally::default();
        tally.record(Some(92));
        tally.record(Some(95));
        assert!(tally.fully_logged());

        tally.record(Some(0));
        assert!(!tally.fully_logged());
    }

    #[test]
    fn missing_splits_block_the_bonus() {
        let mut tally = SplitTally::default();
        tally.record(Some(92));
        tally.record_missing();
        assert!(!tally.fully_logged());
    }

    #[test]
    fn null_times_count_as_unlogged() {
        let mut tally = SplitTally::default();
        tally.record(None);
        assert!(!tally.fully_logged());
    }

    #[test]
    fn nothing_submitted_earns_nothing() {
        assert!(!SplitTally::default().fully_logged());
    }
}
