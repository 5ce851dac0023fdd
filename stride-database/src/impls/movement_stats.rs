use chrono::NaiveDate;
use sqlx::PgConnection;
use stride_utils::strength::{epley_one_rep_max, set_load};
use tracing::debug;

use crate::database::Database;
use crate::model::stats::{MovementSummary, MovementSummaryReport, StrengthSet};

#[derive(Clone, Copy, Debug)]
pub struct NewStrengthSet {
    pub owner_id: i64,
    pub movement_id: i64,
    pub workout_id: Option<i64>,
    pub performed_date: NaiveDate,
    pub set_number: Option<i16>,
    pub reps: i16,
    pub weight: f64,
    pub rpe: f64,
}

/// Best set of a movement: highest weight, ties broken by more reps.
pub fn best_set(sets: &[(f64, i16)]) -> Option<(f64, i16)> {
    sets.iter().copied().reduce(|best, candidate| {
        let heavier = candidate.0 > best.0;
        let same_weight_more_reps = candidate.0 == best.0 && candidate.1 > best.1;
        if heavier || same_weight_more_reps {
            candidate
        } else {
            best
        }
    })
}

pub async fn insert_strength_set(conn: &mut PgConnection, set: NewStrengthSet) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO strength_sets
             (owner_id, movement_id, workout_id, performed_date, set_number, reps, weight, rpe, load)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(set.owner_id)
    .bind(set.movement_id)
    .bind(set.workout_id)
    .bind(set.performed_date)
    .bind(set.set_number)
    .bind(set.reps)
    .bind(set.weight)
    .bind(set.rpe)
    .bind(set_load(set.weight, set.reps))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Recompute one user's summaries, optionally for a single movement.
/// Summaries whose movement has no remaining sets are removed.
pub async fn recalc_movement_summaries(
    db: &Database,
    owner_id: i64,
    movement_id: Option<i64>,
) -> anyhow::Result<usize> {
    let rows: Vec<(i64, f64, i16)> = sqlx::query_as(
        "SELECT movement_id, weight, reps FROM strength_sets
         WHERE owner_id = $1 AND ($2::BIGINT IS NULL OR movement_id = $2)
         ORDER BY movement_id",
    )
    .bind(owner_id)
    .bind(movement_id)
    .fetch_all(db.pool())
    .await?;

    let mut per_movement: Vec<(i64, Vec<(f64, i16)>)> = Vec::new();
    for (movement, weight, reps) in rows {
        match per_movement.last_mut() {
            Some((current, sets)) if *current == movement => sets.push((weight, reps)),
            _ => per_movement.push((movement, vec![(weight, reps)])),
        }
    }

    let mut tx = db.begin().await?;

    let kept: Vec<i64> = per_movement.iter().map(|(movement, _)| *movement).collect();
    sqlx::query(
        "DELETE FROM movement_summaries
         WHERE owner_id = $1
           AND ($2::BIGINT IS NULL OR movement_id = $2)
           AND NOT (movement_id = ANY($3))",
    )
    .bind(owner_id)
    .bind(movement_id)
    .bind(&kept)
    .execute(&mut *tx)
    .await?;

    for (movement, sets) in &per_movement {
        let Some((best_weight, best_reps)) = best_set(sets) else {
            continue;
        };
        let best_reps = f64::from(best_reps);

        sqlx::query(
            "INSERT INTO movement_summaries (owner_id, movement_id, best_weight, best_reps, estimated_1rm)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (owner_id, movement_id) DO UPDATE SET
                 best_weight = EXCLUDED.best_weight,
                 best_reps = EXCLUDED.best_reps,
                 estimated_1rm = EXCLUDED.estimated_1rm",
        )
        .bind(owner_id)
        .bind(movement)
        .bind(best_weight)
        .bind(best_reps)
        .bind(epley_one_rep_max(best_weight, best_reps))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    debug!(owner_id, movements = per_movement.len(), "movement summaries recalculated");
    Ok(per_movement.len())
}

/// Owners with at least one strength set or summary.
pub async fn owners_with_strength_data(db: &Database) -> anyhow::Result<Vec<i64>> {
    let owners: Vec<i64> = sqlx::query_scalar(
        "SELECT owner_id FROM strength_sets WHERE owner_id IS NOT NULL
         UNION
         SELECT owner_id FROM movement_summaries WHERE owner_id IS NOT NULL
         ORDER BY 1",
    )
    .fetch_all(db.pool())
    .await?;

    Ok(owners)
}

pub async fn movement_summary_report(
    db: &Database,
    owner_id: i64,
) -> anyhow::Result<MovementSummaryReport> {
    let summaries = sqlx::query_as::<_, MovementSummary>(
        "SELECT id, owner_id, movement_id, best_weight, best_reps, estimated_1rm
         FROM movement_summaries WHERE owner_id = $1 ORDER BY movement_id",
    )
    .bind(owner_id)
    .fetch_all(db.pool())
    .await?;

    let strength_sets = sqlx::query_as::<_, StrengthSet>(
        "SELECT id, owner_id, movement_id, workout_id, performed_date, set_number,
                reps, weight, rpe, load
         FROM strength_sets WHERE owner_id = $1
         ORDER BY performed_date DESC, id DESC",
    )
    .bind(owner_id)
    .fetch_all(db.pool())
    .await?;

    Ok(MovementSummaryReport {
        summaries,
        strength_sets,
    })
}

#[cfg(test)]
mod tests {
    use super::best_set;

    #[test]
    fn heaviest_set_wins() {
        assert_eq!(best_set(&[(60.0, 8), (80.0, 3), (70.0, 5)]), Some((80.0, 3)));
    }

    #[test]
    fn ties_prefer_more_reps() {
        assert_eq!(best_set(&[(80.0, 3), (80.0, 6), (80.0, 4)]), Some((80.0, 6)));
    }

    #[test]
    fn no_sets_no_best() {
        assert_eq!(best_set(&[]), None);
    }
}
