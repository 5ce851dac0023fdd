use tracing::warn;

use crate::database::Database;
use crate::impls::completion::upsert_set;
use crate::model::workouts::LoggedSectionInput;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionLogReport {
    pub movements_updated: usize,
    pub sets_saved: usize,
    pub skipped: usize,
}

/// Store in-progress logging: difficulty, comments and sets per section movement.
pub async fn save_workout_details(
    db: &Database,
    sections: &[LoggedSectionInput],
) -> anyhow::Result<SectionLogReport> {
    let mut tx = db.begin().await?;
    let mut report = SectionLogReport::default();

    for section in sections {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sections WHERE id = $1)")
            .bind(section.section_id)
            .fetch_one(&mut *tx)
            .await?;

        if !exists {
            warn!(section_id = section.section_id, "section not found; skipping");
            report.skipped += 1;
            continue;
        }

        for logged in &section.movements {
            let updated = sqlx::query(
                "UPDATE section_movements SET
                     movement_difficulty = COALESCE($3, movement_difficulty),
                     movement_comment = COALESCE($4, movement_comment)
                 WHERE id = $1 AND section_id = $2",
            )
            .bind(logged.movement_id)
            .bind(section.section_id)
            .bind(logged.movement_difficulty)
            .bind(logged.movement_comments.as_deref())
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                warn!(
                    section_id = section.section_id,
                    section_movement_id = logged.movement_id,
                    "section movement not found; skipping"
                );
                report.skipped += 1;
                continue;
            }
            report.movements_updated += 1;

            for set in &logged.sets {
                upsert_set(
                    &mut *tx,
                    logged.movement_id,
                    set.set_number,
                    set.reps.unwrap_or(0),
                    set.weight.unwrap_or(0.0),
                )
                .await?;
                report.sets_saved += 1;
            }
        }
    }

    tx.commit().await?;
    Ok(report)
}
