use std::collections::HashMap;

use crate::cache::{CATALOG_CACHE_TTL, catalog_key};
use crate::database::Database;
use crate::model::catalog::{
    ConditioningDetail, ConditioningOverview, Equipment, EquipmentCombo, MobilityWorkout,
    MobilityWorkoutDetail, Movement, RunningInterval, RunningSession, SuggestedStrength,
    SuggestedStrengthDetail,
};

pub(crate) const MOVEMENT_COLUMNS: &str = "id, body_area, movement, exercise, complexity, \
     movement_type, primary_body_part, landscape_video_url, portrait_video_url, landscape_thumbnail";

#[derive(sqlx::FromRow)]
struct ComboRow {
    combo_id: i64,
    movement_id: i64,
    combo_label: Option<String>,
    equipment_name: Option<String>,
}

/// Every catalog movement ordered by id, with its equipment combos.
pub async fn list_movements(db: &Database) -> anyhow::Result<Vec<Movement>> {
    let cache_key = catalog_key(db.cache(), "movements");
    db.cache()
        .get_or_load_json(&cache_key, CATALOG_CACHE_TTL, || async {
            let mut movements = sqlx::query_as::<_, Movement>(&format!(
                "SELECT {MOVEMENT_COLUMNS} FROM movements ORDER BY id"
            ))
            .fetch_all(db.pool())
            .await?;

            let combos = sqlx::query_as::<_, ComboRow>(
                "SELECT em.id AS combo_id, em.movement_id, em.combo_label, e.equipment_name
                 FROM equipment_movements em
                 LEFT JOIN equipment_movement_items emi ON emi.equipment_movement_id = em.id
                 LEFT JOIN equipment e ON e.id = emi.equipment_id
                 WHERE em.movement_id IS NOT NULL
                 ORDER BY em.id, e.equipment_name",
            )
            .fetch_all(db.pool())
            .await?;

            attach_combos(&mut movements, combos);
            Ok(movements)
        })
        .await
}

fn attach_combos(movements: &mut [Movement], rows: Vec<ComboRow>) {
    let index: HashMap<i64, usize> = movements
        .iter()
        .enumerate()
        .map(|(position, movement)| (movement.id, position))
        .collect();

    let mut last_combo: Option<i64> = None;
    for row in rows {
        let Some(&position) = index.get(&row.movement_id) else {
            continue;
        };
        let combos = &mut movements[position].equipment_combos;
        if last_combo != Some(row.combo_id) {
            combos.push(EquipmentCombo {
                combo_label: row.combo_label,
                equipment: Vec::new(),
            });
            last_combo = Some(row.combo_id);
        }
        if let (Some(name), Some(combo)) = (row.equipment_name, combos.last_mut()) {
            combo.equipment.push(name);
        }
    }
}

/// Resolve a catalog movement by its `exercise` name (first match by id).
pub async fn find_movement_id_by_exercise<'e, E>(
    executor: E,
    exercise: &str,
) -> anyhow::Result<Option<i64>>
where
    E: sqlx::PgExecutor<'e>,
{
    let id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM movements WHERE exercise = $1 ORDER BY id LIMIT 1")
            .bind(exercise.trim())
            .fetch_optional(executor)
            .await?;

    Ok(id)
}

pub async fn list_equipment(db: &Database) -> anyhow::Result<Vec<Equipment>> {
    let cache_key = catalog_key(db.cache(), "equipment");
    db.cache()
        .get_or_load_json(&cache_key, CATALOG_CACHE_TTL, || async {
            let rows = sqlx::query_as::<_, Equipment>(
                "SELECT id, equipment_name FROM equipment ORDER BY equipment_name",
            )
            .fetch_all(db.pool())
            .await?;
            Ok(rows)
        })
        .await
}

pub async fn list_running_sessions(db: &Database) -> anyhow::Result<Vec<RunningSession>> {
    let cache_key = catalog_key(db.cache(), "running_sessions");
    db.cache()
        .get_or_load_json(&cache_key, CATALOG_CACHE_TTL, || async {
            let mut sessions = sqlx::query_as::<_, RunningSession>(
                "SELECT id, session_type, session_name, duration, warmup_distance,
                        cool_down_distance, total_distance, notes
                 FROM running_sessions ORDER BY id",
            )
            .fetch_all(db.pool())
            .await?;

            let intervals = sqlx::query_as::<_, RunningInterval>(
                "SELECT id, session_id, repeat_variation, repeats, repeat_distance, target_pace, rest_time
                 FROM running_intervals ORDER BY session_id, repeat_variation, id",
            )
            .fetch_all(db.pool())
            .await?;

            let mut grouped = group_by(intervals, |interval| Some(interval.session_id));
            for session in &mut sessions {
                session.intervals = grouped.remove(&session.id).unwrap_or_default();
            }
            Ok(sessions)
        })
        .await
}

pub async fn find_running_session<'e, E>(
    executor: E,
    session_id: i64,
) -> anyhow::Result<Option<RunningSession>>
where
    E: sqlx::PgExecutor<'e>,
{
    let session = sqlx::query_as::<_, RunningSession>(
        "SELECT id, session_type, session_name, duration, warmup_distance,
                cool_down_distance, total_distance, notes
         FROM running_sessions WHERE id = $1",
    )
    .bind(session_id)
    .fetch_optional(executor)
    .await?;

    Ok(session)
}

/// Catalog intervals for one running session, used when saving a run without explicit intervals.
pub async fn running_intervals_for_session<'e, E>(
    executor: E,
    session_id: i64,
) -> anyhow::Result<Vec<RunningInterval>>
where
    E: sqlx::PgExecutor<'e>,
{
    let intervals = sqlx::query_as::<_, RunningInterval>(
        "SELECT id, session_id, repeat_variation, repeats, repeat_distance, target_pace, rest_time
         FROM running_intervals WHERE session_id = $1 ORDER BY repeat_variation, id",
    )
    .bind(session_id)
    .fetch_all(executor)
    .await?;

    Ok(intervals)
}

pub async fn list_mobility_workouts(db: &Database) -> anyhow::Result<Vec<MobilityWorkout>> {
    let cache_key = catalog_key(db.cache(), "mobility");
    db.cache()
        .get_or_load_json(&cache_key, CATALOG_CACHE_TTL, || async {
            let mut workouts = sqlx::query_as::<_, MobilityWorkout>(
                "SELECT id, workout_name, body_area, duration, summary, number_of_movements
                 FROM mobility_workouts ORDER BY id",
            )
            .fetch_all(db.pool())
            .await?;

            let details = sqlx::query_as::<_, MobilityWorkoutDetail>(
                r#"SELECT id, session_id, exercise, "order", duration
                   FROM mobility_workout_details ORDER BY session_id, "order", id"#,
            )
            .fetch_all(db.pool())
            .await?;

            let mut grouped = group_by(details, |detail| detail.session_id);
            for workout in &mut workouts {
                workout.details = grouped.remove(&workout.id).unwrap_or_default();
            }
            Ok(workouts)
        })
        .await
}

pub async fn list_suggested_strength(db: &Database) -> anyhow::Result<Vec<SuggestedStrength>> {
    let cache_key = catalog_key(db.cache(), "suggested_strength");
    db.cache()
        .get_or_load_json(&cache_key, CATALOG_CACHE_TTL, || async {
            let mut workouts = sqlx::query_as::<_, SuggestedStrength>(
                "SELECT id, workout_name, body_area, duration, description, number_of_sections
                 FROM suggested_strength ORDER BY id",
            )
            .fetch_all(db.pool())
            .await?;

            let details = sqlx::query_as::<_, SuggestedStrengthDetail>(
                "SELECT id, session_id, section_name, section_number, section_movement, exercise
                 FROM suggested_strength_details
                 ORDER BY session_id, section_number, section_movement, id",
            )
            .fetch_all(db.pool())
            .await?;

            let mut grouped = group_by(details, |detail| detail.session_id);
            for workout in &mut workouts {
                workout.details = grouped.remove(&workout.id).unwrap_or_default();
            }
            Ok(workouts)
        })
        .await
}

pub async fn list_conditioning(db: &Database) -> anyhow::Result<Vec<ConditioningOverview>> {
    let cache_key = catalog_key(db.cache(), "conditioning");
    db.cache()
        .get_or_load_json(&cache_key, CATALOG_CACHE_TTL, || async {
            let mut overviews = sqlx::query_as::<_, ConditioningOverview>(
                "SELECT id, name, duration, movements, rest, notes
                 FROM conditioning_overviews ORDER BY id",
            )
            .fetch_all(db.pool())
            .await?;

            let details = sqlx::query_as::<_, ConditioningDetail>(
                "SELECT id, conditioning_overview_id, movement_order, exercise, detail
                 FROM conditioning_details
                 ORDER BY conditioning_overview_id, movement_order, id",
            )
            .fetch_all(db.pool())
            .await?;

            let mut grouped = group_by(details, |detail| detail.conditioning_overview_id);
            for overview in &mut overviews {
                overview.conditioning_details = grouped.remove(&overview.id).unwrap_or_default();
            }
            Ok(overviews)
        })
        .await
}

/// Bucket rows by parent id, keeping their query order.
pub(crate) fn group_by<T>(rows: Vec<T>, parent: impl Fn(&T) -> Option<i64>) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        if let Some(parent_id) = parent(&row) {
            grouped.entry(parent_id).or_default().push(row);
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::{ComboRow, attach_combos, group_by};
    use crate::model::catalog::Movement;

    fn movement(id: i64) -> Movement {
        Movement {
            id,
            body_area: None,
            movement: None,
            exercise: Some(format!("Exercise {id}")),
            complexity: None,
            movement_type: None,
            primary_body_part: None,
            landscape_video_url: None,
            portrait_video_url: None,
            landscape_thumbnail: None,
            equipment_combos: Vec::new(),
        }
    }

    fn combo(combo_id: i64, movement_id: i64, equipment: Option<&str>) -> ComboRow {
        ComboRow {
            combo_id,
            movement_id,
            combo_label: Some(format!("combo {combo_id}")),
            equipment_name: equipment.map(str::to_owned),
        }
    }

    #[test]
    fn combos_collect_equipment_per_movement() {
        let mut movements = vec![movement(1), movement(2)];
        attach_combos(
            &mut movements,
            vec![
                combo(10, 1, Some("Barbell")),
                combo(10, 1, Some("Bench")),
                combo(11, 1, None),
                combo(12, 2, Some("Kettlebell")),
                combo(13, 99, Some("Ghost")),
            ],
        );

        assert_eq!(movements[0].equipment_combos.len(), 2);
        assert_eq!(movements[0].equipment_combos[0].equipment, vec!["Barbell", "Bench"]);
        assert!(movements[0].equipment_combos[1].equipment.is_empty());
        assert_eq!(movements[1].equipment_combos[0].equipment, vec!["Kettlebell"]);
    }

    #[test]
    fn group_by_skips_orphans_and_keeps_order() {
        let grouped = group_by(
            vec![(Some(1), "a"), (None, "b"), (Some(1), "c"), (Some(2), "d")],
            |row| row.0,
        );
        assert_eq!(grouped[&1], vec![(Some(1), "a"), (Some(1), "c")]);
        assert_eq!(grouped[&2], vec![(Some(2), "d")]);
        assert_eq!(grouped.len(), 2);
    }
}
