use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use sqlx::types::Json;
use stride_utils::time::DateWindow;
use tracing::info;

use crate::database::Database;
use crate::model::stats::{ActivityRow, BodyPartRow, UserStats};

/// Sections that never count towards body-part totals.
pub const EXCLUDED_SECTIONS: &[&str] = &["Warm Up A", "Warm Up B", "Conditioning"];

pub const WEEK_DAYS: u64 = 7;
pub const MONTH_DAYS: u64 = 30;
pub const YEAR_DAYS: u64 = 365;

const STATS_COLUMNS: &str = "owner_id, weekly_body_part, monthly_body_part, yearly_body_part, \
     weekly_activity_type, monthly_activity_type, yearly_activity_type, last_updated";

/// Count distinct movements per completed workout by primary body part.
pub fn aggregate_body_parts(rows: &[BodyPartRow], window: DateWindow) -> BTreeMap<String, i64> {
    let mut per_workout: HashMap<i64, BTreeSet<(i64, &str)>> = HashMap::new();

    for row in rows {
        if !window.contains(row.completed_date) {
            continue;
        }
        if row
            .section_name
            .as_deref()
            .is_some_and(|name| EXCLUDED_SECTIONS.contains(&name))
        {
            continue;
        }
        let Some(body_part) = row.primary_body_part.as_deref().filter(|part| !part.is_empty())
        else {
            continue;
        };
        per_workout
            .entry(row.workout_id)
            .or_default()
            .insert((row.movement_id, body_part));
    }

    let mut counts = BTreeMap::new();
    for movements in per_workout.values() {
        for (_, body_part) in movements {
            *counts.entry((*body_part).to_owned()).or_insert(0) += 1;
        }
    }
    counts
}

/// Sum durations per activity type; missing types are "Unknown".
pub fn aggregate_activity(rows: &[ActivityRow], window: DateWindow) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for row in rows.iter().filter(|row| window.contains(row.completed_date)) {
        let activity = row.activity_type.clone().unwrap_or_else(|| "Unknown".to_owned());
        *totals.entry(activity).or_insert(0) += i64::from(row.duration.unwrap_or(0));
    }
    totals
}

pub async fn get_or_create_user_stats(db: &Database, owner_id: i64) -> anyhow::Result<UserStats> {
    sqlx::query("INSERT INTO user_stats (owner_id) VALUES ($1) ON CONFLICT (owner_id) DO NOTHING")
        .bind(owner_id)
        .execute(db.pool())
        .await?;

    let stats = sqlx::query_as::<_, UserStats>(&format!(
        "SELECT {STATS_COLUMNS} FROM user_stats WHERE owner_id = $1"
    ))
    .bind(owner_id)
    .fetch_one(db.pool())
    .await?;

    Ok(stats)
}

pub async fn find_user_stats(db: &Database, owner_id: i64) -> anyhow::Result<Option<UserStats>> {
    let stats = sqlx::query_as::<_, UserStats>(&format!(
        "SELECT {STATS_COLUMNS} FROM user_stats WHERE owner_id = $1"
    ))
    .bind(owner_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(stats)
}

/// Rebuild one user's weekly, monthly and yearly aggregates ending on `today`.
pub async fn recompute_user_stats(db: &Database, owner_id: i64, today: NaiveDate) -> anyhow::Result<()> {
    let week = DateWindow::trailing(today, WEEK_DAYS);
    let month = DateWindow::trailing(today, MONTH_DAYS);
    let year = DateWindow::trailing(today, YEAR_DAYS);

    let body_rows = sqlx::query_as::<_, BodyPartRow>(
        "SELECT DISTINCT w.id AS workout_id, w.completed_date, s.section_name,
                m.id AS movement_id, m.primary_body_part
         FROM workouts w
         JOIN sections s ON s.workout_id = w.id
         JOIN section_movements sm ON sm.section_id = s.id
         JOIN movements m ON m.id = sm.movement_id
         WHERE w.owner_id = $1 AND w.status = 'Completed'
           AND w.completed_date BETWEEN $2 AND $3",
    )
    .bind(owner_id)
    .bind(year.start)
    .bind(year.end)
    .fetch_all(db.pool())
    .await?;

    let activity_rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT completed_date, activity_type, duration
         FROM workouts
         WHERE owner_id = $1 AND status = 'Completed'
           AND completed_date BETWEEN $2 AND $3",
    )
    .bind(owner_id)
    .bind(year.start)
    .bind(year.end)
    .fetch_all(db.pool())
    .await?;

    sqlx::query(
        "INSERT INTO user_stats
             (owner_id, weekly_body_part, monthly_body_part, yearly_body_part,
              weekly_activity_type, monthly_activity_type, yearly_activity_type, last_updated)
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
         ON CONFLICT (owner_id) DO UPDATE SET
             weekly_body_part = EXCLUDED.weekly_body_part,
             monthly_body_part = EXCLUDED.monthly_body_part,
             yearly_body_part = EXCLUDED.yearly_body_part,
             weekly_activity_type = EXCLUDED.weekly_activity_type,
             monthly_activity_type = EXCLUDED.monthly_activity_type,
             yearly_activity_type = EXCLUDED.yearly_activity_type,
             last_updated = EXCLUDED.last_updated",
    )
    .bind(owner_id)
    .bind(Json(aggregate_body_parts(&body_rows, week)))
    .bind(Json(aggregate_body_parts(&body_rows, month)))
    .bind(Json(aggregate_body_parts(&body_rows, year)))
    .bind(Json(aggregate_activity(&activity_rows, week)))
    .bind(Json(aggregate_activity(&activity_rows, month)))
    .bind(Json(aggregate_activity(&activity_rows, year)))
    .execute(db.pool())
    .await?;

    Ok(())
}

/// Recompute stats for every user. Returns the number of users processed.
pub async fn recompute_all_user_stats(db: &Database, today: NaiveDate) -> anyhow::Result<usize> {
    let owners: Vec<i64> = sqlx::query_scalar("SELECT id FROM users ORDER BY id")
        .fetch_all(db.pool())
        .await?;

    for owner_id in &owners {
        recompute_user_stats(db, *owner_id, today).await?;
    }

    info!(users = owners.len(), "user stats recomputed");
    Ok(owners.len())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use stride_utils::time::DateWindow;

    use super::{aggregate_activity, aggregate_body_parts};
    use crate::model::stats::{ActivityRow, BodyPartRow};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn body(workout_id: i64, day: u32, section: &str, movement_id: i64, part: &str) -> BodyPartRow {
        BodyPartRow {
            workout_id,
            completed_date: date(day),
            section_name: Some(section.to_owned()),
            movement_id,
            primary_body_part: Some(part.to_owned()),
        }
    }

    #[test]
    fn body_parts_skip_warmups_and_conditioning() {
        let rows = vec![
            body(1, 20, "Strong 1", 10, "Legs"),
            body(1, 20, "Build 1", 11, "Back"),
            body(1, 20, "Warm Up A", 12, "Shoulders"),
            body(1, 20, "Conditioning", 13, "Core"),
            body(1, 20, "Pump 1", 14, ""),
        ];
        let counts = aggregate_body_parts(&rows, DateWindow::trailing(date(21), 7));

        assert_eq!(counts.get("Legs"), Some(&1));
        assert_eq!(counts.get("Back"), Some(&1));
        assert!(!counts.contains_key("Shoulders"));
        assert!(!counts.contains_key("Core"));
        assert!(!counts.contains_key(""));
    }

    #[test]
    fn movements_count_once_per_workout() {
        let rows = vec![
            body(1, 20, "Strong 1", 10, "Legs"),
            body(1, 20, "Build 2", 10, "Legs"),
            body(2, 21, "Strong 1", 10, "Legs"),
        ];
        let counts = aggregate_body_parts(&rows, DateWindow::trailing(date(21), 7));
        assert_eq!(counts.get("Legs"), Some(&2));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let rows = vec![
            body(1, 14, "Strong 1", 10, "Legs"),
            body(2, 13, "Strong 1", 11, "Back"),
        ];
        let counts = aggregate_body_parts(&rows, DateWindow::trailing(date(21), 7));
        assert_eq!(counts.get("Legs"), Some(&1));
        assert!(!counts.contains_key("Back"));
    }

    #[test]
    fn activity_durations_sum_with_unknown_fallback() {
        let rows = vec![
            ActivityRow {
                completed_date: date(20),
                activity_type: Some("Gym".to_owned()),
                duration: Some(45),
            },
            ActivityRow {
                completed_date: date(21),
                activity_type: Some("Gym".to_owned()),
                duration: None,
            },
            ActivityRow {
                completed_date: date(21),
                activity_type: None,
                duration: Some(20),
            },
        ];
        let totals = aggregate_activity(&rows, DateWindow::trailing(date(21), 30));
        assert_eq!(totals.get("Gym"), Some(&45));
        assert_eq!(totals.get("Unknown"), Some(&20));
    }
}
