use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use stride_utils::formatting::capitalize;

use crate::database::Database;
use crate::model::plans::{PlanContext, PlanPart, PlanSlots};

static WARMUP_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)warm\s*up").expect("warm-up pattern is valid"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoredPlans {
    pub request_number: i32,
    pub plans_created: usize,
    pub usage_updated: i64,
}

fn is_warmup(label: &str) -> bool {
    WARMUP_LABEL.is_match(label)
}

/// Map one candidate plan onto its movement slots.
///
/// Warm-up parts and labels with fewer than two words are skipped; `Strong N`
/// stores every movement comma-joined, `Build N` and `Pump N` the first two.
pub fn parse_plan(parts: &[PlanPart]) -> PlanSlots {
    let mut slots = PlanSlots::default();

    for part in parts {
        if is_warmup(&part.part_label) {
            continue;
        }
        let mut words = part.part_label.split_whitespace();
        let (Some(category), Some(number)) = (words.next(), words.next()) else {
            continue;
        };

        let first = part.movements.first().cloned().unwrap_or_default();
        let second = part.movements.get(1).cloned().unwrap_or_default();
        let take_two = |slot_1: &mut String, slot_2: &mut String| {
            if !part.movements.is_empty() {
                *slot_1 = first.clone();
            }
            if part.movements.len() > 1 {
                *slot_2 = second.clone();
            }
        };

        match (category.to_ascii_lowercase().as_str(), number) {
            ("strong", "1") => slots.strong_1 = part.movements.join(","),
            ("strong", "2") => slots.strong_2 = part.movements.join(","),
            ("build", "1") => take_two(&mut slots.build_1_movement_1, &mut slots.build_1_movement_2),
            ("build", "2") => take_two(&mut slots.build_2_movement_1, &mut slots.build_2_movement_2),
            ("pump", "1") => take_two(&mut slots.pump_1_movement_1, &mut slots.pump_1_movement_2),
            ("pump", "2") => take_two(&mut slots.pump_2_movement_1, &mut slots.pump_2_movement_2),
            _ => {}
        }

        let full_label = format!("{} {}", capitalize(category), number);
        for movement in &part.movements {
            slots.usage.push((movement.clone(), full_label.clone()));
        }
    }

    slots
}

/// Store every candidate plan under a new request number and bump movement usage.
pub async fn store_plans(
    db: &Database,
    context: PlanContext<'_>,
    candidate_plans: &[Vec<PlanPart>],
) -> anyhow::Result<StoredPlans> {
    let mut tx = db.begin().await?;

    // Serializes concurrent requests so request numbers stay unique.
    sqlx::query("LOCK TABLE generated_workout_plans IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let current_max: Option<i32> =
        sqlx::query_scalar("SELECT MAX(request_number) FROM generated_workout_plans")
            .fetch_one(&mut *tx)
            .await?;
    let request_number = current_max.unwrap_or(0) + 1;

    let mut usage: BTreeMap<(String, String), i64> = BTreeMap::new();

    for plan in candidate_plans {
        let slots = parse_plan(plan);

        sqlx::query(
            "INSERT INTO generated_workout_plans
                 (workout_type, duration, complexity, finish_type,
                  strong_1, strong_2,
                  build_1_movement_1, build_1_movement_2, build_2_movement_1, build_2_movement_2,
                  pump_1_movement_1, pump_1_movement_2, pump_2_movement_1, pump_2_movement_2,
                  request_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(context.workout_type)
        .bind(context.workout_time)
        .bind(context.complexity)
        .bind(context.finish_type)
        .bind(&slots.strong_1)
        .bind(&slots.strong_2)
        .bind(&slots.build_1_movement_1)
        .bind(&slots.build_1_movement_2)
        .bind(&slots.build_2_movement_1)
        .bind(&slots.build_2_movement_2)
        .bind(&slots.pump_1_movement_1)
        .bind(&slots.pump_1_movement_2)
        .bind(&slots.pump_2_movement_1)
        .bind(&slots.pump_2_movement_2)
        .bind(request_number)
        .execute(&mut *tx)
        .await?;

        for key in slots.usage {
            *usage.entry(key).or_insert(0) += 1;
        }
    }

    let mut usage_updated = 0;
    for ((movement, category), increment) in &usage {
        sqlx::query(
            "INSERT INTO movement_usage (movement, category, workout_type, workout_time, usage_count)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (movement, category, workout_type, workout_time) DO UPDATE SET
                 usage_count = movement_usage.usage_count + EXCLUDED.usage_count,
                 updated_at = NOW()",
        )
        .bind(movement)
        .bind(category)
        .bind(context.workout_type)
        .bind(context.workout_time)
        .bind(i32::try_from(*increment).unwrap_or(i32::MAX))
        .execute(&mut *tx)
        .await?;
        usage_updated += increment;
    }

    tx.commit().await?;

    Ok(StoredPlans {
        request_number,
        plans_created: candidate_plans.len(),
        usage_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::parse_plan;
    use crate::model::plans::PlanPart;

    fn part(label: &str, movements: &[&str]) -> PlanPart {
        PlanPart {
            part_label: label.to_owned(),
            movements: movements.iter().map(|m| (*m).to_owned()).collect(),
        }
    }

    #[test]
    fn fills_slots_by_category() {
        let slots = parse_plan(&[
            part("Strong 1", &["Back Squat", "Deadlift", "Lunge"]),
            part("Build 2", &["Row", "Press", "Curl"]),
            part("pump 1", &["Fly"]),
        ]);

        assert_eq!(slots.strong_1, "Back Squat,Deadlift,Lunge");
        assert_eq!(slots.build_2_movement_1, "Row");
        assert_eq!(slots.build_2_movement_2, "Press");
        assert_eq!(slots.pump_1_movement_1, "Fly");
        assert_eq!(slots.pump_1_movement_2, "");
        assert_eq!(slots.usage.len(), 7);
        assert!(slots.usage.contains(&("Fly".to_owned(), "Pump 1".to_owned())));
    }

    #[test]
    fn skips_warmups_and_short_labels() {
        let slots = parse_plan(&[
            part("Warm Up A", &["Jog"]),
            part("WARMUP", &["Skip"]),
            part("Finisher", &["Burpee"]),
        ]);

        assert_eq!(slots.usage, Vec::new());
        assert_eq!(slots.strong_1, "");
    }

    #[test]
    fn warmup_match_needs_both_words() {
        let slots = parse_plan(&[
            part("Warm  up B", &["Jog"]),
            part("Warmth 1", &["Sauna Squat"]),
        ]);

        assert_eq!(
            slots.usage,
            vec![("Sauna Squat".to_owned(), "Warmth 1".to_owned())]
        );
    }

    #[test]
    fn unknown_numbers_still_count_usage() {
        let slots = parse_plan(&[part("Strong 3", &["Bench"]), part("Core 1", &["Plank"])]);

        assert_eq!(slots.strong_1, "");
        assert_eq!(slots.strong_2, "");
        assert_eq!(
            slots.usage,
            vec![
                ("Bench".to_owned(), "Strong 3".to_owned()),
                ("Plank".to_owned(), "Core 1".to_owned()),
            ]
        );
    }
}
