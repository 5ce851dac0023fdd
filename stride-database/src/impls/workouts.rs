use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use sqlx::PgConnection;
use stride_utils::parse::parse_pace_seconds;

use crate::database::Database;
use crate::impls::catalog::{
    MOVEMENT_COLUMNS, find_movement_id_by_exercise, find_running_session, group_by,
    running_intervals_for_session,
};
use crate::model::catalog::Movement;
use crate::model::sessions::{
    SavedConditioning, SavedHiitBlock, SavedHiitMovement, SavedHiitSession, SavedHiitWorkout,
    SavedMobilityDetail, SavedMobilitySession, SavedMobilitySessionDetail, SavedRunningInterval,
    SavedRunningIntervalDetail, SavedRunningSession, SavedRunningSessionDetail,
    SavedRunningSplitTime,
};
use crate::model::workouts::{
    GymSectionInput, HiitInput, HistoryRow, HistorySet, MobilityInput,
    MovementHistoryEntry, NewWorkout, PopulatedSection, PopulatedSectionMovement,
    PopulatedWorkout, RunningInput, RunningIntervalInput, Section, SectionMovement, SetRecord,
    Workout, WorkoutPayload, WorkoutStatus,
};

pub(crate) const WORKOUT_COLUMNS: &str = "id, owner_id, workout_number, name, description, status, \
     activity_type, complexity, duration, comments, created_at, updated_at, completed_date, scheduled_date";

/// Completed dates considered for movement history.
pub const HISTORY_DATE_LIMIT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveWorkoutOutcome {
    Saved(i64),
    MovementNotFound(String),
    ConditioningNotFound(i64),
    RunningSessionNotFound(i64),
}

/// Next workout number for an owner: highest existing plus one, starting at 1.
pub fn next_workout_number(current_max: Option<f64>) -> f64 {
    current_max.map_or(1.0, |max| max + 1.0)
}

/// Persist a workout and its activity-specific children in one transaction.
/// Nothing is written unless every referenced catalog entry resolves.
pub async fn save_workout(
    db: &Database,
    new_workout: NewWorkout<'_>,
    payload: &WorkoutPayload,
) -> anyhow::Result<SaveWorkoutOutcome> {
    let mut tx = db.begin().await?;

    let current_max: Option<f64> =
        sqlx::query_scalar("SELECT MAX(workout_number) FROM workouts WHERE owner_id = $1")
            .bind(new_workout.owner_id)
            .fetch_one(&mut *tx)
            .await?;

    let complexity = match payload {
        WorkoutPayload::Running(_) => Some(0),
        _ => new_workout.complexity,
    };

    let workout_id: i64 = sqlx::query_scalar(
        "INSERT INTO workouts
             (owner_id, workout_number, name, description, status, activity_type,
              complexity, duration, scheduled_date)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id",
    )
    .bind(new_workout.owner_id)
    .bind(next_workout_number(current_max))
    .bind(new_workout.name)
    .bind(new_workout.description)
    .bind(new_workout.status.as_str())
    .bind(payload.activity_type().as_str())
    .bind(complexity)
    .bind(new_workout.duration)
    .bind(new_workout.scheduled_date)
    .fetch_one(&mut *tx)
    .await?;

    let outcome = match payload {
        WorkoutPayload::Gym(sections) => {
            save_gym_sections(&mut *tx, workout_id, sections).await?
        }
        WorkoutPayload::Running(running) => save_running(&mut *tx, workout_id, running).await?,
        WorkoutPayload::Mobility(mobility) => {
            save_mobility(&mut *tx, workout_id, mobility).await?
        }
        WorkoutPayload::Hiit(hiit) => save_hiit(&mut *tx, workout_id, hiit).await?,
    };

    if let Some(outcome) = outcome {
        tx.rollback().await?;
        return Ok(outcome);
    }

    tx.commit().await?;
    Ok(SaveWorkoutOutcome::Saved(workout_id))
}

async fn save_gym_sections(
    conn: &mut PgConnection,
    workout_id: i64,
    sections: &[GymSectionInput],
) -> anyhow::Result<Option<SaveWorkoutOutcome>> {
    for section in sections {
        let section_id: i64 = sqlx::query_scalar(
            "INSERT INTO sections (workout_id, section_name, section_type, section_order)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(workout_id)
        .bind(section.section_name.as_deref())
        .bind(section.section_type.as_deref())
        .bind(section.section_order)
        .fetch_one(&mut *conn)
        .await?;

        if let Some(overview_id) = section.conditioning_overview_id {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM conditioning_overviews WHERE id = $1)",
            )
            .bind(overview_id)
            .fetch_one(&mut *conn)
            .await?;
            if !exists {
                return Ok(Some(SaveWorkoutOutcome::ConditioningNotFound(overview_id)));
            }

            sqlx::query(
                "INSERT INTO saved_conditioning (section_id, conditioning_overview_id) VALUES ($1, $2)",
            )
            .bind(section_id)
            .bind(overview_id)
            .execute(&mut *conn)
            .await?;
        }

        for movement in &section.movements {
            let Some(movement_id) =
                find_movement_id_by_exercise(&mut *conn, &movement.movement_name).await?
            else {
                return Ok(Some(SaveWorkoutOutcome::MovementNotFound(
                    movement.movement_name.clone(),
                )));
            };

            sqlx::query(
                "INSERT INTO section_movements (section_id, movement_id, movement_order)
                 VALUES ($1, $2, $3)",
            )
            .bind(section_id)
            .bind(movement_id)
            .bind(movement.movement_order)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(None)
}

async fn save_running(
    conn: &mut PgConnection,
    workout_id: i64,
    running: &RunningInput,
) -> anyhow::Result<Option<SaveWorkoutOutcome>> {
    let catalog = match running.running_session_id {
        Some(session_id) => match find_running_session(&mut *conn, session_id).await? {
            Some(session) => Some(session),
            None => return Ok(Some(SaveWorkoutOutcome::RunningSessionNotFound(session_id))),
        },
        None => None,
    };

    let saved_session_id: i64 = sqlx::query_scalar(
        "INSERT INTO saved_running_sessions
             (workout_id, running_session_id, warmup_distance, cooldown_distance,
              total_distance, workout_notes, suggested_warmup_pace, suggested_cooldown_pace)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id",
    )
    .bind(workout_id)
    .bind(catalog.as_ref().map(|session| session.id))
    .bind(catalog.as_ref().and_then(|session| session.warmup_distance))
    .bind(catalog.as_ref().and_then(|session| session.cool_down_distance))
    .bind(catalog.as_ref().and_then(|session| session.total_distance))
    .bind(catalog.as_ref().and_then(|session| session.notes.clone()))
    .bind(running.suggested_warmup_pace)
    .bind(running.suggested_cooldown_pace)
    .fetch_one(&mut *conn)
    .await?;

    let intervals: Vec<RunningIntervalInput> = match (&running.intervals, &catalog) {
        (Some(intervals), _) => intervals.clone(),
        (None, Some(session)) => running_intervals_for_session(&mut *conn, session.id)
            .await?
            .into_iter()
            .map(|interval| RunningIntervalInput {
                repeat_variation: Some(interval.repeat_variation),
                repeats: Some(interval.repeats),
                repeat_distance: interval.repeat_distance,
                target_pace: parse_pace_seconds(&interval.target_pace),
            })
            .collect(),
        (None, None) => Vec::new(),
    };

    for interval in &intervals {
        let interval_id: i64 = sqlx::query_scalar(
            "INSERT INTO saved_running_intervals
                 (saved_session_id, repeat_variation, repeats, repeat_distance, target_pace)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(saved_session_id)
        .bind(interval.repeat_variation)
        .bind(interval.repeats)
        .bind(interval.repeat_distance)
        .bind(interval.target_pace)
        .fetch_one(&mut *conn)
        .await?;

        let repeats = i16::try_from(interval.repeats.unwrap_or(0).max(0)).unwrap_or(i16::MAX);
        for repeat_number in 1..=repeats {
            sqlx::query(
                "INSERT INTO saved_running_split_times (saved_interval_id, repeat_number)
                 VALUES ($1, $2)",
            )
            .bind(interval_id)
            .bind(repeat_number)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(None)
}

async fn save_mobility(
    conn: &mut PgConnection,
    workout_id: i64,
    mobility: &MobilityInput,
) -> anyhow::Result<Option<SaveWorkoutOutcome>> {
    let session_id: i64 = sqlx::query_scalar(
        "INSERT INTO saved_mobility_sessions (workout_id, number_of_movements)
         VALUES ($1, $2)
         RETURNING id",
    )
    .bind(workout_id)
    .bind(mobility.movements.len() as f64)
    .fetch_one(&mut *conn)
    .await?;

    for (position, movement) in mobility.movements.iter().enumerate() {
        let Some(movement_id) =
            find_movement_id_by_exercise(&mut *conn, &movement.movement_name).await?
        else {
            return Ok(Some(SaveWorkoutOutcome::MovementNotFound(
                movement.movement_name.clone(),
            )));
        };

        sqlx::query(
            r#"INSERT INTO saved_mobility_details (session_id, movement_id, "order", duration)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(session_id)
        .bind(movement_id)
        .bind(movement.order.unwrap_or((position + 1) as f64))
        .bind(movement.duration.as_deref())
        .execute(&mut *conn)
        .await?;
    }

    Ok(None)
}

async fn save_hiit(
    conn: &mut PgConnection,
    workout_id: i64,
    hiit: &HiitInput,
) -> anyhow::Result<Option<SaveWorkoutOutcome>> {
    let hiit_id: i64 = sqlx::query_scalar(
        "INSERT INTO saved_hiit_workouts (workout_id, workout_type, structure, duration)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(workout_id)
    .bind(hiit.hiit.workout_type.as_deref())
    .bind(hiit.hiit.structure.as_deref())
    .bind(hiit.hiit.duration)
    .fetch_one(&mut *conn)
    .await?;

    for (block_position, block) in hiit.blocks.iter().enumerate() {
        let block_order = block
            .order
            .unwrap_or_else(|| i32::try_from(block_position + 1).unwrap_or(i32::MAX));
        let block_id: i64 = sqlx::query_scalar(
            r#"INSERT INTO saved_hiit_blocks (hiit_workout_id, block_name, rep_scheme, "order")
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(hiit_id)
        .bind(block.block_name.as_deref())
        .bind(block.rep_scheme.as_deref())
        .bind(block_order)
        .fetch_one(&mut *conn)
        .await?;

        for (movement_position, movement) in block.movements.iter().enumerate() {
            // Rest periods carry no catalog movement.
            let movement_id = if movement.rest_period {
                None
            } else {
                find_movement_id_by_exercise(&mut *conn, &movement.exercise_name).await?
            };
            let movement_order = movement
                .order
                .unwrap_or_else(|| i32::try_from(movement_position + 1).unwrap_or(i32::MAX));

            sqlx::query(
                r#"INSERT INTO saved_hiit_movements
                       (block_id, movement_id, exercise_name, "order", rest_period)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(block_id)
            .bind(movement_id)
            .bind(movement.exercise_name.trim())
            .bind(movement_order)
            .bind(movement.rest_period)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(None)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Owner's workouts, newest first.
pub async fn list_workouts(db: &Database, owner_id: i64) -> anyhow::Result<Vec<Workout>> {
    let rows = sqlx::query_as::<_, Workout>(&format!(
        "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(owner_id)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}

/// With `upcoming_from`, only workouts scheduled on or after that date, soonest first.
/// A `limit` of zero returns every match.
pub async fn list_upcoming_workouts(
    db: &Database,
    owner_id: i64,
    upcoming_from: Option<NaiveDate>,
    limit: u32,
) -> anyhow::Result<Vec<Workout>> {
    let limit = (limit > 0).then_some(i64::from(limit));

    let rows = match upcoming_from {
        Some(from) => {
            sqlx::query_as::<_, Workout>(&format!(
                "SELECT {WORKOUT_COLUMNS} FROM workouts
                 WHERE owner_id = $1 AND scheduled_date >= $2
                 ORDER BY scheduled_date ASC, id ASC
                 LIMIT $3"
            ))
            .bind(owner_id)
            .bind(from)
            .bind(limit)
            .fetch_all(db.pool())
            .await?
        }
        None => {
            sqlx::query_as::<_, Workout>(&format!(
                "SELECT {WORKOUT_COLUMNS} FROM workouts
                 WHERE owner_id = $1
                 ORDER BY scheduled_date ASC NULLS LAST, id ASC
                 LIMIT $2"
            ))
            .bind(owner_id)
            .bind(limit)
            .fetch_all(db.pool())
            .await?
        }
    };

    Ok(rows)
}

pub async fn find_workout(db: &Database, workout_id: i64) -> anyhow::Result<Option<Workout>> {
    let workout = sqlx::query_as::<_, Workout>(&format!(
        "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1"
    ))
    .bind(workout_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(workout)
}

/// Workout only when owned by `owner_id`.
pub async fn find_owned_workout(
    db: &Database,
    workout_id: i64,
    owner_id: i64,
) -> anyhow::Result<Option<Workout>> {
    let workout = sqlx::query_as::<_, Workout>(&format!(
        "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1 AND owner_id = $2"
    ))
    .bind(workout_id)
    .bind(owner_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(workout)
}

/// Load the whole workout tree.
pub async fn populate_workout(db: &Database, workout: Workout) -> anyhow::Result<PopulatedWorkout> {
    let workout_id = workout.id;

    let sections = sqlx::query_as::<_, Section>(
        "SELECT id, workout_id, section_name, section_type, section_order
         FROM sections WHERE workout_id = $1
         ORDER BY section_order ASC NULLS LAST, id ASC",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let section_movements = sqlx::query_as::<_, SectionMovement>(
        "SELECT sm.id, sm.section_id, sm.movement_id, sm.movement_order,
                sm.movement_difficulty, sm.movement_comment
         FROM section_movements sm
         JOIN sections s ON s.id = sm.section_id
         WHERE s.workout_id = $1
         ORDER BY sm.movement_order ASC NULLS LAST, sm.id ASC",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let sets = sqlx::query_as::<_, SetRecord>(
        "SELECT st.id, st.section_movement_id, st.set_number, st.reps, st.weight
         FROM sets st
         JOIN section_movements sm ON sm.id = st.section_movement_id
         JOIN sections s ON s.id = sm.section_id
         WHERE s.workout_id = $1
         ORDER BY st.set_number ASC NULLS LAST, st.id ASC",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let movements = sqlx::query_as::<_, Movement>(&format!(
        "SELECT {MOVEMENT_COLUMNS} FROM movements
         WHERE id IN (
             SELECT sm.movement_id FROM section_movements sm
             JOIN sections s ON s.id = sm.section_id
             WHERE s.workout_id = $1
         )"
    ))
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let conditioning = sqlx::query_as::<_, SavedConditioning>(
        "SELECT sc.id, sc.section_id, sc.conditioning_overview_id, sc.comments, sc.rpe
         FROM saved_conditioning sc
         JOIN sections s ON s.id = sc.section_id
         WHERE s.workout_id = $1
         ORDER BY sc.id",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let movements: HashMap<i64, Movement> = movements
        .into_iter()
        .map(|movement| (movement.id, movement))
        .collect();
    let mut sets = group_by(sets, |set| set.section_movement_id);
    let mut section_movements = group_by(section_movements, |sm| sm.section_id);
    let mut conditioning = group_by(conditioning, |element| element.section_id);

    let workout_sections = sections
        .into_iter()
        .map(|section| PopulatedSection {
            section_movement_details: section_movements
                .remove(&section.id)
                .unwrap_or_default()
                .into_iter()
                .map(|section_movement| PopulatedSectionMovement {
                    movements: section_movement
                        .movement_id
                        .and_then(|id| movements.get(&id).cloned()),
                    workout_sets: sets.remove(&section_movement.id).unwrap_or_default(),
                    section_movement,
                })
                .collect(),
            conditioning_elements: conditioning.remove(&section.id).unwrap_or_default(),
            section,
        })
        .collect();

    Ok(PopulatedWorkout {
        running_sessions: load_running_sessions(db, workout_id).await?,
        mobility_sessions: load_mobility_sessions(db, workout_id).await?,
        hiit_sessions: load_hiit_sessions(db, workout_id).await?,
        workout_sections,
        workout,
    })
}

async fn load_running_sessions(
    db: &Database,
    workout_id: i64,
) -> anyhow::Result<Vec<SavedRunningSessionDetail>> {
    let sessions = sqlx::query_as::<_, SavedRunningSession>(
        "SELECT id, workout_id, running_session_id, warmup_distance, cooldown_distance,
                total_distance, workout_notes, rpe, comments, suggested_warmup_pace,
                actual_warmup_pace, suggested_cooldown_pace, actual_cooldown_pace,
                created_at, updated_at
         FROM saved_running_sessions WHERE workout_id = $1 ORDER BY id",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let intervals = sqlx::query_as::<_, SavedRunningInterval>(
        "SELECT i.id, i.saved_session_id, i.repeat_variation, i.repeats, i.repeat_distance,
                i.target_pace, i.average_actual_pace, i.comments
         FROM saved_running_intervals i
         JOIN saved_running_sessions s ON s.id = i.saved_session_id
         WHERE s.workout_id = $1
         ORDER BY i.repeat_variation ASC NULLS LAST, i.id ASC",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let splits = sqlx::query_as::<_, SavedRunningSplitTime>(
        "SELECT t.id, t.saved_interval_id, t.repeat_number, t.target_time, t.actual_time, t.comments
         FROM saved_running_split_times t
         JOIN saved_running_intervals i ON i.id = t.saved_interval_id
         JOIN saved_running_sessions s ON s.id = i.saved_session_id
         WHERE s.workout_id = $1
         ORDER BY t.repeat_number ASC, t.id ASC",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let mut splits = group_by(splits, |split| Some(split.saved_interval_id));
    let mut intervals = group_by(intervals, |interval| Some(interval.saved_session_id));

    Ok(sessions
        .into_iter()
        .map(|session| SavedRunningSessionDetail {
            saved_intervals: intervals
                .remove(&session.id)
                .unwrap_or_default()
                .into_iter()
                .map(|interval| SavedRunningIntervalDetail {
                    split_times: splits.remove(&interval.id).unwrap_or_default(),
                    interval,
                })
                .collect(),
            session,
        })
        .collect())
}

async fn load_mobility_sessions(
    db: &Database,
    workout_id: i64,
) -> anyhow::Result<Vec<SavedMobilitySessionDetail>> {
    let sessions = sqlx::query_as::<_, SavedMobilitySession>(
        "SELECT id, workout_id, number_of_movements, session_video, rpe, comments,
                created_at, updated_at
         FROM saved_mobility_sessions WHERE workout_id = $1 ORDER BY id",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let details = sqlx::query_as::<_, SavedMobilityDetail>(
        r#"SELECT d.id, d.session_id, d.movement_id, m.exercise, d."order", d.duration
           FROM saved_mobility_details d
           JOIN saved_mobility_sessions s ON s.id = d.session_id
           LEFT JOIN movements m ON m.id = d.movement_id
           WHERE s.workout_id = $1
           ORDER BY d."order" ASC NULLS LAST, d.id ASC"#,
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let mut details = group_by(details, |detail| detail.session_id);

    Ok(sessions
        .into_iter()
        .map(|session| SavedMobilitySessionDetail {
            mobility_details: details.remove(&session.id).unwrap_or_default(),
            session,
        })
        .collect())
}

async fn load_hiit_sessions(db: &Database, workout_id: i64) -> anyhow::Result<Vec<SavedHiitSession>> {
    let workouts = sqlx::query_as::<_, SavedHiitWorkout>(
        "SELECT id, workout_id, workout_type, structure, duration, rpe, comments,
                created_at, updated_at
         FROM saved_hiit_workouts WHERE workout_id = $1 ORDER BY id",
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let blocks = sqlx::query_as::<_, SavedHiitBlock>(
        r#"SELECT b.id, b.hiit_workout_id, b.block_name, b.rep_scheme, b."order"
           FROM saved_hiit_blocks b
           JOIN saved_hiit_workouts h ON h.id = b.hiit_workout_id
           WHERE h.workout_id = $1
           ORDER BY b."order" ASC, b.id ASC"#,
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let movements = sqlx::query_as::<_, SavedHiitMovement>(
        r#"SELECT m.id, m.block_id, m.movement_id, m.exercise_name, m."order", m.rest_period
           FROM saved_hiit_movements m
           JOIN saved_hiit_blocks b ON b.id = m.block_id
           JOIN saved_hiit_workouts h ON h.id = b.hiit_workout_id
           WHERE h.workout_id = $1
           ORDER BY m."order" ASC, m.id ASC"#,
    )
    .bind(workout_id)
    .fetch_all(db.pool())
    .await?;

    let mut movements = group_by(movements, |movement| movement.block_id);
    let mut blocks = group_by(blocks, |block| block.hiit_workout_id);

    Ok(workouts
        .into_iter()
        .map(|workout| SavedHiitSession {
            hiit_details: blocks
                .remove(&workout.id)
                .unwrap_or_default()
                .into_iter()
                .map(|mut block| {
                    block.hiit_movements = movements.remove(&block.id).unwrap_or_default();
                    block
                })
                .collect(),
            workout,
        })
        .collect())
}

/// Past sets of `movement_ids`, limited to the owner's most recent completed dates.
pub async fn movement_history(
    db: &Database,
    owner_id: i64,
    movement_ids: &[i64],
) -> anyhow::Result<BTreeMap<i64, Vec<MovementHistoryEntry>>> {
    if movement_ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let limit = i64::try_from(HISTORY_DATE_LIMIT).unwrap_or(i64::MAX);
    let rows = sqlx::query_as::<_, HistoryRow>(
        "WITH recent AS (
             SELECT DISTINCT completed_date FROM workouts
             WHERE owner_id = $1 AND status = 'Completed' AND completed_date IS NOT NULL
             ORDER BY completed_date DESC
             LIMIT $3
         )
         SELECT sm.movement_id, sm.id AS section_movement_id, w.completed_date,
                sm.movement_difficulty, st.set_number, st.reps, st.weight
         FROM sets st
         JOIN section_movements sm ON sm.id = st.section_movement_id
         JOIN sections s ON s.id = sm.section_id
         JOIN workouts w ON w.id = s.workout_id
         WHERE w.owner_id = $1
           AND w.status = 'Completed'
           AND w.completed_date IN (SELECT completed_date FROM recent)
           AND sm.movement_id = ANY($2)
         ORDER BY sm.movement_id, w.completed_date DESC, sm.id, st.set_number ASC NULLS LAST",
    )
    .bind(owner_id)
    .bind(movement_ids)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    Ok(group_history(rows))
}

/// Group flat set rows per movement and per date, newest date first.
pub fn group_history(rows: Vec<HistoryRow>) -> BTreeMap<i64, Vec<MovementHistoryEntry>> {
    let mut grouped: BTreeMap<i64, Vec<MovementHistoryEntry>> = BTreeMap::new();

    for row in rows {
        let entries = grouped.entry(row.movement_id).or_default();
        let set = HistorySet {
            set_number: row.set_number,
            reps: row.reps,
            weight: row.weight,
        };

        match entries
            .iter_mut()
            .find(|entry| entry.workout_date == row.completed_date)
        {
            Some(entry) => entry.sets.push(set),
            None => entries.push(MovementHistoryEntry {
                workout_date: row.completed_date,
                movement_difficulty: row.movement_difficulty,
                sets: vec![set],
            }),
        }
    }

    for entries in grouped.values_mut() {
        entries.sort_by(|a, b| b.workout_date.cmp(&a.workout_date));
    }

    grouped
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Set a new status; `Completed` also stamps `completed_date` when unset.
pub async fn update_workout_status(
    db: &Database,
    workout_id: i64,
    status: WorkoutStatus,
    today: NaiveDate,
) -> anyhow::Result<Option<Workout>> {
    let completed_date = (status == WorkoutStatus::Completed).then_some(today);

    let workout = sqlx::query_as::<_, Workout>(&format!(
        "UPDATE workouts SET
             status = $2,
             completed_date = COALESCE(completed_date, $3),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {WORKOUT_COLUMNS}"
    ))
    .bind(workout_id)
    .bind(status.as_str())
    .bind(completed_date)
    .fetch_optional(db.pool())
    .await?;

    Ok(workout)
}

/// Delete a workout; children and notifications cascade.
pub async fn delete_workout(db: &Database, workout_id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM workouts WHERE id = $1")
        .bind(workout_id)
        .execute(db.pool())
        .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Clone, Debug)]
pub enum RescheduleOutcome {
    Rescheduled {
        workout: Workout,
        notifications_moved: u64,
    },
    NotFound,
    AlreadyCompleted,
}

/// Move a workout to `new_date`. Pending notifications keep their time of day.
pub async fn reschedule_workout(
    db: &Database,
    workout_id: i64,
    new_date: NaiveDate,
) -> anyhow::Result<RescheduleOutcome> {
    let mut tx = db.begin().await?;

    let status: Option<Option<String>> =
        sqlx::query_scalar("SELECT status FROM workouts WHERE id = $1 FOR UPDATE")
            .bind(workout_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(status) = status else {
        return Ok(RescheduleOutcome::NotFound);
    };
    if status.as_deref() == Some(WorkoutStatus::Completed.as_str()) {
        return Ok(RescheduleOutcome::AlreadyCompleted);
    }

    let workout = sqlx::query_as::<_, Workout>(&format!(
        "UPDATE workouts SET scheduled_date = $2, updated_at = NOW()
         WHERE id = $1
         RETURNING {WORKOUT_COLUMNS}"
    ))
    .bind(workout_id)
    .bind(new_date)
    .fetch_one(&mut *tx)
    .await?;

    let moved = sqlx::query(
        "UPDATE scheduled_notifications SET
             scheduled_datetime = ($2::DATE + (scheduled_datetime AT TIME ZONE 'UTC')::TIME)
                                  AT TIME ZONE 'UTC',
             updated_at = NOW()
         WHERE workout_id = $1 AND sent = FALSE AND canceled = FALSE",
    )
    .bind(workout_id)
    .bind(new_date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(RescheduleOutcome::Rescheduled {
        workout,
        notifications_moved: moved.rows_affected(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{group_history, next_workout_number};
    use crate::model::workouts::HistoryRow;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn row(movement_id: i64, day: u32, set_number: i16, reps: i16) -> HistoryRow {
        HistoryRow {
            movement_id,
            section_movement_id: movement_id * 100 + i64::from(day),
            completed_date: date(day),
            movement_difficulty: Some(3),
            set_number: Some(set_number),
            reps: Some(reps),
            weight: Some(40.0),
        }
    }

    #[test]
    fn workout_numbers_increment() {
        assert_eq!(next_workout_number(None), 1.0);
        assert_eq!(next_workout_number(Some(4.0)), 5.0);
    }

    #[test]
    fn history_groups_by_movement_and_date() {
        let history = group_history(vec![
            row(7, 2, 1, 10),
            row(7, 9, 1, 8),
            row(7, 9, 2, 6),
            row(3, 2, 1, 12),
        ]);

        let squat = &history[&7];
        assert_eq!(squat.len(), 2);
        assert_eq!(squat[0].workout_date, date(9));
        assert_eq!(squat[0].sets.len(), 2);
        assert_eq!(squat[0].sets[1].reps, Some(6));
        assert_eq!(squat[1].workout_date, date(2));

        assert_eq!(history[&3].len(), 1);
    }

    #[test]
    fn empty_history_is_empty() {
        assert!(group_history(Vec::new()).is_empty());
    }
}
