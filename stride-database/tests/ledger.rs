use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use stride_database::Database;
use stride_database::impls::completion::{CompletionOutcome, complete_gym_workout, complete_run};
use stride_database::impls::leaderboard::{
    get_leaderboard_entry, list_leaderboard, recompute_leaderboards,
};
use stride_database::impls::notifications::{due_notifications, schedule_notification};
use stride_database::impls::scoring::award;
use stride_database::impls::users::{create_user, set_push_token};
use stride_database::impls::workouts::{SaveWorkoutOutcome, save_workout};
use stride_database::model::notifications::NewNotification;
use stride_database::model::scoring::{ScoreKey, ScoreType};
use stride_database::model::sessions::{IntervalLogInput, RunCompletion, SplitTimeInput};
use stride_database::model::users::NewUser;
use stride_database::model::workouts::{
    ActivityType, GymMovementInput, GymSectionInput, LoggedMovementInput, LoggedSectionInput,
    NewWorkout, RunningInput, RunningIntervalInput, SetInput, WorkoutPayload, WorkoutStatus,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

async fn user(db: &Database, name: &str) -> i64 {
    let email = format!("{name}@stride.app");
    create_user(
        db,
        NewUser {
            email: &email,
            username: name,
            first_name: name,
            last_name: "",
            password_hash: "hash",
        },
    )
    .await
    .unwrap()
    .id
}

async fn movement(pool: &PgPool, exercise: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO movements (exercise, primary_body_part) VALUES ($1, 'Legs') RETURNING id",
    )
    .bind(exercise)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn new_workout(owner_id: i64, activity_type: ActivityType) -> NewWorkout<'static> {
    NewWorkout {
        owner_id,
        name: "Session",
        description: None,
        status: WorkoutStatus::Saved,
        activity_type,
        complexity: Some(2),
        duration: Some(45),
        scheduled_date: None,
    }
}

fn gym(exercises: &[&str]) -> WorkoutPayload {
    WorkoutPayload::Gym(vec![GymSectionInput {
        section_name: Some("Strong 1".to_owned()),
        section_type: Some("Strength".to_owned()),
        section_order: Some(1),
        conditioning_overview_id: None,
        movements: exercises
            .iter()
            .zip(1..)
            .map(|(name, order)| GymMovementInput {
                movement_name: (*name).to_owned(),
                movement_order: Some(order),
            })
            .collect(),
    }])
}

async fn saved_gym_workout(db: &Database, owner_id: i64, exercises: &[&str]) -> i64 {
    match save_workout(db, new_workout(owner_id, ActivityType::Gym), &gym(exercises))
        .await
        .unwrap()
    {
        SaveWorkoutOutcome::Saved(id) => id,
        other => panic!("workout not saved: {other:?}"),
    }
}

/// `(section_id, section_movement_id)` pairs of a workout in movement order.
async fn section_movements(pool: &PgPool, workout_id: i64) -> Vec<(i64, i64)> {
    sqlx::query_as(
        "SELECT s.id, sm.id FROM section_movements sm
         JOIN sections s ON s.id = sm.section_id
         WHERE s.workout_id = $1
         ORDER BY sm.movement_order",
    )
    .bind(workout_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

fn logged(pairs: &[(i64, i64)], reps: i16, weight: f64) -> Vec<LoggedSectionInput> {
    pairs
        .iter()
        .map(|&(section_id, movement_id)| LoggedSectionInput {
            section_id,
            movements: vec![LoggedMovementInput {
                movement_id,
                movement_difficulty: Some(7),
                movement_comments: None,
                sets: vec![SetInput {
                    set_number: Some(1),
                    reps: Some(reps),
                    weight: Some(weight),
                }],
            }],
        })
        .collect()
}

async fn total_score(db: &Database, user_id: i64) -> i32 {
    get_leaderboard_entry(db, user_id)
        .await
        .unwrap()
        .map_or(0, |entry| entry.total_score)
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn award_counts_each_key_once(pool: PgPool) {
    let db = Database::new(pool.clone());
    let athlete = user(&db, "ana").await;
    movement(&pool, "Back Squat").await;
    let workout_id = saved_gym_workout(&db, athlete, &["Back Squat"]).await;

    let mut conn = pool.acquire().await.unwrap();
    let key = ScoreKey::Workout(workout_id);
    assert!(award(&mut conn, athlete, ScoreType::WorkoutCompletion, key).await.unwrap());
    assert!(!award(&mut conn, athlete, ScoreType::WorkoutCompletion, key).await.unwrap());
    assert!(award(&mut conn, athlete, ScoreType::FullRunningSplits, key).await.unwrap());
    drop(conn);

    let entry = get_leaderboard_entry(&db, athlete).await.unwrap().unwrap();
    assert_eq!(entry.total_score, 70);
    assert_eq!(entry.weekly_score, 70);
    assert_eq!(entry.monthly_score, 70);
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn completing_twice_awards_once(pool: PgPool) {
    let db = Database::new(pool.clone());
    let athlete = user(&db, "ben").await;
    movement(&pool, "Back Squat").await;
    movement(&pool, "Deadlift").await;
    let workout_id = saved_gym_workout(&db, athlete, &["Back Squat", "Deadlift"]).await;
    let pairs = section_movements(&pool, workout_id).await;
    let sections = logged(&pairs, 5, 100.0);

    let first = complete_gym_workout(&db, workout_id, athlete, &sections, day(2)).await.unwrap();
    assert_eq!(first, CompletionOutcome::Completed { points_awarded: 60 });

    let second = complete_gym_workout(&db, workout_id, athlete, &sections, day(2)).await.unwrap();
    assert_eq!(second, CompletionOutcome::Completed { points_awarded: 0 });

    assert_eq!(total_score(&db, athlete).await, 60);
    let ledger_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM score_logs WHERE user_id = $1")
        .bind(athlete)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(ledger_rows, 3);
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn untracked_sets_earn_no_movement_score(pool: PgPool) {
    let db = Database::new(pool.clone());
    let athlete = user(&db, "cy").await;
    movement(&pool, "Plank").await;
    let workout_id = saved_gym_workout(&db, athlete, &["Plank"]).await;
    let pairs = section_movements(&pool, workout_id).await;

    let outcome = complete_gym_workout(&db, workout_id, athlete, &logged(&pairs, 0, 0.0), day(3))
        .await
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::Completed { points_awarded: 50 });
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn completing_someone_elses_workout_is_not_found(pool: PgPool) {
    let db = Database::new(pool.clone());
    let owner = user(&db, "dee").await;
    let stranger = user(&db, "eli").await;
    movement(&pool, "Row").await;
    let workout_id = saved_gym_workout(&db, owner, &["Row"]).await;

    let outcome = complete_gym_workout(&db, workout_id, stranger, &[], day(4)).await.unwrap();
    assert_eq!(outcome, CompletionOutcome::NotFound);
    assert_eq!(total_score(&db, stranger).await, 0);
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn unknown_movement_saves_nothing(pool: PgPool) {
    let db = Database::new(pool.clone());
    let athlete = user(&db, "fay").await;
    movement(&pool, "Back Squat").await;

    let outcome = save_workout(
        &db,
        new_workout(athlete, ActivityType::Gym),
        &gym(&["Back Squat", "Moon Walk"]),
    )
    .await
    .unwrap();
    assert_eq!(outcome, SaveWorkoutOutcome::MovementNotFound("Moon Walk".to_owned()));

    let workouts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
        .fetch_one(&pool)
        .await
        .unwrap();
    let sections: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sections")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((workouts, sections), (0, 0));
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn recompute_ranks_by_score_then_user(pool: PgPool) {
    let db = Database::new(pool.clone());
    let first = user(&db, "gus").await;
    let second = user(&db, "hal").await;
    let third = user(&db, "ivy").await;
    movement(&pool, "Lunge").await;
    let workout_id = saved_gym_workout(&db, third, &["Lunge"]).await;

    let mut conn = pool.acquire().await.unwrap();
    award(&mut conn, third, ScoreType::WorkoutCompletion, ScoreKey::Workout(workout_id))
        .await
        .unwrap();
    drop(conn);

    let today = Utc::now().date_naive();
    let users = recompute_leaderboards(&db, today - Duration::days(7), today - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(users, 3);

    let board = list_leaderboard(&db).await.unwrap();
    let ranks: Vec<(i64, i32, i32)> = board
        .iter()
        .map(|entry| (entry.user, entry.total_score, entry.total_rank))
        .collect();
    assert_eq!(ranks, vec![(third, 50, 1), (first, 0, 2), (second, 0, 3)]);
    assert!(board.iter().all(|entry| entry.weekly_rank == entry.total_rank));
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn registered_users_appear_on_the_leaderboard(pool: PgPool) {
    let db = Database::new(pool);
    let before = list_leaderboard(&db).await.unwrap();
    assert!(before.is_empty());

    let athlete = user(&db, "jo").await;
    let after = list_leaderboard(&db).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].user, athlete);
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn stored_split_times_count_toward_the_bonus(pool: PgPool) {
    let db = Database::new(pool.clone());
    let runner = user(&db, "kit").await;

    let payload = WorkoutPayload::Running(RunningInput {
        intervals: Some(vec![RunningIntervalInput {
            repeat_variation: Some(1),
            repeats: Some(2),
            repeat_distance: Some(400.0),
            target_pace: Some(90),
        }]),
        ..RunningInput::default()
    });
    let SaveWorkoutOutcome::Saved(workout_id) =
        save_workout(&db, new_workout(runner, ActivityType::Running), &payload)
            .await
            .unwrap()
    else {
        panic!("run not saved");
    };

    let splits: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT i.id, t.id FROM saved_running_split_times t
         JOIN saved_running_intervals i ON i.id = t.saved_interval_id
         JOIN saved_running_sessions s ON s.id = i.saved_session_id
         WHERE s.workout_id = $1
         ORDER BY t.repeat_number",
    )
    .bind(workout_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(splits.len(), 2);

    sqlx::query("UPDATE saved_running_split_times SET actual_time = 88 WHERE id = $1")
        .bind(splits[0].1)
        .execute(&pool)
        .await
        .unwrap();

    let completion = RunCompletion {
        intervals: vec![IntervalLogInput {
            id: splits[0].0,
            split_times: vec![
                SplitTimeInput {
                    id: splits[0].1,
                    actual_time: None,
                    comments: None,
                },
                SplitTimeInput {
                    id: splits[1].1,
                    actual_time: Some(91),
                    comments: None,
                },
            ],
        }],
        ..RunCompletion::default()
    };

    let outcome = complete_run(&db, workout_id, runner, &completion, day(5)).await.unwrap();
    assert_eq!(outcome, CompletionOutcome::Completed { points_awarded: 70 });
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn dropped_movements_lose_their_summary(pool: PgPool) {
    let db = Database::new(pool.clone());
    let athlete = user(&db, "lou").await;
    movement(&pool, "Bench").await;
    movement(&pool, "Curl").await;
    let workout_id = saved_gym_workout(&db, athlete, &["Bench", "Curl"]).await;
    let pairs = section_movements(&pool, workout_id).await;

    complete_gym_workout(&db, workout_id, athlete, &logged(&pairs, 8, 40.0), day(6))
        .await
        .unwrap();
    complete_gym_workout(&db, workout_id, athlete, &logged(&pairs[..1], 8, 45.0), day(6))
        .await
        .unwrap();

    let summaries: Vec<(String, f64)> = sqlx::query_as(
        "SELECT m.exercise, s.best_weight FROM movement_summaries s
         JOIN movements m ON m.id = s.movement_id
         WHERE s.owner_id = $1",
    )
    .bind(athlete)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(summaries, vec![("Bench".to_owned(), 45.0)]);
}

#[sqlx::test(migrator = "stride_database::MIGRATOR")]
async fn due_notifications_skip_owners_without_tokens(pool: PgPool) {
    let db = Database::new(pool);
    let silent = user(&db, "max").await;
    let reachable = user(&db, "nia").await;
    set_push_token(&db, reachable, "ExponentPushToken[nia]").await.unwrap();

    let earlier = Utc::now() - Duration::hours(2);
    for owner_id in [silent, silent, silent, reachable] {
        schedule_notification(
            &db,
            NewNotification {
                owner_id,
                workout_id: None,
                scheduled_datetime: earlier,
                title: "Workout reminder",
                subtitle: "",
                body: "",
            },
        )
        .await
        .unwrap();
    }

    let due = due_notifications(&db, Utc::now(), 0, 2).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].owner_id, Some(reachable));

    let rest = due_notifications(&db, Utc::now(), due[0].id, 2).await.unwrap();
    assert!(rest.is_empty());
}
