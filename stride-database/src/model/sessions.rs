use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedConditioning {
    pub id: i64,
    pub section_id: Option<i64>,
    pub conditioning_overview_id: Option<i64>,
    pub comments: Option<String>,
    pub rpe: Option<i16>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedRunningSession {
    pub id: i64,
    pub workout_id: i64,
    pub running_session_id: Option<i64>,
    pub warmup_distance: Option<f64>,
    pub cooldown_distance: Option<f64>,
    pub total_distance: Option<f64>,
    pub workout_notes: Option<String>,
    pub rpe: Option<i16>,
    pub comments: Option<String>,
    pub suggested_warmup_pace: Option<i32>,
    pub actual_warmup_pace: Option<i32>,
    pub suggested_cooldown_pace: Option<i32>,
    pub actual_cooldown_pace: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedRunningInterval {
    pub id: i64,
    pub saved_session_id: i64,
    pub repeat_variation: Option<i16>,
    pub repeats: Option<i32>,
    pub repeat_distance: Option<f64>,
    pub target_pace: Option<i32>,
    pub average_actual_pace: Option<i32>,
    pub comments: Option<String>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedRunningSplitTime {
    pub id: i64,
    pub saved_interval_id: i64,
    pub repeat_number: i16,
    pub target_time: Option<i32>,
    pub actual_time: Option<i32>,
    pub comments: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SavedRunningIntervalDetail {
    #[serde(flatten)]
    pub interval: SavedRunningInterval,
    pub split_times: Vec<SavedRunningSplitTime>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SavedRunningSessionDetail {
    #[serde(flatten)]
    pub session: SavedRunningSession,
    pub saved_intervals: Vec<SavedRunningIntervalDetail>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedMobilitySession {
    pub id: i64,
    pub workout_id: Option<i64>,
    pub number_of_movements: Option<f64>,
    pub session_video: Option<String>,
    pub rpe: Option<i16>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedMobilityDetail {
    pub id: i64,
    pub session_id: Option<i64>,
    pub movement_id: Option<i64>,
    pub exercise: Option<String>,
    pub order: Option<f64>,
    pub duration: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SavedMobilitySessionDetail {
    #[serde(flatten)]
    pub session: SavedMobilitySession,
    pub mobility_details: Vec<SavedMobilityDetail>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedHiitWorkout {
    pub id: i64,
    pub workout_id: Option<i64>,
    pub workout_type: Option<String>,
    pub structure: Option<String>,
    pub duration: Option<i32>,
    pub rpe: Option<i16>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedHiitBlock {
    pub id: i64,
    pub hiit_workout_id: Option<i64>,
    pub block_name: Option<String>,
    pub rep_scheme: Option<String>,
    pub order: i32,
    #[sqlx(skip)]
    pub hiit_movements: Vec<SavedHiitMovement>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedHiitMovement {
    pub id: i64,
    pub block_id: Option<i64>,
    pub movement_id: Option<i64>,
    pub exercise_name: String,
    pub order: i32,
    pub rest_period: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SavedHiitSession {
    #[serde(flatten)]
    pub workout: SavedHiitWorkout,
    pub hiit_details: Vec<SavedHiitBlock>,
}

// ---------------------------------------------------------------------------
// Completion payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SplitTimeInput {
    pub id: i64,
    pub actual_time: Option<i32>,
    pub comments: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct IntervalLogInput {
    pub id: i64,
    #[serde(default)]
    pub split_times: Vec<SplitTimeInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunCompletion {
    pub scheduled_date: Option<String>,
    pub rpe: Option<i16>,
    pub comments: Option<String>,
    #[serde(default)]
    pub intervals: Vec<IntervalLogInput>,
}

/// Session feedback shared by mobility and HIIT completion.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionFeedback {
    pub rpe: Option<i16>,
    pub comments: Option<String>,
}
