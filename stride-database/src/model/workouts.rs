use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::catalog::Movement;
use crate::model::sessions::{
    SavedConditioning, SavedHiitSession, SavedMobilitySessionDetail, SavedRunningSessionDetail,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutStatus {
    Saved,
    Scheduled,
    Started,
    Completed,
}

impl WorkoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "Saved",
            Self::Scheduled => "Scheduled",
            Self::Started => "Started",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Saved" => Some(Self::Saved),
            "Scheduled" => Some(Self::Scheduled),
            "Started" => Some(Self::Started),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityType {
    Gym,
    Running,
    Mobility,
    Hiit,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gym => "Gym",
            Self::Running => "Running",
            Self::Mobility => "Mobility",
            Self::Hiit => "Hiit",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Gym" => Some(Self::Gym),
            "Running" => Some(Self::Running),
            "Mobility" => Some(Self::Mobility),
            "Hiit" => Some(Self::Hiit),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Workout {
    pub id: i64,
    #[serde(rename = "owner")]
    pub owner_id: Option<i64>,
    pub workout_number: Option<f64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub activity_type: Option<String>,
    pub complexity: Option<i16>,
    pub duration: Option<i16>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_date: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
}

impl Workout {
    pub fn activity(&self) -> Option<ActivityType> {
        self.activity_type.as_deref().and_then(ActivityType::parse)
    }

    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some(WorkoutStatus::Completed.as_str())
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Section {
    pub id: i64,
    pub workout_id: Option<i64>,
    pub section_name: Option<String>,
    pub section_type: Option<String>,
    pub section_order: Option<i16>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SectionMovement {
    pub id: i64,
    pub section_id: Option<i64>,
    pub movement_id: Option<i64>,
    pub movement_order: Option<i16>,
    pub movement_difficulty: Option<i16>,
    pub movement_comment: Option<String>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SetRecord {
    pub id: i64,
    pub section_movement_id: Option<i64>,
    pub set_number: Option<i16>,
    pub reps: Option<i16>,
    pub weight: Option<f64>,
}

/// Workout with every nested child attached.
#[derive(Clone, Debug, Serialize)]
pub struct PopulatedWorkout {
    #[serde(flatten)]
    pub workout: Workout,
    pub workout_sections: Vec<PopulatedSection>,
    pub running_sessions: Vec<SavedRunningSessionDetail>,
    pub mobility_sessions: Vec<SavedMobilitySessionDetail>,
    pub hiit_sessions: Vec<SavedHiitSession>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PopulatedSection {
    #[serde(flatten)]
    pub section: Section,
    pub section_movement_details: Vec<PopulatedSectionMovement>,
    pub conditioning_elements: Vec<SavedConditioning>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PopulatedSectionMovement {
    #[serde(flatten)]
    pub section_movement: SectionMovement,
    pub movements: Option<Movement>,
    pub workout_sets: Vec<SetRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HistorySet {
    pub set_number: Option<i16>,
    pub reps: Option<i16>,
    pub weight: Option<f64>,
}

/// One past performance of a movement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovementHistoryEntry {
    pub workout_date: NaiveDate,
    pub movement_difficulty: Option<i16>,
    pub sets: Vec<HistorySet>,
}

/// Flat row joined from completed workouts down to sets.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct HistoryRow {
    pub movement_id: i64,
    pub section_movement_id: i64,
    pub completed_date: NaiveDate,
    pub movement_difficulty: Option<i16>,
    pub set_number: Option<i16>,
    pub reps: Option<i16>,
    pub weight: Option<f64>,
}

// ---------------------------------------------------------------------------
// Save payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct NewWorkout<'a> {
    pub owner_id: i64,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub status: WorkoutStatus,
    pub activity_type: ActivityType,
    pub complexity: Option<i16>,
    pub duration: Option<i16>,
    pub scheduled_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GymSectionInput {
    pub section_name: Option<String>,
    pub section_type: Option<String>,
    pub section_order: Option<i16>,
    pub conditioning_overview_id: Option<i64>,
    #[serde(default)]
    pub movements: Vec<GymMovementInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GymMovementInput {
    pub movement_name: String,
    pub movement_order: Option<i16>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunningIntervalInput {
    pub repeat_variation: Option<i16>,
    pub repeats: Option<i32>,
    pub repeat_distance: Option<f64>,
    pub target_pace: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunningInput {
    pub running_session_id: Option<i64>,
    pub intervals: Option<Vec<RunningIntervalInput>>,
    pub suggested_warmup_pace: Option<i32>,
    pub suggested_cooldown_pace: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MobilityMovementInput {
    pub movement_name: String,
    pub order: Option<f64>,
    pub duration: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MobilityInput {
    pub mobility_workout_id: Option<i64>,
    #[serde(default)]
    pub movements: Vec<MobilityMovementInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HiitSummaryInput {
    pub workout_type: Option<String>,
    pub structure: Option<String>,
    pub duration: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HiitMovementInput {
    pub exercise_name: String,
    pub order: Option<i32>,
    #[serde(default)]
    pub rest_period: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HiitBlockInput {
    pub block_name: Option<String>,
    pub rep_scheme: Option<String>,
    pub order: Option<i32>,
    #[serde(default)]
    pub movements: Vec<HiitMovementInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HiitInput {
    #[serde(default)]
    pub hiit: HiitSummaryInput,
    #[serde(default)]
    pub blocks: Vec<HiitBlockInput>,
}

/// Activity-specific part of a save request.
#[derive(Clone, Debug)]
pub enum WorkoutPayload {
    Gym(Vec<GymSectionInput>),
    Running(RunningInput),
    Mobility(MobilityInput),
    Hiit(HiitInput),
}

impl WorkoutPayload {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            Self::Gym(_) => ActivityType::Gym,
            Self::Running(_) => ActivityType::Running,
            Self::Mobility(_) => ActivityType::Mobility,
            Self::Hiit(_) => ActivityType::Hiit,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct SetInput {
    pub set_number: Option<i16>,
    pub reps: Option<i16>,
    pub weight: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoggedMovementInput {
    pub movement_id: i64,
    pub movement_difficulty: Option<i16>,
    pub movement_comments: Option<String>,
    #[serde(default)]
    pub sets: Vec<SetInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoggedSectionInput {
    pub section_id: i64,
    #[serde(default)]
    pub movements: Vec<LoggedMovementInput>,
}

#[cfg(test)]
mod tests {
    use super::{ActivityType, WorkoutStatus};

    #[test]
    fn status_round_trips_through_labels() {
        for status in [
            WorkoutStatus::Saved,
            WorkoutStatus::Scheduled,
            WorkoutStatus::Started,
            WorkoutStatus::Completed,
        ] {
            assert_eq!(WorkoutStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WorkoutStatus::parse("done"), None);
    }

    #[test]
    fn activity_labels_are_case_sensitive() {
        assert_eq!(ActivityType::parse("Hiit"), Some(ActivityType::Hiit));
        assert_eq!(ActivityType::parse(" Gym "), Some(ActivityType::Gym));
        assert_eq!(ActivityType::parse("gym"), None);
    }
}
