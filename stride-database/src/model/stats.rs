use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct UserStats {
    #[serde(rename = "owner")]
    pub owner_id: i64,
    pub weekly_body_part: serde_json::Value,
    pub monthly_body_part: serde_json::Value,
    pub yearly_body_part: serde_json::Value,
    pub weekly_activity_type: serde_json::Value,
    pub monthly_activity_type: serde_json::Value,
    pub yearly_activity_type: serde_json::Value,
    pub last_updated: DateTime<Utc>,
}

/// Distinct movement appearing in a completed workout, used for body-part counts.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct BodyPartRow {
    pub workout_id: i64,
    pub completed_date: NaiveDate,
    pub section_name: Option<String>,
    pub movement_id: i64,
    pub primary_body_part: Option<String>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ActivityRow {
    pub completed_date: NaiveDate,
    pub activity_type: Option<String>,
    pub duration: Option<i16>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct StrengthSet {
    pub id: i64,
    #[serde(rename = "owner")]
    pub owner_id: Option<i64>,
    #[serde(rename = "movement")]
    pub movement_id: i64,
    #[serde(rename = "workout")]
    pub workout_id: Option<i64>,
    pub performed_date: NaiveDate,
    pub set_number: Option<i16>,
    pub reps: i16,
    pub weight: f64,
    pub rpe: f64,
    pub load: Option<f64>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct MovementSummary {
    pub id: i64,
    #[serde(rename = "owner")]
    pub owner_id: Option<i64>,
    #[serde(rename = "movement")]
    pub movement_id: i64,
    pub best_weight: Option<f64>,
    pub best_reps: Option<f64>,
    pub estimated_1rm: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovementSummaryReport {
    pub summaries: Vec<MovementSummary>,
    pub strength_sets: Vec<StrengthSet>,
}
