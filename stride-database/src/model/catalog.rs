use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movement {
    pub id: i64,
    pub body_area: Option<String>,
    pub movement: Option<String>,
    pub exercise: Option<String>,
    pub complexity: Option<i16>,
    pub movement_type: Option<String>,
    pub primary_body_part: Option<String>,
    pub landscape_video_url: Option<String>,
    pub portrait_video_url: Option<String>,
    pub landscape_thumbnail: Option<String>,
    #[sqlx(skip)]
    pub equipment_combos: Vec<EquipmentCombo>,
}

/// One way of performing a movement, e.g. "Barbell + Bench".
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EquipmentCombo {
    pub combo_label: Option<String>,
    pub equipment: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Equipment {
    pub id: i64,
    pub equipment_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct RunningSession {
    pub id: i64,
    pub session_type: String,
    pub session_name: Option<String>,
    pub duration: String,
    pub warmup_distance: Option<f64>,
    pub cool_down_distance: Option<f64>,
    pub total_distance: Option<f64>,
    pub notes: Option<String>,
    #[sqlx(skip)]
    pub intervals: Vec<RunningInterval>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct RunningInterval {
    pub id: i64,
    pub session_id: i64,
    pub repeat_variation: i16,
    pub repeats: i32,
    pub repeat_distance: Option<f64>,
    pub target_pace: String,
    pub rest_time: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct MobilityWorkout {
    pub id: i64,
    pub workout_name: String,
    pub body_area: Option<String>,
    pub duration: Option<f64>,
    pub summary: Option<String>,
    pub number_of_movements: Option<f64>,
    #[sqlx(skip)]
    pub details: Vec<MobilityWorkoutDetail>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct MobilityWorkoutDetail {
    pub id: i64,
    pub session_id: Option<i64>,
    pub exercise: Option<String>,
    pub order: i32,
    pub duration: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SuggestedStrength {
    pub id: i64,
    pub workout_name: String,
    pub body_area: Option<String>,
    pub duration: Option<f64>,
    pub description: Option<String>,
    pub number_of_sections: Option<f64>,
    #[sqlx(skip)]
    pub details: Vec<SuggestedStrengthDetail>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SuggestedStrengthDetail {
    pub id: i64,
    pub session_id: Option<i64>,
    pub section_name: Option<String>,
    pub section_number: i32,
    pub section_movement: i32,
    pub exercise: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConditioningOverview {
    pub id: i64,
    pub name: String,
    pub duration: Option<i32>,
    pub movements: Option<i32>,
    pub rest: Option<i32>,
    pub notes: Option<String>,
    #[sqlx(skip)]
    pub conditioning_details: Vec<ConditioningDetail>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConditioningDetail {
    pub id: i64,
    pub conditioning_overview_id: Option<i64>,
    pub movement_order: Option<i32>,
    pub exercise: Option<String>,
    pub detail: Option<String>,
}
