use serde::Deserialize;

/// One labelled part of a candidate plan, e.g. `{"partLabel": "Build 1", ...}`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPart {
    #[serde(default)]
    pub part_label: String,
    #[serde(default)]
    pub movements: Vec<String>,
}

/// Movement slots extracted from a candidate plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanSlots {
    pub strong_1: String,
    pub strong_2: String,
    pub build_1_movement_1: String,
    pub build_1_movement_2: String,
    pub build_2_movement_1: String,
    pub build_2_movement_2: String,
    pub pump_1_movement_1: String,
    pub pump_1_movement_2: String,
    pub pump_2_movement_1: String,
    pub pump_2_movement_2: String,
    /// `(movement, "<Category> N")` for every counted movement.
    pub usage: Vec<(String, String)>,
}

#[derive(Clone, Debug)]
pub struct PlanContext<'a> {
    pub workout_type: &'a str,
    pub workout_time: i32,
    pub complexity: &'a str,
    pub finish_type: &'a str,
}
