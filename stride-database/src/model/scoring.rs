use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScoreType {
    WorkoutCompletion,
    MovementScore,
    FullRunningSplits,
}

impl ScoreType {
    pub const ALL: [ScoreType; 3] = [
        ScoreType::WorkoutCompletion,
        ScoreType::MovementScore,
        ScoreType::FullRunningSplits,
    ];

    /// Ledger label stored in `score_logs.score_type`.
    pub fn label(self) -> &'static str {
        match self {
            Self::WorkoutCompletion => "Workout Completion",
            Self::MovementScore => "Movement Score",
            Self::FullRunningSplits => "Full Running Splits",
        }
    }

    pub fn points(self) -> i32 {
        match self {
            Self::WorkoutCompletion => 50,
            Self::MovementScore => 5,
            Self::FullRunningSplits => 20,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

/// What an award is keyed on; each key can earn a given score type once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreKey {
    Workout(i64),
    SectionMovement(i64),
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ScoreLog {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub score_type: String,
    pub score_value: i32,
    pub timestamp: DateTime<Utc>,
    pub workout_id: Option<i64>,
    pub section_movement_id: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub user: i64,
    pub username: String,
    pub first_name: String,
    pub profile_image: Option<String>,
    pub total_score: i32,
    pub weekly_score: i32,
    pub monthly_score: i32,
    pub total_rank: i32,
    pub weekly_rank: i32,
    pub monthly_rank: i32,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::ScoreType;

    #[test]
    fn score_values_match_rules() {
        assert_eq!(ScoreType::WorkoutCompletion.points(), 50);
        assert_eq!(ScoreType::MovementScore.points(), 5);
        assert_eq!(ScoreType::FullRunningSplits.points(), 20);
    }

    #[test]
    fn labels_resolve_back() {
        for kind in ScoreType::ALL {
            assert_eq!(ScoreType::from_label(kind.label()), Some(kind));
        }
        assert_eq!(ScoreType::from_label("Bonus"), None);
    }
}
