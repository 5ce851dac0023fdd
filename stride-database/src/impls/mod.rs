pub mod catalog;
pub mod chat;
pub mod completion;
pub mod equipment_filters;
pub mod leaderboard;
pub mod movement_stats;
pub mod notifications;
pub mod plans;
pub mod scoring;
pub mod sections;
pub mod user_stats;
pub mod users;
pub mod workouts;
