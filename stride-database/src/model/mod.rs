pub mod catalog;
pub mod chat;
pub mod equipment;
pub mod notifications;
pub mod plans;
pub mod scoring;
pub mod sessions;
pub mod stats;
pub mod users;
pub mod workouts;
