pub mod auth;
pub mod chat;
pub mod error;
pub mod state;

pub use error::AppError;
pub use state::AppState;

pub type Error = anyhow::Error;
