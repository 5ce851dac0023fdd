pub mod client;
pub mod message;

pub use client::PushService;
pub use message::{PushMessage, PushTicket};
