use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ChatRoom {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatAuthor {
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ChatMessageRow {
    pub id: i64,
    pub room_id: i64,
    pub owner_id: i64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
}

/// Message as delivered to clients over REST and WebSocket.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub room: i64,
    pub content: String,
    pub owner: ChatAuthor,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: row.id,
            room: row.room_id,
            content: row.content,
            owner: ChatAuthor {
                first_name: row.first_name,
                last_name: row.last_name,
                profile_image: row.profile_image,
            },
            timestamp: row.timestamp,
        }
    }
}
