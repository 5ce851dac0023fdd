use crate::database::Database;
use crate::model::chat::{ChatMessage, ChatMessageRow, ChatRoom};

const MESSAGE_SELECT: &str = "SELECT m.id, m.room_id, m.owner_id, m.content, m.timestamp,
            u.first_name, u.last_name, u.profile_image
     FROM chat_messages m
     JOIN users u ON u.id = m.owner_id";

pub async fn list_rooms(db: &Database) -> anyhow::Result<Vec<ChatRoom>> {
    let rooms = sqlx::query_as::<_, ChatRoom>("SELECT id, name FROM chat_rooms ORDER BY name")
        .fetch_all(db.pool())
        .await?;

    Ok(rooms)
}

pub async fn find_room(db: &Database, room_id: i64) -> anyhow::Result<Option<ChatRoom>> {
    let room = sqlx::query_as::<_, ChatRoom>("SELECT id, name FROM chat_rooms WHERE id = $1")
        .bind(room_id)
        .fetch_optional(db.pool())
        .await?;

    Ok(room)
}

pub async fn find_room_by_name(db: &Database, name: &str) -> anyhow::Result<Option<ChatRoom>> {
    let room = sqlx::query_as::<_, ChatRoom>("SELECT id, name FROM chat_rooms WHERE name = $1")
        .bind(name)
        .fetch_optional(db.pool())
        .await?;

    Ok(room)
}

/// Messages newest first; `None` limit returns the whole room.
pub async fn list_messages(
    db: &Database,
    room_id: i64,
    offset: u32,
    limit: Option<u32>,
) -> anyhow::Result<Vec<ChatMessage>> {
    let rows = sqlx::query_as::<_, ChatMessageRow>(&format!(
        "{MESSAGE_SELECT}
         WHERE m.room_id = $1
         ORDER BY m.timestamp DESC, m.id DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(room_id)
    .bind(i64::from(offset))
    .bind(limit.map(i64::from))
    .fetch_all(db.pool())
    .await?;

    Ok(rows.into_iter().map(ChatMessage::from).collect())
}

pub async fn create_message(
    db: &Database,
    room_id: i64,
    owner_id: i64,
    content: &str,
) -> anyhow::Result<ChatMessage> {
    let message_id: i64 = sqlx::query_scalar(
        "INSERT INTO chat_messages (room_id, owner_id, content) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(room_id)
    .bind(owner_id)
    .bind(content)
    .fetch_one(db.pool())
    .await?;

    let row = sqlx::query_as::<_, ChatMessageRow>(&format!("{MESSAGE_SELECT} WHERE m.id = $1"))
        .bind(message_id)
        .fetch_one(db.pool())
        .await?;

    Ok(row.into())
}
