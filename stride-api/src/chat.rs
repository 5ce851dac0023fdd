use axum::{
    Json, Router,
    extract::{
        State,
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use stride_core::{AppError, AppState};
use stride_database::impls::chat::{
    create_message, find_room, find_room_by_name, list_messages, list_rooms,
};
use stride_database::model::chat::{ChatMessage, ChatRoom};
use stride_utils::pagination::{Page, PageQuery};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::RouteMeta;
use crate::extract::{ApiPath, ApiQuery, UserQuery, existing_user};

pub const ROUTES: &[RouteMeta] = &[
    RouteMeta {
        method: "GET",
        path: "/api/chat/rooms/",
        desc: "All chat rooms.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/chat/rooms/{room_id}/",
        desc: "A page of a room's messages, newest first.",
    },
    RouteMeta {
        method: "GET",
        path: "/api/chat/rooms/{room_id}/messages/",
        desc: "Every message in a room, newest first.",
    },
    RouteMeta {
        method: "POST",
        path: "/api/chat/rooms/{room_id}/messages/",
        desc: "Posts a message and relays it to live subscribers.",
    },
    RouteMeta {
        method: "GET",
        path: "/ws/chat/{room_name}/",
        desc: "Live room connection; requires ?token=.",
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat/rooms/", get(rooms))
        .route("/api/chat/rooms/{room_id}/", get(room_page))
        .route(
            "/api/chat/rooms/{room_id}/messages/",
            get(room_messages).post(post_message),
        )
        .route("/ws/chat/{room_name}/", get(chat_socket))
}

async fn rooms(State(state): State<AppState>) -> Result<Json<Vec<ChatRoom>>, AppError> {
    Ok(Json(list_rooms(&state.db).await?))
}

async fn room_or_404(state: &AppState, room_id: i64) -> Result<ChatRoom, AppError> {
    find_room(&state.db, room_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat room not found"))
}

async fn room_page(
    State(state): State<AppState>,
    ApiPath(room_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let room = room_or_404(&state, room_id).await?;
    let page = Page::from_query(query);

    Ok(Json(
        list_messages(&state.db, room.id, page.offset, Some(page.limit)).await?,
    ))
}

async fn room_messages(
    State(state): State<AppState>,
    ApiPath(room_id): ApiPath<i64>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let room = room_or_404(&state, room_id).await?;
    Ok(Json(list_messages(&state.db, room.id, 0, None).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct IncomingMessage {
    pub content: Option<String>,
}

impl IncomingMessage {
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|content| !content.is_empty())
    }
}

async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(room_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
    payload: Result<Json<IncomingMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    let user_id = existing_user(&state, &headers, &query).await?;
    let Json(incoming) = payload?;
    let room = room_or_404(&state, room_id).await?;

    let content = incoming
        .text()
        .ok_or_else(|| AppError::bad_request("Message content is required"))?;

    let message = create_message(&state.db, room.id, user_id, content).await?;
    let delivered = state.chat.publish(&room.name, message.clone());
    debug!(room = %room.name, user_id, delivered, "chat message posted");

    Ok((StatusCode::CREATED, Json(message)))
}

/// Payload pushed to live subscribers.
pub fn outgoing_frame(message: &ChatMessage) -> Value {
    json!({
        "content": message.content,
        "owner": message.owner,
        "timestamp": message.timestamp,
    })
}

#[derive(Debug, Default, Deserialize)]
struct SocketQuery {
    token: Option<String>,
}

async fn chat_socket(
    State(state): State<AppState>,
    ApiPath(room_name): ApiPath<String>,
    ApiQuery(query): ApiQuery<SocketQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let token = query
        .token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::forbidden("A token is required"))?;
    let claims = state
        .tokens
        .verify(token, Utc::now().timestamp())
        .map_err(|err| AppError::forbidden(format!("Invalid token: {err}")))?;

    let room = find_room_by_name(&state.db, &room_name)
        .await?
        .ok_or_else(|| AppError::not_found("Chat room not found"))?;

    let upgrade = upgrade.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let user_id = claims.sub;

    Ok(upgrade.on_upgrade(move |socket| serve_socket(state, room, user_id, socket)))
}

async fn serve_socket(state: AppState, room: ChatRoom, user_id: i64, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let mut subscription = state.chat.join(&room.name);
    info!(room = %room.name, user_id, "chat socket connected");

    let room_name = room.name.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            match subscription.recv().await {
                Ok(message) => {
                    let frame = outgoing_frame(&message).to_string();
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(room = %room_name, skipped, "chat subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let recv_state = state.clone();
    let recv_room = room.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = stream.next().await {
            match frame {
                Message::Text(text) => {
                    relay_frame(&recv_state, &recv_room, user_id, text.as_str()).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!(room = %room.name, user_id, "chat socket closed");
}

async fn relay_frame(state: &AppState, room: &ChatRoom, user_id: i64, raw: &str) {
    let incoming = match serde_json::from_str::<IncomingMessage>(raw) {
        Ok(incoming) => incoming,
        Err(err) => {
            warn!(room = %room.name, user_id, error = %err, "unreadable chat frame");
            return;
        }
    };
    let Some(content) = incoming.text() else {
        return;
    };

    match create_message(&state.db, room.id, user_id, content).await {
        Ok(message) => {
            state.chat.publish(&room.name, message);
        }
        Err(err) => warn!(room = %room.name, user_id, error = ?err, "failed to store chat message"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use stride_database::model::chat::{ChatAuthor, ChatMessage};

    use super::{IncomingMessage, outgoing_frame};

    #[test]
    fn incoming_content_is_trimmed() {
        let blank = IncomingMessage {
            content: Some("   ".to_owned()),
        };
        assert_eq!(blank.text(), None);

        let hello = IncomingMessage {
            content: Some(" hello ".to_owned()),
        };
        assert_eq!(hello.text(), Some("hello"));
    }

    #[test]
    fn outgoing_frame_carries_author() {
        let message = ChatMessage {
            id: 3,
            room: 1,
            content: "nice run".to_owned(),
            owner: ChatAuthor {
                first_name: "Kai".to_owned(),
                last_name: "Lee".to_owned(),
                profile_image: None,
            },
            timestamp: Utc.with_ymd_and_hms(2025, 5, 1, 7, 0, 0).unwrap(),
        };

        let frame = outgoing_frame(&message);
        assert_eq!(frame["content"], "nice run");
        assert_eq!(frame["owner"]["first_name"], "Kai");
        assert!(frame.get("id").is_none());
    }
}
