use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stride_database::model::chat::ChatMessage;
use tokio::sync::broadcast;
use tracing::debug;

const ROOM_CAPACITY: usize = 64;

type Rooms = HashMap<String, broadcast::Sender<ChatMessage>>;

/// In-process fan-out of chat messages, one broadcast channel per room.
#[derive(Clone, Debug, Default)]
pub struct ChatHub {
    rooms: Arc<Mutex<Rooms>>,
}

impl ChatHub {
    fn rooms(&self) -> MutexGuard<'_, Rooms> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to a room, creating its channel on first join.
    pub fn join(&self, room: &str) -> RoomSubscription {
        let mut rooms = self.rooms();
        let receiver = match rooms.get(room) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(ROOM_CAPACITY);
                rooms.insert(room.to_string(), sender);
                debug!(room, "chat room opened");
                receiver
            }
        };

        RoomSubscription {
            hub: self.clone(),
            room: room.to_string(),
            receiver,
        }
    }

    /// Returns how many subscribers received the message.
    pub fn publish(&self, room: &str, message: ChatMessage) -> usize {
        let rooms = self.rooms();
        rooms
            .get(room)
            .and_then(|sender| sender.send(message).ok())
            .unwrap_or(0)
    }

    pub fn is_open(&self, room: &str) -> bool {
        self.rooms().contains_key(room)
    }

    pub fn subscriber_count(&self, room: &str) -> usize {
        self.rooms()
            .get(room)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn leave(&self, room: &str) {
        let mut rooms = self.rooms();
        // The departing receiver is still alive here.
        let last = rooms
            .get(room)
            .is_some_and(|sender| sender.receiver_count() <= 1);
        if last {
            rooms.remove(room);
            debug!(room, "chat room closed");
        }
    }
}

/// A live subscription; dropping it leaves the room.
#[derive(Debug)]
pub struct RoomSubscription {
    hub: ChatHub,
    room: String,
    receiver: broadcast::Receiver<ChatMessage>,
}

impl RoomSubscription {
    pub fn room(&self) -> &str {
        &self.room
    }

    pub async fn recv(&mut self) -> Result<ChatMessage, broadcast::error::RecvError> {
        self.receiver.recv().await
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.hub.leave(&self.room);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stride_database::model::chat::{ChatAuthor, ChatMessage};

    use super::ChatHub;

    fn message(content: &str) -> ChatMessage {
        ChatMessage {
            id: 1,
            room: 1,
            content: content.to_string(),
            owner: ChatAuthor {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                profile_image: None,
            },
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_messages() {
        let hub = ChatHub::default();
        let mut first = hub.join("general");
        let mut second = hub.join("general");

        assert_eq!(hub.publish("general", message("hello")), 2);
        assert_eq!(first.recv().await.unwrap().content, "hello");
        assert_eq!(second.recv().await.unwrap().content, "hello");
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let hub = ChatHub::default();
        let _runners = hub.join("runners");
        let mut lifters = hub.join("lifters");

        hub.publish("runners", message("5k today"));
        hub.publish("lifters", message("squats"));

        assert_eq!(lifters.recv().await.unwrap().content, "squats");
    }

    #[test]
    fn room_closes_after_last_subscriber_leaves() {
        let hub = ChatHub::default();
        let first = hub.join("general");
        let second = hub.join("general");
        assert_eq!(hub.subscriber_count("general"), 2);

        drop(first);
        assert!(hub.is_open("general"));

        drop(second);
        assert!(!hub.is_open("general"));
        assert_eq!(hub.publish("general", message("anyone?")), 0);
    }
}
