use chrono::Utc;
use stride_database::Database;
use stride_database::impls::notifications::{due_notifications, mark_notification_sent};
use stride_database::model::notifications::DueNotification;
use stride_push::{PushMessage, PushService};
use tracing::{debug, warn};

const BATCH_SIZE: i64 = 100;

/// `None` when the owner has no push token.
pub fn push_message(due: &DueNotification) -> Option<PushMessage> {
    let token = due
        .expo_push_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())?;

    Some(
        PushMessage::new(token, due.title.clone())
            .subtitle(Some(due.subtitle.clone()))
            .body(Some(due.body.clone())),
    )
}

/// Sends every due notification and marks the delivered ones as sent.
pub async fn run(db: &Database, push: &PushService) -> anyhow::Result<usize> {
    let now = Utc::now();
    let mut after_id = 0;
    let mut sent = 0;

    loop {
        let due = due_notifications(db, now, after_id, BATCH_SIZE).await?;
        let Some(last) = due.last() else {
            break;
        };
        after_id = last.id;

        for notification in &due {
            let Some(message) = push_message(notification) else {
                debug!(
                    notification_id = notification.id,
                    owner_id = ?notification.owner_id,
                    "owner has no push token; leaving pending"
                );
                continue;
            };

            match push.send(&message).await {
                Ok(_) => {
                    mark_notification_sent(db, notification.id).await?;
                    sent += 1;
                }
                Err(err) => warn!(
                    notification_id = notification.id,
                    ?err,
                    "push delivery failed; leaving pending"
                ),
            }
        }

        if (due.len() as i64) < BATCH_SIZE {
            break;
        }
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use stride_database::model::notifications::DueNotification;

    use super::push_message;

    fn due(token: Option<&str>) -> DueNotification {
        DueNotification {
            id: 1,
            owner_id: Some(2),
            expo_push_token: token.map(str::to_owned),
            title: "Workout reminder".to_owned(),
            subtitle: String::new(),
            body: "Upper body at 18:00".to_owned(),
        }
    }

    #[test]
    fn owners_without_token_are_skipped() {
        assert!(push_message(&due(None)).is_none());
        assert!(push_message(&due(Some("  "))).is_none());
    }

    #[test]
    fn message_uses_owner_token() {
        let message = push_message(&due(Some("ExponentPushToken[xyz]"))).unwrap();
        assert_eq!(message.to, "ExponentPushToken[xyz]");
        assert_eq!(message.title, "Workout reminder");
        assert_eq!(message.subtitle, None);
        assert_eq!(message.body.as_deref(), Some("Upper body at 18:00"));
    }
}
