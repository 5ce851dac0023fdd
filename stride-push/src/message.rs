use serde::{Deserialize, Serialize};

/// Body accepted by the Expo push endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl PushMessage {
    pub fn new(to: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            title: title.into(),
            subtitle: None,
            body: None,
        }
    }

    pub fn subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = subtitle.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn body(mut self, body: Option<String>) -> Self {
        self.body = body.filter(|value| !value.trim().is_empty());
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PushTicket {
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PushTicket {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PushResponse {
    #[serde(default)]
    pub data: Option<PushTicket>,
    #[serde(default)]
    pub errors: Vec<PushResponseError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PushResponseError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::{PushMessage, PushResponse};

    #[test]
    fn blank_optional_fields_are_omitted() {
        let message = PushMessage::new("ExponentPushToken[abc]", "Workout today")
            .subtitle(Some("   ".to_string()))
            .body(Some("Leg day at 6pm".to_string()));

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["to"], "ExponentPushToken[abc]");
        assert_eq!(json["body"], "Leg day at 6pm");
        assert!(json.get("subtitle").is_none());
    }

    #[test]
    fn parses_ticket_and_error_responses() {
        let ok: PushResponse =
            serde_json::from_str(r#"{"data":{"status":"ok","id":"XXXX"}}"#).unwrap();
        assert!(ok.data.unwrap().is_ok());

        let failed: PushResponse = serde_json::from_str(
            r#"{"data":{"status":"error","message":"not registered","details":{}}}"#,
        )
        .unwrap();
        let ticket = failed.data.unwrap();
        assert!(!ticket.is_ok());
        assert_eq!(ticket.message.as_deref(), Some("not registered"));

        let rejected: PushResponse =
            serde_json::from_str(r#"{"errors":[{"code":"VALIDATION_ERROR","message":"bad"}]}"#)
                .unwrap();
        assert!(rejected.data.is_none());
        assert_eq!(rejected.errors[0].message, "bad");
    }
}
