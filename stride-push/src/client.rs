use std::env;
use std::time::Duration;

use anyhow::Context as _;
use tracing::debug;

use crate::message::{PushMessage, PushResponse, PushTicket};

const DEFAULT_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Clone, Debug)]
pub struct PushService {
    client: reqwest::Client,
    url: String,
    access_token: Option<String>,
}

impl PushService {
    pub fn from_env_optional() -> anyhow::Result<Option<Self>> {
        let enabled = env::var("EXPO_PUSH_ENABLED")
            .ok()
            .map(|value| {
                matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(true);

        if !enabled {
            return Ok(None);
        }

        Ok(Some(Self::from_env()?))
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let url = env::var("EXPO_PUSH_URL")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PUSH_URL.to_owned());
        let access_token = env::var("EXPO_ACCESS_TOKEN")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        Self::new(url, access_token)
    }

    pub fn new(url: impl Into<String>, access_token: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build push http client")?;

        Ok(Self {
            client,
            url: url.into(),
            access_token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one notification and returns the ticket Expo hands back.
    pub async fn send(&self, message: &PushMessage) -> anyhow::Result<PushTicket> {
        let mut request = self.client.post(&self.url).json(message);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("failed to reach push service")?;
        let status = response.status();
        let body: PushResponse = response
            .json()
            .await
            .with_context(|| format!("unreadable push response (status {status})"))?;

        if let Some(error) = body.errors.first() {
            anyhow::bail!(
                "push rejected ({}): {}",
                error.code.as_deref().unwrap_or("unknown"),
                error.message
            );
        }

        let ticket = body
            .data
            .with_context(|| format!("push response without ticket (status {status})"))?;
        if !ticket.is_ok() {
            anyhow::bail!(
                "push ticket error: {}",
                ticket.message.as_deref().unwrap_or("no message")
            );
        }

        debug!(to = %message.to, ticket = ?ticket.id, "push delivered");
        Ok(ticket)
    }
}
