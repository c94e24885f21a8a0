//! Expo push notification client.
//!
//! Talks to `https://exp.host/--/api/v2/push/send`. Expo accepts either a single
//! message object or an array of up to 100 messages per request, and answers
//! with one ticket object or an array of tickets to match.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Expo rejects batches larger than this.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ExpoError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("expo push api returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("expo rejected {failed} of {total} messages")]
    Tickets { failed: usize, total: usize },
}

/// One push message.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<i32>,
}

impl PushMessage {
    pub fn new(
        to: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            to: to.into(),
            title: title.into(),
            body: body.into(),
            data,
            sound: Some("default".to_string()),
            badge: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    data: TicketData,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TicketData {
    Many(Vec<PushTicket>),
    One(PushTicket),
}

impl TicketData {
    fn into_tickets(self) -> Vec<PushTicket> {
        match self {
            TicketData::Many(tickets) => tickets,
            TicketData::One(ticket) => vec![ticket],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PushTicket {
    pub status: String,
    pub id: Option<String>,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl PushTicket {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

#[derive(Debug, Clone)]
pub struct ExpoClient {
    client: Client,
    access_token: Option<String>,
    endpoint: String,
}

impl ExpoClient {
    pub fn new(access_token: Option<String>) -> Self {
        Self::with_endpoint(access_token, EXPO_PUSH_URL)
    }

    /// Point the client at a different push endpoint (mock servers, proxies).
    pub fn with_endpoint(access_token: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token,
            endpoint: endpoint.into(),
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Send a single message. Any error ticket fails the call.
    pub async fn send(&self, message: &PushMessage) -> Result<(), ExpoError> {
        info!(to = %message.to, "Sending Expo push notification");

        let tickets = self.post(message).await?;
        let failed = tickets.iter().filter(|t| t.is_error()).count();
        if failed > 0 {
            error!(?tickets, "Expo ticket error");
            return Err(ExpoError::Tickets {
                failed,
                total: tickets.len(),
            });
        }
        Ok(())
    }

    /// Send messages in chunks of [`MAX_BATCH_SIZE`].
    ///
    /// Error tickets are logged and counted but do not abort the remaining chunks.
    /// Returns the number of rejected messages.
    pub async fn send_batch(&self, messages: &[PushMessage]) -> Result<usize, ExpoError> {
        let mut failed = 0;
        for chunk in messages.chunks(MAX_BATCH_SIZE) {
            info!(count = chunk.len(), "Sending batch of Expo push notifications");
            let tickets = self.post(chunk).await?;
            for ticket in tickets.iter().filter(|t| t.is_error()) {
                error!(?ticket, "Expo ticket error");
                failed += 1;
            }
        }
        Ok(failed)
    }

    async fn post<T: Serialize + ?Sized>(&self, payload: &T) -> Result<Vec<PushTicket>, ExpoError> {
        let mut request = self.client.post(&self.endpoint).json(payload);

        // Authenticated requests get higher rate limits
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "Expo push failed");
            return Err(ExpoError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PushResponse = response.json().await?;
        Ok(parsed.data.into_tickets())
    }
}
