//! External messenger collaborator.
//!
//! Wraps the HTTP surface of the messaging-bot service behind the
//! [`Messenger`] trait. Pushes are best-effort by contract: the dispatcher
//! logs a failed send and moves on, and nothing here is ever allowed to roll
//! back a booking transition.

use std::time::Duration;

use serde::Serialize;
use slotbook_core::types::MessengerId;

/// Request timeout for calls to the bot service.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("messenger request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("messenger returned status {0}")]
    Status(reqwest::StatusCode),
}

/// A rendered message ready for the messaging channel.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub title: String,
    pub body: String,
}

/// Push-only delivery to a messaging identity. No delivery receipt is
/// consumed; an `Ok` means the bot service accepted the message.
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    /// Push a rendered message to a user on the messaging channel.
    async fn send(
        &self,
        recipient: MessengerId,
        message: &OutboundMessage,
    ) -> Result<(), MessengerError>;

    /// Ask the bot to prompt the user to confirm a web login attempt.
    async fn send_login_prompt(&self, recipient: MessengerId) -> Result<(), MessengerError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct NotifyPayload<'a> {
    messenger_id: MessengerId,
    title: &'a str,
    message: &'a str,
}

/// Talks to the bot service over its internal HTTP notifier endpoints,
/// authenticated with a shared internal token header.
pub struct HttpMessenger {
    client: reqwest::Client,
    base_url: String,
    internal_token: String,
}

impl HttpMessenger {
    pub fn new(base_url: impl Into<String>, internal_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            base_url: base_url.into(),
            internal_token: internal_token.into(),
        }
    }

    fn check_status(response: &reqwest::Response) -> Result<(), MessengerError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(MessengerError::Status(response.status()))
        }
    }
}

#[async_trait::async_trait]
impl Messenger for HttpMessenger {
    async fn send(
        &self,
        recipient: MessengerId,
        message: &OutboundMessage,
    ) -> Result<(), MessengerError> {
        let url = format!("{}/notify", self.base_url);
        let payload = NotifyPayload {
            messenger_id: recipient,
            title: &message.title,
            message: &message.body,
        };

        let response = self
            .client
            .post(&url)
            .header("X-Internal-Token", &self.internal_token)
            .json(&payload)
            .send()
            .await?;
        Self::check_status(&response)
    }

    async fn send_login_prompt(&self, recipient: MessengerId) -> Result<(), MessengerError> {
        let url = format!("{}/notify-login/{recipient}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-Internal-Token", &self.internal_token)
            .send()
            .await?;
        Self::check_status(&response)
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

/// Accepts and discards every message. Used by tests and by deployments that
/// run without a bot service configured.
#[derive(Debug, Default)]
pub struct NoopMessenger;

#[async_trait::async_trait]
impl Messenger for NoopMessenger {
    async fn send(
        &self,
        recipient: MessengerId,
        message: &OutboundMessage,
    ) -> Result<(), MessengerError> {
        tracing::debug!(recipient, title = %message.title, "Noop messenger: dropping message");
        Ok(())
    }

    async fn send_login_prompt(&self, recipient: MessengerId) -> Result<(), MessengerError> {
        tracing::debug!(recipient, "Noop messenger: dropping login prompt");
        Ok(())
    }
}
