//! Telegram Bot API transport.
//!
//! Outbound messages go through `sendMessage`; announcements are also pinned
//! with `pinChatMessage`. Inbound updates arrive either
//! through the long-polling loop in [`TelegramPoller`] or the webhook route;
//! both hand text messages to the conversation dispatcher.

use std::time::Duration;

use async_trait::async_trait;
use domain::services::{
    ConversationDispatcher, InboundMessage, NotificationError, NotificationGateway, Recipient,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::validation::normalize_handle;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TelegramConfig;

/// Client timeout for calls other than `getUpdates`.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Slack added on top of the long-poll timeout for the HTTP request.
const POLL_TIMEOUT_SLACK_SECS: u64 = 10;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API error {code}: {description}")]
    Api { code: u16, description: String },
}

impl TelegramError {
    /// Whether the Bot API refused the destination rather than the request.
    fn is_unresolved_recipient(&self) -> bool {
        match self {
            TelegramError::Api { code, description } => {
                let description = description.to_ascii_lowercase();
                (*code == 400 && description.contains("chat not found"))
                    || (*code == 400 && description.contains("user not found"))
                    || *code == 403
            }
            TelegramError::Http(_) => false,
        }
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl Update {
    /// The text message carried by this update, if any.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        let text = message.text?;
        let (sender_id, sender_name) = match message.from {
            Some(user) => (Some(user.id.to_string()), user.first_name),
            None => (None, None),
        };
        Some(InboundMessage {
            recipient_id: message.chat.id.to_string(),
            sender_id,
            sender_name,
            text,
        })
    }
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct PinChatMessageBody<'a> {
    chat_id: &'a str,
    message_id: i64,
    disable_notification: bool,
}

#[derive(Debug, Serialize)]
struct GetUpdatesBody {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// Thin Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &"[REDACTED]")
            .finish()
    }
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs.max(REQUEST_TIMEOUT_SECS) + POLL_TIMEOUT_SLACK_SECS,
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_base_url.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(TelegramError::Api {
                code: error_code.unwrap_or_else(|| status.as_u16()),
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message, TelegramError> {
        let body = SendMessageBody {
            chat_id,
            text,
            disable_web_page_preview: false,
        };
        self.call("sendMessage", &body, Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .await
    }

    /// Pins a message without notifying the chat members.
    pub async fn pin_chat_message(&self, chat_id: &str, message_id: i64) -> Result<(), TelegramError> {
        let body = PinChatMessageBody {
            chat_id,
            message_id,
            disable_notification: true,
        };
        let _: bool = self
            .call("pinChatMessage", &body, Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .await?;
        Ok(())
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdatesBody {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };
        self.call(
            "getUpdates",
            &body,
            Duration::from_secs(timeout_secs + POLL_TIMEOUT_SLACK_SECS),
        )
        .await
    }

    /// Removes a registered webhook so `getUpdates` is allowed.
    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &serde_json::json!({}),
                Duration::from_secs(REQUEST_TIMEOUT_SECS),
            )
            .await?;
        Ok(())
    }
}

/// Bot API destination for a recipient.
fn chat_id_for(recipient: &Recipient) -> String {
    match recipient {
        Recipient::Chat(id) => id.clone(),
        Recipient::Handle(handle) => format!("@{}", normalize_handle(handle)),
    }
}

fn notification_error(recipient: &Recipient, err: TelegramError) -> NotificationError {
    if err.is_unresolved_recipient() {
        NotificationError::UnresolvedRecipient(recipient.to_string())
    } else {
        NotificationError::Transport(err.to_string())
    }
}

/// Notification gateway backed by the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramGateway {
    client: TelegramClient,
}

impl TelegramGateway {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationGateway for TelegramGateway {
    async fn send_text(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError> {
        let chat_id = chat_id_for(recipient);
        let sent = self
            .client
            .send_message(&chat_id, text)
            .await
            .map_err(|err| notification_error(recipient, err))?;
        debug!(recipient = %recipient, message_id = sent.message_id, "Telegram message sent");
        Ok(())
    }

    async fn send_pinned(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError> {
        let chat_id = chat_id_for(recipient);
        let sent = self
            .client
            .send_message(&chat_id, text)
            .await
            .map_err(|err| notification_error(recipient, err))?;
        self.client
            .pin_chat_message(&chat_id, sent.message_id)
            .await
            .map_err(|err| NotificationError::Transport(err.to_string()))?;
        debug!(recipient = %recipient, message_id = sent.message_id, "Telegram message pinned");
        Ok(())
    }
}

/// Gateway used when the chat transport is disabled. Messages are logged.
#[derive(Debug, Clone, Default)]
pub struct ConsoleGateway;

#[async_trait]
impl NotificationGateway for ConsoleGateway {
    async fn send_text(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError> {
        info!(recipient = %recipient, text = %text, "Chat transport disabled, message not sent");
        Ok(())
    }
}

/// Long-polling loop feeding updates to the dispatcher.
pub struct TelegramPoller {
    client: TelegramClient,
    dispatcher: ConversationDispatcher,
    poll_timeout_secs: u64,
}

impl TelegramPoller {
    pub fn new(
        client: TelegramClient,
        dispatcher: ConversationDispatcher,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            dispatcher,
            poll_timeout_secs,
        }
    }

    /// Runs until `shutdown` is cancelled.
    ///
    /// Updates within a batch are dispatched in order. Transport errors back
    /// off exponentially up to one minute.
    pub async fn run(self, shutdown: CancellationToken) {
        if let Err(err) = self.client.delete_webhook().await {
            warn!(error = %err, "Failed to remove webhook before polling");
        }
        info!(timeout_secs = self.poll_timeout_secs, "Telegram polling started");

        let mut offset = 0_i64;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let batch = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.client.get_updates(offset, self.poll_timeout_secs) => result,
            };

            match batch {
                Ok(updates) => {
                    backoff = INITIAL_BACKOFF;
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let update_id = update.update_id;
                        match update.into_inbound() {
                            Some(message) => {
                                let outcome = self.dispatcher.dispatch(&message).await;
                                debug!(update_id, outcome = ?outcome, "Update dispatched");
                            }
                            None => debug!(update_id, "Skipping non-text update"),
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, retry_in_secs = backoff.as_secs(), "getUpdates failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }

        info!("Telegram polling stopped");
    }
}
