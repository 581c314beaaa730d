//! Conversation dispatcher for inbound chat messages.
//!
//! Routes each message to one of start, help, catalog, announce, register
//! prompt, code submission, format error or idle, based on the text and the
//! sender's registration session.

use std::sync::Arc;

use uuid::Uuid;

use shared::code::parse_registration_code;

use crate::errors::LifecycleError;
use crate::services::lifecycle::ApplicationLifecycle;
use crate::services::messages;
use crate::services::notification::{Notifier, Recipient};
use crate::services::session::RegistrationSessions;

/// An inbound text message from a chat party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat id the reply goes to and the binding is made for.
    pub recipient_id: String,
    /// User id of the sender; differs from the chat id in group chats.
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
    pub text: String,
}

impl InboundMessage {
    pub fn new(recipient_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            sender_id: None,
            sender_name: None,
            text: text.into(),
        }
    }
}

/// A parsed inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Help,
    Catalog,
    /// Admin-only: post and pin the catalog announcement in the current chat.
    Announce,
    /// `/register` with its argument, if any.
    Register(Option<&'a str>),
    /// Anything that is not a known command.
    Text(&'a str),
}

/// Parses slash commands, accepting the `/cmd@BotName` form.
pub fn parse_command(text: &str) -> Command<'_> {
    let text = text.trim();
    let Some(body) = text.strip_prefix('/') else {
        return Command::Text(text);
    };

    let (head, rest) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (body, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
    let argument = Some(rest).filter(|r| !r.is_empty());

    match name.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "catalog" => Command::Catalog,
        "announce" => Command::Announce,
        "register" => Command::Register(argument),
        _ => Command::Text(text),
    }
}

/// What the dispatcher did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Started,
    Help,
    Catalog,
    Announced,
    /// `/announce` from a sender who is not an admin.
    AnnounceDenied,
    PromptedForCode,
    Bound(Uuid),
    /// Unknown, unclaimable or already claimed code.
    CodeRejected,
    FormatError,
    Ignored,
    /// The store or the transport failed.
    Failed,
}

/// Routes inbound chat text to lifecycle actions and replies.
#[derive(Clone)]
pub struct ConversationDispatcher {
    lifecycle: ApplicationLifecycle,
    sessions: RegistrationSessions,
    replies: Notifier,
    catalog_url: String,
    admin_ids: Arc<[String]>,
}

impl ConversationDispatcher {
    pub fn new(
        lifecycle: ApplicationLifecycle,
        sessions: RegistrationSessions,
        replies: Notifier,
        catalog_url: impl Into<String>,
        admin_ids: Vec<String>,
    ) -> Self {
        Self {
            lifecycle,
            sessions,
            replies,
            catalog_url: catalog_url.into(),
            admin_ids: admin_ids
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    pub async fn dispatch(&self, message: &InboundMessage) -> DispatchOutcome {
        let recipient_id = message.recipient_id.as_str();

        let outcome = match parse_command(&message.text) {
            Command::Start => {
                self.sessions.end(recipient_id).await;
                self.reply(
                    recipient_id,
                    &messages::welcome(message.sender_name.as_deref(), &self.catalog_url),
                )
                .await;
                DispatchOutcome::Started
            }
            Command::Help => {
                self.reply(recipient_id, &messages::help()).await;
                DispatchOutcome::Help
            }
            Command::Catalog => {
                self.reply(recipient_id, &messages::catalog(&self.catalog_url))
                    .await;
                DispatchOutcome::Catalog
            }
            Command::Announce => self.announce(message).await,
            Command::Register(None) => {
                self.sessions.begin(recipient_id).await;
                self.reply(recipient_id, messages::register_prompt()).await;
                DispatchOutcome::PromptedForCode
            }
            Command::Register(Some(argument)) => match parse_registration_code(argument) {
                Ok(code) => self.redeem(recipient_id, &code).await,
                Err(_) => {
                    self.sessions.begin(recipient_id).await;
                    self.reply(recipient_id, messages::format_error()).await;
                    DispatchOutcome::FormatError
                }
            },
            Command::Text(text) => match parse_registration_code(text) {
                Ok(code) => self.redeem(recipient_id, &code).await,
                Err(_) if self.sessions.is_awaiting_code(recipient_id).await => {
                    self.reply(recipient_id, messages::format_error()).await;
                    DispatchOutcome::FormatError
                }
                Err(_) => DispatchOutcome::Ignored,
            },
        };

        tracing::debug!(recipient_id = %recipient_id, outcome = ?outcome, "Inbound message dispatched");
        outcome
    }

    async fn redeem(&self, recipient_id: &str, code: &str) -> DispatchOutcome {
        let result = self.lifecycle.redeem_code(code, recipient_id).await;
        self.sessions.end(recipient_id).await;

        match result {
            Ok(application) => {
                self.reply(recipient_id, &messages::registration_success(&application))
                    .await;
                DispatchOutcome::Bound(application.id)
            }
            Err(LifecycleError::Store(err)) => {
                tracing::warn!(recipient_id = %recipient_id, error = %err, "Code redemption failed");
                self.reply(recipient_id, messages::try_later()).await;
                DispatchOutcome::Failed
            }
            Err(err) => {
                tracing::info!(recipient_id = %recipient_id, reason = %err, "Code rejected");
                self.reply(recipient_id, messages::code_not_found()).await;
                DispatchOutcome::CodeRejected
            }
        }
    }

    /// Posts and pins the catalog announcement, then reports to the admin
    /// in a private message.
    async fn announce(&self, message: &InboundMessage) -> DispatchOutcome {
        let chat_id = message.recipient_id.as_str();
        let Some(admin_id) = message
            .sender_id
            .as_deref()
            .filter(|id| self.admin_ids.iter().any(|admin| admin == id))
        else {
            tracing::info!(
                chat_id = %chat_id,
                sender_id = ?message.sender_id,
                "Announce refused for non-admin sender"
            );
            self.reply(chat_id, messages::announce_denied()).await;
            return DispatchOutcome::AnnounceDenied;
        };

        let chat = Recipient::Chat(chat_id.to_string());
        match self
            .replies
            .send_pinned(&chat, &messages::announcement(&self.catalog_url))
            .await
        {
            Ok(()) => {
                tracing::info!(chat_id = %chat_id, admin_id = %admin_id, "Catalog announcement pinned");
                self.reply(admin_id, messages::announce_published()).await;
                DispatchOutcome::Announced
            }
            Err(err) => {
                tracing::warn!(
                    chat_id = %chat_id,
                    admin_id = %admin_id,
                    error = %err,
                    "Catalog announcement failed"
                );
                self.reply(admin_id, &messages::announce_failed(&err.to_string()))
                    .await;
                DispatchOutcome::Failed
            }
        }
    }

    async fn reply(&self, recipient_id: &str, text: &str) {
        self.replies
            .send_best_effort(&Recipient::Chat(recipient_id.to_string()), text, "reply")
            .await;
    }
}
