//! Registration session tracking.
//!
//! A session only remembers whether a chat party is expected to type a
//! registration code next. State lives behind [`SessionStore`] so a shared
//! store can replace the in-process map when running several instances.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

/// Per-conversation registration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingCode,
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value store with per-entry expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<SessionState>, SessionStoreError>;

    async fn set(
        &self,
        key: &str,
        state: SessionState,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    async fn clear(&self, key: &str) -> Result<(), SessionStoreError>;
}

struct SessionEntry {
    state: SessionState,
    expires_at: Instant,
}

/// Process-local session store for single-instance deployments.
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) sessions.
    pub fn active_sessions(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .map(|entries| entries.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    fn poisoned<T>(_: T) -> SessionStoreError {
        SessionStoreError::Unavailable("session map lock poisoned".to_string())
    }
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("active_sessions", &self.active_sessions())
            .finish()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<SessionState>, SessionStoreError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(Self::poisoned)?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.state)),
                Some(_) => {}
            }
        }

        // Expired: drop it.
        let mut entries = self.entries.write().map_err(Self::poisoned)?;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        state: SessionState,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(Self::poisoned)?;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            SessionEntry {
                state,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), SessionStoreError> {
        self.entries.write().map_err(Self::poisoned)?.remove(key);
        Ok(())
    }
}

/// Registration session tracker used by the conversation dispatcher.
///
/// Store failures are logged and treated as "no session"; a lost flag only
/// means the party has to send `/register` again.
#[derive(Clone)]
pub struct RegistrationSessions {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl RegistrationSessions {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Marks `recipient_id` as awaiting a code.
    pub async fn begin(&self, recipient_id: &str) {
        if let Err(err) = self
            .store
            .set(recipient_id, SessionState::AwaitingCode, self.ttl)
            .await
        {
            tracing::warn!(recipient_id = %recipient_id, error = %err, "Failed to store registration session");
        }
    }

    pub async fn is_awaiting_code(&self, recipient_id: &str) -> bool {
        match self.store.get(recipient_id).await {
            Ok(state) => state == Some(SessionState::AwaitingCode),
            Err(err) => {
                tracing::warn!(recipient_id = %recipient_id, error = %err, "Failed to read registration session");
                false
            }
        }
    }

    /// Returns `recipient_id` to idle.
    pub async fn end(&self, recipient_id: &str) {
        if let Err(err) = self.store.clear(recipient_id).await {
            tracing::warn!(recipient_id = %recipient_id, error = %err, "Failed to clear registration session");
        }
    }
}
