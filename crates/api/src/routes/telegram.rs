//! Telegram webhook route.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::app::AppState;
use crate::config::DeliveryMode;
use crate::error::ApiError;
use crate::services::Update;

/// Header carrying the secret registered with `setWebhook`.
pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub ok: bool,
}

/// POST /api/telegram/webhook
///
/// Always acknowledges an authenticated update, even when it carries no text
/// or the dispatcher failed, so the Bot API does not redeliver it.
pub async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<(StatusCode, Json<WebhookAck>), ApiError> {
    let telegram = &state.config.telegram;
    if !telegram.enabled || telegram.mode != DeliveryMode::Webhook {
        return Err(ApiError::NotFound("Webhook delivery is not enabled".to_string()));
    }

    let presented = headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !secrets_match(presented, &telegram.webhook_secret) {
        tracing::warn!("Rejected webhook call with an invalid secret token");
        return Err(ApiError::Unauthorized("Invalid webhook secret".to_string()));
    }

    let update_id = update.update_id;
    match update.into_inbound() {
        Some(message) => {
            let outcome = state.dispatcher.dispatch(&message).await;
            tracing::debug!(update_id, outcome = ?outcome, "Webhook update dispatched");
        }
        None => tracing::debug!(update_id, "Skipping non-text update"),
    }

    Ok((StatusCode::OK, Json(WebhookAck { ok: true })))
}

type HmacSha256 = Hmac<Sha256>;

/// Compares HMAC-SHA256 digests of both values keyed by the expected secret,
/// so the check runs in constant time and does not reveal the secret length.
fn secrets_match(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }

    let digest = |value: &str| {
        HmacSha256::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(value.as_bytes());
            mac
        })
    };

    match (digest(presented), digest(expected)) {
        (Ok(presented), Ok(expected)) => presented
            .verify_slice(&expected.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}
