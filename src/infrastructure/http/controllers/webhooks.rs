//! WhatsApp Cloud API webhook: the subscription handshake and inbound deliveries.

use crate::infrastructure::http::middleware::webhook_signature::{
    verify_signature, SIGNATURE_HEADER,
};
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState};
use crate::infrastructure::providers::whatsapp_gateway::parse_webhook_payload;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Echoes `hub.challenge` when the subscription request carries our verify token.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<String> {
    let expected = state.webhook.verify_token.as_str();
    let token_matches = !expected.is_empty() && query.verify_token.as_deref() == Some(expected);

    match (query.mode.as_deref(), query.challenge) {
        (Some("subscribe"), Some(challenge)) if token_matches => {
            tracing::info!("WhatsApp webhook verified");
            Ok(challenge)
        }
        _ => {
            tracing::warn!("WhatsApp webhook verification failed");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Acknowledges immediately and handles each message on its own task.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    if let Some(secret) = state.webhook.app_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(&body, signature, secret) {
            tracing::warn!("Rejected webhook delivery with a bad signature");
            return Err(ApiError::Unauthorized);
        }
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook body: {}", e)))?;

    let messages = parse_webhook_payload(&payload);
    if messages.is_empty() {
        tracing::debug!("Webhook delivery without messages (status update)");
    }

    for message in messages {
        let chat_service = state.chat_service.clone();
        tokio::spawn(async move {
            chat_service.handle_inbound(message).await;
        });
    }

    Ok(StatusCode::OK)
}
