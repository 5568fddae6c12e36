use crate::domain::entities::InboundMessage;
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState};
use axum::{extract::State, http::StatusCode, Json};

/// Channel-neutral ingress for gateways other than WhatsApp.
pub async fn post_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> ApiResult<StatusCode> {
    if message.chat_id.trim().is_empty() {
        return Err(ApiError::BadRequest("chat_id is required".to_string()));
    }
    if message.text.is_none() && message.button_id.is_none() && message.media_url.is_none() {
        return Err(ApiError::BadRequest(
            "message needs text, button_id or media_url".to_string(),
        ));
    }

    let chat_service = state.chat_service.clone();
    tokio::spawn(async move {
        chat_service.handle_inbound(message).await;
    });

    Ok(StatusCode::ACCEPTED)
}
