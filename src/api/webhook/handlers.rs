use crate::api::models::*;
use crate::line::signature;
use crate::line::webhook::WebhookBody;
use axum::{body::Bytes, extract::State, http::HeaderMap};
use tracing::{error, info, warn};

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Verify, parse, then answer each event. A failing event is logged and
/// does not fail the delivery.
pub async fn callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature".to_string()))?;

    signature::verify(&state.channel_secret, &body, signature).map_err(|e| {
        warn!(error = %e, "Rejected webhook");
        AppError::BadRequest("Invalid signature".to_string())
    })?;

    let payload: WebhookBody = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook body: {e}")))?;

    info!(events = payload.events.len(), "📬 Webhook received");

    for event in &payload.events {
        if let Err(e) = state.bot.handle_event(event).await {
            error!(kind = event.kind(), error = %e, "Event handling failed");
        }
    }

    Ok("OK")
}
