use {
    crate::{
        adapters::{api_errors::ApiError, signature},
        domain::{error::ReconcileError, event::StripeEvent, mode::StripeMode},
        services::pipeline,
        AppState,
    },
    axum::{extract::State, http::HeaderMap, Json},
};

/// CORS preflight on the webhook route: empty 200.
pub async fn preflight() -> axum::http::StatusCode {
    axum::http::StatusCode::OK
}

/// The webhook endpoint. The body must arrive as the raw byte stream —
/// signature verification covers the exact bytes the provider signed.
#[tracing::instrument(
    name = "webhook",
    skip_all,
    fields(event_id = tracing::field::Empty, event_type = tracing::field::Empty, mode = tracing::field::Empty)
)]
pub async fn stripe_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sig = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(ReconcileError::MissingSignature)?;

    let mode = signature::verify_and_resolve_mode(
        body.as_bytes(),
        sig,
        &state.secrets,
        signature::DEFAULT_TOLERANCE_SECS,
    )?;

    let raw_payload: serde_json::Value =
        serde_json::from_str(&body).map_err(ReconcileError::from)?;
    let event: StripeEvent = serde_json::from_str(&body).map_err(ReconcileError::from)?;

    // Correlate all downstream logs with this delivery.
    tracing::Span::current()
        .record("event_id", tracing::field::display(&event.id))
        .record("event_type", tracing::field::display(&event.event_type))
        .record("mode", tracing::field::display(mode));

    // The signature is the sole mode authority; the payload flag is
    // caller-supplied. A disagreement is worth an operator's attention.
    if event.livemode != (mode == StripeMode::Live) {
        tracing::warn!(
            livemode = event.livemode,
            "payload livemode flag disagrees with signature-resolved mode"
        );
    }

    pipeline::process_event(&state.pool, mode, &event, &raw_payload).await?;

    Ok(Json(serde_json::json!({ "received": true })))
}
