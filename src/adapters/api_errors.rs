use {
    crate::domain::error::ReconcileError,
    axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    },
};

/// Newtype so the domain error can carry axum's response mapping without the
/// domain layer depending on HTTP.
pub struct ApiError(pub ReconcileError);

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ReconcileError::MissingSignature => (
                StatusCode::BAD_REQUEST,
                "Missing stripe-signature header".to_string(),
            ),
            ReconcileError::InvalidSignature(detail) => {
                tracing::warn!("signature rejected: {detail}");
                (StatusCode::BAD_REQUEST, "Invalid signature".to_string())
            }
            // Everything past the signature gate is a 500: the provider
            // retries, and idempotency keys make the retry safe.
            other => {
                tracing::error!("webhook processing failed: {other}");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
