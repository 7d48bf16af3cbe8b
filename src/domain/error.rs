use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("missing stripe-signature header")]
    MissingSignature,

    #[error("webhook signature: {0}")]
    InvalidSignature(String),

    /// Missing payer email, unresolvable beneficiary, orphan invoice, etc.
    /// Surfaces as a 500 so the provider retries the same payload.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("notification: {0}")]
    Notify(String),
}
