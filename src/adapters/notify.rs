use {
    crate::domain::error::ReconcileError,
    serde::{Deserialize, Serialize},
};

/// Body POSTed to the email-sending collaborator. Field names are part of
/// that collaborator's contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptNotification {
    pub sponsor_email: String,
    pub sponsor_name: Option<String>,
    pub bestie_name: String,
    pub amount: f64,
    pub frequency: String,
    pub transaction_id: String,
    pub transaction_date: String,
    pub stripe_mode: String,
}

/// Thin client for the receipt-email endpoint. Used only by the notification
/// worker — send failures surface there as retryable job errors, never on the
/// webhook path.
#[derive(Clone)]
pub struct ReceiptMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl ReceiptMailer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub async fn send(&self, notification: &ReceiptNotification) -> Result<(), ReconcileError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await
            .map_err(|e| ReconcileError::Notify(e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| ReconcileError::Notify(e.to_string()))?;
        Ok(())
    }
}
