use {
    crate::{
        adapters::notify::ReceiptNotification,
        domain::{
            error::ReconcileError,
            mode::StripeMode,
            money::MoneyAmount,
            receipt::{receipt_number, tax_year, Frequency, NewReceipt, GENERAL_SUPPORT},
        },
        infra::postgres::{lookup_repo, notify_repo, receipt_repo},
    },
    chrono::{DateTime, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

pub struct ReceiptRequest {
    pub sponsorship_id: Option<Uuid>,
    pub payer_email: String,
    pub payer_name: Option<String>,
    /// None renders as "General Support" (untargeted donation).
    pub bestie_name: Option<String>,
    pub amount_cents: i64,
    pub frequency: Frequency,
    pub transaction_id: String,
    /// Provider timestamp of the monetary event; tax year derives from this,
    /// never from wall clock.
    pub transaction_ts: i64,
    pub mode: StripeMode,
}

/// Synthesize and persist a tax receipt, and queue its email in the same
/// transaction. The receipt insert is fatal on failure; the email send
/// happens later on the worker and is not.
pub async fn issue(pool: &PgPool, request: ReceiptRequest) -> Result<Uuid, ReconcileError> {
    let transaction_date: DateTime<Utc> = DateTime::from_timestamp(request.transaction_ts, 0)
        .filter(|_| request.transaction_ts > 0)
        .unwrap_or_else(Utc::now);

    let org = lookup_repo::find_org(pool).await?;
    let amount = MoneyAmount::new(request.amount_cents)?;
    let bestie_name = request
        .bestie_name
        .unwrap_or_else(|| GENERAL_SUPPORT.to_string());

    let receipt = NewReceipt {
        id: Uuid::now_v7(),
        receipt_number: receipt_number(&transaction_date),
        sponsorship_id: request.sponsorship_id,
        payer_email: request.payer_email.clone(),
        payer_name: request.payer_name.clone(),
        bestie_name: bestie_name.clone(),
        amount_cents: amount.cents(),
        frequency: request.frequency,
        stripe_transaction_id: request.transaction_id.clone(),
        transaction_date,
        tax_year: tax_year(&transaction_date),
        mode: request.mode,
        org_name: org.as_ref().map(|o| o.org_name.clone()),
        org_ein: org.and_then(|o| o.org_ein),
    };

    let notification = ReceiptNotification {
        sponsor_email: request.payer_email,
        sponsor_name: request.payer_name,
        bestie_name,
        amount: amount.dollars(),
        frequency: request.frequency.as_str().to_string(),
        transaction_id: request.transaction_id,
        transaction_date: transaction_date.to_rfc3339(),
        stripe_mode: request.mode.as_str().to_string(),
    };

    let mut tx = pool.begin().await?;
    receipt_repo::insert(&mut tx, &receipt).await?;
    notify_repo::enqueue(&mut tx, receipt.id, &serde_json::to_value(&notification)?).await?;
    tx.commit().await?;

    tracing::info!(
        receipt_number = %receipt.receipt_number,
        amount_cents = receipt.amount_cents,
        tax_year = receipt.tax_year,
        "receipt issued"
    );
    Ok(receipt.id)
}
