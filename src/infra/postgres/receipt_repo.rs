use {
    crate::domain::{error::ReconcileError, receipt::NewReceipt},
    uuid::Uuid,
};

/// Insert-only. No ON CONFLICT: a receipt that fails to write is a
/// correctness defect and must propagate (the provider retries the event).
pub async fn insert(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    receipt: &NewReceipt,
) -> Result<Uuid, ReconcileError> {
    sqlx::query(
        r#"
        INSERT INTO receipts
            (id, receipt_number, sponsorship_id, payer_email, payer_name, bestie_name,
             amount_cents, frequency, stripe_transaction_id, transaction_date, tax_year,
             stripe_mode, org_name, org_ein)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(receipt.id)
    .bind(&receipt.receipt_number)
    .bind(receipt.sponsorship_id)
    .bind(&receipt.payer_email)
    .bind(receipt.payer_name.as_deref())
    .bind(&receipt.bestie_name)
    .bind(receipt.amount_cents)
    .bind(receipt.frequency.as_str())
    .bind(&receipt.stripe_transaction_id)
    .bind(receipt.transaction_date)
    .bind(receipt.tax_year)
    .bind(receipt.mode.as_str())
    .bind(receipt.org_name.as_deref())
    .bind(receipt.org_ein.as_deref())
    .execute(&mut **tx)
    .await?;
    Ok(receipt.id)
}
