use {
    crate::domain::{
        donation::{DonationStatus, NewDonation},
        error::ReconcileError,
        mode::StripeMode,
    },
    sqlx::PgPool,
    uuid::Uuid,
};

#[derive(Debug, sqlx::FromRow)]
pub struct DonationRow {
    pub id: Uuid,
    pub donor_user_id: Option<String>,
    pub donor_email: Option<String>,
    pub amount_cents: i64,
    pub status: String,
}

const SELECT_COLS: &str = "id, donor_user_id, donor_email, amount_cents, status";

pub async fn find_by_session(
    pool: &PgPool,
    session_id: &str,
    mode: StripeMode,
) -> Result<Option<DonationRow>, ReconcileError> {
    let row = sqlx::query_as::<_, DonationRow>(&format!(
        "SELECT {SELECT_COLS} FROM donations WHERE stripe_session_id = $1 AND stripe_mode = $2"
    ))
    .bind(session_id)
    .bind(mode.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_subscription(
    pool: &PgPool,
    subscription_id: &str,
    mode: StripeMode,
) -> Result<Option<DonationRow>, ReconcileError> {
    let row = sqlx::query_as::<_, DonationRow>(&format!(
        "SELECT {SELECT_COLS} FROM donations WHERE stripe_subscription_id = $1 AND stripe_mode = $2"
    ))
    .bind(subscription_id)
    .bind(mode.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Settle a pre-created pending donation from its completed checkout session:
/// final status plus the external ids the session resolved to.
#[allow(clippy::too_many_arguments)]
pub async fn settle_checkout(
    pool: &PgPool,
    id: Uuid,
    status: DonationStatus,
    amount_cents: i64,
    payment_intent_id: Option<&str>,
    subscription_id: Option<&str>,
    customer_id: Option<&str>,
) -> Result<(), ReconcileError> {
    sqlx::query(
        r#"
        UPDATE donations
        SET status = $2,
            amount_cents = $3,
            stripe_payment_intent_id = COALESCE($4, stripe_payment_intent_id),
            stripe_subscription_id = COALESCE($5, stripe_subscription_id),
            stripe_customer_id = COALESCE($6, stripe_customer_id),
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(amount_cents)
    .bind(payment_intent_id)
    .bind(subscription_id)
    .bind(customer_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Fallback path: no pending row existed, create the donation outright.
/// Atomic on `(stripe_session_id, stripe_mode)`; `None` means a concurrent
/// delivery won the race.
pub async fn insert(pool: &PgPool, donation: &NewDonation) -> Result<Option<Uuid>, ReconcileError> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO donations
            (id, donor_user_id, donor_email, amount_cents, currency, frequency, status,
             stripe_session_id, stripe_subscription_id, stripe_payment_intent_id,
             stripe_customer_id, stripe_mode)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (stripe_session_id, stripe_mode) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(donation.id)
    .bind(donation.donor.user_id())
    .bind(donation.donor.email())
    .bind(donation.amount_cents)
    .bind(&donation.currency)
    .bind(donation.frequency.as_str())
    .bind(donation.status.as_str())
    .bind(&donation.stripe_session_id)
    .bind(donation.stripe_subscription_id.as_deref())
    .bind(donation.stripe_payment_intent_id.as_deref())
    .bind(donation.stripe_customer_id.as_deref())
    .bind(donation.mode.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(inserted)
}
