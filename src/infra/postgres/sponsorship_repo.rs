use {
    crate::domain::{
        error::ReconcileError,
        mode::StripeMode,
        sponsorship::{NewSponsorship, SponsorshipStatus},
    },
    chrono::{DateTime, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

#[derive(Debug, sqlx::FromRow)]
pub struct SponsorshipRow {
    pub id: Uuid,
    pub sponsor_user_id: Option<String>,
    pub sponsor_email: Option<String>,
    pub bestie_id: String,
    pub status: String,
    pub monthly_amount_cents: i64,
}

pub async fn find_by_subscription(
    pool: &PgPool,
    subscription_id: &str,
    mode: StripeMode,
) -> Result<Option<SponsorshipRow>, ReconcileError> {
    let row = sqlx::query_as::<_, SponsorshipRow>(
        r#"
        SELECT id, sponsor_user_id, sponsor_email, bestie_id, status, monthly_amount_cents
        FROM sponsorships
        WHERE stripe_subscription_id = $1 AND stripe_mode = $2
        "#,
    )
    .bind(subscription_id)
    .bind(mode.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Atomic conditional insert on `(stripe_subscription_id, stripe_mode)`.
/// Returns `None` when another delivery already created the row — the caller
/// treats that as an idempotent no-op.
pub async fn insert(
    pool: &PgPool,
    sponsorship: &NewSponsorship,
) -> Result<Option<Uuid>, ReconcileError> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO sponsorships
            (id, sponsor_user_id, sponsor_email, bestie_id, monthly_amount_cents,
             status, stripe_subscription_id, stripe_customer_id, stripe_session_id, stripe_mode)
        VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, $8, $9)
        ON CONFLICT (stripe_subscription_id, stripe_mode) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(sponsorship.id)
    .bind(sponsorship.sponsor.user_id())
    .bind(sponsorship.sponsor.email())
    .bind(&sponsorship.bestie_id)
    .bind(sponsorship.monthly_amount_cents)
    .bind(&sponsorship.stripe_subscription_id)
    .bind(sponsorship.stripe_customer_id.as_deref())
    .bind(&sponsorship.stripe_session_id)
    .bind(sponsorship.mode.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(inserted)
}

/// Status sync from a subscription-lifecycle event. Keyed purely by
/// `(subscription, mode)`; returns `None` when no sponsorship holds the
/// subscription (it likely belongs to a recurring donation).
pub async fn apply_lifecycle(
    pool: &PgPool,
    subscription_id: &str,
    mode: StripeMode,
    status: SponsorshipStatus,
    ended_at: Option<DateTime<Utc>>,
) -> Result<Option<Uuid>, ReconcileError> {
    let updated: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE sponsorships
        SET status = $3, ended_at = $4, updated_at = now()
        WHERE stripe_subscription_id = $1 AND stripe_mode = $2
        RETURNING id
        "#,
    )
    .bind(subscription_id)
    .bind(mode.as_str())
    .bind(status.as_str())
    .bind(ended_at)
    .fetch_optional(pool)
    .await?;
    Ok(updated)
}
