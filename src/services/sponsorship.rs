use {
    crate::{
        domain::{
            error::ReconcileError,
            event::{Disposition, RecordKind, RelatedRecord},
            identity::PayerIdentity,
            mode::StripeMode,
            receipt::Frequency,
            sponsorship::{ended_at_for, NewSponsorship, SponsorshipStatus},
            stripe::{CheckoutSession, SubscriptionObject},
        },
        infra::postgres::{donation_repo, lookup_repo, sponsorship_repo},
        services::receipt::{self, ReceiptRequest},
    },
    sqlx::PgPool,
    uuid::Uuid,
};

fn related(id: Uuid) -> Option<RelatedRecord> {
    Some(RelatedRecord {
        kind: RecordKind::Sponsorship,
        id,
    })
}

/// A checkout session carrying a bestie reference becomes a sponsorship.
/// Missing email, missing subscription, or an unresolvable bestie are
/// data-integrity failures: they propagate, the log closes as failed, and
/// the provider retries the identical payload.
pub async fn handle_checkout(
    pool: &PgPool,
    mode: StripeMode,
    session: &CheckoutSession,
) -> Result<Disposition, ReconcileError> {
    let bestie_ref = session.metadata_value("bestie_id").ok_or_else(|| {
        ReconcileError::DataIntegrity(format!(
            "sponsorship checkout {} has no bestie_id metadata",
            session.id
        ))
    })?;
    let email = session.payer_email().ok_or_else(|| {
        ReconcileError::DataIntegrity(format!("checkout {} has no payer email", session.id))
    })?;
    let subscription_id = session.subscription.as_deref().ok_or_else(|| {
        ReconcileError::DataIntegrity(format!(
            "sponsorship checkout {} has no subscription",
            session.id
        ))
    })?;
    let amount_cents = session.amount_total.ok_or_else(|| {
        ReconcileError::DataIntegrity(format!("checkout {} has no amount_total", session.id))
    })?;

    // Idempotency: the (subscription, mode) pair already claimed means this
    // session was processed by an earlier delivery.
    if let Some(existing) =
        sponsorship_repo::find_by_subscription(pool, subscription_id, mode).await?
    {
        tracing::info!(
            subscription = subscription_id,
            sponsorship_id = %existing.id,
            "sponsorship already exists, checkout is a no-op"
        );
        return Ok(Disposition::Completed(related(existing.id)));
    }

    // Exclusivity: a subscription id resolves to at most one of
    // {sponsorship, donation}.
    if donation_repo::find_by_subscription(pool, subscription_id, mode)
        .await?
        .is_some()
    {
        tracing::warn!(
            subscription = subscription_id,
            session = %session.id,
            "subscription already claimed by a donation, not creating sponsorship"
        );
        return Ok(Disposition::Completed(None));
    }

    let bestie = lookup_repo::find_bestie(pool, bestie_ref)
        .await?
        .ok_or_else(|| {
            ReconcileError::DataIntegrity(format!(
                "bestie {bestie_ref} referenced by checkout {} not found",
                session.id
            ))
        })?;

    let sponsorship = NewSponsorship {
        id: Uuid::now_v7(),
        sponsor: PayerIdentity::from_checkout(session.metadata_value("user_id"), email),
        bestie_id: bestie.id.clone(),
        monthly_amount_cents: amount_cents,
        stripe_subscription_id: subscription_id.to_string(),
        stripe_customer_id: session.customer.clone(),
        stripe_session_id: session.id.clone(),
        mode,
    };

    let Some(sponsorship_id) = sponsorship_repo::insert(pool, &sponsorship).await? else {
        tracing::info!(
            subscription = subscription_id,
            "lost creation race, sponsorship already inserted"
        );
        return Ok(Disposition::Completed(None));
    };

    receipt::issue(
        pool,
        ReceiptRequest {
            sponsorship_id: Some(sponsorship_id),
            payer_email: email.to_string(),
            payer_name: session.payer_name().map(str::to_string),
            bestie_name: Some(bestie.name),
            amount_cents,
            frequency: Frequency::Monthly,
            transaction_id: session.id.clone(),
            transaction_ts: session.created,
            mode,
        },
    )
    .await?;

    tracing::info!(
        sponsorship_id = %sponsorship_id,
        bestie = %bestie.id,
        subscription = subscription_id,
        "sponsorship created"
    );
    Ok(Disposition::Completed(related(sponsorship_id)))
}

/// Sync a subscription-lifecycle event onto the sponsorship's status. A
/// subscription with no sponsorship is fine — it's probably a recurring
/// donation's — so the event completes without touching anything.
pub async fn handle_lifecycle(
    pool: &PgPool,
    mode: StripeMode,
    subscription: &SubscriptionObject,
) -> Result<Disposition, ReconcileError> {
    let status = SponsorshipStatus::from_subscription(subscription);
    let ended_at = ended_at_for(status, subscription);

    let updated =
        sponsorship_repo::apply_lifecycle(pool, &subscription.id, mode, status, ended_at).await?;

    match updated {
        Some(id) => {
            tracing::info!(
                sponsorship_id = %id,
                subscription = %subscription.id,
                status = %status,
                "sponsorship status synced"
            );
            Ok(Disposition::Completed(related(id)))
        }
        None => {
            tracing::info!(
                subscription = %subscription.id,
                "no sponsorship for subscription, lifecycle event does not apply"
            );
            Ok(Disposition::Completed(None))
        }
    }
}
