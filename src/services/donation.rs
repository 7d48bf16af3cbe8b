use {
    crate::{
        domain::{
            donation::{shape_for_session_mode, DonationStatus, NewDonation},
            error::ReconcileError,
            event::{Disposition, RecordKind, RelatedRecord},
            identity::PayerIdentity,
            mode::StripeMode,
            receipt::Frequency,
            stripe::{CheckoutSession, InvoiceObject},
        },
        infra::postgres::{
            donation_repo::{self, DonationRow},
            lookup_repo, sponsorship_repo,
        },
        services::receipt::{self, ReceiptRequest},
    },
    sqlx::PgPool,
    uuid::Uuid,
};

fn related(id: Uuid) -> Option<RelatedRecord> {
    Some(RelatedRecord {
        kind: RecordKind::Donation,
        id,
    })
}

/// Stored donor email → profile lookup by donor id → checkout session email.
async fn resolve_donor_email(
    pool: &PgPool,
    row: &DonationRow,
    session_email: Option<&str>,
) -> Result<Option<String>, ReconcileError> {
    if let Some(email) = row.donor_email.as_deref() {
        return Ok(Some(email.to_string()));
    }
    if let Some(user_id) = row.donor_user_id.as_deref() {
        if let Some(email) = lookup_repo::find_profile_email(pool, user_id).await? {
            return Ok(Some(email));
        }
    }
    Ok(session_email.map(str::to_string))
}

/// A checkout session tagged `type=donation`. Common path: the checkout
/// creator pre-inserted a pending row keyed by session id, and we settle it.
/// Fallback: construct the donation directly.
pub async fn handle_checkout(
    pool: &PgPool,
    mode: StripeMode,
    session: &CheckoutSession,
) -> Result<Disposition, ReconcileError> {
    let email = session.payer_email().ok_or_else(|| {
        ReconcileError::DataIntegrity(format!("donation checkout {} has no payer email", session.id))
    })?;
    let (frequency, status) = shape_for_session_mode(&session.mode)?;

    // Exclusivity guard for recurring donations: the subscription must not
    // already belong to a sponsorship.
    if let Some(subscription_id) = session.subscription.as_deref() {
        if sponsorship_repo::find_by_subscription(pool, subscription_id, mode)
            .await?
            .is_some()
        {
            tracing::warn!(
                subscription = subscription_id,
                session = %session.id,
                "subscription already claimed by a sponsorship, not creating donation"
            );
            return Ok(Disposition::Completed(None));
        }
    }

    let transaction_id = session
        .payment_intent
        .clone()
        .or_else(|| session.subscription.clone())
        .unwrap_or_else(|| session.id.clone());

    if let Some(existing) = donation_repo::find_by_session(pool, &session.id, mode).await? {
        if DonationStatus::try_from(existing.status.as_str())?.is_settled() {
            tracing::info!(
                donation_id = %existing.id,
                session = %session.id,
                "donation already settled, checkout is a no-op"
            );
            return Ok(Disposition::Completed(related(existing.id)));
        }

        let amount_cents = session.amount_total.unwrap_or(existing.amount_cents);
        donation_repo::settle_checkout(
            pool,
            existing.id,
            status,
            amount_cents,
            session.payment_intent.as_deref(),
            session.subscription.as_deref(),
            session.customer.as_deref(),
        )
        .await?;

        let receipt_email = resolve_donor_email(pool, &existing, Some(email))
            .await?
            .ok_or_else(|| {
                ReconcileError::DataIntegrity(format!(
                    "donation {} has no resolvable donor email",
                    existing.id
                ))
            })?;

        receipt::issue(
            pool,
            ReceiptRequest {
                sponsorship_id: None,
                payer_email: receipt_email,
                payer_name: session.payer_name().map(str::to_string),
                bestie_name: None,
                amount_cents,
                frequency,
                transaction_id,
                transaction_ts: session.created,
                mode,
            },
        )
        .await?;

        tracing::info!(donation_id = %existing.id, status = %status, "donation settled");
        return Ok(Disposition::Completed(related(existing.id)));
    }

    // Fallback: no pending row from the checkout creator.
    let amount_cents = session.amount_total.ok_or_else(|| {
        ReconcileError::DataIntegrity(format!("checkout {} has no amount_total", session.id))
    })?;
    let donation = NewDonation {
        id: Uuid::now_v7(),
        donor: PayerIdentity::from_checkout(session.metadata_value("user_id"), email),
        amount_cents,
        currency: session.currency.clone().unwrap_or_else(|| "usd".into()),
        frequency,
        status,
        stripe_session_id: session.id.clone(),
        stripe_subscription_id: session.subscription.clone(),
        stripe_payment_intent_id: session.payment_intent.clone(),
        stripe_customer_id: session.customer.clone(),
        mode,
    };

    let Some(donation_id) = donation_repo::insert(pool, &donation).await? else {
        tracing::info!(session = %session.id, "lost creation race, donation already inserted");
        return Ok(Disposition::Completed(None));
    };

    receipt::issue(
        pool,
        ReceiptRequest {
            sponsorship_id: None,
            payer_email: email.to_string(),
            payer_name: session.payer_name().map(str::to_string),
            bestie_name: None,
            amount_cents,
            frequency,
            transaction_id,
            transaction_ts: session.created,
            mode,
        },
    )
    .await?;

    tracing::info!(donation_id = %donation_id, frequency = %frequency, "donation created");
    Ok(Disposition::Completed(related(donation_id)))
}

/// Recurring charge on an existing monthly donation. Only `active` donations
/// get receipts — a payment racing a cancellation must not produce one.
pub async fn handle_recurring_invoice(
    pool: &PgPool,
    mode: StripeMode,
    invoice: &InvoiceObject,
    donation: &DonationRow,
) -> Result<Disposition, ReconcileError> {
    if DonationStatus::try_from(donation.status.as_str())? != DonationStatus::Active {
        tracing::warn!(
            donation_id = %donation.id,
            status = %donation.status,
            invoice = %invoice.id,
            "recurring payment on non-active donation, no receipt"
        );
        return Ok(Disposition::Completed(None));
    }

    let email = resolve_donor_email(pool, donation, None)
        .await?
        .ok_or_else(|| {
            ReconcileError::DataIntegrity(format!(
                "donation {} has no resolvable donor email",
                donation.id
            ))
        })?;

    receipt::issue(
        pool,
        ReceiptRequest {
            sponsorship_id: None,
            payer_email: email,
            payer_name: None,
            bestie_name: None,
            amount_cents: invoice.amount_paid,
            frequency: Frequency::Monthly,
            transaction_id: invoice.id.clone(),
            transaction_ts: invoice.created,
            mode,
        },
    )
    .await?;

    tracing::info!(donation_id = %donation.id, invoice = %invoice.id, "recurring donation receipt issued");
    Ok(Disposition::Completed(related(donation.id)))
}
