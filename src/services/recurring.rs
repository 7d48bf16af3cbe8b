use {
    crate::{
        domain::{
            error::ReconcileError,
            event::{Disposition, RecordKind, RelatedRecord},
            mode::StripeMode,
            receipt::Frequency,
            stripe::InvoiceObject,
        },
        infra::postgres::{donation_repo, lookup_repo, sponsorship_repo},
        services::{
            donation,
            receipt::{self, ReceiptRequest},
        },
    },
    sqlx::PgPool,
};

/// Route an invoice-paid event to whichever family owns its subscription.
/// Exactly one receipt comes out of a match.
pub async fn handle_invoice(
    pool: &PgPool,
    mode: StripeMode,
    invoice: &InvoiceObject,
) -> Result<Disposition, ReconcileError> {
    let Some(subscription_id) = invoice.subscription.as_deref() else {
        tracing::warn!(invoice = %invoice.id, "invoice is not subscription-linked, nothing to reconcile");
        return Ok(Disposition::Completed(None));
    };

    // The first invoice of a subscription is the checkout's revenue event;
    // receipting it here would double-count.
    if invoice.is_subscription_create() {
        return Ok(Disposition::Skipped(
            "subscription_create invoice is handled by checkout-completed".into(),
        ));
    }

    if let Some(sponsorship) =
        sponsorship_repo::find_by_subscription(pool, subscription_id, mode).await?
    {
        let email = match (&sponsorship.sponsor_email, &sponsorship.sponsor_user_id) {
            (Some(email), _) => email.clone(),
            (None, Some(user_id)) => lookup_repo::find_profile_email(pool, user_id)
                .await?
                .ok_or_else(|| {
                    ReconcileError::DataIntegrity(format!(
                        "sponsor {user_id} has no profile email for invoice {}",
                        invoice.id
                    ))
                })?,
            (None, None) => {
                return Err(ReconcileError::DataIntegrity(format!(
                    "sponsorship {} has neither sponsor email nor user id",
                    sponsorship.id
                )))
            }
        };

        let bestie = lookup_repo::find_bestie(pool, &sponsorship.bestie_id)
            .await?
            .ok_or_else(|| {
                ReconcileError::DataIntegrity(format!(
                    "bestie {} missing for sponsorship {}",
                    sponsorship.bestie_id, sponsorship.id
                ))
            })?;

        receipt::issue(
            pool,
            ReceiptRequest {
                sponsorship_id: Some(sponsorship.id),
                payer_email: email,
                payer_name: None,
                bestie_name: Some(bestie.name),
                amount_cents: invoice.amount_paid,
                frequency: Frequency::Monthly,
                transaction_id: invoice.id.clone(),
                transaction_ts: invoice.created,
                mode,
            },
        )
        .await?;

        tracing::info!(
            sponsorship_id = %sponsorship.id,
            invoice = %invoice.id,
            "recurring sponsorship receipt issued"
        );
        return Ok(Disposition::Completed(Some(RelatedRecord {
            kind: RecordKind::Sponsorship,
            id: sponsorship.id,
        })));
    }

    if let Some(donation_row) =
        donation_repo::find_by_subscription(pool, subscription_id, mode).await?
    {
        return donation::handle_recurring_invoice(pool, mode, invoice, &donation_row).await;
    }

    // Neither family owns the subscription. Most likely the checkout event
    // hasn't landed yet; failing keeps the receipt recoverable through the
    // provider's retry schedule, and exhausted retries stay visible as a
    // failed audit row.
    Err(ReconcileError::DataIntegrity(format!(
        "invoice {} references subscription {subscription_id} with no sponsorship or donation",
        invoice.id
    )))
}
