use {
    crate::{
        domain::{
            error::ReconcileError,
            event::{Disposition, StripeEvent},
            mode::StripeMode,
            stripe::{CheckoutSession, InvoiceObject, SubscriptionObject},
        },
        infra::postgres::event_repo::{self, OpenOutcome},
        services::{donation, recurring, sponsorship},
    },
    sqlx::PgPool,
};

/// How the handler acknowledged the event. Everything here maps to HTTP 200;
/// the distinctions exist for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Processed,
    Skipped,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    SubscriptionLifecycle,
    Checkout,
    RecurringInvoice,
    Unhandled,
}

/// Dispatch on the provider's event type string. Unknown types are skipped,
/// not failed — new provider event types must not poison the retry queue.
pub fn classify(event_type: &str) -> EventClass {
    match event_type {
        "customer.subscription.updated" | "customer.subscription.deleted" => {
            EventClass::SubscriptionLifecycle
        }
        "checkout.session.completed" => EventClass::Checkout,
        "invoice.paid" | "invoice.payment_succeeded" => EventClass::RecurringInvoice,
        _ => EventClass::Unhandled,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutKind {
    Sponsorship,
    Donation,
    Unclassified,
}

/// Sponsorship vs donation for a completed checkout. A bestie reference wins
/// unconditionally over the `type=donation` tag: the reference is structurally
/// validated downstream, while the tag is an unvalidated string set at
/// session creation.
pub fn route_checkout(session: &CheckoutSession) -> CheckoutKind {
    if session.metadata_value("bestie_id").is_some() {
        CheckoutKind::Sponsorship
    } else if session.metadata_value("type") == Some("donation") {
        CheckoutKind::Donation
    } else {
        CheckoutKind::Unclassified
    }
}

async fn dispatch(
    pool: &PgPool,
    mode: StripeMode,
    event: &StripeEvent,
) -> Result<Disposition, ReconcileError> {
    match classify(&event.event_type) {
        EventClass::SubscriptionLifecycle => {
            let subscription: SubscriptionObject =
                serde_json::from_value(event.data.object.clone())?;
            sponsorship::handle_lifecycle(pool, mode, &subscription).await
        }
        EventClass::Checkout => {
            let session: CheckoutSession = serde_json::from_value(event.data.object.clone())?;
            match route_checkout(&session) {
                CheckoutKind::Sponsorship => {
                    sponsorship::handle_checkout(pool, mode, &session).await
                }
                CheckoutKind::Donation => donation::handle_checkout(pool, mode, &session).await,
                CheckoutKind::Unclassified => {
                    // Neither signal present. Possibly an out-of-scope
                    // checkout flow; a warning, not an error.
                    tracing::warn!(
                        session = %session.id,
                        "checkout session has neither bestie_id nor donation tag"
                    );
                    Ok(Disposition::Completed(None))
                }
            }
        }
        EventClass::RecurringInvoice => {
            let invoice: InvoiceObject = serde_json::from_value(event.data.object.clone())?;
            recurring::handle_invoice(pool, mode, &invoice).await
        }
        EventClass::Unhandled => Ok(Disposition::Skipped(format!(
            "unhandled event type: {}",
            event.event_type
        ))),
    }
}

/// Run one event through the full pipeline with the audit log bookending the
/// attempt: open → dispatch → close. `close` runs on every path, including
/// dispatch errors, which are recorded as failed and re-raised so the
/// provider retries.
pub async fn process_event(
    pool: &PgPool,
    mode: StripeMode,
    event: &StripeEvent,
    raw_payload: &serde_json::Value,
) -> Result<Ack, ReconcileError> {
    let log_id = match event_repo::open(pool, &event.id, &event.event_type, mode, raw_payload)
        .await?
    {
        OpenOutcome::Opened(id) => id,
        OpenOutcome::Retry(id) => {
            tracing::info!(event_id = %event.id, "redelivery of failed event, reprocessing");
            id
        }
        OpenOutcome::AlreadyProcessed => {
            tracing::info!(event_id = %event.id, "duplicate delivery, already processed");
            return Ok(Ack::Duplicate);
        }
    };

    match dispatch(pool, mode, event).await {
        Ok(Disposition::Completed(record)) => {
            event_repo::close_success(pool, log_id, record).await?;
            Ok(Ack::Processed)
        }
        Ok(Disposition::Skipped(reason)) => {
            tracing::info!(event_id = %event.id, reason = %reason, "event skipped");
            event_repo::close_skipped(pool, log_id, &reason).await?;
            Ok(Ack::Skipped)
        }
        Err(err) => {
            // Best-effort close; the original error is the one worth raising.
            if let Err(close_err) = event_repo::close_failed(pool, log_id, &err.to_string()).await {
                tracing::error!(event_id = %event.id, "failed to record failure: {close_err}");
            }
            Err(err)
        }
    }
}
