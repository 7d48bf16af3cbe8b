use {
    crate::domain::{
        error::ReconcileError,
        event::{EventStatus, RelatedRecord},
        mode::StripeMode,
    },
    sqlx::PgPool,
    uuid::Uuid,
};

/// Result of opening the audit row for an inbound event.
#[derive(Debug)]
pub enum OpenOutcome {
    /// First delivery — a fresh `processing` row was inserted.
    Opened(Uuid),
    /// Redelivery of an event whose last attempt failed, or whose `processing`
    /// row is older than any live request can be (the attempt died mid-flight
    /// without closing). The existing row is re-used; its status only moves
    /// when `close` finalizes the new attempt, so a terminal status never
    /// regresses to `processing`.
    Retry(Uuid),
    /// Redelivery of an event already finalized (or currently in flight).
    AlreadyProcessed,
}

/// A `processing` row older than this cannot belong to a live request (the
/// HTTP timeout is 30s); the attempt was cut off before it could close.
/// Redelivery reclaims such rows instead of acking them as duplicates.
const STALE_PROCESSING: &str = "2 minutes";

/// Open the audit record. The insert is a single atomic conditional insert on
/// `(stripe_event_id, stripe_mode)` — concurrent deliveries of the same event
/// cannot both open it.
pub async fn open(
    pool: &PgPool,
    stripe_event_id: &str,
    event_type: &str,
    mode: StripeMode,
    payload: &serde_json::Value,
) -> Result<OpenOutcome, ReconcileError> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO webhook_events (id, stripe_event_id, event_type, stripe_mode, status, payload)
        VALUES ($1, $2, $3, $4, 'processing', $5)
        ON CONFLICT (stripe_event_id, stripe_mode) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(stripe_event_id)
    .bind(event_type)
    .bind(mode.as_str())
    .bind(payload)
    .fetch_optional(pool)
    .await?;

    if let Some(id) = inserted {
        return Ok(OpenOutcome::Opened(id));
    }

    let existing: Option<(Uuid, String, bool)> = sqlx::query_as(&format!(
        r#"
        SELECT id, status, created_at < now() - interval '{STALE_PROCESSING}'
        FROM webhook_events
        WHERE stripe_event_id = $1 AND stripe_mode = $2
        "#,
    ))
    .bind(stripe_event_id)
    .bind(mode.as_str())
    .fetch_optional(pool)
    .await?;

    match existing {
        Some((id, status, stale)) => match EventStatus::try_from(status.as_str())? {
            EventStatus::Failed => Ok(OpenOutcome::Retry(id)),
            EventStatus::Processing if stale => {
                tracing::warn!(
                    event_id = stripe_event_id,
                    log_id = %id,
                    "reclaiming stale processing row from an attempt that never closed"
                );
                Ok(OpenOutcome::Retry(id))
            }
            _ => Ok(OpenOutcome::AlreadyProcessed),
        },
        None => Ok(OpenOutcome::AlreadyProcessed),
    }
}

/// Finalize the attempt. Guarded so a row already closed as success/skipped
/// is never rewritten — the status lattice is monotonic.
async fn close(
    pool: &PgPool,
    id: Uuid,
    status: EventStatus,
    message: Option<&str>,
    related: Option<RelatedRecord>,
) -> Result<(), ReconcileError> {
    sqlx::query(
        r#"
        UPDATE webhook_events
        SET status = $2,
            error_message = $3,
            record_kind = $4,
            record_id = $5,
            processed_at = now()
        WHERE id = $1 AND status IN ('processing', 'failed')
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(message)
    .bind(related.map(|r| r.kind.as_str()))
    .bind(related.map(|r| r.id))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn close_success(
    pool: &PgPool,
    id: Uuid,
    related: Option<RelatedRecord>,
) -> Result<(), ReconcileError> {
    close(pool, id, EventStatus::Success, None, related).await
}

pub async fn close_skipped(pool: &PgPool, id: Uuid, reason: &str) -> Result<(), ReconcileError> {
    close(pool, id, EventStatus::Skipped, Some(reason), None).await
}

pub async fn close_failed(pool: &PgPool, id: Uuid, message: &str) -> Result<(), ReconcileError> {
    close(pool, id, EventStatus::Failed, Some(message), None).await
}
