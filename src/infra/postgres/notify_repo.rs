use {crate::domain::error::ReconcileError, uuid::Uuid};

#[derive(Debug, sqlx::FromRow)]
pub struct NotifyJob {
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub payload: serde_json::Value,
    pub attempts: i32,
}

/// Enqueue the receipt email. One job per receipt — a redelivered event that
/// somehow reaches this point cannot queue a second email.
pub async fn enqueue(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    receipt_id: Uuid,
    payload: &serde_json::Value,
) -> Result<bool, ReconcileError> {
    let inserted: Option<bool> = sqlx::query_scalar(
        r#"
        INSERT INTO notification_jobs (receipt_id, payload)
        VALUES ($1, $2)
        ON CONFLICT (receipt_id) DO NOTHING
        RETURNING true
        "#,
    )
    .bind(receipt_id)
    .bind(payload)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(inserted.is_some())
}

/// Claim up to `limit` pending jobs. SKIP LOCKED avoids contention when
/// multiple workers poll.
pub async fn claim(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    limit: i64,
) -> Result<Vec<NotifyJob>, ReconcileError> {
    let rows = sqlx::query_as::<_, NotifyJob>(
        r#"
        UPDATE notification_jobs
        SET status = 'processing', updated_at = now()
        WHERE id IN (
            SELECT id FROM notification_jobs
            WHERE status = 'pending' AND scheduled_at <= now()
            ORDER BY scheduled_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, receipt_id, payload, attempts
        "#,
    )
    .bind(limit)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows)
}

pub async fn complete(pool: &sqlx::PgPool, id: Uuid) -> Result<(), ReconcileError> {
    sqlx::query("UPDATE notification_jobs SET status = 'completed', updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Record a send failure. Exponential backoff via scheduled_at; after
/// max_attempts the job parks as 'failed' for operator inspection.
pub async fn fail(pool: &sqlx::PgPool, id: Uuid, error: &str) -> Result<(), ReconcileError> {
    sqlx::query(
        r#"
        UPDATE notification_jobs
        SET attempts = attempts + 1,
            last_error = $2,
            status = CASE
                WHEN attempts + 1 >= max_attempts THEN 'failed'
                ELSE 'pending'
            END,
            scheduled_at = CASE
                WHEN attempts + 1 >= max_attempts THEN scheduled_at
                ELSE now() + make_interval(secs => power(2, attempts + 1)::int)
            END,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

/// Reset jobs stuck in 'processing' for >2 minutes back to 'pending'.
pub async fn reap_stale(pool: &sqlx::PgPool) -> Result<u64, ReconcileError> {
    let result = sqlx::query(
        r#"
        UPDATE notification_jobs
        SET status = 'pending', updated_at = now()
        WHERE status = 'processing' AND updated_at < now() - interval '2 minutes'
        "#,
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
