use {
    crate::{
        adapters::notify::{ReceiptMailer, ReceiptNotification},
        domain::error::ReconcileError,
        infra::postgres::notify_repo,
    },
    sqlx::PgPool,
    tokio::sync::watch,
};

/// Poll the notification queue and deliver receipt emails. Dispatch is
/// at-least-once and fully decoupled from the webhook path: a flaky email
/// endpoint retries here with backoff instead of re-running reconciliation.
pub async fn run_notify_worker(
    pool: PgPool,
    mailer: ReceiptMailer,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("notification worker started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("notification worker shutting down");
                return;
            }
            _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
        }

        if let Err(e) = poll_once(&pool, &mailer).await {
            tracing::error!(error = %e, "notification worker poll error");
        }
    }
}

async fn poll_once(pool: &PgPool, mailer: &ReceiptMailer) -> Result<(), ReconcileError> {
    let mut tx = pool.begin().await?;
    let jobs = notify_repo::claim(&mut tx, 10).await?;
    tx.commit().await?;

    for job in jobs {
        let notification: ReceiptNotification = match serde_json::from_value(job.payload.clone()) {
            Ok(n) => n,
            Err(e) => {
                // Unparseable payload will never succeed; complete it rather
                // than retry forever.
                tracing::warn!(job_id = %job.id, error = %e, "malformed notification payload, completing");
                notify_repo::complete(pool, job.id).await?;
                continue;
            }
        };

        match mailer.send(&notification).await {
            Ok(()) => {
                tracing::info!(job_id = %job.id, receipt_id = %job.receipt_id, "receipt email sent");
                notify_repo::complete(pool, job.id).await?;
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id,
                    attempts = job.attempts + 1,
                    error = %e,
                    "receipt email failed, scheduling retry"
                );
                notify_repo::fail(pool, job.id, &e.to_string()).await?;
            }
        }
    }

    Ok(())
}

/// Periodically reset jobs stuck in 'processing' back to 'pending'.
pub async fn run_reaper(pool: PgPool, mut shutdown: watch::Receiver<bool>) {
    tracing::info!("stale notification reaper started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("stale notification reaper shutting down");
                return;
            }
            _ = tokio::time::sleep(std::time::Duration::from_secs(60)) => {}
        }

        match notify_repo::reap_stale(&pool).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "reaped stale notification jobs"),
            Err(e) => tracing::error!(error = %e, "reaper error"),
        }
    }
}
