use {
    give_sync::{
        adapters::{notify::ReceiptMailer, signature::WebhookSecrets},
        services::worker,
        AppState,
    },
    sqlx::postgres::PgPoolOptions,
    std::{env, sync::Arc, time::Duration},
    tokio::{signal, sync::watch},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let secrets = WebhookSecrets {
        test: env::var("STRIPE_WEBHOOK_SECRET_TEST")
            .expect("STRIPE_WEBHOOK_SECRET_TEST must be set"),
        live: env::var("STRIPE_WEBHOOK_SECRET_LIVE")
            .expect("STRIPE_WEBHOOK_SECRET_LIVE must be set"),
    };
    let receipt_email_url =
        env::var("RECEIPT_EMAIL_URL").expect("RECEIPT_EMAIL_URL must be set");
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let state = AppState {
        pool: pool.clone(),
        secrets: Arc::new(secrets),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mailer = ReceiptMailer::new(receipt_email_url);
    let worker_handle = tokio::spawn(worker::run_notify_worker(
        pool.clone(),
        mailer,
        shutdown_rx.clone(),
    ));
    let reaper_handle = tokio::spawn(worker::run_reaper(pool, shutdown_rx));

    let app = give_sync::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;
    let _ = reaper_handle.await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
