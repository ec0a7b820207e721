use std::sync::Arc;
use std::time::Duration;

use bookwell_core::clock::SystemClock;
use bookwell_engine::background;
use bookwell_engine::config::EngineConfig;
use bookwell_engine::BookingEngine;
use bookwell_events::{
    LogDelivery, NotificationBus, NotificationDelivery, NotificationDispatcher, WebhookDelivery,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long each task gets to finish after cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookwell_engine=debug,bookwell_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = EngineConfig::from_env().expect("Invalid configuration");
    tracing::info!(timezone = %config.timezone, "Loaded worker configuration");

    // --- Database ---
    let pool = bookwell_db::create_pool(&config.database_url, config.max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    bookwell_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    bookwell_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Notifications ---
    let bus = Arc::new(NotificationBus::default());
    let delivery: Arc<dyn NotificationDelivery> = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!(%url, "Delivering notifications to webhook");
            Arc::new(WebhookDelivery::new(url.clone()).expect("Failed to build HTTP client"))
        }
        None => {
            tracing::info!("No NOTIFY_WEBHOOK_URL set, notifications are only logged");
            Arc::new(LogDelivery)
        }
    };

    // --- Engine ---
    let engine = BookingEngine::new(pool, Arc::new(SystemClock), bus.clone(), config.timezone);
    engine
        .seed_settings(&config.settings_defaults)
        .await
        .expect("Failed to seed settings");
    engine
        .load_settings()
        .await
        .expect("Stored settings are invalid");

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let handles = vec![
        tokio::spawn(
            NotificationDispatcher::new(delivery).run(bus.subscribe(), cancel.clone()),
        ),
        tokio::spawn(background::hold_expiry::run(
            engine.clone(),
            config.hold_sweep_interval,
            cancel.clone(),
        )),
        tokio::spawn(background::break_expansion::run(
            engine.clone(),
            config.break_expansion_interval,
            cancel.clone(),
        )),
        tokio::spawn(background::reminders::run(
            engine.clone(),
            config.reminder_interval,
            cancel.clone(),
        )),
        tokio::spawn(background::completion::run(
            engine.clone(),
            config.completion_interval,
            cancel.clone(),
        )),
    ];
    tracing::info!("Worker started");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl-C handler");
    tracing::info!("Received SIGINT (Ctrl-C), shutting down");

    cancel.cancel();
    for handle in handles {
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, handle).await;
    }
    tracing::info!("Shutdown complete");
}
