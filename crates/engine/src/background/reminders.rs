//! Sends the two-day and two-hour reminders.
//!
//! The period must stay below the reminder matching window or some
//! appointments fall between two ticks.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::BookingEngine;
use crate::error::EngineResult;

/// Run the reminder loop until `cancel` is triggered.
pub async fn run(engine: BookingEngine, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Reminder job started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reminder job stopping");
                break;
            }
            _ = interval.tick() => {
                match tick(&engine).await {
                    Ok(sent) if sent > 0 => tracing::info!(sent, "Reminders: sent"),
                    Ok(_) => tracing::debug!("Reminders: nothing due"),
                    Err(e) => tracing::error!(error = %e, "Reminders: run failed"),
                }
            }
        }
    }
}

async fn tick(engine: &BookingEngine) -> EngineResult<usize> {
    let settings = engine.load_settings().await?;
    engine.send_reminders(&settings).await
}
