//! Projects recurring break rules across the booking horizon.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::engine::{BookingEngine, ExpansionReport};
use crate::error::EngineResult;

/// Run the break expansion loop until `cancel` is triggered.
pub async fn run(engine: BookingEngine, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Break expansion job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Break expansion job stopping");
                break;
            }
            _ = interval.tick() => {
                // The engine logs non-empty runs itself.
                match tick(&engine).await {
                    Ok(report) if report == ExpansionReport::default() => {
                        tracing::debug!("Break expansion: nothing due");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Break expansion: run failed"),
                }
            }
        }
    }
}

async fn tick(engine: &BookingEngine) -> EngineResult<ExpansionReport> {
    let settings = engine.load_settings().await?;
    engine
        .expand_break_rules(&settings, settings.booking_horizon_days)
        .await
}
