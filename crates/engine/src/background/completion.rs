//! Completes Booked appointments once they have ended.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::engine::BookingEngine;
use crate::error::EngineResult;

/// Run the completion loop until `cancel` is triggered.
pub async fn run(engine: BookingEngine, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Completion job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Completion job stopping");
                break;
            }
            _ = interval.tick() => {
                match tick(&engine).await {
                    Ok(completed) if completed > 0 => {
                        tracing::info!(completed, "Completion: appointments finished");
                    }
                    Ok(_) => tracing::debug!("Completion: nothing due"),
                    Err(e) => tracing::error!(error = %e, "Completion: sweep failed"),
                }
            }
        }
    }
}

async fn tick(engine: &BookingEngine) -> EngineResult<usize> {
    let settings = engine.load_settings().await?;
    engine.complete_finished(&settings).await
}
