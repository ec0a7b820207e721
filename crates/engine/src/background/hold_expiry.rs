//! Rejects holds whose TTL elapsed.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::engine::BookingEngine;
use crate::error::EngineResult;

/// Run the hold expiry loop until `cancel` is triggered.
pub async fn run(engine: BookingEngine, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Hold expiry job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Hold expiry job stopping");
                break;
            }
            _ = interval.tick() => {
                match tick(&engine).await {
                    Ok(expired) if expired > 0 => {
                        tracing::info!(expired, "Hold expiry: rejected abandoned holds");
                    }
                    Ok(_) => tracing::debug!("Hold expiry: nothing due"),
                    Err(e) => tracing::error!(error = %e, "Hold expiry: sweep failed"),
                }
            }
        }
    }
}

async fn tick(engine: &BookingEngine) -> EngineResult<usize> {
    let settings = engine.load_settings().await?;
    engine.expire_holds(&settings).await
}
