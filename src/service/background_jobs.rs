use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::AppState;

// Expiry cadence: once a day. The sweep itself holds a single-flight lock,
// so a slow run cannot overlap the next tick.
const SWEEP_INTERVAL_SECS: u64 = 86_400;

/// Daily scan that auto-closes jobs past their expiry date.
pub async fn start_job_expiry_sweep(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));

    loop {
        interval.tick().await;

        tracing::info!("running job expiry sweep at {}", Utc::now());

        match app_state.job_service.run_expiry_sweep().await {
            Ok(count) => tracing::info!("job expiry sweep completed: {} job(s) closed", count),
            Err(err) => tracing::error!("job expiry sweep failed: {}", err),
        }
    }
}
