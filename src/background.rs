use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;

/// Periodic maintenance: expires lapsed pending bookings and returns units whose
/// temporary block has run out.
pub async fn start_background_worker(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.sweep_interval_secs.max(1));
    info!("Starting booking sweeper (every {:?})...", interval);

    loop {
        run_sweep(&state).instrument(info_span!("booking_sweep")).await;
        sleep(interval).await;
    }
}

pub async fn run_sweep(state: &AppState) {
    match state.bookings.expire_stale().await {
        Ok(sweep) if sweep.examined > 0 => info!(
            examined = sweep.examined,
            expired = sweep.expired,
            failed = sweep.failed,
            "Expiry sweep finished"
        ),
        Ok(_) => {}
        Err(e) => error!("Expiry sweep failed: {:?}", e),
    }

    let today = state.policy.today(state.clock.now());
    match state.room_repo.release_expired_blocks(today).await {
        Ok(0) => {}
        Ok(released) => info!("Returned {} blocked units to service", released),
        Err(e) => error!("Failed to release expired unit blocks: {:?}", e),
    }
}
