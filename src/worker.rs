use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::retry::RetryError;
use crate::state::SharedState;

/// Start the retry scheduler. The first sweep runs immediately so anything
/// left over from a previous run goes out at startup.
pub fn spawn(state: SharedState, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(state, shutdown))
}

async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(state.config.retry_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        "Retry scheduler started (every {}s)",
        state.config.retry_interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if *shutdown.borrow() {
            break;
        }

        tick(&state).await;
    }

    tracing::info!("Retry scheduler stopped");
}

/// One scheduler pass: prune limiter state, then sweep the queue.
pub async fn tick(state: &SharedState) {
    state.submission_limiter.cleanup();

    match state.retry.retry_all().await {
        Ok(report) if report.is_empty() => {}
        Ok(report) => {
            tracing::debug!(
                "Scheduled retry: {} delivered, {} still failing",
                report.succeeded.len(),
                report.failed.len()
            );
        }
        Err(RetryError::InProgress) => {
            tracing::debug!("Skipping scheduled retry: a retry is already in progress");
        }
    }
}
