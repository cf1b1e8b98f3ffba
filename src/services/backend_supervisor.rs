use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{services::sse_service, state::SharedState};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll the remote backend forever, keeping the shared state in degraded mode
/// while it is unreachable. Failed checks back off exponentially.
pub async fn run(state: SharedState) {
    let mut delay = INITIAL_DELAY;

    loop {
        if check_once(&state).await {
            delay = INITIAL_DELAY;
            sleep(HEALTH_POLL_INTERVAL).await;
        } else {
            sleep(delay).await;
            delay = (delay * 2).min(MAX_DELAY);
        }
    }
}

/// Run one health check, updating the degraded flag. Returns whether the backend is healthy.
async fn check_once(state: &SharedState) -> bool {
    match state.backend().health_check().await {
        Ok(()) => {
            if state.is_degraded() {
                info!("remote backend healthy; leaving degraded mode");
                state.update_degraded(false);
                sse_service::broadcast_info(state.feedback_sse(), "service restored");
            }
            true
        }
        Err(err) => {
            if state.is_degraded() {
                warn!(error = %err, "remote backend still unreachable");
            } else {
                warn!(error = %err, "remote backend health check failed; entering degraded mode");
                state.update_degraded(true);
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, SseHub},
        test_support::{RecordingSink, StubServerActions},
    };

    #[tokio::test]
    async fn degraded_flag_follows_backend_health() {
        let backend = StubServerActions::new();
        let state = AppState::with_sink(
            AppConfig::default(),
            backend.clone(),
            Arc::new(SseHub::new(8)),
            RecordingSink::new(),
        );
        assert!(state.is_degraded());

        let mut watcher = state.degraded_watcher();
        assert!(check_once(&state).await);
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        watcher.borrow_and_update();

        backend.set_healthy(false);
        assert!(!check_once(&state).await);
        assert!(state.is_degraded());
        assert!(watcher.has_changed().unwrap());
    }
}
