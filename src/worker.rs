use std::time::Duration;

use crate::state::AppState;

/// Keeps the board in step with changes made outside this gateway and
/// drops sessions idle for longer than `session_idle`.
pub async fn run_refresher(state: AppState, every: Duration, session_idle: Duration) {
    loop {
        match state.refresh_board().await {
            Ok(count) => tracing::debug!("Loaded {} bets", count),
            Err(e) => tracing::warn!("Failed to load bets: {}", e),
        }

        let evicted = state.evict_idle_sessions(session_idle);
        if evicted > 0 {
            tracing::info!("Evicted {} idle sessions", evicted);
        }

        tokio::time::sleep(every).await;
    }
}
