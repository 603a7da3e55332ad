use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

/// How often idle sessions are looked for
const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn a background task that drops sessions idle for longer than the
/// configured TTL. Sessions owned by an open socket are closed with it instead.
pub fn spawn_session_reaper(state: Arc<AppState>) {
    let ttl = state.config.session_ttl;
    tokio::spawn(async move {
        // interval() panics on a zero period
        let period = REAP_INTERVAL.min(ttl).max(Duration::from_secs(1));
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            let reaped = state.reap_idle_sessions(ttl).await;
            if reaped > 0 {
                tracing::debug!("{} session(s) still active", state.sessions.read().await.len());
            }
        }
    });
}
