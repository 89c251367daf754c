// ==================== SESSION SWEEPER ====================
// Expired sessions already resolve to "no identity"; this job only frees the
// registry entries (and their AuthClients) that nobody will use again.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::services::auth_service::SessionRegistry;

/// Spawns the sweeper; it runs every `every` for the life of the process.
pub fn start_session_sweeper(sessions: Arc<SessionRegistry>, every: Duration) -> JoinHandle<()> {
    log::info!("🧹 Starting session sweeper (every {}s)", every.as_secs());

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_once(&sessions);
        }
    })
}

fn sweep_once(sessions: &SessionRegistry) -> usize {
    let removed = sessions.sweep_expired();
    if removed > 0 {
        log::info!("✅ Swept {} expired sessions ({} live)", removed, sessions.len());
    } else {
        log::debug!("⏰ Session sweep: nothing expired ({} live)", sessions.len());
    }
    removed
}
