//! Refresh cycles and the auto-refresh timer.
//!
//! A cycle is one `fetch_all`, ordered and rendered into a [`Snapshot`],
//! stored in [`AppState::snapshot`] and announced over SSE.

use crate::state::AppState;
use chrono::Utc;
use flagdesk_core::error::DeskError;
use flagdesk_core::view::Snapshot;
use flagdesk_core::workflow;
use tokio::task::JoinHandle;

async fn cycle(app: &AppState) -> Snapshot {
    let store = app.store.clone();
    let fetched = tokio::task::spawn_blocking(move || workflow::load_ordered(store.as_ref()))
        .await
        .unwrap_or_else(|e| Err(DeskError::StoreUnavailable(format!("task join error: {e}"))));

    if let Err(e) = &fetched {
        tracing::warn!("refresh cycle failed: {e}");
    }

    let snapshot = Snapshot::build(fetched, &app.config.collection, Utc::now());
    tracing::debug!(
        rows = snapshot.rows.len(),
        open = snapshot.open_tickets(),
        "refresh cycle complete"
    );
    *app.snapshot.write().await = Some(snapshot.clone());
    app.notify();
    snapshot
}

/// Run a cycle, waiting for one already in flight to finish first.
pub async fn run_cycle(app: &AppState) -> Snapshot {
    let _guard = app.cycle_lock.lock().await;
    cycle(app).await
}

/// Run a cycle unless one is already in flight.
pub async fn try_run_cycle(app: &AppState) -> Option<Snapshot> {
    let Ok(_guard) = app.cycle_lock.try_lock() else {
        tracing::debug!("refresh cycle in flight; skipping tick");
        return None;
    };
    Some(cycle(app).await)
}

/// The latest snapshot, running a first cycle if there is none yet.
pub async fn current(app: &AppState) -> Snapshot {
    if let Some(snapshot) = app.snapshot.read().await.clone() {
        return snapshot;
    }
    run_cycle(app).await
}

/// Tick on the session's refresh interval. A settings change restarts the
/// wait with the new interval.
pub fn spawn_timer(app: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let settings = app.refresh_settings().await;
            tokio::select! {
                _ = tokio::time::sleep(settings.interval()) => {
                    if app.refresh_settings().await.enabled {
                        try_run_cycle(&app).await;
                    }
                }
                _ = app.refresh_changed.notified() => {
                    tracing::debug!("refresh settings changed; restarting timer");
                }
            }
        }
    })
}
