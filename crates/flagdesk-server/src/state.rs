use flagdesk_core::config::Config;
use flagdesk_core::session::{RefreshSettings, Session};
use flagdesk_core::store::RecordStore;
use flagdesk_core::view::Snapshot;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, Notify, RwLock};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
    pub session: Arc<Mutex<Session>>,
    /// Result of the most recent refresh cycle.
    pub snapshot: Arc<RwLock<Option<Snapshot>>>,
    /// Held for the duration of a refresh cycle; cycles never overlap.
    pub cycle_lock: Arc<Mutex<()>>,
    /// Wakes the timer so a new interval applies immediately.
    pub refresh_changed: Arc<Notify>,
    pub event_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: Config, refresh: RefreshSettings) -> Self {
        let (tx, _) = broadcast::channel(64);
        let state = Self {
            store,
            config: Arc::new(config),
            session: Arc::new(Mutex::new(Session::new(refresh))),
            snapshot: Arc::new(RwLock::new(None)),
            cycle_lock: Arc::new(Mutex::new(())),
            refresh_changed: Arc::new(Notify::new()),
            event_tx: tx,
        };

        // Guard: only spawn if inside a Tokio runtime (skipped in sync unit tests).
        if tokio::runtime::Handle::try_current().is_ok() {
            crate::refresh::spawn_timer(state.clone());
        }

        state
    }

    pub async fn refresh_settings(&self) -> RefreshSettings {
        self.session.lock().await.refresh
    }

    pub async fn set_refresh_settings(&self, settings: RefreshSettings) {
        self.session.lock().await.refresh = settings;
        self.refresh_changed.notify_one();
        self.notify();
    }

    /// Tell SSE subscribers something changed.
    pub fn notify(&self) {
        let _ = self.event_tx.send(());
    }
}
