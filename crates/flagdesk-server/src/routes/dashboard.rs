use axum::extract::State;
use axum::Json;
use flagdesk_core::view::Snapshot;

use crate::refresh;
use crate::state::AppState;

/// GET /api/dashboard — latest snapshot; runs the first cycle on demand.
pub async fn get_dashboard(State(app): State<AppState>) -> Json<Snapshot> {
    Json(refresh::current(&app).await)
}

/// POST /api/refresh — manual refresh.
pub async fn refresh_now(State(app): State<AppState>) -> Json<Snapshot> {
    Json(refresh::run_cycle(&app).await)
}
