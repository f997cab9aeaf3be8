use axum::extract::State;
use axum::Json;
use flagdesk_core::session::RefreshSettings;
use serde::Deserialize;

use crate::error::{AppError, JsonBody};
use crate::state::AppState;

/// GET /api/refresh-settings
pub async fn get_refresh_settings(State(app): State<AppState>) -> Json<RefreshSettings> {
    Json(app.refresh_settings().await)
}

#[derive(Deserialize)]
pub struct UpdateRefreshBody {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

/// PUT /api/refresh-settings — either field may be omitted to keep it.
pub async fn put_refresh_settings(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<UpdateRefreshBody>,
) -> Result<Json<RefreshSettings>, AppError> {
    let current = app.refresh_settings().await;
    let updated = RefreshSettings::new(
        body.enabled.unwrap_or(current.enabled),
        body.interval_secs.unwrap_or(current.interval_secs),
    )?;
    app.set_refresh_settings(updated).await;
    tracing::info!(
        enabled = updated.enabled,
        interval_secs = updated.interval_secs,
        "refresh settings changed"
    );
    Ok(Json(updated))
}
