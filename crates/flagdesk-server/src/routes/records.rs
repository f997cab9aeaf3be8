use axum::extract::{Path, State};
use axum::Json;
use flagdesk_core::types::Disposition;
use flagdesk_core::view::Snapshot;
use flagdesk_core::workflow;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, JsonBody};
use crate::refresh;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitBody {
    pub action: String,
}

/// POST /api/records/{id}/action — record a disposition and resolve the record.
pub async fn submit_action(
    State(app): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<SubmitBody>,
) -> Result<Json<Snapshot>, AppError> {
    let action: Disposition = body.action.parse()?;
    let store = app.store.clone();
    tokio::task::spawn_blocking(move || workflow::submit(store.as_ref(), &id, action))
        .await
        .map_err(AppError::join)??;

    Ok(Json(refresh::run_cycle(&app).await))
}

/// POST /api/records/{id}/flag — raise the flag again.
pub async fn set_flag(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Snapshot>, AppError> {
    let store = app.store.clone();
    tokio::task::spawn_blocking(move || workflow::set_flag(store.as_ref(), &id))
        .await
        .map_err(AppError::join)??;

    Ok(Json(refresh::run_cycle(&app).await))
}

#[derive(Deserialize)]
pub struct DuplicateBody {
    pub new_id: String,
}

#[derive(Serialize)]
pub struct DuplicateResponse {
    pub id: String,
    pub template_id: String,
    pub dashboard: Snapshot,
}

/// POST /api/records/duplicate — copy the template record under a new id.
pub async fn duplicate_template(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<DuplicateBody>,
) -> Result<Json<DuplicateResponse>, AppError> {
    let store = app.store.clone();
    let template_id = app.config.template_id.clone();
    let from = template_id.clone();
    let id = tokio::task::spawn_blocking(move || {
        workflow::duplicate_template(store.as_ref(), &from, &body.new_id)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(DuplicateResponse {
        id,
        template_id,
        dashboard: refresh::run_cycle(&app).await,
    }))
}
