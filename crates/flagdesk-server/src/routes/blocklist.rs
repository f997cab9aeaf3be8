use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use flagdesk_core::blocklist::BlockLists;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, JsonBody};
use crate::state::AppState;

pub const EXPORT_FILENAME: &str = "block_lists.json";

#[derive(Serialize)]
pub struct BlockListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub total: usize,
    pub lists: BlockLists,
}

impl BlockListResponse {
    fn new(lists: &BlockLists, message: Option<String>) -> Json<Self> {
        Json(Self {
            message,
            total: lists.total(),
            lists: lists.clone(),
        })
    }
}

/// GET /api/blocklist
pub async fn get_blocklist(State(app): State<AppState>) -> Json<BlockListResponse> {
    let session = app.session.lock().await;
    BlockListResponse::new(&session.block_lists, None)
}

#[derive(Deserialize)]
pub struct AddBody {
    pub url: String,
    pub category: String,
}

/// POST /api/blocklist — normalize and append a URL.
pub async fn add_url(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<AddBody>,
) -> Result<Json<BlockListResponse>, AppError> {
    let mut session = app.session.lock().await;
    let added = session.block_lists.add(&body.url, &body.category)?;
    tracing::info!(url = %added, category = %body.category, "block list entry added");
    let resp = BlockListResponse::new(
        &session.block_lists,
        Some(format!("Added to {}: {added}", body.category)),
    );
    drop(session);
    app.notify();
    Ok(resp)
}

#[derive(Deserialize)]
pub struct RemoveBody {
    pub category: String,
    pub url: String,
}

/// POST /api/blocklist/remove
pub async fn remove_url(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<RemoveBody>,
) -> Result<Json<BlockListResponse>, AppError> {
    let mut session = app.session.lock().await;
    let removed = session.block_lists.remove(&body.category, &body.url)?;
    let message = if removed {
        format!("Removed {} from {}", body.url, body.category)
    } else {
        format!("{} is not in {}", body.url, body.category)
    };
    let resp = BlockListResponse::new(&session.block_lists, Some(message));
    drop(session);
    app.notify();
    Ok(resp)
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub from: String,
    pub to: String,
    pub urls: Vec<String>,
}

/// POST /api/blocklist/move
pub async fn move_urls(
    State(app): State<AppState>,
    JsonBody(body): JsonBody<MoveBody>,
) -> Result<Json<BlockListResponse>, AppError> {
    let mut session = app.session.lock().await;
    let moved = session
        .block_lists
        .move_urls(&body.from, &body.urls, &body.to)?;
    let resp = BlockListResponse::new(
        &session.block_lists,
        Some(format!("Moved {moved} item(s) to {}", body.to)),
    );
    drop(session);
    app.notify();
    Ok(resp)
}

/// POST /api/blocklist/reset — back to the starter lists.
pub async fn reset(State(app): State<AppState>) -> Json<BlockListResponse> {
    let mut session = app.session.lock().await;
    session.block_lists.reset();
    let resp = BlockListResponse::new(
        &session.block_lists,
        Some("Restored default block lists.".to_string()),
    );
    drop(session);
    app.notify();
    resp
}

/// GET /api/blocklist/export — download as `block_lists.json`.
pub async fn export(State(app): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let json = app.session.lock().await.block_lists.export_json()?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        json,
    ))
}

/// POST /api/blocklist/import — raw JSON body; replaces every list.
pub async fn import(
    State(app): State<AppState>,
    body: String,
) -> Result<Json<BlockListResponse>, AppError> {
    let mut session = app.session.lock().await;
    session.block_lists.import_json(&body)?;
    tracing::info!(total = session.block_lists.total(), "block lists imported");
    let resp = BlockListResponse::new(
        &session.block_lists,
        Some("Imported block lists.".to_string()),
    );
    drop(session);
    app.notify();
    Ok(resp)
}
