pub mod embed;
pub mod error;
pub mod refresh;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Dashboard
        .route("/api/dashboard", get(routes::dashboard::get_dashboard))
        .route("/api/refresh", post(routes::dashboard::refresh_now))
        .route(
            "/api/refresh-settings",
            get(routes::settings::get_refresh_settings).put(routes::settings::put_refresh_settings),
        )
        // Records
        .route(
            "/api/records/duplicate",
            post(routes::records::duplicate_template),
        )
        .route(
            "/api/records/{id}/action",
            post(routes::records::submit_action),
        )
        .route("/api/records/{id}/flag", post(routes::records::set_flag))
        // Block list
        .route(
            "/api/blocklist",
            get(routes::blocklist::get_blocklist).post(routes::blocklist::add_url),
        )
        .route("/api/blocklist/remove", post(routes::blocklist::remove_url))
        .route("/api/blocklist/move", post(routes::blocklist::move_urls))
        .route("/api/blocklist/reset", post(routes::blocklist::reset))
        .route("/api/blocklist/export", get(routes::blocklist::export))
        .route("/api/blocklist/import", post(routes::blocklist::import))
        .fallback(embed::static_handler)
        .layer(cors)
        .with_state(app_state)
}

/// Start the dashboard server.
pub async fn serve(app_state: AppState, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener, open_browser).await
}

/// Start the dashboard server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    tracing::info!(
        store = %app_state.store.describe(),
        "flagdesk dashboard listening on http://localhost:{actual_port}"
    );
    let app = build_router(app_state);

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        if let Err(e) = open::that(&url) {
            tracing::warn!("could not open browser: {e}");
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
