use anyhow::Context;
use flagdesk_server::AppState;
use std::path::Path;

pub fn run(config_path: Option<&Path>, demo: bool, port: u16, no_open: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let refresh = config
        .refresh_settings()
        .context("invalid refresh settings")?;
    let store = super::open_store(&config, demo);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("cannot bind port {port}"))?;
        let actual_port = listener.local_addr()?.port();
        let source = store.describe();

        // Built inside the runtime so the refresh timer starts.
        let state = AppState::new(store, config, refresh);

        println!("flagdesk ({source}) → http://localhost:{actual_port}");

        tokio::select! {
            res = flagdesk_server::serve_on(state, listener, !no_open) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
