mod app;
mod app_state;
mod config;
mod core;
mod domain;
mod errors;
mod logging;
mod scheduler;
mod screens;

use anyhow::Result;
use tracing::{error, info};

use crate::app::App;
use crate::app_state::build_app_state;
use crate::config::AppConfig;
use crate::core::client::kube_client::build_kube_client;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load();
    let _log_guard = logging::init_logging(&config)?;

    info!(
        "Starting kuv (refresh every {}s, auto-refresh {}, fetch timeout {}s)",
        config.refresh_interval.as_secs(),
        if config.auto_refresh { "on" } else { "off" },
        config.fetch_timeout.as_secs()
    );

    let client = build_kube_client(config.kube_context.as_deref()).await?;
    let state = build_app_state(config, client);

    let mut app = App::new(&state);
    if let Err(e) = app.run().await {
        error!("kuv exited with error: {:#}", e);
        return Err(e);
    }

    info!("kuv stopped");
    Ok(())
}
