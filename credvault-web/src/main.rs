use std::path::PathBuf;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use credvault_app::AppStateBuilder;
use credvault_web::{configure, logging, WebConfig, WebState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_path) = WebConfig::load(std::env::args_os().nth(1).map(PathBuf::from))?;
    let _log_guard = logging::init(&config.log)?;

    match config_path {
        Some(ref path) => tracing::info!("Loaded configuration from {}", path.display()),
        None => tracing::info!("No configuration file found, using defaults"),
    }

    let store_config = config
        .store_config()
        .context("invalid store configuration")?;
    let app = AppStateBuilder::new()
        .config(store_config)
        .build()
        .await
        .context("failed to initialize the credential store")?;

    let backend = app.backend;
    let state = web::Data::new(WebState::new(app, !config.server.is_production()));
    let workers = config.server.workers.max(1);

    tracing::info!(
        bind = %config.server.bind,
        workers,
        backend = backend.as_str(),
        "Starting credvault-web"
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .workers(workers)
        .bind(&config.server.bind)
        .with_context(|| format!("failed to bind {}", config.server.bind))?
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
