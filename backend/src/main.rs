mod catalog;
mod config;
mod error;
mod job_controller;
mod services;
mod store;

use crate::catalog::invalidation::{start_invalidation_listener, ChannelInvalidator};
use crate::catalog::HomeCatalog;
use crate::config::AppConfig;
use crate::job_controller::state::JobsState;
use crate::store::{DocumentStore, SqliteDocumentStore};
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::open(&config.db_path).map_err(|e| {
        error!("Cannot open document store at {}: {}", config.db_path, e);
        io::Error::other(e.to_string())
    })?);
    info!("Document store opened at {}", config.db_path);

    // Cache invalidations are announced on a bounded channel and drained here.
    let (invalidation_tx, invalidation_rx) = mpsc::channel(256);
    tokio::spawn(start_invalidation_listener(invalidation_rx));
    let catalog = HomeCatalog::new(store, Arc::new(ChannelInvalidator::new(invalidation_tx)), &config);

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new(100);
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    info!("Server running at http://{}:{}", config.host, config.port);

    let json_limit = config.json_limit;
    let bind = (config.host.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(catalog.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .service(services::home_sections::configure_routes(json_limit))
    })
    .bind(bind)?
    .run()
    .await
}
