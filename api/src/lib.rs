//! HTTP surface of the survey core.

pub mod config;
pub mod errors;
pub mod extract;
pub mod metrics_defs;
pub mod routes;

use axum::Router;
use config::ApiConfig;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use store::Store;
use surveys::Surveys;
use tokio::net::TcpListener;
use webhooks::{Dispatcher, WebhookError, Webhooks, WebhooksConfig};

pub use errors::ApiError;

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub surveys: Surveys,
    pub webhooks: Webhooks,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, webhooks: &WebhooksConfig) -> Result<Self, WebhookError> {
        Ok(AppState {
            surveys: Surveys::new(store.clone()),
            webhooks: Webhooks::new(store.clone()),
            dispatcher: Dispatcher::new(store, webhooks)?,
        })
    }
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

/// Serves the API and the admin endpoints until either listener fails.
pub async fn run(config: ApiConfig, state: AppState) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.listener.addr()).await?;
    tracing::info!(addr = %config.listener.addr(), "Serving API");

    let api = app(state).into_make_service_with_connect_info::<SocketAddr>();
    let api_task = async { axum::serve(listener, api).await.map_err(ServerError::from) };

    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::new(|| true),
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}
