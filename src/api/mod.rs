use anyhow::Result;
use axum::{Router, routing::get};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Config;
use crate::dom::Document;
use crate::error::ClientError;
use crate::http;
use crate::page::{DEFAULT_TEMPLATE, SearchPage};
use crate::search_api::SearchApi;
use crate::summary::SummaryClient;

pub mod handlers;
pub mod models;

/// Everything a request needs, built once at startup.
pub struct AppState {
    pub config: Config,
    /// Parsed page template, already checked to bind.
    pub template: Document,
    pub search_api: SearchApi,
    pub summaries: SummaryClient,
}

impl AppState {
    pub fn new(config: Config) -> crate::error::Result<Self> {
        let html = match &config.template_path {
            Some(path) => read_template(path)?,
            None => DEFAULT_TEMPLATE.to_string(),
        };
        let template = Document::parse(&html);
        SearchPage::bind(template.clone())?;

        let client = http::build_client(&config)?;
        Ok(Self {
            search_api: SearchApi::new(client.clone(), config.server_url.clone()),
            summaries: SummaryClient::new(
                client,
                config.summary_endpoint.clone(),
                config.summary_max_chars,
            ),
            template,
            config,
        })
    }
}

fn read_template(path: &Path) -> crate::error::Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        ClientError::Config(format!("cannot read template {}: {e}", path.display()))
    })
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(handlers::search_page))
        .with_state(state)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Runs the front-end until `shutdown` is cancelled.
pub async fn serve(state: Arc<AppState>, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(&state.config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "front-end listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("front-end stopped");
    Ok(())
}
