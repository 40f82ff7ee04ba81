use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::tle::{CelestrakSource, TleCache, TleFetcher};

use super::api::passes as pass_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::state::AppState;

/// Build the shared state for `config`: one process-wide cache behind the
/// Celestrak source.
pub fn build_state(config: Config) -> std::io::Result<AppState> {
    let source = CelestrakSource::new(config.tle.source_url.clone(), config.tle.fetch_timeout)
        .map_err(std::io::Error::other)?;
    let fetcher = TleFetcher::new(Arc::new(TleCache::new()), Arc::new(source));

    Ok(AppState {
        config: Arc::new(config),
        fetcher: Arc::new(fetcher),
    })
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/passes", post(pass_handlers::calculate_passes))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let app = build_router(build_state(config)?);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
