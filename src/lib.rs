pub mod config;
pub mod credential;
pub mod download;
pub mod fal;
mod routes;
pub mod staging;
pub mod state;
pub mod workflow;

use axum::{extract::Request, routing::get, Router, ServiceExt};
use axum_embed::ServeEmbed;
use routes::{
    credential::credential_routes, download::download_routes, images::image_routes,
    workflow::workflow_routes, ApiDoc,
};
use rust_embed::RustEmbed;
use state::AppState;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tower::{Layer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

#[derive(RustEmbed, Clone)]
#[folder = "web/dist/"]
struct WebDist;

/// Router serving the api, its documentation and the embedded single page app.
pub fn app(app_state: AppState) -> Router {
    let max_body_bytes = app_state.config().max_body_bytes;
    let is_dev = app_state.config().is_dev();

    let app = Router::new()
        .nest("/credential", credential_routes())
        .nest("/images", image_routes(max_body_bytes))
        .nest("/workflow", workflow_routes().merge(download_routes()))
        .route("/health_check", get(routes::health_check))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/docs"))
        .fallback_service(ServeEmbed::<WebDist>::new())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(Arc::new(app_state));

    if is_dev {
        app.layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_origin(Any)
                .allow_methods(Any),
        )
    } else {
        app
    }
}

pub async fn run(app_state: AppState) -> anyhow::Result<()> {
    let config = app_state.config().clone();

    let app = NormalizePathLayer::trim_trailing_slash().layer(app(app_state));

    let addr = SocketAddr::from_str(format!("{}:{}", &config.host, &config.port).as_str())?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(signal_shutdown())
        .await?;

    Ok(())
}

async fn signal_shutdown() {
    tokio::signal::ctrl_c()
        .await
        .expect("expect tokio signal ctrl-c");
    tracing::info!("signal shutdown");
}
