use axum::http::{header, HeaderValue, Method};
use domain::connection::Connections;
use log::*;
use service::config::Config;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

mod controller;
mod error;
mod params;
mod router;

pub use error::{Error, Result, WebErrorKind};
pub use router::define_routes;

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub connections: Arc<Connections>,
}

impl AppState {
    pub fn new(app_config: Config, connections: Arc<Connections>) -> Self {
        Self {
            config: app_config,
            connections,
        }
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{}:{}", host, app_state.config.port);

    info!("Server starting... listening for connections on http://{server_url}");

    let cors_layer = cors_layer(&app_state.config);
    let listener = tokio::net::TcpListener::bind(&server_url).await?;

    axum::serve(listener, define_routes(app_state).layer(cors_layer)).await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse()
                .inspect_err(|_| warn!("Ignoring invalid CORS origin: {origin}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
