use domain::connection::Connections;
use domain::token_storage::EnvFileStorage;
use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
        std::process::exit(1);
    }

    info!(
        "Starting bank dashboard [{}], tokens kept in {}",
        config.runtime_env(),
        config.token_store_path.display()
    );

    let storage = Arc::new(EnvFileStorage::new(config.token_store_path.clone()));
    let connections = match Connections::new(&config, storage) {
        Ok(connections) => Arc::new(connections),
        Err(e) => {
            error!("Failed to set up bank connections: {e}");
            std::process::exit(1);
        }
    };

    let app_state = web::AppState::new(config, connections);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
