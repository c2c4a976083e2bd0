use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use filedepot::file::FileStorage;
use filedepot::web::WebServer;
use filedepot::{Config, Database};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = filedepot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        filedepot::logging::init_console_only(&config.logging.level);
    }

    info!("filedepot - File Management Backend");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let storage = match FileStorage::new(&config.storage.path) {
        Ok(storage) => storage,
        Err(e) => {
            error!("Failed to initialize blob storage: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Blob storage initialized at: {}", config.storage.path);

    let server = WebServer::new(&config.server, db, storage, &config.storage);
    if let Err(e) = server.run().await {
        error!("Web server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
