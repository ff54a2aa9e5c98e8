use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use pairing_algo::config::Settings;
use pairing_algo::core::PairingEngine;
use pairing_algo::routes::{self, AppState};
use pairing_algo::services::{MemoryPairStore, OllamaProvider, PairStore, PostgresPairStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

fn startup_error(what: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", what, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", what, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    pairing_algo::logging::init(&settings.logging.level, &settings.logging.format);

    info!("Starting pairing service...");

    let ollama = OllamaProvider::new(
        &settings.ollama.url,
        settings.ollama.model.clone(),
        Duration::from_secs(settings.ollama.timeout_secs),
        settings.ollama.cache_size,
        Duration::from_secs(settings.ollama.cache_ttl_secs),
    )
    .map_err(|e| startup_error("Failed to create embeddings client", e))?;

    if settings.ollama.pull_on_start {
        ollama
            .pull_model()
            .await
            .map_err(|e| startup_error("Failed to pull embedding model", e))?;
    }

    info!("Embeddings client ready ({} at {})", settings.ollama.model, ollama.base_url());

    let store: Arc<dyn PairStore> = match &settings.database.url {
        Some(url) => {
            let db = &settings.database;
            let postgres = PostgresPairStore::from_settings(
                url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!("PostgreSQL store initialized");
            Arc::new(postgres)
        }
        None => {
            warn!("No database configured, pairing results are kept in memory only");
            Arc::new(MemoryPairStore::new())
        }
    };

    let engine = PairingEngine::new(settings.engine_settings());

    info!("Pairing engine initialized with {:?}", engine.settings());

    let app_state = AppState {
        provider: Arc::new(ollama),
        store,
        engine,
        slot_labels: Arc::new(settings.availability.slots.clone()),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
