//! Wastage upload server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, http::header, web};
use sea_orm_migration::MigratorTrait;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use wastage_server_lib::api::{self, ApiDoc};
use wastage_server_lib::config::Config;
use wastage_server_lib::db::{DbPool, WastageStore};
use wastage_server_lib::middleware::RequestLogger;
use wastage_server_lib::migration::Migrator;
use wastage_server_lib::services::storage::UPLOADS_PREFIX;
use wastage_server_lib::services::{ImageStore, InwardChallanClient, WastageService};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and INWARD_API_URL must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Wastage Upload Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Create the image upload directory
    let uploads_dir = config.web_root.join(UPLOADS_PREFIX);
    tokio::fs::create_dir_all(&uploads_dir)
        .await
        .expect("Failed to create uploads directory");

    // Initialize database and run migrations
    let pool = DbPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    info!("Database connection established");

    Migrator::up(pool.connection(), None)
        .await
        .expect("Failed to run migrations");
    info!("Database migrations complete");

    // Wire up the workflow: record store, image store, downstream notifier
    let store: Arc<dyn WastageStore> = Arc::new(pool.clone());
    let images = ImageStore::new(config.web_root.clone());
    let notifier = Arc::new(InwardChallanClient::new(
        config.inward_api_url.clone(),
        config.inward_api_key.clone(),
    ));
    let service = web::Data::new(WastageService::new(store, images, notifier));
    let config_data = web::Data::new(config.clone());

    info!("Inward challan API: {}", config.inward_api_url);

    // Limit concurrent multipart submissions to bound memory usage
    let upload_semaphore = Arc::new(Semaphore::new(config.max_concurrent_uploads));
    info!(
        "Upload limits: {}MB max payload, {} concurrent uploads",
        config.max_upload_size / 1024 / 1024,
        config.max_concurrent_uploads
    );

    let bind_address = config.bind_address();
    let web_root = config.web_root.clone();
    let max_upload_size = config.max_upload_size;
    let is_development = config.is_development();

    let worker_count = if is_development {
        4
    } else {
        num_cpus::get()
    };
    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    let server = HttpServer::new(move || {
        // Permissive CORS for development, same-origin in production
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(service.clone())
            .app_data(config_data.clone())
            .app_data(web::Data::new(upload_semaphore.clone()))
            .app_data(web::PayloadConfig::new(max_upload_size))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_wastage_routes),
            )
            // Stored images resolve at the same relative URL that is persisted
            .service(Files::new("/uploads", web_root.join("uploads")).prefer_utf8(true))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    });

    server.workers(worker_count).bind(&bind_address)?.run().await
}
