//! QA manager server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use qa_manager_lib::api::{self, ApiDoc};
use qa_manager_lib::config::Config;
use qa_manager_lib::db::DbPool;
use qa_manager_lib::file_store::FileStore;
use qa_manager_lib::middleware::RequestLogger;
use qa_manager_lib::models::EntityKind;
use qa_manager_lib::services::Services;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - QAM_USE_POSTGRES* and QAM_FALLBACK_TO_FILE must be booleans");
            error!("  - In production, DATABASE_URL must be set when any entity uses PostgreSQL");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  QA Manager Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let storage = &config.storage;
    for kind in EntityKind::ALL {
        let backend = if storage.use_postgres(kind) { "postgres" } else { "file" };
        info!(entity = %kind, backend, "Storage backend selected");
    }
    info!(
        data_dir = %storage.data_dir.display(),
        fallback_enabled = storage.fallback_enabled,
        "File backend configured"
    );

    let file_store = Arc::new(FileStore::new(storage.data_dir.clone()));
    if let Err(e) = file_store.ensure_data_dir().await {
        error!("{}", e);
        std::process::exit(1);
    }

    // Entities on PostgreSQL need a reachable database at startup, even with
    // fallback enabled: migrations must have run before the first request.
    let pool = if storage.needs_database() {
        match DbPool::new(&config).await {
            Ok(pool) => {
                info!("Database connection established");
                Some(Arc::new(pool))
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!("No entity uses PostgreSQL, skipping database connection");
        None
    };

    let services = match Services::new(storage, pool.clone(), file_store) {
        Ok(services) => services,
        Err(e) => {
            error!("Failed to build services: {}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address();
    let is_development = config.is_development();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };
    info!("API docs at http://{}/swagger-ui/", bind_address);

    let services = web::Data::new(services);
    let pool = pool.map(web::Data::from);

    let server = HttpServer::new(move || {
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_origin("http://localhost:5173")
                .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let mut app = App::new()
            // CORS must wrap before other middleware
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(services.clone())
            .app_data(api::json_config())
            .app_data(api::query_config());
        if let Some(ref pool) = pool {
            app = app.app_data(pool.clone());
        }

        app.service(web::scope("/api/v1").configure(api::configure_api))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
