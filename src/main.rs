//!
//! ParkHub API server.
//! Reads configuration from TOML file (~/.config/parkhub/config.toml).

use std::sync::Arc;
use std::time::Instant;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use parkhub::application::services::{
    HistoryService, LotService, OccupancyService, ReminderScheduler, ReportService, UserService,
};
use parkhub::application::PlainTextReportGenerator;
use parkhub::config::AppConfig;
use parkhub::domain::{Role, Storage, User};
use parkhub::infrastructure::cache::{CacheLayer, InMemoryCache};
use parkhub::infrastructure::crypto::jwt::JwtConfig;
use parkhub::infrastructure::crypto::password::hash_password;
use parkhub::infrastructure::database::migrator::Migrator;
use parkhub::interfaces::http::modules::health::HealthState;
use parkhub::notifications::{start_delivery_worker, Dispatcher, LoggingSink};
use parkhub::shared::ShutdownCoordinator;
use parkhub::{
    create_api_router, create_event_bus, default_config_path, init_database, ApiState,
    DatabaseConfig, DatabaseStorage,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("PARKHUB_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting ParkHub API server...");

    let db_config = DatabaseConfig {
        url: app_cfg.database.connection_url(),
    };
    info!("Database: {}", db_config.url);

    let jwt_config = JwtConfig {
        secret: app_cfg.security.jwt_secret.clone(),
        expiration_hours: app_cfg.security.jwt_expiration_hours,
        issuer: "parkhub".to_string(),
    };
    info!(
        "JWT configured with {}h token expiration",
        jwt_config.expiration_hours
    );

    // ── Database ───────────────────────────────────────────────
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    let storage: Arc<dyn Storage> = Arc::new(DatabaseStorage::new(db.clone()));

    // Create default admin user if no users exist
    create_default_admin(storage.as_ref(), &app_cfg).await;

    // ── Cache (read accelerator, optional) ─────────────────────
    let cache = if app_cfg.cache.enabled {
        CacheLayer::new(Arc::new(InMemoryCache::new()))
    } else {
        info!("Cache disabled");
        CacheLayer::disabled()
    };

    // ── Event bus & notification dispatch ──────────────────────
    let event_bus = create_event_bus();
    let dispatcher = Dispatcher::new(event_bus.clone());
    info!("🔔 Event bus initialized for notifications");

    // ── Services ───────────────────────────────────────────────
    let lots = Arc::new(LotService::new(
        storage.clone(),
        cache.clone(),
        dispatcher.clone(),
    ));
    let occupancy = Arc::new(OccupancyService::new(
        storage.clone(),
        cache.clone(),
        dispatcher.clone(),
    ));
    let history = Arc::new(HistoryService::new(storage.clone(), cache.clone()));
    let users = Arc::new(UserService::new(storage.clone(), cache.clone()));
    let reports = Arc::new(ReportService::new(
        storage.clone(),
        dispatcher.clone(),
        Arc::new(PlainTextReportGenerator),
        app_cfg.jobs.exports_dir.clone().into(),
    ));

    // Initialize shutdown coordinator
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── Background workers ─────────────────────────────────────
    start_delivery_worker(
        event_bus.clone(),
        Arc::new(LoggingSink),
        shutdown_signal.clone(),
    );

    let reminder_scheduler = Arc::new(ReminderScheduler::new(
        storage.clone(),
        dispatcher.clone(),
        app_cfg.jobs.reminder_hour,
        app_cfg.jobs.reminder_minute,
    ));
    reminder_scheduler.start(
        shutdown_signal.clone(),
        app_cfg.jobs.reminder_check_interval,
    );

    reports
        .clone()
        .start(shutdown_signal.clone(), app_cfg.jobs.report_poll_interval);

    // ── REST API ───────────────────────────────────────────────
    let api_state = ApiState {
        storage,
        jwt_config,
        lots,
        occupancy,
        history,
        users,
        reports,
    };
    let health_state = HealthState {
        db: db.clone(),
        started_at: Arc::new(Instant::now()),
    };
    let api_router = create_api_router(api_state, health_state);

    let api_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("🛑 REST API server received shutdown signal");
    });

    info!("🚀 Server started. Press Ctrl+C to shutdown gracefully.");

    if let Err(e) = api_server.await {
        error!("REST API server error: {}", e);
    }

    // Perform final cleanup
    info!("🧹 Performing final cleanup...");

    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("✅ Database connection closed");
    }

    info!("👋 ParkHub shutdown complete");
    Ok(())
}

/// Create default admin user if no users exist
async fn create_default_admin(storage: &dyn Storage, app_cfg: &AppConfig) {
    let users_count = storage.count_users().await.unwrap_or(0);

    if users_count == 0 {
        info!("Creating default admin user...");

        let password_hash = match hash_password(&app_cfg.admin.password) {
            Ok(hash) => hash,
            Err(e) => {
                error!("Failed to hash admin password: {}", e);
                return;
            }
        };

        let admin = User::new(
            app_cfg.admin.username.clone(),
            app_cfg.admin.email.clone(),
            password_hash,
            Role::Admin,
        );

        match storage.insert_user(admin).await {
            Ok(created) => {
                info!("Default admin created: {}", created.email);
                info!("⚠️  Please change the admin password immediately!");
            }
            Err(e) => {
                error!("Failed to create admin user: {}", e);
            }
        }
    }
}
