//! LDH Admission Server
//!
//! REST API for help request admission and visit ticketing.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ldh_admission_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{
        clock::{Clock, SystemClock},
        notifications::RedisOutbox,
        Collaborators, Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("ldh_admission_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting LDH Admission Server v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let started_at = clock.now();

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    let outbox = RedisOutbox::new(&config.redis).await?;

    tracing::info!("Connected to Redis outbox {}", config.redis.outbox_key);

    let repository = Repository::new(pool);
    let collaborators = Collaborators {
        eligibility: Arc::new(repository.visitors.clone()),
        notifier: Arc::new(outbox),
        audit: Arc::new(repository.audit_logs.clone()),
        clock,
    };
    let services = Services::new(Arc::new(repository), &config.admission, collaborators);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        started_at,
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
