// Session safety admin API
// Serves the session and password reset administration endpoints

mod config;
mod handlers;
mod routes;

use anyhow::Context;
use config::Config;
use dotenvy::dotenv;
use safety_auth::{Resolvers, Safety, SessionAdmin};
use safety_cache::{Cache, RedisSessionStore};
use safety_database::Database;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub struct AppState {
    pub safety: Safety,
    pub admin: SessionAdmin,
}

impl AppState {
    pub fn new(safety: Safety) -> Self {
        let admin = SessionAdmin::new(safety.sessions.clone(), safety.password_resets.clone());
        Self { safety, admin }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,safety_api=debug,tower_http=debug")),
        )
        .init();

    tracing::info!("Starting session safety API");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Server: {}:{}", config.server_host, config.server_port);

    // Initialize database
    tracing::info!("Connecting to database...");
    let database = Database::new(config.database.clone()).await?;
    database.ping().await?;
    database.migrate().await.context(
        "Applying migrations failed; the schema references the host's users(id UUID) table, which must exist first",
    )?;
    tracing::info!("Database connected and migrated");

    // Initialize session store
    tracing::info!("Connecting to Redis...");
    let cache = Cache::new(&config.cache).await?;
    cache.ping().await?;
    let session_store = RedisSessionStore::new(cache, config.cache.session_key_prefix.clone());
    tracing::info!("Redis connected");

    let resolvers = Resolvers::from_config(&config.safety)?;
    let safety = Safety::postgres(&database, Arc::new(session_store), resolvers);
    let state = Arc::new(AppState::new(safety));

    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    tracing::info!("Routes configured:");
    tracing::info!("   GET    /health");
    tracing::info!("   GET    /admin/sessions");
    tracing::info!("   DELETE /admin/sessions/:id");
    tracing::info!("   GET    /admin/password-resets");

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server ready at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
