use leaddesk::bootstrap;
use leaddesk::config::Config;
use leaddesk::infrastructure::http::router::build_router;
use leaddesk::infrastructure::observability;
use leaddesk::infrastructure::persistence::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    observability::init(&config)?;
    tracing::info!("Configuration loaded");

    // Initialize database connection
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    db.run_migrations().await?;
    tracing::info!("Database migrations applied");

    // Build application state (and start background services)
    let state = bootstrap::build_app_state(db, &config).await?;

    let app = build_router(state);

    let addr = config.server_address();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
