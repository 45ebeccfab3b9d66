use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lunch_vote::adapters::clock::SystemClock;
use lunch_vote::adapters::http::{app_router, HealthState, VoteSessionHandlers};
use lunch_vote::adapters::postgres::{
    PostgresHealthCheck, PostgresRestaurantRegistry, PostgresVotingStore,
};
use lunch_vote::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = EnvFilter::try_new(&config.server.log_level)?;
    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting lunch-vote");

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let health = HealthState::new(
        Arc::new(PostgresHealthCheck::new(pool.clone())),
        config.server.environment.as_str(),
    );
    let handlers = VoteSessionHandlers::new(
        Arc::new(PostgresVotingStore::new(pool.clone())),
        Arc::new(PostgresRestaurantRegistry::new(pool)),
        config.voting.rules()?,
        Arc::new(SystemClock),
    );
    let app = app_router(handlers, health, config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
