//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `LUNCH_VOTE` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use lunch_vote::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod server;
mod voting;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use voting::{VotingConfig, VOTE_BUDGET_LIMIT};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Voting rules
    #[serde(default)]
    pub voting: VotingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `LUNCH_VOTE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Splits `voting.weight_schedule` on commas
    ///
    /// # Environment Variable Format
    ///
    /// - `LUNCH_VOTE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LUNCH_VOTE__DATABASE__URL=...` -> `database.url = ...`
    /// - `LUNCH_VOTE__VOTING__WEIGHT_SCHEDULE=1.0,0.5` -> `voting.weight_schedule = [1.0, 0.5]`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("LUNCH_VOTE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("voting.weight_schedule"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.voting.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
