//! Database Config

use clap::Args;

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string for the row-level-security app role
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// `PostgreSQL` connection string for the role that finalizes orders
    #[arg(long, env = "SERVICE_DATABASE_URL", hide_env_values = true)]
    pub service_database_url: String,
}
