use std::path::PathBuf;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use crate::config::DatabaseConfig;

/// Build PostgreSQL connection options from the individual settings.
pub fn connect_options(config: &DatabaseConfig) -> anyhow::Result<PgConnectOptions> {
    let ssl_mode: PgSslMode = config
        .ssl_mode
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown SSL mode '{}'", config.ssl_mode))?;

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database_name)
        .ssl_mode(ssl_mode))
}

/// Create a PostgreSQL connection pool.
///
/// The pool is the only state shared between requests; hand clones of it
/// to whatever needs database access.
pub async fn create_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_options(config)?)
        .await?;

    tracing::info!(
        host = %config.host,
        database = %config.database_name,
        max_connections = config.max_connections,
        "Connected to PostgreSQL"
    );
    Ok(pool)
}

/// Apply the migrations found in `dir` at runtime.
pub async fn run_migrations(pool: &PgPool, dir: &str) -> anyhow::Result<()> {
    let migrator = Migrator::new(PathBuf::from(dir)).await?;
    migrator.run(pool).await?;

    tracing::info!(dir, "Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ssl_mode: &str) -> DatabaseConfig {
        DatabaseConfig {
            host: "db.internal".to_string(),
            port: 6543,
            user: "subtracker".to_string(),
            password: "secret".to_string(),
            database_name: "subscriptions".to_string(),
            ssl_mode: ssl_mode.to_string(),
            max_connections: 5,
        }
    }

    #[test]
    fn test_connect_options_from_parts() {
        let options = connect_options(&config("require")).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "subtracker");
        assert_eq!(options.get_database(), Some("subscriptions"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
    }

    #[test]
    fn test_unknown_ssl_mode_rejected() {
        assert!(connect_options(&config("sometimes")).is_err());
    }
}
