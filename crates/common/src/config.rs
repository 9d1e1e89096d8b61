use std::fmt;
use std::str::FromStr;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to (default: 0.0.0.0:8080)
    pub listen_addr: String,

    /// Upper bound on waiting for in-flight requests at shutdown (default: 5)
    pub shutdown_timeout_secs: u64,

    /// PostgreSQL connection settings
    pub db: DatabaseConfig,

    /// Schema migration settings
    pub migrations: MigrationsConfig,
}

/// PostgreSQL connection settings.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database_name: String,
    /// One of `disable`, `allow`, `prefer`, `require`, `verify-ca`, `verify-full`
    pub ssl_mode: String,
    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub max_connections: u32,
}

// Keeps the password out of start-up logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database_name", &self.database_name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Schema migration settings.
#[derive(Debug, Clone)]
pub struct MigrationsConfig {
    pub dir: String,
    pub enabled: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };

        Ok(Self {
            listen_addr: lookup("HTTP_SERVER_LISTEN_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            shutdown_timeout_secs: parse_or(&lookup, "HTTP_SERVER_SHUTDOWN_TIMEOUT_SECS", 5)?,
            db: DatabaseConfig {
                host: required("MAIN_DB_HOST")?,
                port: required("MAIN_DB_PORT")?
                    .parse()
                    .map_err(|_| anyhow::anyhow!("MAIN_DB_PORT must be a valid u16"))?,
                user: required("MAIN_DB_USER")?,
                password: required("MAIN_DB_PASSWORD")?,
                database_name: required("MAIN_DB_DATABASE_NAME")?,
                ssl_mode: required("MAIN_DB_SSL_MODE")?,
                max_connections: parse_or(&lookup, "MAIN_DB_MAX_CONNECTIONS", 20)?,
            },
            migrations: MigrationsConfig {
                dir: lookup("MIGRATIONS_DIR").unwrap_or_else(|| "migrations".to_string()),
                enabled: parse_or(&lookup, "MIGRATIONS_ENABLED", false)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
