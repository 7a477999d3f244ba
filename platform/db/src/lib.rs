//! Database primitives shared by the service crates: connection settings,
//! the pooled connection handle and page-number pagination.

mod pagination;

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use thiserror::Error;
use tracing::info;

pub use pagination::{MAX_PAGE_SIZE, PageError, PageRequest, Paged, fetch_page};

/// Shared pooled connection handle.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing (set {0})")]
    MissingUrl(&'static str),
    #[error("invalid {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },
    #[error(transparent)]
    Connect(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

const URL_KEY: &str = "DATABASE_URL";
const MAX_CONNECTIONS_KEY: &str = "DB_MAX_CONNECTIONS";
const SQL_LOGGING_KEY: &str = "DB_SQL_LOGGING";

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub sql_logging: bool,
}

fn default_max_connections() -> u32 {
    10
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            sql_logging: false,
        }
    }

    /// Reads `DATABASE_URL`, `DB_MAX_CONNECTIONS` and `DB_SQL_LOGGING`.
    pub fn from_env() -> DbResult<Self> {
        let url = std::env::var(URL_KEY).map_err(|_| DbError::MissingUrl(URL_KEY))?;
        let max_connections = match std::env::var(MAX_CONNECTIONS_KEY) {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(DbError::InvalidSetting {
                    key: MAX_CONNECTIONS_KEY,
                    value: raw,
                })?,
            Err(_) => default_max_connections(),
        };
        let sql_logging = std::env::var(SQL_LOGGING_KEY)
            .ok()
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self {
            url,
            max_connections,
            sql_logging,
        })
    }
}

/// Opens the connection pool described by `settings`.
pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    // Every in-memory SQLite connection is a separate database.
    let max_connections = if settings.url.contains(":memory:") {
        1
    } else {
        settings.max_connections
    };
    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(settings.sql_logging);
    let pool = Database::connect(options).await?;
    info!(
        backend = ?pool.get_database_backend(),
        max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Round-trips a trivial statement; used by the health check.
pub async fn ping(pool: &DbPool) -> bool {
    pool.execute(Statement::from_string(
        pool.get_database_backend(),
        "SELECT 1".to_string(),
    ))
    .await
    .is_ok()
}
