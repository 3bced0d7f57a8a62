pub mod album;
pub mod error;

use std::{fmt::Display, time::Duration};

pub use error::Error;
pub use sqlx::Error as SqlxError;
use sqlx::any::AnyPoolOptions;
use tracing::{debug, info};

use crate::error::Result;

pub type ChosenDB = sqlx::Any;
pub type Pool = sqlx::Pool<ChosenDB>;

const MYSQL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Albums (
    id INT AUTO_INCREMENT PRIMARY KEY,
    artist VARCHAR(255) NOT NULL,
    year INT NOT NULL,
    title VARCHAR(255) NOT NULL,
    image MEDIUMBLOB NOT NULL
) ENGINE=InnoDB
"#;

const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    artist VARCHAR(255) NOT NULL,
    year INT NOT NULL,
    title VARCHAR(255) NOT NULL,
    image BLOB NOT NULL
)
"#;

/// Database engine behind a connection URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Sqlite,
}

impl Backend {
    pub fn from_url(database_url: &str) -> Result<Self> {
        let scheme = database_url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .unwrap_or_default();
        match scheme {
            "mysql" | "mariadb" => Ok(Backend::MySql),
            "sqlite" => Ok(Backend::Sqlite),
            _ => Err(Error::UnsupportedDatabase(scheme.to_string())),
        }
    }

    fn schema(&self) -> &'static str {
        match self {
            Backend::MySql => MYSQL_SCHEMA,
            Backend::Sqlite => SQLITE_SCHEMA,
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::MySql => write!(f, "MySQL"),
            Backend::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Connection pool limits, fixed for the lifetime of the pool.
/// Connections have unlimited lifetime.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// Idle connections above `min_connections` are closed after this time
    pub idle_timeout: Option<Duration>,
}

/// Creates pool and checks that database is reachable
pub async fn new_pool(database_url: &str, config: &PoolConfig) -> Result<Pool, Error> {
    let backend = Backend::from_url(database_url)?;
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(None)
        .connect(database_url)
        .await?;
    debug!("Connected to {backend} database, pool config {config:?}");
    Ok(pool)
}

/// Creates albums table, if it does not exist yet
pub async fn ensure_schema(pool: &Pool, backend: Backend) -> Result<()> {
    sqlx::raw_sql(backend.schema()).execute(pool).await?;
    info!("Albums table is ready");
    Ok(())
}
