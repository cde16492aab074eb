//! # Database Pool Management
//!
//! Connection string parsing, pool creation, and repository access.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  "Data Source=AdminSERMAC.db;Version=3;"                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::from_connection_string ← ADO-style, sqlite:// or :memory:   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + ensure schema             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.clientes() / db.productos() / ... ← one scope per call             │
//! │  db.unit_of_work()                    ← shared transaction             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases use WAL so report queries don't block a receipt being
//! written. In-memory databases keep SQLite's default journal.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::cliente::ClienteRepository;
use crate::repository::compra::CompraRepository;
use crate::repository::inventario::InventarioRepository;
use crate::repository::producto::ProductoRepository;
use crate::repository::venta::VentaRepository;
use crate::schema;
use crate::session::Session;
use crate::unit_of_work::UnitOfWork;

/// Path value that selects a private in-memory database.
const MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust
/// use sermac_db::DbConfig;
///
/// let config = DbConfig::from_connection_string("Data Source=AdminSERMAC.db;Version=3;")
///     .unwrap()
///     .max_connections(4);
/// assert_eq!(config.database_path.to_str(), Some("AdminSERMAC.db"));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long a call waits for a free connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps it forever.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Whether to create missing tables on connect.
    /// Default: true
    pub ensure_schema: bool,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            ensure_schema: true,
        }
    }

    /// Parses a connection string.
    ///
    /// ## Accepted Forms
    /// ```text
    /// Data Source=AdminSERMAC.db;Version=3;   ADO.NET style, keys case-insensitive
    /// sqlite://data/AdminSERMAC.db?mode=rwc   URL, query string ignored
    /// sqlite::memory:  /  :memory:            in-memory database
    /// ```
    pub fn from_connection_string(connection_string: &str) -> DbResult<Self> {
        let s = connection_string.trim();

        if s.is_empty() {
            return Err(DbError::InvalidConnectionString(
                "connection string is empty".to_string(),
            ));
        }

        if let Some(rest) = s.strip_prefix("sqlite:") {
            let rest = rest.strip_prefix("//").unwrap_or(rest);
            let path = rest.split('?').next().unwrap_or_default();
            return Self::for_path(path, connection_string);
        }

        if !s.contains('=') {
            return Self::for_path(s, connection_string);
        }

        let mut data_source = None;
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                DbError::InvalidConnectionString(format!("malformed segment '{}'", part))
            })?;
            let key = key.trim().to_ascii_lowercase();
            if matches!(key.as_str(), "data source" | "datasource" | "filename") {
                data_source = Some(value.trim());
            }
        }

        match data_source {
            Some(path) => Self::for_path(path, connection_string),
            None => Err(DbError::InvalidConnectionString(
                "missing 'Data Source'".to_string(),
            )),
        }
    }

    fn for_path(path: &str, original: &str) -> DbResult<Self> {
        let path = path.trim();
        if path.is_empty() {
            return Err(DbError::InvalidConnectionString(format!(
                "no database path in '{}'",
                original
            )));
        }
        if path == MEMORY {
            return Ok(Self::in_memory());
        }
        Ok(Self::new(path))
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to create missing tables on connect.
    pub fn ensure_schema(mut self, ensure: bool) -> Self {
        self.ensure_schema = ensure;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// One connection that is never recycled: the database lives exactly
    /// as long as the pool.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            ensure_schema: true,
        }
    }

    /// True when this configuration selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(MEMORY)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone: every clone shares the same pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::connect("Data Source=AdminSERMAC.db;Version=3;").await?;
///
/// let deudores = db.clientes().get_clientes_con_deuda().await?;
///
/// let uow = db.unit_of_work();
/// uow.begin().await?;
/// uow.productos().actualizar_stock("P-001", -5, -12.5).await?;
/// uow.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode (file databases only)
    ///    - NORMAL synchronous
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Creates missing tables (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let base_options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(DbError::ConnectionFailed)?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true)
        };

        let connect_options = base_options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(if config.is_in_memory() {
                None
            } else {
                Some(Duration::from_secs(30 * 60))
            })
            .connect_with(connect_options)
            .await
            .map_err(DbError::ConnectionFailed)?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.ensure_schema {
            db.ensure_schema().await?;
        }

        Ok(db)
    }

    /// Parses `connection_string` and opens the database it names.
    pub async fn connect(connection_string: &str) -> DbResult<Self> {
        Self::new(DbConfig::from_connection_string(connection_string)?).await
    }

    /// Creates any missing table.
    pub async fn ensure_schema(&self) -> DbResult<()> {
        schema::ensure_schema(&self.pool).await?;
        info!("Schema ready");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn session(&self) -> Session {
        Session::standalone(self.pool.clone())
    }

    /// Returns the client repository.
    pub fn clientes(&self) -> ClienteRepository {
        ClienteRepository::new(self.session())
    }

    /// Returns the product repository.
    pub fn productos(&self) -> ProductoRepository {
        ProductoRepository::new(self.session())
    }

    /// Returns the sale repository.
    pub fn ventas(&self) -> VentaRepository {
        VentaRepository::new(self.session())
    }

    /// Returns the inventory repository.
    pub fn inventario(&self) -> InventarioRepository {
        InventarioRepository::new(self.session())
    }

    /// Returns the purchase lookup repository.
    pub fn compras(&self) -> CompraRepository {
        CompraRepository::new(self.session())
    }

    /// Starts a new unit of work over this pool.
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_connect_in_memory_from_connection_string() {
        let db = Database::connect("Data Source=:memory:;Version=3;")
            .await
            .unwrap();
        assert!(db.health_check().await);

        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .ensure_schema(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.ensure_schema);
    }

    #[test]
    fn test_ado_connection_string() {
        let config =
            DbConfig::from_connection_string("Data Source=AdminSERMAC.db;Version=3;").unwrap();
        assert_eq!(config.database_path, PathBuf::from("AdminSERMAC.db"));
        assert!(!config.is_in_memory());

        let config =
            DbConfig::from_connection_string("version=3; data source = C:\\SERMAC\\a.db ;")
                .unwrap();
        assert_eq!(config.database_path, PathBuf::from("C:\\SERMAC\\a.db"));
    }

    #[test]
    fn test_url_connection_string() {
        let config = DbConfig::from_connection_string("sqlite://data/sermac.db?mode=rwc").unwrap();
        assert_eq!(config.database_path, PathBuf::from("data/sermac.db"));

        assert!(DbConfig::from_connection_string("sqlite::memory:")
            .unwrap()
            .is_in_memory());
        assert!(DbConfig::from_connection_string(":memory:")
            .unwrap()
            .is_in_memory());
    }

    #[test]
    fn test_invalid_connection_strings() {
        for bad in ["", "   ", "Version=3;", "Data Source=;Version=3;", "sqlite://"] {
            assert!(
                matches!(
                    DbConfig::from_connection_string(bad),
                    Err(DbError::InvalidConnectionString(_))
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_in_memory_never_recycles_its_connection() {
        let config = DbConfig::in_memory();
        assert_eq!(config.max_connections, 1);
        assert!(config.idle_timeout.is_none());
    }
}
