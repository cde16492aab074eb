//! # Service Container
//!
//! Builds every component of the back office from one [`AppConfig`].
//!
//! ## Registrations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppConfig.connection_string                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database (pool + schema)                                               │
//! │       ├── repositories        one per call, own scope per operation     │
//! │       └── unit_of_work()      new per call, shared transaction          │
//! │                                                                         │
//! │  ConfigurationService   (AppConfig)                                     │
//! │  NotificationService    (single broadcast channel)                      │
//! │  ClienteService         (Database)                                      │
//! │  InventarioService      (Database, Configuration, Notification)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything in here is cheap to clone; clones share the pool and the
//! notification channel.

use sermac_db::{
    ClienteRepository, Database, DbConfig, InventarioRepository, ProductoRepository, UnitOfWork,
    VentaRepository,
};
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::services::{ClienteService, ConfigurationService, InventarioService, NotificationService};

#[derive(Debug, Clone)]
pub struct ServiceContainer {
    db: Database,
    configuration: ConfigurationService,
    notifications: NotificationService,
    clientes: ClienteService,
    inventario: InventarioService,
}

impl ServiceContainer {
    /// Opens the configured database and wires the services to it.
    pub async fn build(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let db_config = DbConfig::from_connection_string(&config.connection_string)?;
        let db = Database::new(db_config).await?;

        let container = Self::with_database(db, config);
        info!("Service container ready");
        Ok(container)
    }

    /// Wires the services to an already open database.
    pub fn with_database(db: Database, config: AppConfig) -> Self {
        let configuration = ConfigurationService::new(config);
        let notifications = NotificationService::default();
        let clientes = ClienteService::new(&db);
        let inventario =
            InventarioService::new(db.clone(), configuration.clone(), notifications.clone());

        ServiceContainer {
            db,
            configuration,
            notifications,
            clientes,
            inventario,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// A fresh unit of work; each caller owns its own transaction.
    pub fn unit_of_work(&self) -> UnitOfWork {
        self.db.unit_of_work()
    }

    pub fn cliente_repository(&self) -> ClienteRepository {
        self.db.clientes()
    }

    pub fn producto_repository(&self) -> ProductoRepository {
        self.db.productos()
    }

    pub fn venta_repository(&self) -> VentaRepository {
        self.db.ventas()
    }

    pub fn inventario_repository(&self) -> InventarioRepository {
        self.db.inventario()
    }

    pub fn configuration(&self) -> &ConfigurationService {
        &self.configuration
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn clientes(&self) -> &ClienteService {
        &self.clientes
    }

    pub fn inventario(&self) -> &InventarioService {
        &self.inventario
    }

    /// Closes the pool.
    pub async fn shutdown(&self) {
        self.db.close().await;
    }
}
