//! # Application Services
//!
//! - [`ClienteService`] - Client maintenance, payments, account summary
//! - [`InventarioService`] - Stock receipts and stock reports
//! - [`NotificationService`] - Broadcast of user-facing notifications
//! - [`ConfigurationService`] - Read access to the loaded configuration

pub mod cliente;
pub mod configuration;
pub mod inventario;
pub mod notification;

pub use cliente::ClienteService;
pub use configuration::ConfigurationService;
pub use inventario::{InventarioService, RecepcionRegistrada};
pub use notification::{Notification, NotificationService};
