//! # SERMAC Admin Library
//!
//! The application half of the back office: configuration, service wiring
//! and the report commands. `main.rs` only parses arguments and calls in.
//!
//! ## Module Organization
//! ```text
//! sermac_admin/
//! ├── lib.rs          ◄─── You are here (tracing setup)
//! ├── config.rs       ◄─── AppConfig: defaults → sermac.toml → SERMAC_* env
//! ├── container.rs    ◄─── ServiceContainer: Database + services
//! ├── services/
//! │   ├── cliente.rs       ◄─── Client maintenance, account summary
//! │   ├── inventario.rs    ◄─── Stock receipts, stock reports
//! │   ├── notification.rs  ◄─── Broadcast notifications
//! │   └── configuration.rs ◄─── Read access to AppConfig
//! ├── cli.rs          ◄─── clap commands and report output
//! └── error.rs        ◄─── AppError
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                             │
//! │  2. Load AppConfig                                                     │
//! │  3. Initialize tracing                                                 │
//! │     • RUST_LOG wins, otherwise AppConfig.log_filter                    │
//! │  4. ServiceContainer::build                                            │
//! │     • parse connection string, open pool, create missing tables        │
//! │  5. Run the report, close the pool                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod services;

pub use config::AppConfig;
pub use container::ServiceContainer;
pub use error::{AppError, AppResult};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=sermac_db=trace` - Trace the database layer only
/// - Otherwise `config.log_filter` (default `info,sermac=debug,sqlx=warn`)
///
/// Logs go to stderr so report output stays clean. Calling this twice
/// keeps the first subscriber.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
