//! # SERMAC Admin Entry Point
//!
//! ```bash
//! sermac-admin deudores
//! sermac-admin deuda 76.123.456-7
//! sermac-admin stock-bajo --minimo 20
//! sermac-admin ventas --desde 2024-03-01 --hasta 2024-03-31
//! sermac-admin por-vencer --dias 3
//! sermac-admin --config ./sermac.toml clientes
//! ```

use anyhow::Context;
use clap::Parser;
use tracing::info;

use sermac_admin::cli::{self, Cli};
use sermac_admin::{AppConfig, ServiceContainer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(connection_string) = cli.connection_string {
        config.connection_string = connection_string;
        config.validate().context("Invalid --connection-string")?;
    }

    sermac_admin::init_tracing(&config);
    info!(command = ?cli.command, "Starting SERMAC Admin");

    let container = ServiceContainer::build(config)
        .await
        .context("Failed to open the database")?;

    let (clientes, productos) = cli::resumen_base(&container).await?;
    info!(clientes, productos, "Database opened");

    let mut stdout = std::io::stdout().lock();
    let result = cli::run(&container, &cli.command, &mut stdout).await;
    container.shutdown().await;

    result.context("Report failed")
}
