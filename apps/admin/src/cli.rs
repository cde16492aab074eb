//! # Report CLI
//!
//! `sermac-admin <command>`: read-only reports over the back-office
//! database. Output goes to the given writer; logs go to stderr.

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sermac_core::validation::validate_rango;
use sermac_core::Money;
use sermac_db::Repository;

use crate::container::ServiceContainer;
use crate::error::AppResult;

#[derive(Debug, Parser)]
#[command(name = "sermac-admin", version, about = "SERMAC Admin back-office reports")]
pub struct Cli {
    /// Config file (default: sermac.toml in the platform config dir)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overrides the configured connection string
    #[arg(long, global = true, value_name = "CONNECTION_STRING")]
    pub connection_string: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Every client
    Clientes,

    /// Clients with an outstanding balance
    Deudores,

    /// Account summary of one client
    Deuda {
        /// Client RUT, e.g. 76.123.456-7
        rut: String,
    },

    /// Products under the minimum stock
    StockBajo {
        /// Units threshold (default: configured stock_minimo)
        #[arg(long)]
        minimo: Option<i64>,
    },

    /// Sales between two dates, both inclusive
    Ventas {
        #[arg(long, value_name = "YYYY-MM-DD")]
        desde: NaiveDate,
        #[arg(long, value_name = "YYYY-MM-DD")]
        hasta: NaiveDate,
    },

    /// Lots expiring soon
    PorVencer {
        /// Days ahead (default: configured dias_vencimiento)
        #[arg(long)]
        dias: Option<i64>,
    },
}

/// Runs one report against `container`, writing it to `out`.
pub async fn run(
    container: &ServiceContainer,
    command: &Command,
    out: &mut impl Write,
) -> AppResult<()> {
    match command {
        Command::Clientes => {
            let clientes = container.clientes().listar().await?;
            writeln!(out, "{:<14} {:<32} {:>14}", "RUT", "Nombre", "Deuda")?;
            for c in &clientes {
                writeln!(out, "{:<14} {:<32} {:>14}", c.rut, c.nombre, c.deuda.to_string())?;
            }
            writeln!(out, "{} clientes", clientes.len())?;
        }

        Command::Deudores => {
            let deudores = container.clientes().deudores().await?;
            let total: Money = deudores.iter().map(|c| c.deuda).sum();
            for c in &deudores {
                writeln!(out, "{:<14} {:<32} {:>14}", c.rut, c.nombre, c.deuda.to_string())?;
            }
            writeln!(out, "{} deudores, total {}", deudores.len(), total)?;
        }

        Command::Deuda { rut } => {
            let resumen = container.clientes().resumen(rut).await?;
            writeln!(out, "{} ({})", resumen.cliente.nombre, resumen.cliente.rut)?;
            writeln!(out, "Deuda registrada: {}", resumen.cliente.deuda)?;
            writeln!(out, "Deuda calculada:  {}", resumen.deuda_calculada)?;
            writeln!(out, "Ventas:           {}", resumen.ventas.len())?;
            if resumen.descuadrado() {
                writeln!(out, "ATENCIÓN: la deuda registrada no cuadra con las ventas")?;
            }
        }

        Command::StockBajo { minimo } => {
            let productos = container.inventario().productos_bajo_stock(*minimo).await?;
            for p in &productos {
                writeln!(
                    out,
                    "{:<10} {:<32} {:>6} u {:>9.2} kg",
                    p.codigo, p.nombre, p.unidades, p.kilos
                )?;
            }
            writeln!(out, "{} productos bajo stock", productos.len())?;
        }

        Command::Ventas { desde, hasta } => {
            validate_rango(*desde, *hasta)?;
            let repo = container.venta_repository();
            let ventas = repo.get_ventas_en_rango(*desde, *hasta).await?;
            let total = repo.calcular_total_ventas(*desde, *hasta).await?;
            for v in &ventas {
                writeln!(
                    out,
                    "{} {:>6} {:<10} {:<28} {:>14}{}",
                    v.fecha_venta,
                    v.numero_guia,
                    v.codigo_producto,
                    v.cliente_nombre,
                    v.total.to_string(),
                    if v.pagado_con_credito { " (crédito)" } else { "" }
                )?;
            }
            writeln!(out, "{} ventas, total {}", ventas.len(), total)?;
        }

        Command::PorVencer { dias } => {
            let lotes = container.inventario().por_vencer(*dias).await?;
            for l in &lotes {
                let vence = l
                    .fecha_vencimiento
                    .map(|f| f.to_string())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{:<10} {:<32} {:>6} u  vence {}",
                    l.codigo, l.producto, l.unidades, vence
                )?;
            }
            writeln!(out, "{} lotes por vencer", lotes.len())?;
        }
    }

    Ok(())
}

/// Clients and products on file, for the startup log line.
pub async fn resumen_base(container: &ServiceContainer) -> AppResult<(usize, usize)> {
    let clientes = container.cliente_repository().get_all().await?.len();
    let productos = container.producto_repository().get_all().await?.len();
    Ok((clientes, productos))
}

// =============================================================================
// Unit Tests
// =============================================================================
