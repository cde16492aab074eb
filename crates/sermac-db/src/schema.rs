//! # Schema Bootstrap
//!
//! Creates the SERMAC tables on open.
//!
//! ```text
//! Database::new ──► ensure_schema ──► CREATE TABLE IF NOT EXISTS ...
//!                                     (safe to run on every start)
//! ```
//!
//! Table and column names match the existing `AdminSERMAC.db` files, so an
//! old database opens unchanged. Those files store `Deuda`, `Total` and
//! `Monto` as REAL; the repositories read money columns through
//! `CAST(ROUND(..) AS INTEGER)` so both layouts decode to whole pesos.
//! There is no migration history: a column change means editing these
//! statements and the databases by hand.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};

/// Every table of the back office.
///
/// Money columns are INTEGER pesos in new databases. Dates are `YYYY-MM-DD` TEXT so they
/// compare correctly as strings.
pub const SCHEMA: &str = r#"
-- Clientes
CREATE TABLE IF NOT EXISTS Clientes (
    RUT TEXT PRIMARY KEY NOT NULL,
    Nombre TEXT NOT NULL,
    Direccion TEXT NOT NULL DEFAULT '',
    Giro TEXT NOT NULL DEFAULT '',
    Deuda INTEGER NOT NULL DEFAULT 0
);

-- Productos
CREATE TABLE IF NOT EXISTS Productos (
    Codigo TEXT PRIMARY KEY NOT NULL,
    Nombre TEXT NOT NULL,
    Unidades INTEGER NOT NULL DEFAULT 0,
    Kilos REAL NOT NULL DEFAULT 0,
    FechaMasAntigua TEXT,
    FechaMasNueva TEXT
);

-- Ventas: one row per product line of a dispatch note
CREATE TABLE IF NOT EXISTS Ventas (
    NumeroGuia INTEGER NOT NULL,
    CodigoProducto TEXT NOT NULL,
    Descripcion TEXT NOT NULL DEFAULT '',
    Bandejas INTEGER NOT NULL DEFAULT 0,
    KilosNeto REAL NOT NULL DEFAULT 0,
    FechaVenta TEXT NOT NULL,
    PagadoConCredito INTEGER NOT NULL DEFAULT 0,
    RUT TEXT NOT NULL,
    ClienteNombre TEXT NOT NULL DEFAULT '',
    Total INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (NumeroGuia, CodigoProducto)
);

CREATE INDEX IF NOT EXISTS idx_ventas_rut ON Ventas(RUT);
CREATE INDEX IF NOT EXISTS idx_ventas_fecha ON Ventas(FechaVenta);

-- Inventario: stock movements, one per product per day
CREATE TABLE IF NOT EXISTS Inventario (
    Codigo TEXT NOT NULL,
    Producto TEXT NOT NULL DEFAULT '',
    Unidades INTEGER NOT NULL DEFAULT 0,
    Kilos REAL NOT NULL DEFAULT 0,
    Fecha TEXT NOT NULL,
    FechaVencimiento TEXT,
    NumeroCompra INTEGER NOT NULL DEFAULT 0,
    Proveedor TEXT NOT NULL DEFAULT '',
    Vendedor TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (Codigo, Fecha)
);

CREATE INDEX IF NOT EXISTS idx_inventario_vencimiento ON Inventario(FechaVencimiento);

-- Abonos: payments against a client's debt
CREATE TABLE IF NOT EXISTS Abonos (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    RUT TEXT NOT NULL,
    Monto INTEGER NOT NULL,
    Fecha TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_abonos_rut ON Abonos(RUT);

-- Lookup tables for inventory entry
CREATE TABLE IF NOT EXISTS Proveedores (
    Nombre TEXT PRIMARY KEY NOT NULL
);

CREATE TABLE IF NOT EXISTS Vendedores (
    Nombre TEXT PRIMARY KEY NOT NULL
);

CREATE TABLE IF NOT EXISTS NumeroCompra (
    Id INTEGER PRIMARY KEY CHECK (Id = 1),
    Ultimo INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO NumeroCompra (Id, Ultimo) VALUES (1, 0);
"#;

/// Creates any missing table. Idempotent.
pub async fn ensure_schema(pool: &SqlitePool) -> DbResult<()> {
    info!("Ensuring database schema");

    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(DbError::SchemaFailed)?;

    Ok(())
}
