//! # Seed Data Generator
//!
//! Populates a database with sample back-office data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./AdminSERMAC.db with 30 days of sales (default)
//! cargo run -p sermac-db --bin seed
//!
//! # Seed a different database with 90 days of sales
//! cargo run -p sermac-db --bin seed -- --db ./data/dev.db --days 90
//! ```
//!
//! ## Generated Data
//! - Suppliers and sellers used by the receipt screen
//! - Poultry and deli products with stock and lot dates
//! - Clients, some with credit sales and partial payments
//! - One receipt movement per product, expiring over the coming weeks

use std::env;

use chrono::{Duration, Local, NaiveDate};
use sermac_core::{Abono, Cliente, Inventario, Money, Producto, Venta};
use sermac_db::{Database, DbConfig, Repository};

const PROVEEDORES: &[&str] = &["Ariztía", "Super Pollo", "Don Pollo", "San Jorge"];

const VENDEDORES: &[&str] = &["Pedro Soto", "María González", "Luis Araya"];

/// (code, name, units, kilos per unit, price per kilo)
const PRODUCTOS: &[(&str, &str, i64, f64, i64)] = &[
    ("PO-001", "Pollo entero", 120, 2.4, 2_290),
    ("PO-002", "Pechuga deshuesada", 80, 1.1, 4_990),
    ("PO-003", "Trutro entero", 95, 1.3, 2_790),
    ("PO-004", "Alitas", 60, 0.9, 2_490),
    ("PO-005", "Filete de pechuga", 45, 1.0, 5_490),
    ("PV-001", "Pavo entero", 8, 6.5, 3_990),
    ("PV-002", "Pechuga de pavo", 20, 2.0, 6_290),
    ("EM-001", "Longaniza", 150, 0.5, 3_490),
    ("EM-002", "Vienesas", 200, 0.25, 2_990),
    ("EM-003", "Jamón pierna", 40, 1.0, 6_990),
];

/// (RUT, name, address, line of business)
const CLIENTES: &[(&str, &str, &str, &str)] = &[
    ("76.123.456-7", "Restaurante El Fogón", "Av. Matta 123, Santiago", "Restaurante"),
    ("77.654.321-K", "Minimarket Doña Rosa", "Gran Avenida 4550, San Miguel", "Almacén"),
    ("12.345.678-5", "Juan Pérez", "Los Aromos 88, Maipú", "Particular"),
    ("78.900.111-2", "Casino Industrial Sur", "Camino Lo Espejo 1200, La Cisterna", "Casino"),
    ("15.222.333-4", "Carnicería Los Andes", "Av. Recoleta 2300, Recoleta", "Carnicería"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 30;
    let mut db_path = String::from("./AdminSERMAC.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(30);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("SERMAC Admin Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of sales history to generate (default: 30)");
                println!("  -d, --db <PATH>    Database file path (default: ./AdminSERMAC.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 SERMAC Admin Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!("Days:     {}", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Schema ready");

    let existing = db.productos().get_all().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let hoy = Local::now().date_naive();
    let start = std::time::Instant::now();

    for nombre in PROVEEDORES {
        db.compras().agregar_proveedor(nombre).await?;
    }
    for nombre in VENDEDORES {
        db.compras().agregar_vendedor(nombre).await?;
    }
    println!("✓ {} suppliers, {} sellers", PROVEEDORES.len(), VENDEDORES.len());

    // One unit of work for the whole catalog: products plus their receipts.
    let uow = db.unit_of_work();
    uow.begin().await?;
    let numero_compra = uow.compras().incrementar_numero_compra().await?;
    for (idx, (codigo, nombre, unidades, kilos_unidad, _)) in PRODUCTOS.iter().enumerate() {
        let kilos = *unidades as f64 * kilos_unidad;
        let fecha = hoy - Duration::days(idx as i64 % 5);
        uow.productos()
            .add(&Producto {
                codigo: codigo.to_string(),
                nombre: nombre.to_string(),
                unidades: *unidades,
                kilos,
                fecha_mas_antigua: Some(fecha),
                fecha_mas_nueva: Some(fecha),
            })
            .await?;
        uow.inventario()
            .registrar_movimiento(&Inventario {
                codigo: codigo.to_string(),
                producto: nombre.to_string(),
                unidades: *unidades,
                kilos,
                fecha,
                fecha_vencimiento: Some(fecha + Duration::days(3 + idx as i64 * 2)),
                numero_compra,
                proveedor: PROVEEDORES[idx % PROVEEDORES.len()].to_string(),
                vendedor: VENDEDORES[idx % VENDEDORES.len()].to_string(),
            })
            .await?;
    }
    let writes = uow.save_changes().await?;
    println!(
        "✓ {} products received under purchase #{} ({} writes)",
        PRODUCTOS.len(),
        numero_compra,
        writes
    );

    for (rut, nombre, direccion, giro) in CLIENTES {
        db.clientes()
            .add(&Cliente {
                rut: rut.to_string(),
                nombre: nombre.to_string(),
                direccion: direccion.to_string(),
                giro: giro.to_string(),
                deuda: Money::zero(),
            })
            .await?;
    }
    println!("✓ {} clients", CLIENTES.len());

    let mut ventas = 0;
    let mut numero_guia = 1000;
    for dia in 0..days.max(0) {
        let fecha_venta = hoy - Duration::days(days - dia);
        let (rut, cliente_nombre, _, _) = CLIENTES[dia as usize % CLIENTES.len()];
        let credito = dia % 3 != 0;
        numero_guia += 1;

        let mut total_guia = Money::zero();
        for offset in 0..2 {
            let (codigo, descripcion, _, kilos_unidad, precio) =
                PRODUCTOS[(dia as usize * 3 + offset) % PRODUCTOS.len()];
            let bandejas = 2 + (dia % 4);
            let kilos_neto = bandejas as f64 * kilos_unidad * 6.0;
            let total = Money::from_pesos((kilos_neto * precio as f64).round() as i64);

            db.ventas()
                .add(&Venta {
                    numero_guia,
                    codigo_producto: codigo.to_string(),
                    descripcion: descripcion.to_string(),
                    bandejas,
                    kilos_neto,
                    fecha_venta,
                    pagado_con_credito: credito,
                    rut: rut.to_string(),
                    cliente_nombre: cliente_nombre.to_string(),
                    total,
                })
                .await?;
            total_guia += total;
            ventas += 1;
        }

        if credito {
            db.clientes().actualizar_deuda(rut, total_guia).await?;
        }
        if credito && dia % 5 == 1 {
            pagar_mitad(&db, rut, total_guia, fecha_venta + Duration::days(2)).await?;
        }
    }

    let elapsed = start.elapsed();
    println!("✓ {} sale lines across {} days", ventas, days);
    println!();
    println!("✅ Seed complete in {:.2}s", elapsed.as_secs_f64());

    let deudores = db.clientes().get_clientes_con_deuda().await?;
    for cliente in deudores {
        println!("   {:<30} {}", cliente.nombre, cliente.deuda);
    }

    db.close().await;
    Ok(())
}

async fn pagar_mitad(
    db: &Database,
    rut: &str,
    total: Money,
    fecha: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let monto = Money::from_pesos(total.pesos() / 2);
    if monto.is_positive() {
        db.clientes()
            .registrar_abono(&Abono {
                id: None,
                rut: rut.to_string(),
                monto,
                fecha,
            })
            .await?;
    }
    Ok(())
}
