//! Sample rows shared by the repository tests.

use chrono::NaiveDate;
use sermac_core::{Cliente, Inventario, Money, Producto, Venta};

use crate::{Database, DbConfig};

pub(crate) async fn db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) fn fecha(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn cliente(rut: &str, deuda: i64) -> Cliente {
    Cliente {
        rut: rut.to_string(),
        nombre: format!("Cliente {rut}"),
        direccion: "Av. Matta 123, Santiago".to_string(),
        giro: "Restaurante".to_string(),
        deuda: Money::from_pesos(deuda),
    }
}

pub(crate) fn producto(codigo: &str, unidades: i64, kilos: f64) -> Producto {
    Producto {
        codigo: codigo.to_string(),
        nombre: format!("Producto {codigo}"),
        unidades,
        kilos,
        fecha_mas_antigua: None,
        fecha_mas_nueva: None,
    }
}

pub(crate) fn venta(
    numero_guia: i64,
    codigo: &str,
    rut: &str,
    total: i64,
    credito: bool,
    fecha_venta: NaiveDate,
) -> Venta {
    Venta {
        numero_guia,
        codigo_producto: codigo.to_string(),
        descripcion: format!("Producto {codigo}"),
        bandejas: 2,
        kilos_neto: 18.5,
        fecha_venta,
        pagado_con_credito: credito,
        rut: rut.to_string(),
        cliente_nombre: format!("Cliente {rut}"),
        total: Money::from_pesos(total),
    }
}

pub(crate) fn movimiento(codigo: &str, fecha: NaiveDate, vence: Option<NaiveDate>) -> Inventario {
    Inventario {
        codigo: codigo.to_string(),
        producto: format!("Producto {codigo}"),
        unidades: 10,
        kilos: 100.0,
        fecha,
        fecha_vencimiento: vence,
        numero_compra: 1,
        proveedor: "Ariztía".to_string(),
        vendedor: "Pedro".to_string(),
    }
}
