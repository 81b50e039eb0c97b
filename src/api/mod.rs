//! # Módulo API
//!
//! Este módulo contiene todas las rutas y controladores de la API REST.
//!
//! ## Módulos principales
//!
//! - [`table`] - Disponibilidad y gestión de mesas
//! - [`reservation`] - Gestión de reservas (crear, listar, borrar)
//! - [`customer`] - Gestión de clientes (listar, borrar en cascada)
//! - [`errors`] - Manejo de errores de la aplicación

pub mod customer;
pub mod errors;
pub mod middleware;
pub mod reservation;
pub mod table;

// Re-exportar tipos comunes para facilitar su uso
pub use errors::{AppError, AppResult, ErrorResponse};

use actix_web::web;

/// Configura todas las rutas de la API.
///
/// Las rutas se montan bajo el prefijo `/api` desde `main`:
///
/// - `GET /api/tables` - Mesas disponibles (o todas, sin parámetros)
/// - `POST /api/tables` - Alta administrativa de una mesa
/// - `DELETE /api/tables/{id}` - Borrado en cascada de una mesa
/// - `POST /api/reservations` - Crear reserva
/// - `GET /api/reservations` - Listar reservas
/// - `DELETE /api/reservations/{id}` - Borrar reserva
/// - `GET /api/customers` - Listar clientes
/// - `DELETE /api/customers/{id}` - Borrado en cascada de un cliente
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    reservation::routes(cfg);
    table::routes(cfg);
    customer::routes(cfg);
}
