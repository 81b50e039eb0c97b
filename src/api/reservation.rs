//! # API de Reservas
//!
//! Este módulo maneja todas las operaciones relacionadas con reservas:
//! - Crear nuevas reservas (admisión transaccional)
//! - Listar reservas con los datos del cliente
//! - Borrar una reserva por id
//!
//! La validación de entrada se hace aquí, antes de tocar la base de datos; la
//! atomicidad y la guardia frente a dobles reservas viven en
//! [`MongoRepo::crear_reserva`].

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{AppError, AppResult};
use crate::db::{Cliente, MongoRepo, NuevaReserva, Reserva};

/// Estructura para crear una nueva reserva.
///
/// Los nombres de campo siguen el contrato JSON del API (camelCase). La
/// duración no se acepta del cliente: toda reserva dura 60 minutos.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MakeReservation {
    /// Nombre completo del cliente
    customer_name: String,
    /// Email del cliente (identidad del cliente, único)
    customer_email: String,
    /// Fecha de la reserva (formato YYYY-MM-DD)
    date: String,
    /// Hora de la reserva (formato HH:MM)
    time: String,
    /// Número de comensales
    party_size: i32,
    /// ID de la mesa a reservar
    table_id: i32,
}

/// Reserva tal y como se expone en los listados, con los datos del cliente
/// ya unidos.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReservationResponse {
    id: i32,
    customer_name: String,
    customer_email: String,
    date: String,
    time: String,
    party_size: i32,
    table_id: i32,
}

impl From<(Reserva, Cliente)> for ReservationResponse {
    fn from((reserva, cliente): (Reserva, Cliente)) -> Self {
        ReservationResponse {
            id: reserva.id,
            customer_name: cliente.nombre,
            customer_email: cliente.email,
            date: reserva.fecha,
            time: reserva.hora,
            party_size: reserva.numero_personas,
            table_id: reserva.id_mesa,
        }
    }
}

/// Valida un email de forma básica.
///
/// `true` si contiene '@' y '.', `false` en caso contrario. Validación muy
/// básica, suficiente para rechazar entradas claramente rotas.
fn validar_email(email: &str) -> bool {
    email.contains('@') && email.contains('.')
}

/// Valida y parsea una fecha en formato YYYY-MM-DD.
///
/// # Errores
/// - `Validation`: si el formato o el valor de fecha son incorrectos
pub(super) fn validar_fecha(fecha: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(fecha, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date or time format".to_string()))
}

/// Valida y parsea una hora en formato HH:MM.
///
/// # Errores
/// - `Validation`: si el formato o el valor de hora son incorrectos
pub(super) fn validar_hora(hora: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(hora, "%H:%M")
        .map_err(|_| AppError::Validation("Invalid date or time format".to_string()))
}

/// Crea una nueva reserva.
///
/// # Validaciones
/// - Nombre y email del cliente no pueden estar vacíos
/// - Email con formato básico válido
/// - Número de comensales mayor que 0
/// - Fecha válida (YYYY-MM-DD) y hora válida (HH:MM)
///
/// Todas se comprueban antes de tocar la base de datos. La existencia de la
/// mesa y la ausencia de solapes se comprueban dentro de la transacción de
/// admisión. La capacidad de la mesa NO se compara con el número de
/// comensales: el restaurante puede sentar un grupo pequeño en una mesa
/// grande.
///
/// # Respuesta
/// ```json
/// {
///   "message": "Reservation created successfully",
///   "reservation_id": 42
/// }
/// ```
///
/// # Errores
/// - `400 Bad Request`: validación fallida, mesa inexistente, franja ya
///   reservada o cualquier otro fallo al confirmar la transacción
#[post("/reservations")]
async fn make_reservation(
    repo: web::Data<MongoRepo>,
    data: web::Json<MakeReservation>,
) -> AppResult<impl Responder> {
    if data.customer_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Customer name is required".to_string(),
        ));
    }

    if !validar_email(&data.customer_email) {
        return Err(AppError::Validation(
            "Customer email is invalid".to_string(),
        ));
    }

    if data.party_size <= 0 {
        return Err(AppError::Validation(
            "Party size must be greater than 0".to_string(),
        ));
    }

    let fecha = validar_fecha(&data.date)?;
    let hora = validar_hora(&data.time)?;

    let reserva = repo
        .crear_reserva(NuevaReserva {
            nombre_cliente: data.customer_name.clone(),
            email_cliente: data.customer_email.clone(),
            fecha,
            hora,
            numero_personas: data.party_size,
            id_mesa: data.table_id,
        })
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Reservation created successfully",
        "reservation_id": reserva.id
    })))
}

/// Lista todas las reservas con los datos de su cliente.
///
/// Sin filtros ni paginación; aceptable al tamaño actual del sistema.
///
/// # Respuesta
/// ```json
/// [
///   {
///     "id": 1,
///     "customerName": "Juan Pérez",
///     "customerEmail": "juan@email.com",
///     "date": "2024-06-01",
///     "time": "18:00",
///     "partySize": 2,
///     "tableId": 3
///   }
/// ]
/// ```
///
/// # Errores
/// - `500 Internal Server Error`: error de base de datos
#[get("/reservations")]
async fn get_reservations(repo: web::Data<MongoRepo>) -> AppResult<impl Responder> {
    let reservas = repo.listar_reservas().await?;

    let respuesta: Vec<ReservationResponse> = reservas.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(respuesta))
}

/// Borra una reserva por id.
///
/// Borrado duro, sin rastro. La reserva es una entidad hoja, así que no hay
/// cascadas que considerar.
///
/// # Respuesta
/// ```json
/// {"message": "Reservation deleted successfully"}
/// ```
///
/// # Errores
/// - `404 Not Found`: el id no existe
/// - `400 Bad Request`: fallo al confirmar el borrado
#[delete("/reservations/{id}")]
async fn delete_reservation(
    repo: web::Data<MongoRepo>,
    path: web::Path<i32>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();

    if !repo.eliminar_reserva(id).await? {
        return Err(AppError::NotFound("Reservation not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Reservation deleted successfully"
    })))
}

/// Configura las rutas relacionadas con reservas.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(make_reservation);
    cfg.service(get_reservations);
    cfg.service(delete_reservation);
}
