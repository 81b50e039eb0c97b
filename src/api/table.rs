//! # API de Mesas
//!
//! Consulta de disponibilidad y gestión administrativa de mesas:
//! - Listar mesas libres en un día y hora concretos (o el inventario completo)
//! - Alta de mesas nuevas
//! - Borrado de una mesa con cascada sobre sus reservas

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::reservation::{validar_fecha, validar_hora};
use super::{AppError, AppResult};
use crate::db::{Mesa, MongoRepo};
use crate::domain::{mesas_ocupadas, ReservaOcupada};

/// Parámetros de consulta de disponibilidad.
///
/// Ambos son opcionales: si falta cualquiera de los dos, la consulta degrada a
/// devolver el inventario completo de mesas. Este fallback es deliberado y hay
/// llamadores que dependen de él para listar todas las mesas.
#[derive(Deserialize)]
struct TablesQuery {
    /// Día consultado (formato YYYY-MM-DD)
    date: Option<String>,
    /// Instante consultado (formato HH:MM)
    time: Option<String>,
}

/// Representación de una mesa en las respuestas del API.
#[derive(Serialize)]
struct TableResponse {
    table_id: i32,
    capacity: i32,
}

impl From<Mesa> for TableResponse {
    fn from(mesa: Mesa) -> Self {
        TableResponse {
            table_id: mesa.id,
            capacity: mesa.capacidad,
        }
    }
}

/// Alta administrativa de una mesa.
#[derive(Deserialize)]
struct NewTable {
    capacity: i32,
}

/// Lista las mesas libres en un instante, o todas las mesas.
///
/// La ocupación se decide por pertenencia puntual: una mesa está ocupada si el
/// instante pedido cae dentro del intervalo `[inicio, inicio + duración)` de
/// alguna de sus reservas de ese día. No se comprueba solape de franjas
/// completas; la pregunta es "¿está libre AHORA?", no "¿está libre durante una
/// hora?".
///
/// # Parámetros
/// - `date`: día consultado, YYYY-MM-DD (opcional)
/// - `time`: instante consultado, HH:MM (opcional)
///
/// # Respuesta
/// ```json
/// [
///   {"table_id": 1, "capacity": 2},
///   {"table_id": 4, "capacity": 4}
/// ]
/// ```
/// Ordenada por id de mesa. Sin `date` y `time`, el inventario completo.
///
/// # Errores
/// - `400 Bad Request`: fecha u hora malformadas (`{"error": "Invalid date or
///   time format"}`), detectado antes de consultar la base de datos
/// - `500 Internal Server Error`: error de base de datos
#[get("/tables")]
async fn get_tables(
    repo: web::Data<MongoRepo>,
    query: web::Query<TablesQuery>,
) -> AppResult<impl Responder> {
    let (date, time) = match (&query.date, &query.time) {
        (Some(date), Some(time)) => (date, time),
        _ => {
            let mesas = repo.listar_mesas().await?;
            let respuesta: Vec<TableResponse> = mesas.into_iter().map(Into::into).collect();
            return Ok(HttpResponse::Ok().json(respuesta));
        }
    };

    let fecha = validar_fecha(date)?;
    let instante = validar_hora(time)?;

    let reservas = repo
        .reservas_del_dia(&fecha.format("%Y-%m-%d").to_string())
        .await?;

    let mut cargadas = Vec::with_capacity(reservas.len());
    for reserva in &reservas {
        let inicio = chrono::NaiveTime::parse_from_str(&reserva.hora, "%H:%M").map_err(|e| {
            AppError::Internal(format!(
                "Hora almacenada corrupta en reserva {}: {}",
                reserva.id, e
            ))
        })?;
        cargadas.push(ReservaOcupada {
            id_mesa: reserva.id_mesa,
            inicio,
            duracion_min: reserva.duracion,
        });
    }

    let ocupadas = mesas_ocupadas(&cargadas, instante);

    let libres: Vec<TableResponse> = repo
        .listar_mesas()
        .await?
        .into_iter()
        .filter(|mesa| !ocupadas.contains(&mesa.id))
        .map(Into::into)
        .collect();

    Ok(HttpResponse::Ok().json(libres))
}

/// Da de alta una mesa nueva.
///
/// # Respuesta
/// ```json
/// {"message": "Table created successfully", "table_id": 9}
/// ```
///
/// # Errores
/// - `400 Bad Request`: capacidad no positiva o fallo al escribir
#[post("/tables")]
async fn create_table(
    repo: web::Data<MongoRepo>,
    data: web::Json<NewTable>,
) -> AppResult<impl Responder> {
    if data.capacity <= 0 {
        return Err(AppError::Validation(
            "Table capacity must be greater than 0".to_string(),
        ));
    }

    let mesa = repo.crear_mesa(data.capacity).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Table created successfully",
        "table_id": mesa.id
    })))
}

/// Borra una mesa y, en cascada, todas sus reservas.
///
/// # Respuesta
/// ```json
/// {"message": "Table deleted successfully"}
/// ```
///
/// # Errores
/// - `404 Not Found`: la mesa no existe
/// - `400 Bad Request`: fallo al confirmar el borrado
#[delete("/tables/{id}")]
async fn delete_table(
    repo: web::Data<MongoRepo>,
    path: web::Path<i32>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();
    repo.eliminar_mesa(id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Table deleted successfully"
    })))
}

/// Configura las rutas relacionadas con mesas.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_tables);
    cfg.service(create_table);
    cfg.service(delete_table);
}
