//! # API de Clientes
//!
//! Los clientes se dan de alta implícitamente al reservar con un email nuevo;
//! aquí solo viven las operaciones administrativas:
//! - Listar clientes
//! - Borrar un cliente con cascada sobre sus reservas

use actix_web::{delete, get, web, HttpResponse, Responder};
use serde::Serialize;

use super::AppResult;
use crate::db::{Cliente, MongoRepo};

/// Representación de un cliente en las respuestas del API.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomerResponse {
    id: i32,
    name: String,
    email: String,
}

impl From<Cliente> for CustomerResponse {
    fn from(cliente: Cliente) -> Self {
        CustomerResponse {
            id: cliente.id,
            name: cliente.nombre,
            email: cliente.email,
        }
    }
}

/// Lista todos los clientes ordenados por id.
///
/// # Errores
/// - `500 Internal Server Error`: error de base de datos
#[get("/customers")]
async fn get_customers(repo: web::Data<MongoRepo>) -> AppResult<impl Responder> {
    let clientes = repo.listar_clientes().await?;
    let respuesta: Vec<CustomerResponse> = clientes.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(respuesta))
}

/// Borra un cliente y, en cascada, todas sus reservas.
///
/// # Respuesta
/// ```json
/// {"message": "Customer deleted successfully"}
/// ```
///
/// # Errores
/// - `404 Not Found`: el cliente no existe
/// - `400 Bad Request`: fallo al confirmar el borrado
#[delete("/customers/{id}")]
async fn delete_customer(
    repo: web::Data<MongoRepo>,
    path: web::Path<i32>,
) -> AppResult<impl Responder> {
    let id = path.into_inner();
    repo.eliminar_cliente(id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Customer deleted successfully"
    })))
}

/// Configura las rutas relacionadas con clientes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_customers);
    cfg.service(delete_customer);
}
