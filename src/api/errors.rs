//! # Manejo de errores
//!
//! Taxonomía de errores de la aplicación con thiserror y su traducción a
//! respuestas HTTP.
//!
//! | Variante     | HTTP | Significado                                        |
//! |--------------|------|----------------------------------------------------|
//! | `Validation` | 400  | Entrada malformada, detectada antes de tocar la BD |
//! | `NotFound`   | 404  | Recurso inexistente                                |
//! | `Commit`     | 400  | Fallo al confirmar una escritura (restricción única, integridad referencial, transacción abortada) |
//! | `Database`   | 500  | Fallo de infraestructura leyendo la BD             |
//! | `Internal`   | 500  | Cualquier otro fallo interno                       |
//!
//! Los fallos de escritura se devuelven como 400 con el mensaje original,
//! conservando el comportamiento histórico del sistema; solo la
//! infraestructura de lectura y conexión se separa como 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::error::Error;
use thiserror::Error;

/// Tipos de error de la aplicación.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de base de datos con contexto de la operación que falló.
    ///
    /// Mantiene la cadena de errores original de mongodb para debugging.
    #[error("Error de base de datos en operación '{operation}': {source}")]
    Database {
        operation: String,
        #[source]
        source: mongodb::error::Error,
    },

    /// Entrada malformada o incompleta.
    #[error("{0}")]
    Validation(String),

    /// Recurso no encontrado.
    #[error("{0}")]
    NotFound(String),

    /// Fallo al confirmar una escritura en la base de datos.
    #[error("{0}")]
    Commit(String),

    /// Error interno simple.
    #[error("Error interno: {0}")]
    Internal(String),
}

impl AppError {
    /// Crea un error de base de datos con contexto de operación.
    pub fn database(operation: &str, source: mongodb::error::Error) -> Self {
        Self::Database {
            operation: operation.to_string(),
            source,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Commit(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Log detallado del error antes de responder
        match self {
            Self::Database { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    error_chain = ?source.source(),
                    "Database error occurred"
                );
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Internal server error".to_string(),
                })
            }
            Self::Validation(message) => {
                tracing::warn!(message = %message, "Validation error");
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: message.clone(),
                })
            }
            Self::NotFound(message) => {
                tracing::info!(message = %message, "Resource not found");
                HttpResponse::NotFound().json(ErrorResponse {
                    error: message.clone(),
                })
            }
            Self::Commit(message) => {
                tracing::warn!(message = %message, "Commit error");
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: message.clone(),
                })
            }
            Self::Internal(message) => {
                tracing::error!(message = %message, "Internal error");
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Internal server error".to_string(),
                })
            }
        }
    }
}

/// Cuerpo JSON de toda respuesta de error: `{"error": "<mensaje legible>"}`.
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type AppResult<T> = Result<T, AppError>;

// Conversión automática desde mongodb::error::Error
impl From<mongodb::error::Error> for AppError {
    fn from(error: mongodb::error::Error) -> Self {
        Self::Database {
            operation: "database_operation".to_string(),
            source: error,
        }
    }
}
