use serde::{Deserialize, Serialize};

/// Cliente del restaurante. El email es único en toda la colección
/// (comparación exacta, sensible a mayúsculas).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Cliente {
    #[serde(rename = "_id")]
    pub id: i32,
    pub nombre: String,
    pub email: String,
}

/// Mesa del comedor. Se crea en el arranque (juego inicial de 8 mesas) o por
/// administración; borrarla elimina en cascada sus reservas.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Mesa {
    #[serde(rename = "_id")]
    pub id: i32,
    pub capacidad: i32,
}

/// Reserva de una mesa para un día y hora concretos.
///
/// El intervalo ocupado es `[hora, hora + duracion)`. `fecha` y `hora` se
/// almacenan canonicalizadas (`YYYY-MM-DD` y `HH:MM`) tras validarlas en la
/// admisión, de modo que la igualdad de cadenas en las consultas es fiable.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Reserva {
    #[serde(rename = "_id")]
    pub id: i32,
    pub fecha: String,
    pub hora: String,
    pub duracion: i32, // en minutos
    pub numero_personas: i32,
    pub id_cliente: i32,
    pub id_mesa: i32,
}

/// Documento de secuencia para asignar ids enteros autoincrementales.
#[derive(Debug, Serialize, Deserialize)]
pub struct Contador {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: i32,
}
