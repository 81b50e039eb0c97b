//! # Lógica de dominio
//!
//! Funciones puras sobre intervalos y disponibilidad de mesas. Este módulo no
//! toca la base de datos: recibe reservas ya cargadas y responde preguntas
//! sobre ellas.
//!
//! - [`interval`] - Intervalos semiabiertos de tiempo `[inicio, fin)`
//! - [`availability`] - Cálculo de mesas ocupadas/libres en un instante

pub mod availability;
pub mod interval;

pub use availability::{mesas_ocupadas, ReservaOcupada, DURACION_RESERVA_MIN};
pub use interval::Franja;
