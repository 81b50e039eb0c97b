//! # Motor de disponibilidad
//!
//! Cálculo puro de qué mesas están ocupadas en un instante concreto. La capa
//! de API carga las reservas del día y delega aquí la comprobación.
//!
//! La pregunta que responde este módulo es "¿está libre la mesa en ESTE
//! instante?", no "¿está libre durante toda una franja?": se comprueba
//! pertenencia puntual del instante pedido al intervalo de cada reserva. Para
//! el camino de escritura (admisión de una reserva nueva) sí se usa solape de
//! intervalos, ver [`Franja::solapa`].

use std::collections::HashSet;

use chrono::NaiveTime;

use super::interval::Franja;

/// Duración fija de toda reserva, en minutos. No la elige el cliente.
pub const DURACION_RESERVA_MIN: i32 = 60;

/// Una reserva ya cargada, reducida a lo que necesita el cálculo.
#[derive(Debug, Clone, Copy)]
pub struct ReservaOcupada {
    pub id_mesa: i32,
    pub inicio: NaiveTime,
    pub duracion_min: i32,
}

/// Devuelve los ids de las mesas ocupadas en el instante dado.
///
/// Una mesa está ocupada si el instante cae dentro del intervalo
/// `[inicio, inicio + duración)` de alguna de sus reservas. Las reservas
/// recibidas deben ser todas del mismo día.
pub fn mesas_ocupadas(reservas: &[ReservaOcupada], instante: NaiveTime) -> HashSet<i32> {
    reservas
        .iter()
        .filter(|r| Franja::new(r.inicio, r.duracion_min).contiene(instante))
        .map(|r| r.id_mesa)
        .collect()
}
