//! # Intervalos de tiempo
//!
//! Una reserva ocupa el intervalo semiabierto `[inicio, inicio + duración)`:
//! el inicio está incluido y el fin excluido, de modo que una reserva que
//! termina exactamente a las 19:00 no bloquea una consulta a las 19:00.
//!
//! Internamente se trabaja en minutos desde medianoche para que el fin pueda
//! superar las 24:00 sin desbordar al día siguiente (una reserva de 23:30
//! termina a las 24:30 "virtuales" del mismo día).

use chrono::{NaiveTime, Timelike};

/// Franja horaria semiabierta `[inicio, inicio + duración)` dentro de un día.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Franja {
    inicio_min: i32,
    duracion_min: i32,
}

impl Franja {
    /// Crea una franja a partir de la hora de inicio y la duración en minutos.
    pub fn new(inicio: NaiveTime, duracion_min: i32) -> Franja {
        Franja {
            inicio_min: minutos_del_dia(inicio),
            duracion_min,
        }
    }

    /// Minuto de fin (excluido). Puede superar 1440 si la franja cruza medianoche.
    fn fin_min(&self) -> i32 {
        self.inicio_min + self.duracion_min
    }

    /// Indica si el instante dado cae dentro de la franja.
    ///
    /// Semántica semiabierta: `inicio <= instante < fin`.
    pub fn contiene(&self, instante: NaiveTime) -> bool {
        let t = minutos_del_dia(instante);
        self.inicio_min <= t && t < self.fin_min()
    }

    /// Indica si dos franjas comparten al menos un instante.
    ///
    /// Semántica semiabierta: dos franjas que solo se tocan en un extremo
    /// (una termina cuando empieza la otra) no se solapan.
    pub fn solapa(&self, otra: &Franja) -> bool {
        self.inicio_min < otra.fin_min() && otra.inicio_min < self.fin_min()
    }
}

fn minutos_del_dia(t: NaiveTime) -> i32 {
    (t.hour() * 60 + t.minute()) as i32
}
