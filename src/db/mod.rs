// src/db/mod.rs
pub mod models;
pub mod mongodb;

pub use models::{Cliente, Contador, Mesa, Reserva};
pub use mongodb::{MongoRepo, NuevaReserva, CAPACIDADES_INICIALES};
