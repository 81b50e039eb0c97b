//! # Reservas Restaurante
//!
//! Backend de gestión de reservas para un restaurante construido con Rust,
//! Actix Web y MongoDB.
//!
//! ## Componentes principales
//!
//! - **Motor de disponibilidad** ([`domain::availability`]): dado un día y una
//!   hora, calcula qué mesas están libres comprobando si el instante pedido cae
//!   dentro del intervalo `[inicio, inicio + duración)` de alguna reserva.
//! - **Admisión de reservas** ([`db::MongoRepo::crear_reserva`]): valida y
//!   persiste una reserva nueva dentro de una única transacción, con un índice
//!   único sobre `(id_mesa, fecha, hora)` como guardia frente a dobles reservas
//!   concurrentes.
//! - **Resolución de clientes** ([`db::MongoRepo::resolver_o_crear_cliente`]):
//!   búsqueda o alta idempotente de un cliente por email.
//! - **API REST** ([`api`]): capa fina de rutas JSON sobre Actix Web.
//!
//! ## Arquitectura
//!
//! ```text
//! Cliente HTTP
//!     ↓ HTTP/JSON
//! API REST (Actix Web)
//!     ↓ MongoDB Driver (transacciones por sesión)
//! MongoDB (colecciones: clientes, mesas, reservas, contadores)
//! ```

pub mod api;
pub mod db;
pub mod domain;
