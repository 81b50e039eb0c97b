//! # Reservas Restaurante Server
//!
//! Servidor web del sistema de reservas construido con Rust, Actix Web y
//! MongoDB.
//!
//! ## Configuración
//!
//! El servidor se configura mediante variables de entorno (archivo `.env`):
//!
//! ```env
//! # Base de datos MongoDB (requiere replica set para transacciones)
//! MONGODB_URI=mongodb://localhost:27017
//! MONGODB_DATABASE=reservas_restaurante
//!
//! # Servidor
//! BIND_ADDRESS=0.0.0.0:8080
//!
//! # Logging
//! RUST_LOG=debug,mongodb=info
//! ```
//!
//! ## Ejecución
//!
//! ```bash
//! # 1. Instalar y ejecutar MongoDB como replica set
//! # Docker: docker run -d --name mongo -p 27017:27017 mongo:latest --replSet rs0
//!
//! # 2. Configurar variables de entorno
//! cp .env.example .env
//!
//! # 3. Compilar y ejecutar
//! cargo run
//! ```

use actix_web::{middleware::Logger, web, App, HttpServer};
use std::env;

use reservas_restaurante::{api, db};

/// Función principal que inicia el servidor web
///
/// # Funcionalidad
///
/// 1. Carga variables de entorno desde `.env`
/// 2. Configura el sistema de logging con tracing
/// 3. Establece conexión con MongoDB
/// 4. Crea los índices (incluida la guardia única de admisión)
/// 5. Siembra el juego inicial de 8 mesas si la colección está vacía
/// 6. Configura y arranca el servidor HTTP con las rutas bajo `/api`
///
/// # Errores
///
/// Retorna `std::io::Error` si:
/// - No se puede conectar a MongoDB
/// - Fallan la creación de índices o la siembra de mesas (los índices son un
///   requisito de corrección, no una optimización: sin la guardia única la
///   admisión pierde su garantía frente a carreras)
/// - No se puede bindear al puerto especificado
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Configurar sistema de logging con tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reservas_restaurante=debug".parse().unwrap())
                .add_directive("mongodb=info".parse().unwrap()),
        )
        .init();

    tracing::info!("Iniciando Reservas Restaurante Server con MongoDB...");

    let mongo_repo = match db::MongoRepo::init().await {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!("Error conectando a MongoDB: {}", e);
            return Err(std::io::Error::other(format!("Error de MongoDB: {}", e)));
        }
    };

    if let Err(e) = mongo_repo.create_indexes().await {
        tracing::error!("Error creando índices: {}", e);
        return Err(std::io::Error::other(format!("Error creando índices: {}", e)));
    }

    if let Err(e) = mongo_repo.seed_mesas().await {
        tracing::error!("Error sembrando mesas iniciales: {}", e);
        return Err(std::io::Error::other(format!("Error sembrando mesas: {}", e)));
    }

    let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    tracing::info!("Servidor iniciando en {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(mongo_repo.clone()))
            .wrap(Logger::default())
            .service(web::scope("/api").configure(api::init_routes))
    })
    .bind(&bind_address)?
    .run()
    .await
}
