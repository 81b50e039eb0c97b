//! # Repositorio MongoDB
//!
//! Acceso a las colecciones `clientes`, `mesas`, `reservas` y `contadores`,
//! junto con las operaciones que necesitan atomicidad multi-documento.
//!
//! ## Transacciones
//!
//! La admisión de una reserva (resolver o crear el cliente + insertar la
//! reserva) y los borrados en cascada se ejecutan dentro de una única
//! transacción de sesión: si cualquier paso falla, la transacción se aborta y
//! no queda estado parcial visible. Las transacciones de MongoDB requieren un
//! despliegue en replica set.
//!
//! ## Guardia de concurrencia
//!
//! El índice único sobre `(id_mesa, fecha, hora)` garantiza que, si dos
//! admisiones compiten por la misma mesa y franja exacta, como mucho una gana;
//! la perdedora recibe un error de clave duplicada. La re-comprobación de
//! solape dentro de la transacción rechaza las franjas que pisan reservas ya
//! confirmadas, es decir, protege admisiones secuenciales. Queda una ventana
//! residual: dos transacciones concurrentes con horas distintas pero solapadas
//! (18:00 y 18:30) leen instantáneas que no ven la inserción no confirmada de
//! la otra, escriben documentos distintos y pueden confirmar ambas. Solo la
//! colisión de franja exacta está garantizada por el índice único.

use chrono::{NaiveDate, NaiveTime};
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;
use mongodb::{Client, ClientSession, Collection, Database};
use std::collections::HashMap;
use std::env;

use crate::api::middleware::ErrorLogExt;
use crate::api::AppError;
use crate::domain::{Franja, DURACION_RESERVA_MIN};

use super::models::{Cliente, Contador, Mesa, Reserva};

pub type Result<T> = std::result::Result<T, AppError>;

/// Capacidades del juego inicial de mesas, sembradas con ids 1..=8.
pub const CAPACIDADES_INICIALES: [i32; 8] = [2, 2, 4, 4, 4, 4, 6, 8];

/// Datos ya validados para admitir una reserva nueva.
///
/// La capa de API valida y parsea la entrada; aquí solo llegan valores
/// correctos. La duración no es un campo: siempre se fija en
/// [`DURACION_RESERVA_MIN`].
#[derive(Debug, Clone)]
pub struct NuevaReserva {
    pub nombre_cliente: String,
    pub email_cliente: String,
    pub fecha: NaiveDate,
    pub hora: NaiveTime,
    pub numero_personas: i32,
    pub id_mesa: i32,
}

#[derive(Debug, Clone)]
pub struct MongoRepo {
    pub client: Client,
    pub database: Database,
}

impl MongoRepo {
    /// Inicializa la conexión leyendo `MONGODB_URI` y `MONGODB_DATABASE` del
    /// entorno, con los valores por defecto habituales en desarrollo.
    pub async fn init() -> Result<MongoRepo> {
        let mongo_uri =
            env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let database_name =
            env::var("MONGODB_DATABASE").unwrap_or_else(|_| "reservas_restaurante".to_string());

        MongoRepo::init_con_uri(&mongo_uri, &database_name).await
    }

    /// Inicializa la conexión contra una URI y base de datos concretas.
    ///
    /// Valida la conexión con un `ping` antes de devolver el repositorio.
    pub async fn init_con_uri(mongo_uri: &str, database_name: &str) -> Result<MongoRepo> {
        let client = Client::with_uri_str(mongo_uri)
            .await
            .map_err(|e| AppError::Internal(format!("Error conectando a MongoDB: {}", e)))?;

        let database = client.database(database_name);

        // Test connection
        database
            .run_command(doc! {"ping": 1})
            .await
            .map_err(|e| AppError::Internal(format!("Error validando conexión MongoDB: {}", e)))?;

        tracing::info!("Conexión a MongoDB establecida exitosamente");

        Ok(MongoRepo { client, database })
    }

    pub fn clientes(&self) -> Collection<Cliente> {
        self.database.collection("clientes")
    }

    pub fn mesas(&self) -> Collection<Mesa> {
        self.database.collection("mesas")
    }

    pub fn reservas(&self) -> Collection<Reserva> {
        self.database.collection("reservas")
    }

    fn contadores(&self) -> Collection<Contador> {
        self.database.collection("contadores")
    }

    /// Crea los índices de los que depende la corrección del sistema.
    ///
    /// - `clientes.email` único: un email corresponde a un solo cliente.
    /// - `reservas (fecha, id_mesa, hora)`: acelera el barrido de
    ///   disponibilidad por día.
    /// - `reservas (id_mesa, fecha, hora)` único: guardia frente a dobles
    ///   reservas concurrentes sobre la misma franja exacta.
    ///
    /// A diferencia de los índices puramente de rendimiento, estos se tratan
    /// como requisito de arranque: sin el índice único la admisión pierde su
    /// garantía frente a carreras.
    pub async fn create_indexes(&self) -> Result<()> {
        use mongodb::{options::IndexOptions, IndexModel};

        let cliente_indexes = vec![IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build()];

        self.clientes()
            .create_indexes(cliente_indexes)
            .await
            .map_err(|e| AppError::database("create_indexes_clientes", e))?;

        let reserva_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "fecha": 1, "id_mesa": 1, "hora": 1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "id_mesa": 1, "fecha": 1, "hora": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ];

        self.reservas()
            .create_indexes(reserva_indexes)
            .await
            .map_err(|e| AppError::database("create_indexes_reservas", e))?;

        tracing::info!("Índices MongoDB creados exitosamente");
        Ok(())
    }

    /// Siembra el juego inicial de mesas si la colección está vacía.
    ///
    /// Inserta exactamente 8 mesas con ids 1..=8 y capacidades
    /// [`CAPACIDADES_INICIALES`], y deja el contador de mesas apuntando al
    /// último id sembrado para que las altas administrativas no colisionen.
    pub async fn seed_mesas(&self) -> Result<()> {
        let mesas = self.mesas();

        let existentes = mesas
            .count_documents(doc! {})
            .await
            .map_err(|e| AppError::database("count_mesas", e))?;

        if existentes > 0 {
            return Ok(());
        }

        let iniciales: Vec<Mesa> = CAPACIDADES_INICIALES
            .iter()
            .enumerate()
            .map(|(i, capacidad)| Mesa {
                id: (i + 1) as i32,
                capacidad: *capacidad,
            })
            .collect();

        mesas
            .insert_many(&iniciales)
            .await
            .map_err(|e| AppError::database("seed_mesas", e))?;

        self.contadores()
            .update_one(
                doc! { "_id": "mesas" },
                doc! { "$max": { "seq": CAPACIDADES_INICIALES.len() as i32 } },
            )
            .upsert(true)
            .await
            .map_err(|e| AppError::database("seed_contador_mesas", e))?;

        tracing::info!(mesas = iniciales.len(), "Mesas iniciales creadas");
        Ok(())
    }

    /// Asigna el siguiente id entero de la secuencia indicada.
    ///
    /// Los contadores se incrementan fuera de cualquier transacción: un id
    /// asignado y no usado deja un hueco, lo cual es aceptable, y a cambio el
    /// documento contador no provoca conflictos de escritura entre admisiones
    /// concurrentes.
    async fn siguiente_id(&self, secuencia: &str) -> Result<i32> {
        let contador = self
            .contadores()
            .find_one_and_update(doc! { "_id": secuencia }, doc! { "$inc": { "seq": 1 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| AppError::database("siguiente_id", e))?
            .ok_or_else(|| {
                AppError::Internal(format!("Contador '{}' sin documento tras upsert", secuencia))
            })?;

        Ok(contador.seq)
    }

    /// Busca un cliente por email o lo da de alta dentro de la sesión dada.
    ///
    /// Si el email ya existe se devuelve el cliente tal cual está almacenado:
    /// un `nombre` distinto en la petición se ignora, el primero registrado
    /// gana. El que llama es dueño de la transacción; aquí no se confirma ni
    /// se aborta nada.
    pub async fn resolver_o_crear_cliente(
        &self,
        session: &mut ClientSession,
        nombre: &str,
        email: &str,
    ) -> Result<Cliente> {
        let clientes = self.clientes();

        let existente = clientes
            .find_one(doc! { "email": email })
            .session(&mut *session)
            .await
            .log_error_context("buscando cliente por email")
            .map_err(|e| AppError::Commit(e.to_string()))?;

        if let Some(cliente) = existente {
            return Ok(cliente);
        }

        let id = self.siguiente_id("clientes").await?;
        let cliente = Cliente {
            id,
            nombre: nombre.to_string(),
            email: email.to_string(),
        };

        clientes
            .insert_one(&cliente)
            .session(&mut *session)
            .await
            .map_err(|e| {
                if es_clave_duplicada(&e) {
                    // Otra admisión registró el mismo email entre la búsqueda
                    // y el alta; el índice único convierte la carrera en error.
                    AppError::Commit(format!("Customer email '{}' already registered", email))
                } else {
                    AppError::Commit(e.to_string())
                }
            })?;

        tracing::debug!(id_cliente = cliente.id, "Cliente nuevo registrado");
        Ok(cliente)
    }

    /// Admite una reserva nueva dentro de una única transacción.
    ///
    /// Pasos, todos dentro de la misma sesión:
    ///
    /// 1. Resolver o crear el cliente por email.
    /// 2. Comprobar que la mesa existe (integridad referencial).
    /// 3. Re-comprobar que el intervalo `[hora, hora + 60)` no solapa ninguna
    ///    reserva existente de esa mesa en esa fecha.
    /// 4. Insertar la reserva; el índice único `(id_mesa, fecha, hora)` actúa
    ///    de guardia si dos transacciones compiten por la franja exacta.
    ///
    /// Cualquier fallo aborta la transacción completa: nunca queda un cliente
    /// nuevo sin reserva ni una reserva sin cliente. Si el que llama cancela
    /// antes del commit, la transacción caduca en el servidor y se deshace;
    /// tras el commit la reserva es durable y la cancelación ya no tiene
    /// efecto.
    pub async fn crear_reserva(&self, solicitud: NuevaReserva) -> Result<Reserva> {
        let mut session = self
            .client
            .start_session()
            .await
            .map_err(|e| AppError::Commit(e.to_string()))?;

        session
            .start_transaction()
            .await
            .map_err(|e| AppError::Commit(e.to_string()))?;

        match self.crear_reserva_en_sesion(&mut session, &solicitud).await {
            Ok(reserva) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| AppError::Commit(e.to_string()))?;

                tracing::info!(
                    id_reserva = reserva.id,
                    id_mesa = reserva.id_mesa,
                    fecha = %reserva.fecha,
                    hora = %reserva.hora,
                    "Reserva admitida"
                );
                Ok(reserva)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    tracing::warn!(error = %abort_err, "Error abortando transacción de reserva");
                }
                Err(e)
            }
        }
    }

    async fn crear_reserva_en_sesion(
        &self,
        session: &mut ClientSession,
        solicitud: &NuevaReserva,
    ) -> Result<Reserva> {
        let cliente = self
            .resolver_o_crear_cliente(
                session,
                &solicitud.nombre_cliente,
                &solicitud.email_cliente,
            )
            .await?;

        let mesa = self
            .mesas()
            .find_one(doc! { "_id": solicitud.id_mesa })
            .session(&mut *session)
            .await
            .map_err(|e| AppError::Commit(e.to_string()))?;

        if mesa.is_none() {
            return Err(AppError::Commit(format!(
                "Table {} does not exist",
                solicitud.id_mesa
            )));
        }

        // Se almacenan siempre las formas canónicas para que la igualdad de
        // cadenas en índices y consultas sea fiable.
        let fecha = solicitud.fecha.format("%Y-%m-%d").to_string();
        let hora = solicitud.hora.format("%H:%M").to_string();

        let nueva_franja = Franja::new(solicitud.hora, DURACION_RESERVA_MIN);
        let mut cursor = self
            .reservas()
            .find(doc! { "id_mesa": solicitud.id_mesa, "fecha": &fecha })
            .session(&mut *session)
            .await
            .map_err(|e| AppError::Commit(e.to_string()))?;

        while let Some(resultado) = cursor.next(&mut *session).await {
            let existente = resultado.map_err(|e| AppError::Commit(e.to_string()))?;
            let inicio = NaiveTime::parse_from_str(&existente.hora, "%H:%M")
                .map_err(|e| AppError::Commit(format!("Stored time is corrupt: {}", e)))?;

            if nueva_franja.solapa(&Franja::new(inicio, existente.duracion)) {
                return Err(AppError::Commit(format!(
                    "Table {} is already reserved for an overlapping time slot on {}",
                    solicitud.id_mesa, fecha
                )));
            }
        }

        let id = self.siguiente_id("reservas").await?;
        let reserva = Reserva {
            id,
            fecha,
            hora,
            duracion: DURACION_RESERVA_MIN,
            numero_personas: solicitud.numero_personas,
            id_cliente: cliente.id,
            id_mesa: solicitud.id_mesa,
        };

        self.reservas()
            .insert_one(&reserva)
            .session(&mut *session)
            .await
            .map_err(|e| {
                if es_clave_duplicada(&e) {
                    AppError::Commit(format!(
                        "Table {} is already reserved at {} on {}",
                        reserva.id_mesa, reserva.hora, reserva.fecha
                    ))
                } else {
                    AppError::Commit(e.to_string())
                }
            })?;

        Ok(reserva)
    }

    /// Devuelve todas las reservas de un día, en cualquier mesa.
    pub async fn reservas_del_dia(&self, fecha: &str) -> Result<Vec<Reserva>> {
        let mut cursor = self
            .reservas()
            .find(doc! { "fecha": fecha })
            .await
            .map_err(|e| AppError::database("reservas_del_dia", e))?;

        let mut resultados = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| AppError::database("reservas_del_dia_cursor", e))?
        {
            resultados.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| AppError::Internal(format!("Error deserializando reserva: {}", e)))?,
            );
        }

        Ok(resultados)
    }

    /// Lista todas las mesas ordenadas por id.
    pub async fn listar_mesas(&self) -> Result<Vec<Mesa>> {
        let mut cursor = self
            .mesas()
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| AppError::database("listar_mesas", e))?;

        let mut resultados = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| AppError::database("listar_mesas_cursor", e))?
        {
            resultados.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| AppError::Internal(format!("Error deserializando mesa: {}", e)))?,
            );
        }

        Ok(resultados)
    }

    /// Da de alta una mesa nueva con la capacidad indicada.
    pub async fn crear_mesa(&self, capacidad: i32) -> Result<Mesa> {
        let id = self.siguiente_id("mesas").await?;
        let mesa = Mesa { id, capacidad };

        self.mesas()
            .insert_one(&mesa)
            .await
            .map_err(|e| AppError::Commit(e.to_string()))?;

        Ok(mesa)
    }

    /// Lista todas las reservas junto con su cliente, ordenadas por id.
    ///
    /// La unión se hace en memoria con un solo barrido de clientes; sin
    /// filtros ni paginación, aceptable al tamaño actual.
    pub async fn listar_reservas(&self) -> Result<Vec<(Reserva, Cliente)>> {
        let mut clientes = HashMap::new();
        let mut cursor = self
            .clientes()
            .find(doc! {})
            .await
            .map_err(|e| AppError::database("listar_clientes_para_union", e))?;

        while cursor
            .advance()
            .await
            .map_err(|e| AppError::database("listar_clientes_cursor", e))?
        {
            let cliente: Cliente = cursor
                .deserialize_current()
                .map_err(|e| AppError::Internal(format!("Error deserializando cliente: {}", e)))?;
            clientes.insert(cliente.id, cliente);
        }

        let mut cursor = self
            .reservas()
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| AppError::database("listar_reservas", e))?;

        let mut resultados = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| AppError::database("listar_reservas_cursor", e))?
        {
            let reserva: Reserva = cursor
                .deserialize_current()
                .map_err(|e| AppError::Internal(format!("Error deserializando reserva: {}", e)))?;

            match clientes.get(&reserva.id_cliente) {
                Some(cliente) => resultados.push((reserva, cliente.clone())),
                None => {
                    // Solo alcanzable si una cascada de borrado corre en
                    // paralelo con este listado.
                    tracing::warn!(
                        id_reserva = reserva.id,
                        id_cliente = reserva.id_cliente,
                        "Reserva sin cliente asociado, omitida del listado"
                    );
                }
            }
        }

        Ok(resultados)
    }

    /// Lista todos los clientes ordenados por id.
    pub async fn listar_clientes(&self) -> Result<Vec<Cliente>> {
        let mut cursor = self
            .clientes()
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| AppError::database("listar_clientes", e))?;

        let mut resultados = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| AppError::database("listar_clientes_cursor", e))?
        {
            resultados.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| AppError::Internal(format!("Error deserializando cliente: {}", e)))?,
            );
        }

        Ok(resultados)
    }

    /// Borra una reserva por id. Devuelve `false` si el id no existe.
    ///
    /// La reserva es una entidad hoja: no hay cascadas que considerar.
    pub async fn eliminar_reserva(&self, id: i32) -> Result<bool> {
        let resultado = self
            .reservas()
            .delete_one(doc! { "_id": id })
            .await
            .log_error_context("borrando reserva")
            .map_err(|e| AppError::Commit(e.to_string()))?;

        Ok(resultado.deleted_count > 0)
    }

    /// Borra un cliente y, en cascada, todas sus reservas.
    ///
    /// Cascada explícita hijos-antes-que-padre dentro de una transacción:
    /// nunca queda una reserva apuntando a un cliente inexistente.
    pub async fn eliminar_cliente(&self, id: i32) -> Result<()> {
        self.eliminar_con_cascada(doc! { "id_cliente": id }, id, Entidad::Cliente)
            .await
    }

    /// Borra una mesa y, en cascada, todas sus reservas.
    pub async fn eliminar_mesa(&self, id: i32) -> Result<()> {
        self.eliminar_con_cascada(doc! { "id_mesa": id }, id, Entidad::Mesa)
            .await
    }

    async fn eliminar_con_cascada(
        &self,
        filtro_reservas: mongodb::bson::Document,
        id: i32,
        entidad: Entidad,
    ) -> Result<()> {
        let mut session = self
            .client
            .start_session()
            .await
            .map_err(|e| AppError::Commit(e.to_string()))?;

        session
            .start_transaction()
            .await
            .map_err(|e| AppError::Commit(e.to_string()))?;

        let resultado = async {
            let hijas = self
                .reservas()
                .delete_many(filtro_reservas)
                .session(&mut session)
                .await
                .map_err(|e| AppError::Commit(e.to_string()))?;

            let padre = match entidad {
                Entidad::Cliente => self
                    .clientes()
                    .delete_one(doc! { "_id": id })
                    .session(&mut session)
                    .await
                    .map_err(|e| AppError::Commit(e.to_string()))?,
                Entidad::Mesa => self
                    .mesas()
                    .delete_one(doc! { "_id": id })
                    .session(&mut session)
                    .await
                    .map_err(|e| AppError::Commit(e.to_string()))?,
            };

            if padre.deleted_count == 0 {
                return Err(AppError::NotFound(format!(
                    "{} {} not found",
                    entidad.nombre(),
                    id
                )));
            }

            Ok(hijas.deleted_count)
        }
        .await;

        match resultado {
            Ok(reservas_borradas) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| AppError::Commit(e.to_string()))?;

                tracing::info!(
                    entidad = entidad.nombre(),
                    id,
                    reservas_borradas,
                    "Borrado en cascada completado"
                );
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    tracing::warn!(error = %abort_err, "Error abortando transacción de borrado");
                }
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Entidad {
    Cliente,
    Mesa,
}

impl Entidad {
    fn nombre(&self) -> &'static str {
        match self {
            Entidad::Cliente => "Customer",
            Entidad::Mesa => "Table",
        }
    }
}

/// Detecta el error de clave duplicada de MongoDB (código 11000).
fn es_clave_duplicada(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
        ErrorKind::Command(e) => e.code == 11000,
        _ => false,
    }
}
