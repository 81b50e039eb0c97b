//! Tests de integración contra un MongoDB real.
//!
//! Requieren la variable de entorno `TEST_MONGODB_URI` apuntando a un
//! despliegue en replica set (las transacciones de sesión no funcionan en un
//! mongod standalone). Sin la variable, cada test se omite con un aviso:
//!
//! ```bash
//! TEST_MONGODB_URI=mongodb://localhost:27017 cargo test
//! ```
//!
//! Cada test trabaja sobre una base de datos propia que se borra al terminar.

use actix_web::{test, web, App};
use chrono::{NaiveDate, NaiveTime};
use std::env;

use reservas_restaurante::api;
use reservas_restaurante::api::AppError;
use reservas_restaurante::db::{MongoRepo, NuevaReserva, CAPACIDADES_INICIALES};

/// Conecta contra una base de datos exclusiva del test, con índices y mesas
/// sembradas. Devuelve `None` (test omitido) si `TEST_MONGODB_URI` no está
/// definida.
async fn repo_de_pruebas(sufijo: &str) -> Option<MongoRepo> {
    let uri = match env::var("TEST_MONGODB_URI") {
        Ok(uri) => uri,
        Err(_) => {
            eprintln!("TEST_MONGODB_URI no definida; test de integración omitido");
            return None;
        }
    };

    let nombre = format!("reservas_test_{}_{}", sufijo, std::process::id());
    let repo = MongoRepo::init_con_uri(&uri, &nombre)
        .await
        .expect("conexión de pruebas");

    // Limpieza de una ejecución anterior abortada, si la hubo.
    repo.database.drop().await.expect("limpieza previa");

    repo.create_indexes().await.expect("índices de pruebas");
    repo.seed_mesas().await.expect("siembra de mesas");

    Some(repo)
}

async fn limpiar(repo: &MongoRepo) {
    repo.database.drop().await.ok();
}

fn solicitud(email: &str, id_mesa: i32, fecha: &str, hora: &str) -> NuevaReserva {
    NuevaReserva {
        nombre_cliente: "Ana García".to_string(),
        email_cliente: email.to_string(),
        fecha: NaiveDate::parse_from_str(fecha, "%Y-%m-%d").unwrap(),
        hora: NaiveTime::parse_from_str(hora, "%H:%M").unwrap(),
        numero_personas: 2,
        id_mesa,
    }
}

#[tokio::test]
async fn la_siembra_crea_ocho_mesas_con_las_capacidades_del_plano() {
    let Some(repo) = repo_de_pruebas("siembra").await else {
        return;
    };

    let mesas = repo.listar_mesas().await.unwrap();
    let capacidades: Vec<i32> = mesas.iter().map(|m| m.capacidad).collect();
    let ids: Vec<i32> = mesas.iter().map(|m| m.id).collect();

    assert_eq!(capacidades, CAPACIDADES_INICIALES);
    assert_eq!(ids, (1..=8).collect::<Vec<i32>>());

    // La siembra es idempotente: un segundo arranque no duplica mesas.
    repo.seed_mesas().await.unwrap();
    assert_eq!(repo.listar_mesas().await.unwrap().len(), 8);

    limpiar(&repo).await;
}

#[tokio::test]
async fn crear_y_listar_una_reserva_devuelve_lo_enviado() {
    let Some(repo) = repo_de_pruebas("round_trip").await else {
        return;
    };

    let creada = repo
        .crear_reserva(solicitud("ana@example.com", 3, "2024-06-01", "18:00"))
        .await
        .unwrap();

    assert_eq!(creada.duracion, 60, "la duración siempre se fija en 60");

    let listado = repo.listar_reservas().await.unwrap();
    assert_eq!(listado.len(), 1);

    let (reserva, cliente) = &listado[0];
    assert_eq!(reserva.id, creada.id);
    assert_eq!(reserva.fecha, "2024-06-01");
    assert_eq!(reserva.hora, "18:00");
    assert_eq!(reserva.numero_personas, 2);
    assert_eq!(reserva.id_mesa, 3);
    assert_eq!(reserva.duracion, 60);
    assert_eq!(cliente.nombre, "Ana García");
    assert_eq!(cliente.email, "ana@example.com");

    limpiar(&repo).await;
}

#[tokio::test]
async fn la_resolucion_de_cliente_es_idempotente_y_gana_el_primer_nombre() {
    let Some(repo) = repo_de_pruebas("cliente_idempotente").await else {
        return;
    };

    let primera = repo
        .crear_reserva(solicitud("ana@example.com", 1, "2024-06-01", "18:00"))
        .await
        .unwrap();

    let mut segunda_solicitud = solicitud("ana@example.com", 2, "2024-06-01", "20:00");
    segunda_solicitud.nombre_cliente = "Ana María García".to_string();
    let segunda = repo.crear_reserva(segunda_solicitud).await.unwrap();

    assert_eq!(
        primera.id_cliente, segunda.id_cliente,
        "el mismo email debe resolver al mismo cliente"
    );

    let clientes = repo.listar_clientes().await.unwrap();
    assert_eq!(clientes.len(), 1);
    assert_eq!(
        clientes[0].nombre, "Ana García",
        "un nombre distinto en la segunda reserva se ignora"
    );

    limpiar(&repo).await;
}

#[tokio::test]
async fn reservar_una_mesa_inexistente_falla_sin_dejar_estado() {
    let Some(repo) = repo_de_pruebas("mesa_inexistente").await else {
        return;
    };

    let err = repo
        .crear_reserva(solicitud("nueva@example.com", 99, "2024-06-01", "18:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Commit(_)));

    // La transacción se abortó entera: tampoco quedó el cliente nuevo.
    assert!(repo.listar_clientes().await.unwrap().is_empty());
    assert!(repo.listar_reservas().await.unwrap().is_empty());

    limpiar(&repo).await;
}

#[tokio::test]
async fn una_franja_solapada_se_rechaza_aunque_la_hora_no_coincida() {
    let Some(repo) = repo_de_pruebas("solape").await else {
        return;
    };

    repo.crear_reserva(solicitud("ana@example.com", 3, "2024-06-01", "18:00"))
        .await
        .unwrap();

    // 18:30 cae dentro de [18:00, 19:00): mismo día y mesa, debe rechazarse.
    let err = repo
        .crear_reserva(solicitud("bea@example.com", 3, "2024-06-01", "18:30"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Commit(_)));

    // 19:00 toca el extremo excluido: no hay solape y se admite.
    repo.crear_reserva(solicitud("bea@example.com", 3, "2024-06-01", "19:00"))
        .await
        .unwrap();

    // Otra mesa a la misma hora tampoco es conflicto.
    repo.crear_reserva(solicitud("carla@example.com", 4, "2024-06-01", "18:30"))
        .await
        .unwrap();

    limpiar(&repo).await;
}

#[tokio::test]
async fn dos_admisiones_concurrentes_por_la_misma_franja_dejan_una_sola_reserva() {
    let Some(repo) = repo_de_pruebas("carrera").await else {
        return;
    };

    let a = repo.crear_reserva(solicitud("ana@example.com", 5, "2024-06-01", "21:00"));
    let b = repo.crear_reserva(solicitud("bea@example.com", 5, "2024-06-01", "21:00"));

    let (resultado_a, resultado_b) = tokio::join!(a, b);

    let exitos = [&resultado_a, &resultado_b]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(exitos, 1, "como mucho una admisión puede ganar la franja");

    let listado = repo.listar_reservas().await.unwrap();
    assert_eq!(listado.len(), 1);

    limpiar(&repo).await;
}

#[tokio::test]
async fn borrar_una_reserva_inexistente_no_cambia_nada() {
    let Some(repo) = repo_de_pruebas("borrado_inexistente").await else {
        return;
    };

    repo.crear_reserva(solicitud("ana@example.com", 1, "2024-06-01", "18:00"))
        .await
        .unwrap();

    assert!(!repo.eliminar_reserva(9999).await.unwrap());
    assert_eq!(repo.listar_reservas().await.unwrap().len(), 1);

    assert!(repo.eliminar_reserva(1).await.unwrap());
    assert!(repo.listar_reservas().await.unwrap().is_empty());

    limpiar(&repo).await;
}

#[tokio::test]
async fn borrar_un_cliente_arrastra_sus_reservas() {
    let Some(repo) = repo_de_pruebas("cascada_cliente").await else {
        return;
    };

    let de_ana = repo
        .crear_reserva(solicitud("ana@example.com", 1, "2024-06-01", "18:00"))
        .await
        .unwrap();
    repo.crear_reserva(solicitud("ana@example.com", 2, "2024-06-02", "20:00"))
        .await
        .unwrap();
    repo.crear_reserva(solicitud("bea@example.com", 3, "2024-06-01", "18:00"))
        .await
        .unwrap();

    repo.eliminar_cliente(de_ana.id_cliente).await.unwrap();

    let listado = repo.listar_reservas().await.unwrap();
    assert_eq!(listado.len(), 1, "solo sobrevive la reserva de Bea");
    assert_eq!(listado[0].1.email, "bea@example.com");

    // Repetir el borrado ya es un 404.
    let err = repo.eliminar_cliente(de_ana.id_cliente).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    limpiar(&repo).await;
}

#[tokio::test]
async fn borrar_una_mesa_arrastra_sus_reservas() {
    let Some(repo) = repo_de_pruebas("cascada_mesa").await else {
        return;
    };

    repo.crear_reserva(solicitud("ana@example.com", 4, "2024-06-01", "18:00"))
        .await
        .unwrap();
    repo.crear_reserva(solicitud("bea@example.com", 4, "2024-06-01", "20:00"))
        .await
        .unwrap();
    repo.crear_reserva(solicitud("bea@example.com", 5, "2024-06-01", "20:00"))
        .await
        .unwrap();

    repo.eliminar_mesa(4).await.unwrap();

    assert_eq!(repo.listar_mesas().await.unwrap().len(), 7);
    let listado = repo.listar_reservas().await.unwrap();
    assert_eq!(listado.len(), 1);
    assert_eq!(listado[0].0.id_mesa, 5);

    let err = repo.eliminar_mesa(4).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    limpiar(&repo).await;
}

// ---------------------------------------------------------------------------
// Tests de la capa HTTP
// ---------------------------------------------------------------------------

macro_rules! app_de_pruebas {
    ($repo:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($repo.clone()))
                .service(web::scope("/api").configure(api::init_routes)),
        )
        .await
    };
}

#[actix_web::test]
async fn el_escenario_de_disponibilidad_de_referencia() {
    let Some(repo) = repo_de_pruebas("http_disponibilidad").await else {
        return;
    };
    let app = app_de_pruebas!(repo);

    // Reservar la mesa 3 el 2024-06-01 a las 18:00 (60 minutos implícitos).
    let req = test::TestRequest::post()
        .uri("/api/reservations")
        .set_json(serde_json::json!({
            "customerName": "Ana García",
            "customerEmail": "ana@example.com",
            "date": "2024-06-01",
            "time": "18:00",
            "partySize": 2,
            "tableId": 3
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let cuerpo: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(cuerpo["message"], "Reservation created successfully");
    assert!(cuerpo["reservation_id"].is_number());

    // A las 18:30 la mesa 3 está ocupada: no debe aparecer.
    let req = test::TestRequest::get()
        .uri("/api/tables?date=2024-06-01&time=18:30")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let libres: serde_json::Value = test::read_body_json(resp).await;
    let ids: Vec<i64> = libres
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["table_id"].as_i64().unwrap())
        .collect();
    assert!(!ids.contains(&3), "18:30 cae dentro de [18:00, 19:00)");
    assert_eq!(ids.len(), 7);

    // A las 19:00 la reserva ya terminó (extremo excluido): vuelve a estar libre.
    let req = test::TestRequest::get()
        .uri("/api/tables?date=2024-06-01&time=19:00")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let libres: serde_json::Value = test::read_body_json(resp).await;
    let ids: Vec<i64> = libres
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["table_id"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&3), "el extremo final no bloquea");
    assert_eq!(ids.len(), 8);

    limpiar(&repo).await;
}

#[actix_web::test]
async fn sin_parametros_la_consulta_devuelve_el_inventario_completo() {
    let Some(repo) = repo_de_pruebas("http_inventario").await else {
        return;
    };
    let app = app_de_pruebas!(repo);

    let req = test::TestRequest::get().uri("/api/tables").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let mesas: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(mesas.as_array().unwrap().len(), 8);
    assert_eq!(mesas[0], serde_json::json!({"table_id": 1, "capacity": 2}));

    // Con solo uno de los dos parámetros también degrada al inventario.
    let req = test::TestRequest::get()
        .uri("/api/tables?date=2024-06-01")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let mesas: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(mesas.as_array().unwrap().len(), 8);

    limpiar(&repo).await;
}

#[actix_web::test]
async fn una_fecha_malformada_devuelve_400_sin_consultar() {
    let Some(repo) = repo_de_pruebas("http_fecha_malformada").await else {
        return;
    };
    let app = app_de_pruebas!(repo);

    let req = test::TestRequest::get()
        .uri("/api/tables?date=2024-13-40&time=18:00")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let cuerpo: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(cuerpo["error"], "Invalid date or time format");

    limpiar(&repo).await;
}

#[actix_web::test]
async fn borrar_una_reserva_por_http_y_repetir_da_404() {
    let Some(repo) = repo_de_pruebas("http_borrado").await else {
        return;
    };
    let app = app_de_pruebas!(repo);

    let creada = repo
        .crear_reserva(solicitud("ana@example.com", 2, "2024-06-01", "18:00"))
        .await
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reservations/{}", creada.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let cuerpo: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(cuerpo["message"], "Reservation deleted successfully");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reservations/{}", creada.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let cuerpo: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(cuerpo["error"], "Reservation not found");

    limpiar(&repo).await;
}

#[actix_web::test]
async fn una_reserva_invalida_devuelve_400_con_mensaje() {
    let Some(repo) = repo_de_pruebas("http_reserva_invalida").await else {
        return;
    };
    let app = app_de_pruebas!(repo);

    let req = test::TestRequest::post()
        .uri("/api/reservations")
        .set_json(serde_json::json!({
            "customerName": "Ana García",
            "customerEmail": "ana@example.com",
            "date": "2024-06-01",
            "time": "25:00",
            "partySize": 2,
            "tableId": 3
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let cuerpo: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(cuerpo["error"], "Invalid date or time format");

    assert!(repo.listar_reservas().await.unwrap().is_empty());

    limpiar(&repo).await;
}
