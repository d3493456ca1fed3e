//! # API de Reservas
//!
//! Este módulo maneja todas las operaciones relacionadas con reservas:
//! - Listar y sustituir la lista completa (panel de administración)
//! - Verificar una reserva por nombre y número en el mostrador
//! - Crear nuevas reservas desde la página del alumno
//! - Listar las reservas del usuario con sesión iniciada

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::{resource, Ack, AppError, AppResult};
use crate::core::reservations::{place_reservation, NewReservation};
use crate::db::{models, JsonStore, Reservation};
use crate::session::SessionStore;

/// Cuerpo de `POST /reservations`: lista completa o acción
#[derive(Deserialize)]
#[serde(untagged)]
enum ReservationsPayload {
    ReplaceAll(Vec<Reservation>),
    Action(ReservationAction),
}

/// Acción sobre una reserva existente
///
/// Sólo existe `verify`, que marca la reserva como comprobada.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReservationAction {
    action: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "models::lenient_number")]
    reservation_number: Option<u32>,
}

/// Datos de una reserva nueva
#[derive(Deserialize)]
struct SubmitReservation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    food: String,
    #[serde(default)]
    people: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    success: bool,
    message: String,
    reservation: Reservation,
}

/// Lista todas las reservas vivas
async fn list_reservations(store: web::Data<JsonStore>) -> AppResult<HttpResponse> {
    let reservations = store.reservations().load().await?;
    Ok(HttpResponse::Ok().json(reservations))
}

/// Sustituye la lista o verifica una reserva
///
/// # Cuerpos aceptados
/// - Array de reservas: sustituye la lista completa
/// - `{ "action": "verify", "name": "...", "reservationNumber": 1234 }`
///
/// # Respuesta
/// ```json
/// { "ok": true }
/// ```
///
/// # Errores
/// - `400 Bad Request`: Acción desconocida o faltan nombre/número
/// - `404 Not Found`: Ninguna reserva coincide con nombre y número
async fn update_reservations(
    store: web::Data<JsonStore>,
    data: web::Json<ReservationsPayload>,
) -> AppResult<HttpResponse> {
    match data.into_inner() {
        ReservationsPayload::ReplaceAll(reservations) => {
            let _guard = store.exclusive().await;
            store.reservations().save(&reservations).await?;
            tracing::info!(count = reservations.len(), "Reservations replaced");
            Ok(Ack::ok())
        }
        ReservationsPayload::Action(action) => verify_reservation(&store, action).await,
    }
}

async fn verify_reservation(store: &JsonStore, action: ReservationAction) -> AppResult<HttpResponse> {
    if action.action != "verify" {
        return Err(AppError::validation_field(
            "action",
            &format!("不明な操作です: {}", action.action),
        ));
    }

    let name = action
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::validation_field("name", "お名前を入力してください"))?;
    let number = action
        .reservation_number
        .ok_or_else(|| AppError::validation_field("reservationNumber", "予約番号を入力してください"))?;

    let _guard = store.exclusive().await;
    let mut reservations = store.reservations().load().await?;

    let reservation = reservations
        .iter_mut()
        .find(|r| r.name.trim() == name && r.reservation_number == Some(number))
        .ok_or_else(|| AppError::not_found_id("予約", &number.to_string()))?;
    reservation.verified = Some(true);

    store.reservations().save(&reservations).await?;
    tracing::info!(reservation_number = number, "Reservation verified");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ok": true,
        "message": "予約を確認しました"
    })))
}

/// Crea una nueva reserva
///
/// # Validaciones
/// - Nombre y menú obligatorios, al menos 1 persona
/// - Dentro de la ventana de reservas si está habilitada
/// - El plato existe y le queda stock
///
/// Con sesión iniciada la reserva queda asociada al usuario.
///
/// # Respuesta
/// ```json
/// {
///   "success": true,
///   "message": "予約が完了しました（予約番号: 4821）",
///   "reservation": { "id": 1760842800000, "reservationNumber": 4821, ... }
/// }
/// ```
///
/// # Errores
/// - `400 Bad Request`: Datos incompletos, fuera de horario o agotado
/// - `404 Not Found`: El plato no existe en el menú
async fn submit_reservation(
    store: web::Data<JsonStore>,
    sessions: web::Data<SessionStore>,
    data: web::Json<SubmitReservation>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let data = data.into_inner();
    let user_id = sessions.current(&req).await.map(|user| user.id);

    let request = NewReservation {
        name: data.name,
        food: data.food,
        people: data.people,
        user_id,
    };

    let _guard = store.exclusive().await;
    let mut menu = store.menu().load().await?;
    let mut reservations = store.reservations().load().await?;
    let window = store.reservation_times().load().await?;

    let now = Local::now().naive_local();
    let reservation = place_reservation(
        &mut menu,
        &reservations,
        window.as_ref(),
        request,
        now,
        &mut rand::thread_rng(),
    )?;

    store.menu().save(&menu).await?;
    reservations.push(reservation.clone());
    store.reservations().save(&reservations).await?;

    let number = reservation.reservation_number.unwrap_or_default();
    tracing::info!(
        reservation_number = number,
        food = %reservation.food,
        people = reservation.people,
        "Reservation placed"
    );

    Ok(HttpResponse::Ok().json(SubmitResponse {
        success: true,
        message: format!("予約が完了しました（予約番号: {}）", number),
        reservation,
    }))
}

/// Reservas del usuario con sesión iniciada, las más recientes primero
///
/// # Errores
/// - `401 Unauthorized`: Sin sesión
async fn user_reservations(
    store: web::Data<JsonStore>,
    sessions: web::Data<SessionStore>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = sessions
        .current(&req)
        .await
        .ok_or_else(|| AppError::Unauthorized("ログインが必要です".to_string()))?;

    let mut mine: Vec<Reservation> = store
        .reservations()
        .load()
        .await?
        .into_iter()
        .filter(|r| r.user_id.as_deref() == Some(user.id.as_str()))
        .collect();

    mine.sort_by(|a, b| (&b.date, &b.time).cmp(&(&a.date, &a.time)));

    Ok(HttpResponse::Ok().json(mine))
}

/// Configura las rutas relacionadas con reservas
///
/// # Rutas disponibles
/// - `GET /reservations` - Listar
/// - `POST /reservations` - Sustituir todo o verificar
/// - `POST /reservations/submit` - Nueva reserva
/// - `GET /user-reservations` - Reservas del usuario (requiere sesión)
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        resource("/reservations")
            .route(web::get().to(list_reservations))
            .route(web::post().to(update_reservations)),
    )
    .service(resource("/reservations/submit").route(web::post().to(submit_reservation)))
    .service(resource("/user-reservations").route(web::get().to(user_reservations)));
}
