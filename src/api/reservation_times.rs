//! # API de la ventana de reservas

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::{resource, AppResult};
use crate::db::{JsonStore, ReservationTimeWindow};

/// Cambios de la ventana; lo que falta toma el valor por defecto
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowUpdate {
    start_time: Option<String>,
    end_time: Option<String>,
    enabled: Option<bool>,
    message: Option<String>,
}

#[derive(Serialize)]
struct WindowSaved {
    success: bool,
    data: ReservationTimeWindow,
}

/// Ventana de reservas actual
///
/// Si todavía no hay ventana guardada se crea la de por defecto
/// (11:30 - 12:45, habilitada).
async fn get_window(store: web::Data<JsonStore>) -> AppResult<HttpResponse> {
    let _guard = store.exclusive().await;

    let window = match store.reservation_times().load().await? {
        Some(window) => window,
        None => {
            let window = ReservationTimeWindow::default();
            store.reservation_times().save(&Some(window.clone())).await?;
            tracing::info!("Default reservation window created");
            window
        }
    };

    Ok(HttpResponse::Ok().json(window))
}

/// Guarda la ventana de reservas
///
/// # Respuesta
/// ```json
/// { "success": true, "data": { "startTime": "11:30", "endTime": "12:45", "enabled": true, "message": "..." } }
/// ```
///
/// # Errores
/// - `400 Bad Request`: Cuerpo que no es un objeto JSON
async fn save_window(
    store: web::Data<JsonStore>,
    data: web::Json<WindowUpdate>,
) -> AppResult<HttpResponse> {
    let update = data.into_inner();
    let defaults = ReservationTimeWindow::default();

    let window = ReservationTimeWindow {
        start_time: update.start_time.unwrap_or(defaults.start_time),
        end_time: update.end_time.unwrap_or(defaults.end_time),
        enabled: update.enabled.unwrap_or(defaults.enabled),
        message: update.message.unwrap_or(defaults.message),
    };

    let _guard = store.exclusive().await;
    store.reservation_times().save(&Some(window.clone())).await?;

    tracing::info!(
        start = %window.start_time,
        end = %window.end_time,
        enabled = window.enabled,
        "Reservation window updated"
    );

    Ok(HttpResponse::Ok().json(WindowSaved {
        success: true,
        data: window,
    }))
}

/// Configura las rutas de la ventana de reservas
///
/// # Rutas disponibles
/// - `GET /reservation-times` - Ventana actual
/// - `POST /reservation-times` - Guardar ventana
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        resource("/reservation-times")
            .route(web::get().to(get_window))
            .route(web::post().to(save_window)),
    );
}
