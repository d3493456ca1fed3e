//! # Módulo API
//!
//! Este módulo contiene todas las rutas y controladores de la API REST,
//! montadas bajo `/api`.
//!
//! ## Módulos principales
//!
//! - [`holidays`] - Días de cierre
//! - [`menu`] - Menú con stock y plato del día
//! - [`reservation`] - Reservas (listado, verificación, alta, reservas del usuario)
//! - [`reservation_times`] - Ventana horaria de reservas
//! - [`reviews`] - Valoraciones
//! - [`auth`] - Login, estado de sesión y logout
//! - [`status`] - Estado del comedor hoy
//! - [`chat`] - Asistente de chat
//! - [`reports`] - Reinicio diario e informe mensual
//! - [`errors`] - Manejo de errores de la aplicación

pub mod auth;
pub mod chat;
pub mod errors;
pub mod holidays;
pub mod menu;
pub mod middleware;
pub mod reports;
pub mod reservation;
pub mod reservation_times;
pub mod reviews;
pub mod status;

// Re-exportar tipos comunes para facilitar su uso
pub use errors::{AppError, AppResult, ResultExt};

use actix_web::{http::Method, web, HttpRequest, HttpResponse, Resource};
use serde::Serialize;

/// Respuesta `{ "ok": true }` de las operaciones de escritura
#[derive(Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> HttpResponse {
        HttpResponse::Ok().json(Ack { ok: true })
    }
}

/// Destino de cualquier método que el recurso no declara
///
/// `OPTIONS` es una comprobación previa de CORS y siempre responde 200.
pub async fn method_not_allowed(req: HttpRequest) -> AppResult<HttpResponse> {
    if req.method() == Method::OPTIONS {
        return Ok(HttpResponse::Ok().finish());
    }
    Err(AppError::MethodNotAllowed(req.method().to_string()))
}

/// Recurso con la respuesta 405 en JSON ya configurada
pub fn resource(path: &str) -> Resource {
    web::resource(path).default_service(web::to(method_not_allowed))
}

/// Configura todas las rutas de la API
///
/// ## Rutas configuradas
///
/// - `/api/holidays/*` - Ver [`holidays::routes`]
/// - `/api/menu`, `/api/daily-menu` - Ver [`menu::routes`]
/// - `/api/reservations/*`, `/api/user-reservations` - Ver [`reservation::routes`]
/// - `/api/reservation-times` - Ver [`reservation_times::routes`]
/// - `/api/reviews` - Ver [`reviews::routes`]
/// - `/api/auth` - Ver [`auth::routes`]
/// - `/api/status` - Ver [`status::routes`]
/// - `/api/ai-response` - Ver [`chat::routes`]
/// - `/api/daily-reset`, `/api/monthly-report` - Ver [`reports::routes`]
///
/// Los cuerpos JSON y query strings mal formados se responden con el mismo
/// `{ "error", "message" }` que el resto de errores.
///
/// # Parámetros
///
/// - `cfg`: Configuración del servicio Actix Web donde se registran las rutas
///
/// # Ejemplo
///
/// ```no_run
/// use actix_web::{web, App};
/// use cafeteria_reservation::api;
///
/// let app = App::new()
///     .configure(api::init_routes);
/// ```
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    );

    cfg.service(
        web::scope("/api")
            .configure(holidays::routes)
            .configure(menu::routes)
            .configure(reservation::routes)
            .configure(reservation_times::routes)
            .configure(reviews::routes)
            .configure(auth::routes)
            .configure(status::routes)
            .configure(chat::routes)
            .configure(reports::routes),
    );
}
