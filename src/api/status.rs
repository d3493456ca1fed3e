//! # API de estado del comedor

use actix_web::{web, HttpResponse};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use super::{resource, AppResult};
use crate::assistant::{lookup::CafeteriaSnapshot, ResponseGenerator};
use crate::core::congestion::Congestion;
use crate::core::hours::{BusinessHours, CafeteriaStatus};
use crate::db::JsonStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStatus {
    pub date: String,
    pub time: String,
    #[serde(flatten)]
    pub status: CafeteriaStatus,
    pub message: String,
    /// Horario de hoy, `None` si el día cierra siempre
    pub hours: Option<String>,
    pub featured: Option<String>,
    pub reservation_count: usize,
    pub congestion: Congestion,
    pub congestion_label: &'static str,
}

impl TodayStatus {
    pub fn build(snapshot: &CafeteriaSnapshot, hours: &BusinessHours, now: NaiveDateTime) -> Self {
        let date = now.date();
        let status = hours.status_at(date, now.time(), snapshot.holiday.as_ref());
        let congestion = snapshot.congestion();

        Self {
            date: date.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M").to_string(),
            message: status.message(),
            status,
            hours: hours.for_day(date).map(|h| h.display()),
            featured: snapshot.featured.clone(),
            reservation_count: snapshot.reservation_count,
            congestion,
            congestion_label: congestion.label(),
        }
    }
}

/// Estado del comedor ahora mismo
///
/// # Respuesta
/// ```json
/// {
///   "date": "2026-10-19", "time": "12:10",
///   "state": "open", "closes": "14:00",
///   "message": "✅ 現在営業中です（14:00まで）",
///   "hours": "11:00 - 14:00", "featured": "カレーライス",
///   "reservationCount": 12, "congestion": "low", "congestionLabel": "空いています"
/// }
/// ```
async fn today_status(
    store: web::Data<JsonStore>,
    assistant: web::Data<ResponseGenerator>,
) -> AppResult<HttpResponse> {
    let now = Local::now().naive_local();
    let snapshot = CafeteriaSnapshot::load(&store, now.date()).await?;
    Ok(HttpResponse::Ok().json(TodayStatus::build(&snapshot, assistant.hours(), now)))
}

/// Configura la ruta de estado
///
/// # Rutas disponibles
/// - `GET /status` - Estado de hoy
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(resource("/status").route(web::get().to(today_status)));
}
