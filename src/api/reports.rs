//! # API de informes
//!
//! Reinicio diario (ventas, reservas, stock y plato del día) e informe
//! mensual en JSON o CSV.

use actix_web::{http::header, web, HttpResponse};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

use super::middleware::ErrorLogExt;
use super::{resource, AppError, AppResult, ResultExt};
use crate::core::{daily_reset, monthly_report};
use crate::db::{JsonStore, SalesRecord};

#[derive(Serialize)]
struct ResetResponse {
    success: bool,
    message: String,
    date: String,
    sales: SalesRecord,
    featured: String,
}

/// Ejecuta el reinicio diario
///
/// Pensado para lanzarse poco después de medianoche (ver el binario
/// `daily_reset`). Ejecutarlo dos veces el mismo día vuelve a archivar la
/// lista de reservas, que ya estará vacía.
///
/// # Respuesta
/// ```json
/// { "success": true, "message": "...", "date": "2026-10-19",
///   "sales": { "date": "2026-10-18", ... }, "featured": "カレーライス" }
/// ```
async fn run_daily_reset(store: web::Data<JsonStore>) -> AppResult<HttpResponse> {
    let featured = daily_reset::pick_featured(&mut rand::thread_rng());
    let outcome = daily_reset::perform_daily_reset(&store, Local::now().naive_local(), featured)
        .await
        .log_error_context("daily reset")?;

    Ok(HttpResponse::Ok().json(ResetResponse {
        success: true,
        message: format!(
            "日次リセットが完了しました（{}件の予約を集計）",
            outcome.cleared_reservations
        ),
        date: outcome.date,
        sales: outcome.sales,
        featured: outcome.featured,
    }))
}

/// Estado del último reinicio
///
/// # Respuesta
/// `{ "needsReset": true, "lastReset": "2026-10-18", "lastResetTime": "...", "today": "2026-10-19" }`
async fn daily_reset_status(store: web::Data<JsonStore>) -> AppResult<HttpResponse> {
    let status = daily_reset::reset_status(&store, Local::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(status))
}

#[derive(Deserialize)]
struct ReportQuery {
    year: Option<String>,
    month: Option<String>,
    format: Option<String>,
}

enum ReportFormat {
    Json,
    Csv,
}

impl ReportQuery {
    /// Interpreta los parámetros; los ausentes toman el mes en curso
    fn resolve(&self, today: chrono::NaiveDate) -> AppResult<(i32, u32, ReportFormat)> {
        let year = match self.year.as_deref() {
            Some(raw) => raw.trim().parse::<i32>().map_err_validation("year")?,
            None => today.year(),
        };

        let month = match self.month.as_deref() {
            Some(raw) => raw.trim().parse::<u32>().map_err_validation("month")?,
            None => today.month(),
        };
        if !(1..=12).contains(&month) {
            return Err(AppError::validation_field("month", "月は1から12で指定してください"));
        }

        let format = match self.format.as_deref().unwrap_or("json") {
            "json" => ReportFormat::Json,
            "csv" => ReportFormat::Csv,
            other => {
                return Err(AppError::validation_field(
                    "format",
                    &format!("未対応の形式です: {}", other),
                ))
            }
        };

        Ok((year, month, format))
    }
}

/// Informe de ventas de un mes
///
/// # Parámetros
/// - `year`, `month`: Mes del informe (por defecto, el actual)
/// - `format`: `json` (por defecto) o `csv`
///
/// # Errores
/// - `400 Bad Request`: Mes fuera de 1-12, número ilegible o formato desconocido
async fn monthly(
    store: web::Data<JsonStore>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    let (year, month, format) = query.resolve(Local::now().date_naive())?;

    let sales = store.sales().load().await?;
    let report = monthly_report::build(&sales, year, month);

    tracing::info!(
        year,
        month,
        days = report.total_days,
        people = report.total_people,
        "Monthly report generated"
    );

    match format {
        ReportFormat::Json => Ok(HttpResponse::Ok().json(report)),
        ReportFormat::Csv => Ok(HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.csv_filename()),
            ))
            .body(report.to_csv())),
    }
}

/// Configura las rutas de informes
///
/// # Rutas disponibles
/// - `POST /daily-reset` - Ejecutar el reinicio diario
/// - `GET /daily-reset` - Estado del último reinicio
/// - `GET /monthly-report` - Informe mensual
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        resource("/daily-reset")
            .route(web::post().to(run_daily_reset))
            .route(web::get().to(daily_reset_status)),
    )
    .service(resource("/monthly-report").route(web::get().to(monthly)));
}
