//! # API de días de cierre
//!
//! - Listar los días de cierre
//! - Sustituir la lista completa (panel de administración)
//! - Añadir o quitar un día concreto

use actix_web::{web, HttpResponse};

use super::{resource, Ack, AppError, AppResult};
use crate::db::{Holiday, JsonStore};

/// Lista todos los días de cierre
///
/// # Respuesta
/// ```json
/// [ { "date": "2026-12-29", "reason": "年末休業" } ]
/// ```
///
/// # Errores
/// - `500 Internal Server Error`: Fichero ilegible
async fn list_holidays(store: web::Data<JsonStore>) -> AppResult<HttpResponse> {
    let holidays = store.holidays().load().await?;
    Ok(HttpResponse::Ok().json(holidays))
}

/// Sustituye la lista completa
///
/// El cuerpo debe ser un array; los campos desconocidos se guardan tal cual.
///
/// # Errores
/// - `400 Bad Request`: El cuerpo no es un array de días
async fn replace_holidays(
    store: web::Data<JsonStore>,
    data: web::Json<Vec<Holiday>>,
) -> AppResult<HttpResponse> {
    let holidays = data.into_inner();

    let _guard = store.exclusive().await;
    store.holidays().save(&holidays).await?;

    tracing::info!(count = holidays.len(), "Holidays replaced");
    Ok(Ack::ok())
}

/// Añade un día de cierre
///
/// # Validaciones
/// - `date` obligatorio
/// - No puede existir ya un cierre con la misma fecha
///
/// # Errores
/// - `400 Bad Request`: Fecha vacía o repetida
async fn add_holiday(
    store: web::Data<JsonStore>,
    data: web::Json<Holiday>,
) -> AppResult<HttpResponse> {
    let mut holiday = data.into_inner();
    holiday.date = holiday.date.trim().to_string();

    if holiday.date.is_empty() {
        return Err(AppError::validation_field("date", "日付を入力してください"));
    }

    let _guard = store.exclusive().await;
    let mut holidays = store.holidays().load().await?;

    if holidays.iter().any(|h| h.date == holiday.date) {
        return Err(AppError::Validation(format!(
            "{} はすでに休業日として登録されています",
            holiday.date
        )));
    }

    tracing::info!(date = %holiday.date, "Holiday added");
    holidays.push(holiday);
    store.holidays().save(&holidays).await?;

    Ok(Ack::ok())
}

/// Elimina el cierre de una fecha
///
/// # Errores
/// - `404 Not Found`: No hay cierre en esa fecha
async fn delete_holiday(
    store: web::Data<JsonStore>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let date = path.into_inner();

    let _guard = store.exclusive().await;
    let mut holidays = store.holidays().load().await?;
    let before = holidays.len();
    holidays.retain(|h| h.date != date);

    if holidays.len() == before {
        return Err(AppError::not_found_id("休業日", &date));
    }

    store.holidays().save(&holidays).await?;
    tracing::info!(date = %date, "Holiday removed");

    Ok(Ack::ok())
}

/// Configura las rutas de días de cierre
///
/// # Rutas disponibles
/// - `GET /holidays` - Listar
/// - `POST /holidays` - Sustituir todo
/// - `POST /holidays/entries` - Añadir uno
/// - `DELETE /holidays/{date}` - Eliminar uno
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        resource("/holidays")
            .route(web::get().to(list_holidays))
            .route(web::post().to(replace_holidays)),
    )
    .service(resource("/holidays/entries").route(web::post().to(add_holiday)))
    .service(resource("/holidays/{date}").route(web::delete().to(delete_holiday)));
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestEnv;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn replace_then_list_returns_payload() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(|cfg| env.state.register(cfg))).await;

        let payload = json!([
            {"date": "2026-12-29", "reason": "年末休業"},
            {"date": "2026-12-30", "reason": "年末休業", "note": "掲示済み"}
        ]);
        let req = test::TestRequest::post()
            .uri("/api/holidays")
            .set_json(&payload)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"ok": true}));

        let req = test::TestRequest::get().uri("/api/holidays").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, payload);
    }

    #[actix_web::test]
    async fn non_array_body_is_rejected() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(|cfg| env.state.register(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/holidays")
            .set_json(json!({"date": "2026-12-29"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn add_rejects_duplicate_and_delete_removes() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(|cfg| env.state.register(cfg))).await;

        let entry = json!({"date": "2026-11-03", "reason": "文化の日"});
        let req = test::TestRequest::post().uri("/api/holidays/entries").set_json(&entry).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/api/holidays/entries").set_json(&entry).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete().uri("/api/holidays/2026-11-03").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert!(env.store().holidays().load().await.unwrap().is_empty());

        let req = test::TestRequest::delete().uri("/api/holidays/2026-11-03").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unsupported_methods() {
        let env = TestEnv::new().await;
        let app = test::init_service(App::new().configure(|cfg| env.state.register(cfg))).await;

        let req = test::TestRequest::put().uri("/api/holidays").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Method not allowed");

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/holidays")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
