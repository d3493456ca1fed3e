//! # API de menú
//!
//! Menú con stock (`-1` = sin límite) y plato destacado del día.

use actix_web::{web, HttpResponse};
use chrono::Local;

use super::{resource, Ack, AppError, AppResult};
use crate::db::{JsonStore, MenuItem, UNLIMITED_STOCK};

/// Lista el menú completo con su stock
async fn list_menu(store: web::Data<JsonStore>) -> AppResult<HttpResponse> {
    let menu = store.menu().load().await?;
    Ok(HttpResponse::Ok().json(menu))
}

/// Sustituye el menú completo
///
/// # Validaciones
/// - Cada plato necesita nombre
/// - `stock` debe ser `-1` (sin límite) o mayor o igual que 0
///
/// # Errores
/// - `400 Bad Request`: Cuerpo que no es un array o plato inválido
async fn replace_menu(
    store: web::Data<JsonStore>,
    data: web::Json<Vec<MenuItem>>,
) -> AppResult<HttpResponse> {
    let menu = data.into_inner();

    if let Some(item) = menu.iter().find(|item| item.name.trim().is_empty()) {
        tracing::debug!(stock = item.stock, "Menu item without name");
        return Err(AppError::validation_field("name", "メニュー名を入力してください"));
    }

    if let Some(item) = menu.iter().find(|item| item.stock < UNLIMITED_STOCK) {
        return Err(AppError::validation_field(
            "stock",
            &format!("「{}」の在庫は-1以上で指定してください", item.name),
        ));
    }

    let _guard = store.exclusive().await;
    store.menu().save(&menu).await?;

    tracing::info!(items = menu.len(), "Menu replaced");
    Ok(Ack::ok())
}

/// Plato destacado de hoy
///
/// # Respuesta
/// ```json
/// { "date": "2026-10-19", "food": "カレーライス" }
/// ```
/// o `null` si no hay plato para hoy.
async fn todays_featured(store: web::Data<JsonStore>) -> AppResult<HttpResponse> {
    let today = Local::now().format("%Y-%m-%d").to_string();
    let featured = store
        .daily_menu()
        .load()
        .await?
        .into_iter()
        .find(|m| m.date == today);

    Ok(HttpResponse::Ok().json(featured))
}

/// Configura las rutas del menú
///
/// # Rutas disponibles
/// - `GET /menu` - Listar
/// - `POST /menu` - Sustituir todo
/// - `GET /daily-menu` - Plato de hoy
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        resource("/menu")
            .route(web::get().to(list_menu))
            .route(web::post().to(replace_menu)),
    )
    .service(resource("/daily-menu").route(web::get().to(todays_featured)));
}
