//! # API de valoraciones

use actix_web::{web, HttpResponse};
use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{resource, Ack, AppError, AppResult};
use crate::db::{models::Extra, JsonStore, Review};

const ANONYMOUS: &str = "匿名";

/// Cuerpo de `POST /reviews`: valoración nueva o lista completa
#[derive(Deserialize)]
#[serde(untagged)]
enum ReviewPayload {
    ReplaceAll(Vec<Review>),
    New(NewReview),
}

#[derive(Deserialize)]
struct NewReview {
    comment: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct DeleteReview {
    id: i64,
}

#[derive(Serialize)]
struct ReviewCreated {
    ok: bool,
    review: Review,
}

/// Lista las valoraciones, las más nuevas primero (por `id`)
async fn list_reviews(store: web::Data<JsonStore>) -> AppResult<HttpResponse> {
    let mut reviews = store.reviews().load().await?;
    reviews.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(HttpResponse::Ok().json(reviews))
}

/// Añade una valoración o sustituye la lista completa
///
/// # Cuerpos aceptados
/// - `{ "comment": "...", "name": "..." }`: nueva valoración; sin nombre es anónima
/// - Array de valoraciones: sustituye todo (administración)
///
/// # Errores
/// - `400 Bad Request`: Comentario vacío o cuerpo inválido
async fn post_review(
    store: web::Data<JsonStore>,
    data: web::Json<ReviewPayload>,
) -> AppResult<HttpResponse> {
    match data.into_inner() {
        ReviewPayload::ReplaceAll(reviews) => {
            let _guard = store.exclusive().await;
            store.reviews().save(&reviews).await?;
            tracing::info!(count = reviews.len(), "Reviews replaced");
            Ok(Ack::ok())
        }
        ReviewPayload::New(new) => {
            let comment = new.comment.trim().to_string();
            if comment.is_empty() {
                return Err(AppError::validation_field("comment", "コメントを入力してください"));
            }

            let name = new
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string());

            let now = Local::now();
            let review = Review {
                id: now.timestamp_millis() + rand::thread_rng().gen_range(0..1000),
                name,
                comment,
                date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
                timestamp: now.timestamp(),
                extra: Extra::new(),
            };

            let _guard = store.exclusive().await;
            let mut reviews = store.reviews().load().await?;
            reviews.push(review.clone());
            store.reviews().save(&reviews).await?;

            tracing::info!(id = review.id, "Review added");
            Ok(HttpResponse::Ok().json(ReviewCreated { ok: true, review }))
        }
    }
}

/// Elimina una valoración por `id`
///
/// # Errores
/// - `400 Bad Request`: Falta `id`
/// - `404 Not Found`: No existe esa valoración
async fn delete_review(
    store: web::Data<JsonStore>,
    data: web::Json<DeleteReview>,
) -> AppResult<HttpResponse> {
    let id = data.id;

    let _guard = store.exclusive().await;
    let mut reviews = store.reviews().load().await?;
    let before = reviews.len();
    reviews.retain(|r| r.id != id);

    if reviews.len() == before {
        return Err(AppError::not_found_id("レビュー", &id.to_string()));
    }

    store.reviews().save(&reviews).await?;
    tracing::info!(id, "Review deleted");
    Ok(Ack::ok())
}

/// Configura las rutas de valoraciones
///
/// # Rutas disponibles
/// - `GET /reviews` - Listar
/// - `POST /reviews` - Añadir o sustituir todo
/// - `DELETE /reviews` - Eliminar por id
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        resource("/reviews")
            .route(web::get().to(list_reviews))
            .route(web::post().to(post_review))
            .route(web::delete().to(delete_review)),
    );
}
