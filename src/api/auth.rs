//! # API de autenticación
//!
//! Login con los datos de la cuenta de Google que envía el navegador.
//! El token no se verifica contra Google: basta con que no esté vacío.
//! La sesión vive en memoria y se identifica con una cookie HTTP-only.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{resource, AppError, AppResult};
use crate::db::{JsonStore, User};
use crate::session::{expired_cookie, session_cookie, SessionStore, SessionUser, SESSION_COOKIE};

const DEFAULT_USER_NAME: &str = "ユーザー";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    id_token: Option<String>,
    user_info: Option<GoogleUserInfo>,
}

/// Perfil de Google tal como lo entrega el cliente
#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: Option<String>,
    id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    picture: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionStatus {
    logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<SessionUser>,
}

/// Verificación simulada del token de Google
fn verify_token(id_token: &str) -> bool {
    !id_token.trim().is_empty()
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Inicia sesión
///
/// Los usuarios se identifican por `googleId`. Un usuario nuevo recibe
/// `id = "user_<uuid>"`; uno existente actualiza email, nombre y foto.
///
/// # Respuesta
/// ```json
/// { "success": true, "user": { "id": "user_...", "name": "...", "email": "...", "picture": "..." } }
/// ```
///
/// # Errores
/// - `400 Bad Request`: Faltan `idToken`/`userInfo` o el perfil no trae `sub`/`id`
/// - `401 Unauthorized`: Token vacío
async fn login(
    store: web::Data<JsonStore>,
    sessions: web::Data<SessionStore>,
    data: web::Json<LoginRequest>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let data = data.into_inner();
    let (Some(id_token), Some(info)) = (data.id_token, data.user_info) else {
        return Err(AppError::Validation("idToken と userInfo は必須です".to_string()));
    };

    if !verify_token(&id_token) {
        return Err(AppError::Unauthorized("トークンが無効です".to_string()));
    }

    let google_id = info
        .sub
        .or(info.id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::validation_field("userInfo", "ユーザー情報が不正です"))?;
    let email = info.email.unwrap_or_default();
    let name = info
        .name
        .or(info.given_name)
        .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
    let picture = info.picture.unwrap_or_default();

    let _guard = store.exclusive().await;
    let mut users = store.users().load().await?;

    let user = match users.iter_mut().find(|u| u.google_id == google_id) {
        Some(existing) => {
            existing.email = email;
            existing.name = name;
            existing.picture = picture;
            existing.last_login = Some(timestamp());
            tracing::info!(user_id = %existing.id, "Returning user logged in");
            existing.clone()
        }
        None => {
            let user = User {
                id: format!("user_{}", uuid::Uuid::new_v4().simple()),
                google_id,
                email,
                name,
                picture,
                created_at: timestamp(),
                last_login: None,
            };
            tracing::info!(user_id = %user.id, "New user registered");
            users.push(user.clone());
            user
        }
    };
    store.users().save(&users).await?;

    // Un nuevo login desde el mismo navegador sustituye su sesión anterior
    if let Some(previous) = req.cookie(SESSION_COOKIE) {
        sessions.destroy(previous.value()).await;
    }

    let session_user = SessionUser::from(&user);
    let session_id = sessions.create(session_user.clone()).await;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&session_id))
        .json(json!({ "success": true, "user": session_user })))
}

/// Estado de la sesión actual
///
/// # Respuesta
/// `{ "loggedIn": false }` o `{ "loggedIn": true, "user": { ... } }`
async fn session_status(
    sessions: web::Data<SessionStore>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = sessions.current(&req).await;
    Ok(HttpResponse::Ok().json(SessionStatus {
        logged_in: user.is_some(),
        user,
    }))
}

/// Cierra la sesión y caduca la cookie
async fn logout(sessions: web::Data<SessionStore>, req: HttpRequest) -> AppResult<HttpResponse> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if sessions.destroy(cookie.value()).await {
            tracing::info!("Session closed");
        }
    }

    Ok(HttpResponse::Ok()
        .cookie(expired_cookie())
        .json(json!({ "success": true })))
}

/// Configura las rutas de autenticación
///
/// # Rutas disponibles
/// - `POST /auth` - Login
/// - `GET /auth` - Estado de la sesión
/// - `DELETE /auth` - Logout
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        resource("/auth")
            .route(web::post().to(login))
            .route(web::get().to(session_status))
            .route(web::delete().to(logout)),
    );
}
