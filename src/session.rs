//! Sesiones de usuario en memoria.
//!
//! El identificador de sesión es un UUID aleatorio guardado en una cookie
//! HTTP-only; el servidor guarda una copia del usuario por sesión. Las
//! sesiones caducan a las 24 horas y se pierden al reiniciar el proceso.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::HttpRequest;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::User;

pub const SESSION_COOKIE: &str = "cafeteria_session";

/// Vida de una sesión desde el login
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Copia del usuario asociada a la sesión
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            picture: user.picture.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user: SessionUser,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Abre una sesión nueva y devuelve su identificador
    ///
    /// Aprovecha la escritura para descartar las sesiones caducadas.
    pub async fn create(&self, user: SessionUser) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        if sessions.len() < before {
            tracing::debug!(expired = before - sessions.len(), "Expired sessions dropped");
        }

        sessions.insert(
            session_id.clone(),
            SessionEntry {
                user,
                expires_at: now + self.ttl,
            },
        );
        session_id
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionUser> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.user.clone())
    }

    pub async fn destroy(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Sesiones guardadas, caducadas incluidas hasta el próximo barrido
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Usuario de la sesión indicada por la cookie de la petición
    pub async fn current(&self, req: &HttpRequest) -> Option<SessionUser> {
        let cookie = req.cookie(SESSION_COOKIE)?;
        self.get(cookie.value()).await
    }
}

pub fn session_cookie(session_id: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session_id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(SESSION_TTL.as_secs() as i64))
        .finish()
}

/// Cookie vacía y caducada para borrar la sesión del navegador
pub fn expired_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::ZERO)
        .finish()
}
