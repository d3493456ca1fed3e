//! # Cafeteria Reservation Server
//!
//! Servidor web del comedor: reservas, menú con stock, días de cierre,
//! valoraciones, login con Google y un asistente de chat. Los datos viven en
//! ficheros JSON dentro de `DATA_DIR`.
//!
//! ## Configuración
//!
//! El servidor se configura mediante variables de entorno (archivo `.env`):
//!
//! ```env
//! BIND_ADDRESS=0.0.0.0:8080
//! DATA_DIR=./data
//! STATIC_DIR=./static
//!
//! # Asistente
//! AI_LOCAL_ENABLED=true
//! AI_LOCAL_URL=http://localhost:11434
//! AI_CLOUD_ENABLED=false
//! AI_CLOUD_TOKEN=hf_...
//!
//! # Logging
//! RUST_LOG=debug,actix_web=info
//! ```
//!
//! ## Arquitectura
//!
//! ```text
//! Frontend (HTML/CSS/JS)
//!     ↓ HTTP/JSON
//! API REST (Actix Web)  ──→  Ollama / Hugging Face (opcional)
//!     ↓ tokio::fs
//! Ficheros JSON
//! ```

use actix_files::Files;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use tracing_subscriber::EnvFilter;

use cafeteria_reservation::config::Config;
use cafeteria_reservation::db::JsonStore;
use cafeteria_reservation::state::AppState;

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["cafeteria_reservation=debug", "actix_web=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Función principal que inicia el servidor web
///
/// 1. Carga variables de entorno desde `.env`
/// 2. Configura el logging con tracing
/// 3. Prepara el directorio de datos
/// 4. Levanta el servidor HTTP con la API bajo `/api`, el frontend bajo
///    `/static` y la raíz redirigida a `/static/index.html`
///
/// # Errores
///
/// Retorna `std::io::Error` si el directorio de datos no se puede crear o
/// el puerto no se puede bindear.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    tracing::info!(
        bind = %config.bind_address,
        local_ai = config.ai.local_enabled,
        cloud_ai = config.ai.cloud_enabled,
        "Starting cafeteria reservation server"
    );

    let store = match JsonStore::init(&config.data_dir).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Cannot prepare data directory");
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let bind_address = config.bind_address.clone();
    let static_dir = config.static_dir.clone();
    let state = AppState::new(config, store);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add((header::CACHE_CONTROL, "no-cache, max-age=0"))
                    .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")),
            )
            .configure(move |cfg| state.register(cfg))
            .service(Files::new("/static", static_dir.clone()).index_file("index.html"))
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::PermanentRedirect()
                        .append_header((header::LOCATION, "/static/index.html"))
                        .finish()
                }),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
