use actix_web::web;

use crate::api;
use crate::assistant::ResponseGenerator;
use crate::config::Config;
use crate::db::JsonStore;
use crate::session::SessionStore;

/// Estado compartido por todos los workers
///
/// Cada pieza se registra como `web::Data` por separado para que los
/// handlers pidan sólo lo que usan.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: JsonStore,
    pub sessions: SessionStore,
    pub assistant: ResponseGenerator,
}

impl AppState {
    pub fn new(config: Config, store: JsonStore) -> Self {
        let assistant = ResponseGenerator::new(&config.ai);
        Self::assemble(config, store, assistant)
    }

    /// Igual que [`AppState::new`] pero con respuestas reproducibles
    pub fn with_seed(config: Config, store: JsonStore, seed: u64) -> Self {
        let assistant = ResponseGenerator::with_seed(&config.ai, seed);
        Self::assemble(config, store, assistant)
    }

    fn assemble(config: Config, store: JsonStore, assistant: ResponseGenerator) -> Self {
        Self {
            config,
            store,
            sessions: SessionStore::new(),
            assistant,
        }
    }

    /// Registra los datos compartidos y las rutas de la API
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.store.clone()))
            .app_data(web::Data::new(self.sessions.clone()))
            .app_data(web::Data::new(self.assistant.clone()));
        api::init_routes(cfg);
    }
}
