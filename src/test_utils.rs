//! Utilidades compartidas por los tests.
//!
//! Cada test trabaja en su propio directorio de datos temporal, que se borra
//! al terminar, y con los modelos externos desactivados. [`ModelStub`]
//! sirve respuestas fijas en lugar de los servidores de modelos.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_web::{dev::ServerHandle, http::StatusCode, web, App, HttpResponse, HttpServer};
use serde_json::Value;

use crate::config::{AiConfig, Config};
use crate::db::JsonStore;
use crate::state::AppState;

/// Directorio temporal único, eliminado en `Drop`
pub struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("cafeteria-test-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&path).expect("create test dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Estado de aplicación listo para `App::configure`
pub struct TestEnv {
    pub dir: TestDir,
    pub state: AppState,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = TestDir::new();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ai: AiConfig::disabled(),
            ..Config::default()
        };
        let store = JsonStore::init(&config.data_dir).await.expect("init store");
        let state = AppState::with_seed(config, store, 42);
        Self { dir, state }
    }

    pub fn store(&self) -> &JsonStore {
        &self.state.store
    }
}

#[derive(Default)]
struct StubState {
    tags: Option<Value>,
    chat_replies: VecDeque<(u16, Value)>,
    chat_requests: Vec<Value>,
    cloud_replies: HashMap<String, (u16, Value)>,
    cloud_calls: Vec<String>,
}

type SharedStub = web::Data<Mutex<StubState>>;

fn stub_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse::build(StatusCode::from_u16(status).unwrap()).json(body)
}

async fn stub_tags(state: SharedStub) -> HttpResponse {
    match &state.lock().unwrap().tags {
        Some(tags) => stub_response(200, tags),
        None => HttpResponse::InternalServerError().finish(),
    }
}

async fn stub_chat(state: SharedStub, body: web::Json<Value>) -> HttpResponse {
    let mut state = state.lock().unwrap();
    state.chat_requests.push(body.into_inner());
    match state.chat_replies.pop_front() {
        Some((status, reply)) => stub_response(status, &reply),
        None => HttpResponse::InternalServerError().finish(),
    }
}

async fn stub_cloud(state: SharedStub, model: web::Path<String>) -> HttpResponse {
    let model = model.into_inner();
    let mut state = state.lock().unwrap();
    state.cloud_calls.push(model.clone());
    match state.cloud_replies.get(&model) {
        Some((status, reply)) => stub_response(*status, reply),
        None => HttpResponse::NotFound().finish(),
    }
}

/// Servidor HTTP local que imita Ollama (`/api/tags`, `/api/chat`) y la API
/// de inferencia en la nube (`/models/{model}`)
///
/// Sin lista de modelos, `/api/tags` contesta 500. `/api/chat` consume las
/// respuestas encoladas en orden y contesta 500 al agotarlas. Un modelo de
/// nube sin respuesta configurada contesta 404.
pub struct ModelStub {
    url: String,
    state: SharedStub,
    handle: ServerHandle,
}

impl ModelStub {
    /// Arranca el servidor; requiere un `System` de actix (`#[actix_web::test]`)
    pub fn start(
        tags: Option<Value>,
        chat_replies: Vec<(u16, Value)>,
        cloud_replies: Vec<(&str, u16, Value)>,
    ) -> Self {
        let state = web::Data::new(Mutex::new(StubState {
            tags,
            chat_replies: chat_replies.into(),
            cloud_replies: cloud_replies
                .into_iter()
                .map(|(model, status, reply)| (model.to_string(), (status, reply)))
                .collect(),
            ..StubState::default()
        }));

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .route("/api/tags", web::get().to(stub_tags))
                .route("/api/chat", web::post().to(stub_chat))
                .route("/models/{model:.*}", web::post().to(stub_cloud))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("bind model stub");

        let url = format!("http://{}", server.addrs()[0]);
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self { url, state, handle }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Cuerpos JSON recibidos en `/api/chat`, en orden
    pub fn chat_requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().chat_requests.clone()
    }

    /// Modelos de nube llamados, en orden
    pub fn cloud_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().cloud_calls.clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}
