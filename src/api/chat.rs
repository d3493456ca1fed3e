//! # API del asistente de chat

use actix_web::{web, HttpResponse};
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::middleware::log_error_chain;
use super::{resource, AppError, AppResult};
use crate::assistant::{ChatTurn, Reply, ReplySource, ResponseGenerator};
use crate::db::JsonStore;

/// Longitud máxima del mensaje, en caracteres
pub const MAX_MESSAGE_CHARS: usize = 3000;

const SIZE_REPLY: &str = "メッセージサイズが不適切です";
const APOLOGY_REPLY: &str =
    "申し訳ございません。現在応答を生成できませんでした。\n\nしばらくしてからもう一度お試しください。";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    message: Option<String>,
    #[serde(default)]
    history: Vec<ChatTurn>,
    #[serde(default)]
    use_ollama: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatDebug {
    ollama_available: bool,
    use_ollama: bool,
    message_length: usize,
    history_count: usize,
    response_length: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    response: String,
    source: ReplySource,
    ollama_used: bool,
    ollama_available: bool,
    api_type: &'static str,
    debug: ChatDebug,
}

fn api_type(reply: &Reply, use_models: bool) -> &'static str {
    if !use_models {
        "Basic"
    } else if reply.local_available {
        "Ollama"
    } else if reply.models_available {
        "HuggingFace"
    } else {
        "Basic"
    }
}

/// Responde a un mensaje del chat
///
/// # Parámetros
/// - `message`: Texto del usuario (obligatorio)
/// - `history`: Turnos anteriores `{ role, content }`
/// - `useOllama`: Permite usar modelos externos (por defecto `true`)
///
/// Un mensaje vacío o de más de 3000 caracteres recibe una respuesta fija.
/// Si algo falla dentro del generador se responde con una disculpa, nunca
/// con un error HTTP.
///
/// # Errores
/// - `400 Bad Request`: Falta `message`
async fn ai_response(
    store: web::Data<JsonStore>,
    assistant: web::Data<ResponseGenerator>,
    data: web::Json<ChatRequest>,
) -> AppResult<HttpResponse> {
    let data = data.into_inner();
    let message = data
        .message
        .ok_or_else(|| AppError::validation_field("message", "メッセージは必須です"))?;
    let message = message.trim();

    let length = message.chars().count();
    if length == 0 || length > MAX_MESSAGE_CHARS {
        tracing::debug!(length, "Chat message rejected by size");
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "response": SIZE_REPLY })));
    }

    let use_models = data.use_ollama.unwrap_or(true);
    let now = Local::now().naive_local();

    let reply = match assistant
        .respond(&store, message, &data.history, use_models, now)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            log_error_chain(&e, Some("generating chat reply"));
            Reply {
                text: APOLOGY_REPLY.to_string(),
                source: ReplySource::Basic,
                local_available: false,
                models_available: false,
            }
        }
    };

    tracing::debug!(source = ?reply.source, chars = reply.text.chars().count(), "Chat reply ready");

    let api_type = api_type(&reply, use_models);
    Ok(HttpResponse::Ok().json(ChatResponse {
        ollama_used: use_models && reply.models_available,
        ollama_available: reply.models_available,
        api_type,
        source: reply.source,
        debug: ChatDebug {
            ollama_available: reply.models_available,
            use_ollama: use_models,
            message_length: length,
            history_count: data.history.len(),
            response_length: reply.text.chars().count(),
        },
        response: reply.text,
    }))
}

/// Configura la ruta del chat
///
/// # Rutas disponibles
/// - `POST /ai-response` - Mensaje al asistente
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(resource("/ai-response").route(web::post().to(ai_response)));
}
