//! Clientes HTTP de los modelos de texto externos.
//!
//! - [`LocalModel`]: servidor compatible con Ollama (`/api/tags`, `/api/chat`)
//! - [`CloudModel`]: API de inferencia compatible con Hugging Face
//!
//! Ningún fallo aquí es fatal: el generador registra el error y sigue con
//! la siguiente etapa.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use super::ChatTurn;

const TAGS_TIMEOUT: Duration = Duration::from_secs(5);
const CHAT_TIMEOUT: Duration = Duration::from_secs(120);
const PLAIN_CHAT_TIMEOUT: Duration = Duration::from_secs(60);
const CLOUD_TIMEOUT: Duration = Duration::from_secs(60);

/// Turnos de historial que se envían al modelo
pub const HISTORY_TURNS: usize = 6;

/// Preferencia de modelos locales, por subcadena del nombre
pub const PREFERRED_MODELS: &[&str] = &["llama3", "llama2", "llama", "mistral", "phi"];
pub const FALLBACK_MODEL: &str = "llama3";

/// Respuestas de la nube con esta longitud o menos se descartan
const MIN_CLOUD_ANSWER_CHARS: usize = 5;

pub const DEFAULT_SYSTEM_PROMPT: &str = "あなたは学校食堂の案内をするAIアシスタントです。\n\
メニュー、営業時間、予約についての質問に、丁寧で自然な日本語で答えてください。\n\
学習に関する質問には答えそのものではなくヒントや解説で手助けしてください。\n\
わからないことは推測で断定せず、管理者サイトの情報を確認するよう案内してください。\n\
回答は簡潔にし、会話の流れに合わせて表現を変えてください。";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("model '{model}' returned an error: {message}")]
    Model { model: String, message: String },

    #[error("no usable answer from {0}")]
    EmptyAnswer(String),
}

/// Últimos `HISTORY_TURNS` turnos con rol y contenido
pub fn recent_history(history: &[ChatTurn]) -> &[ChatTurn] {
    let start = history.len().saturating_sub(HISTORY_TURNS);
    &history[start..]
}

/// Elige el modelo local según la preferencia
///
/// Sin coincidencias se usa el primero listado; sin modelos, `llama3`.
pub fn choose_model(models: &[String]) -> String {
    PREFERRED_MODELS
        .iter()
        .find_map(|preferred| models.iter().find(|name| name.contains(preferred)))
        .or_else(|| models.first())
        .cloned()
        .unwrap_or_else(|| FALLBACK_MODEL.to_string())
}

/// Prompt plano con historial para modelos de completado
pub fn build_prompt_with_history(system_prompt: &str, history: &[ChatTurn], message: &str) -> String {
    let mut prompt = format!("{system_prompt}\n\n");

    let recent = recent_history(history);
    if !recent.is_empty() {
        prompt.push_str("会話履歴:\n");
        for turn in recent {
            let speaker = if turn.role == "user" { "ユーザー" } else { "アシスタント" };
            prompt.push_str(&format!("{speaker}: {}\n", turn.content));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("現在の質問: {message}\n回答:"));
    prompt
}

pub fn build_simple_prompt(system_prompt: &str, message: &str) -> String {
    format!("{system_prompt}\n\n質問: {message}\n回答:")
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: Option<ChatReplyMessage>,
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: String,
}

impl ChatReply {
    fn into_text(self) -> Option<String> {
        self.message
            .map(|m| m.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .or_else(|| self.response.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()))
    }
}

/// Servidor de modelos local
#[derive(Debug, Clone)]
pub struct LocalModel {
    client: Client,
    base_url: String,
}

impl LocalModel {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Comprueba que el servidor responde y devuelve los modelos instalados
    pub async fn available_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).timeout(TAGS_TIMEOUT).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                url,
                status: response.status(),
            });
        }

        // Un cuerpo ilegible no invalida el servidor, sólo deja la lista vacía
        let models = match response.json::<TagsResponse>().await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Unexpected model list format");
                Vec::new()
            }
        };

        if !models.iter().any(|m| m.contains(FALLBACK_MODEL)) {
            tracing::debug!(?models, "Preferred local model not installed");
        }
        Ok(models)
    }

    /// Conversación con prompt de sistema e historial reciente
    pub async fn chat(
        &self,
        model: &str,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, ProviderError> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: system_prompt,
        }];
        messages.extend(
            recent_history(history)
                .iter()
                .filter(|turn| !turn.role.is_empty() && !turn.content.is_empty())
                .map(|turn| ChatMessage {
                    role: &turn.role,
                    content: &turn.content,
                }),
        );
        messages.push(ChatMessage {
            role: "user",
            content: message,
        });

        let body = json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": 0.8,
                "top_p": 0.9,
                "repeat_penalty": 1.1
            }
        });

        self.post_chat(model, body, CHAT_TIMEOUT).await
    }

    /// Reintento mínimo: sólo el mensaje, sin prompt de sistema
    pub async fn chat_plain(&self, model: &str, message: &str) -> Result<String, ProviderError> {
        let messages = [ChatMessage {
            role: "user",
            content: message,
        }];
        let body = json!({
            "model": model,
            "messages": messages,
            "stream": false
        });

        self.post_chat(model, body, PLAIN_CHAT_TIMEOUT).await
    }

    async fn post_chat(&self, model: &str, body: Value, timeout: Duration) -> Result<String, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                tracing::warn!(model = %model, "Local model not installed");
            }
            return Err(ProviderError::Status { url, status });
        }

        response
            .json::<ChatReply>()
            .await?
            .into_text()
            .ok_or_else(|| ProviderError::EmptyAnswer(model.to_string()))
    }
}

/// API de inferencia en la nube, probando varios modelos en orden
#[derive(Debug, Clone)]
pub struct CloudModel {
    client: Client,
    base_url: String,
    token: Option<String>,
    models: Vec<String>,
}

impl CloudModel {
    pub fn new(client: Client, base_url: &str, token: Option<String>, models: Vec<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            models,
        }
    }

    /// Primera respuesta útil de la lista de modelos
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut last_error = ProviderError::EmptyAnswer("cloud".to_string());

        for model in &self.models {
            match self.generate_with(model, prompt).await {
                Ok(answer) => {
                    tracing::debug!(model = %model, "Cloud model answered");
                    return Ok(answer);
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "Cloud model failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn generate_with(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}", self.base_url, model);
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_length": 300,
                "temperature": 0.7,
                "do_sample": true,
                "top_p": 0.9,
                "repetition_penalty": 1.2
            }
        });

        let mut request = self.client.post(&url).json(&body).timeout(CLOUD_TIMEOUT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::info!(model = %model, "Cloud model still loading");
        }
        if !status.is_success() {
            return Err(ProviderError::Status { url, status });
        }

        let data: Value = response.json().await?;
        if let Some(message) = data.get("error").and_then(Value::as_str) {
            return Err(ProviderError::Model {
                model: model.to_string(),
                message: message.to_string(),
            });
        }

        data.get(0)
            .and_then(|first| first.get("generated_text"))
            .and_then(Value::as_str)
            .map(|generated| strip_prompt(generated, prompt))
            .filter(|answer| answer.chars().count() > MIN_CLOUD_ANSWER_CHARS)
            .ok_or_else(|| ProviderError::EmptyAnswer(model.to_string()))
    }
}

/// Quita el prompt que algunos modelos repiten al principio
pub fn strip_prompt(generated: &str, prompt: &str) -> String {
    generated.replace(prompt, "").trim().to_string()
}
