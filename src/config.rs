//! # Configuración
//!
//! Todo se lee de variables de entorno (cargadas desde `.env` con dotenvy en
//! `main`). Un valor ausente usa el valor por defecto; un valor inválido se
//! avisa por log y también cae al valor por defecto.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

/// Modelos de Hugging Face probados en orden
pub const DEFAULT_CLOUD_MODELS: &[&str] = &[
    "microsoft/DialoGPT-medium",
    "gpt2",
    "distilgpt2",
    "facebook/blenderbot-400M-distill",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub ai: AiConfig,
}

/// Proveedores de texto externos del asistente
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub local_enabled: bool,
    pub local_url: String,
    pub cloud_enabled: bool,
    pub cloud_url: String,
    pub cloud_token: Option<String>,
    pub cloud_models: Vec<String>,
    pub system_prompt: Option<String>,
}

impl AiConfig {
    /// Sin proveedores externos: sólo datos y respuestas por reglas
    pub fn disabled() -> Self {
        Self {
            local_enabled: false,
            cloud_enabled: false,
            ..Self::default()
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_url: "http://localhost:11434".to_string(),
            cloud_enabled: false,
            cloud_url: "https://api-inference.huggingface.co".to_string(),
            cloud_token: None,
            cloud_models: DEFAULT_CLOUD_MODELS.iter().map(|m| m.to_string()).collect(),
            system_prompt: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: PathBuf::from("./data"),
            static_dir: PathBuf::from("./static"),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    /// Construye la configuración desde el entorno
    ///
    /// # Variables de entorno
    ///
    /// - `BIND_ADDRESS`: Dirección y puerto del servidor (default: 0.0.0.0:8080)
    /// - `DATA_DIR`: Directorio de los ficheros JSON (default: ./data)
    /// - `STATIC_DIR`: Frontend estático (default: ./static)
    /// - `AI_LOCAL_ENABLED` / `AI_LOCAL_URL`: Ollama local
    /// - `AI_CLOUD_ENABLED` / `AI_CLOUD_URL` / `AI_CLOUD_TOKEN` / `AI_CLOUD_MODELS`: Hugging Face
    /// - `AI_SYSTEM_PROMPT`: sustituye el prompt de sistema por defecto
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let cloud_models = var("AI_CLOUD_MODELS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|models| !models.is_empty())
            .unwrap_or(defaults.ai.cloud_models);

        Config {
            bind_address: var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            data_dir: var("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            static_dir: var("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            ai: AiConfig {
                local_enabled: parse_or("AI_LOCAL_ENABLED", defaults.ai.local_enabled),
                local_url: var("AI_LOCAL_URL").unwrap_or(defaults.ai.local_url),
                cloud_enabled: parse_or("AI_CLOUD_ENABLED", defaults.ai.cloud_enabled),
                cloud_url: var("AI_CLOUD_URL").unwrap_or(defaults.ai.cloud_url),
                cloud_token: var("AI_CLOUD_TOKEN"),
                cloud_models,
                system_prompt: var("AI_SYSTEM_PROMPT"),
            },
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {key} value '{raw}': {e}, using default: {default}");
            default
        }),
    }
}
