//! # Manejo de errores de la API
//!
//! Jerarquía de errores construida con thiserror. Cada variante sabe cómo
//! convertirse en una respuesta JSON `{ "error", "message" }` y registra su
//! contexto con tracing antes de responder.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::error::Error;
use thiserror::Error;

/// Tipos de error de la aplicación con contexto
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de entrada/salida sobre un fichero de datos
    ///
    /// Mantiene la operación que falló y el `std::io::Error` original
    /// para poder seguir la cadena de errores.
    #[error("Error de E/S en operación '{operation}': {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Un fichero JSON existe pero no se puede interpretar
    #[error("JSON inválido en '{file}': {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// Error de validación con campo específico
    #[error("Error de validación en campo '{field}': {message}")]
    ValidationWithField {
        field: String,
        message: String,
    },

    /// Error de validación general
    #[error("Error de validación: {0}")]
    Validation(String),

    /// Error de autorización simple
    #[error("No autorizado: {0}")]
    Unauthorized(String),

    /// Error de recurso no encontrado
    #[error("No encontrado: {resource_type} con ID '{id}'")]
    NotFoundWithId {
        resource_type: String,
        id: String,
    },

    /// Método HTTP no soportado por el recurso
    #[error("Método no permitido: {0}")]
    MethodNotAllowed(String),
}

// Métodos helper para crear errores con contexto
impl AppError {
    /// Crea un error de E/S con contexto de operación
    pub fn io(operation: &str, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            source,
        }
    }

    /// Crea un error de validación con campo específico
    pub fn validation_field(field: &str, message: &str) -> Self {
        Self::ValidationWithField {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Crea un error de no encontrado con ID
    pub fn not_found_id(resource_type: &str, id: &str) -> Self {
        Self::NotFoundWithId {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::ValidationWithField { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFoundWithId { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io { .. } | Self::Json { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Log detallado del error antes de responder
        let body = match self {
            Self::Io { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    error_chain = ?source.source(),
                    "I/O error on data store"
                );
                ErrorResponse::new("データエラー", "サーバー内部でエラーが発生しました")
            }
            Self::Json { file, source } => {
                tracing::error!(
                    file = %file,
                    error = %source,
                    "Corrupted JSON data file"
                );
                ErrorResponse::new("データエラー", "データファイルを読み込めませんでした")
            }
            Self::ValidationWithField { field, message } => {
                tracing::warn!(
                    field = %field,
                    message = %message,
                    "Validation error"
                );
                ErrorResponse::new("入力エラー", format!("{}: {}", field, message))
            }
            Self::Validation(message) => {
                tracing::warn!(message = %message, "Validation error");
                ErrorResponse::new("入力エラー", message.clone())
            }
            Self::Unauthorized(reason) => {
                tracing::warn!(reason = %reason, "Unauthorized access attempt");
                ErrorResponse::new("未ログイン", reason.clone())
            }
            Self::NotFoundWithId { resource_type, id } => {
                tracing::info!(
                    resource_type = %resource_type,
                    id = %id,
                    "Resource not found"
                );
                ErrorResponse::new("見つかりません", format!("{} '{}' が見つかりません", resource_type, id))
            }
            Self::MethodNotAllowed(method) => {
                tracing::info!(method = %method, "Method not allowed");
                ErrorResponse::new("Method not allowed", format!("{} は利用できません", method))
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub trait ResultExt<T> {
    fn map_err_validation(self, message: &str) -> AppResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + 'static,
{
    fn map_err_validation(self, message: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Validation(format!("{}: {}", message, e)))
    }
}
