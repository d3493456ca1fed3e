//! # Utilidades de logging para errores
//!
//! Recorre la cadena `source()` de un error y la registra completa. Se usa
//! para los fallos "blandos" que no llegan a convertirse en respuesta HTTP:
//! llamadas a modelos externos que fallan y pasan a la siguiente etapa,
//! lecturas de datos del asistente, etc.

use std::error::Error as StdError;

/// Devuelve los mensajes de la cadena de errores, del más externo al más interno
pub fn error_chain<E>(error: &E) -> Vec<String>
where
    E: StdError + 'static,
{
    let mut chain = Vec::new();
    let mut current: Option<&dyn StdError> = Some(error);

    while let Some(err) = current {
        chain.push(err.to_string());
        current = err.source();
    }

    chain
}

/// Registra la cadena completa de errores
///
/// # Parámetros
/// - `error`: Error a analizar y registrar
/// - `context`: Contexto opcional para añadir información
pub fn log_error_chain<E>(error: &E, context: Option<&str>)
where
    E: StdError + 'static,
{
    let chain = error_chain(error);

    if let Some(ctx) = context {
        tracing::error!(
            context = %ctx,
            error_chain = ?chain,
            "Error with full chain (with context)"
        );
    } else {
        tracing::error!(error_chain = ?chain, "Error with full chain");
    }
}

/// Extension trait para Results que añade logging automático de error chains
///
/// # Ejemplo de uso
/// ```ignore
/// client.get(url).send().await.log_error_context("listing local models")?;
/// ```
pub trait ErrorLogExt<T, E> {
    /// Loggea la cadena de errores con contexto adicional
    fn log_error_context(self, context: &str) -> Result<T, E>;

    /// Loggea la cadena como advertencia; para fallos que tienen alternativa
    fn log_soft_failure(self, context: &str) -> Result<T, E>;
}

impl<T, E> ErrorLogExt<T, E> for Result<T, E>
where
    E: StdError + 'static,
{
    fn log_error_context(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            log_error_chain(error, Some(context));
        }
        self
    }

    fn log_soft_failure(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            tracing::warn!(
                context = %context,
                error_chain = ?error_chain(error),
                "Soft failure, falling through"
            );
        }
        self
    }
}
