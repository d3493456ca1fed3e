//! # Disparador del reinicio diario
//!
//! Llama a `POST /api/daily-reset` del servidor en marcha. Pensado para cron:
//!
//! ```text
//! 5 0 * * * /usr/local/bin/daily_reset >> /var/log/cafeteria-reset.log 2>&1
//! ```
//!
//! `RESET_URL` cambia el destino (default: http://localhost:8080/api/daily-reset).
//! Sale con código 1 si la petición falla o el servidor no responde 2xx.

use std::process::ExitCode;
use std::time::Duration;

use serde_json::Value;

const DEFAULT_RESET_URL: &str = "http://localhost:8080/api/daily-reset";
const TIMEOUT: Duration = Duration::from_secs(30);

async fn trigger(url: &str) -> Result<Value, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
    client
        .post(url)
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let url = std::env::var("RESET_URL").unwrap_or_else(|_| DEFAULT_RESET_URL.to_string());
    tracing::info!(%url, "Triggering daily reset");

    match trigger(&url).await {
        Ok(body) => {
            tracing::info!(
                date = %body["date"],
                featured = %body["featured"],
                people = %body["sales"]["totalPeople"],
                "Daily reset done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, status = ?e.status(), "Daily reset failed");
            ExitCode::FAILURE
        }
    }
}
