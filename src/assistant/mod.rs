//! # Asistente de chat del comedor
//!
//! Cada mensaje pasa por tres etapas y gana la primera que contesta:
//!
//! 1. [`lookup`] - respuestas deterministas con los datos del día
//! 2. [`providers`] - modelo local y, si está habilitado, modelo en la nube
//! 3. [`fallback`] - árbol de respuestas por reglas, que siempre contesta
//!
//! La aleatoriedad de las respuestas sale de un `StdRng` propio del
//! generador, que los tests siembran con [`ResponseGenerator::with_seed`].

pub mod fallback;
pub mod intent;
pub mod lookup;
pub mod providers;

use chrono::NaiveDateTime;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::api::middleware::ErrorLogExt;
use crate::config::AiConfig;
use crate::core::hours::BusinessHours;
use crate::db::store::Result;
use crate::db::JsonStore;
use fallback::FallbackInput;
use lookup::CafeteriaSnapshot;
use providers::{CloudModel, LocalModel};

/// Respuestas de modelo con esta longitud o menos se descartan
const MIN_MODEL_ANSWER_CHARS: usize = 10;

/// Un turno del historial que envía el cliente
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Etapa que produjo la respuesta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    CafeteriaData,
    LocalModel,
    CloudModel,
    Basic,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
    /// El servidor local respondió con su lista de modelos
    pub local_available: bool,
    /// Había algún proveedor externo utilizable
    pub models_available: bool,
}

/// Elección uniforme entre respuestas enlatadas
pub(crate) fn pick<'a>(rng: &mut impl Rng, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

fn usable(answer: &str) -> bool {
    answer.trim().chars().count() > MIN_MODEL_ANSWER_CHARS
}

#[derive(Clone)]
pub struct ResponseGenerator {
    system_prompt: String,
    local: Option<LocalModel>,
    cloud: Option<CloudModel>,
    hours: BusinessHours,
    rng: Arc<Mutex<StdRng>>,
}

impl ResponseGenerator {
    pub fn new(config: &AiConfig) -> Self {
        Self::build(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: &AiConfig, seed: u64) -> Self {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: &AiConfig, rng: StdRng) -> Self {
        let client = reqwest::Client::new();

        let local = config
            .local_enabled
            .then(|| LocalModel::new(client.clone(), &config.local_url));
        let cloud = config.cloud_enabled.then(|| {
            CloudModel::new(
                client.clone(),
                &config.cloud_url,
                config.cloud_token.clone(),
                config.cloud_models.clone(),
            )
        });

        Self {
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| providers::DEFAULT_SYSTEM_PROMPT.to_string()),
            local,
            cloud,
            hours: BusinessHours::default(),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn hours(&self) -> &BusinessHours {
        &self.hours
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// Genera la respuesta a `message`
    ///
    /// # Errores
    /// Sólo los errores al leer los datos del comedor; los fallos de los
    /// modelos externos se registran y se pasa a la siguiente etapa.
    pub async fn respond(
        &self,
        store: &JsonStore,
        message: &str,
        history: &[ChatTurn],
        use_models: bool,
        now: NaiveDateTime,
    ) -> Result<Reply> {
        let snapshot = CafeteriaSnapshot::load(store, now.date()).await?;
        let lower = message.to_lowercase();

        let local_models = match &self.local {
            Some(local) => local
                .available_models()
                .await
                .log_soft_failure("listing local models")
                .ok(),
            None => None,
        };
        let local_available = local_models.is_some();
        let models_available = local_available || self.cloud.is_some();

        let reply = |text: String, source: ReplySource| Reply {
            text,
            source,
            local_available,
            models_available,
        };

        if let Some(text) = self.with_rng(|rng| lookup::answer(&snapshot, &lower, rng)) {
            return Ok(reply(text, ReplySource::CafeteriaData));
        }

        if use_models {
            if let (Some(local), Some(models)) = (&self.local, &local_models) {
                if let Some(text) = self.ask_local(local, models, history, message).await {
                    return Ok(reply(text, ReplySource::LocalModel));
                }
            }

            if let Some(cloud) = &self.cloud {
                if let Some(text) = self.ask_cloud(cloud, history, message).await {
                    return Ok(reply(text, ReplySource::CloudModel));
                }
            }
        }

        let input = FallbackInput {
            message: &lower,
            history,
            snapshot: &snapshot,
            hours: &self.hours,
            now,
        };
        let text = self.with_rng(|rng| fallback::respond(&input, rng));
        Ok(reply(text, ReplySource::Basic))
    }

    async fn ask_local(
        &self,
        local: &LocalModel,
        models: &[String],
        history: &[ChatTurn],
        message: &str,
    ) -> Option<String> {
        let model = providers::choose_model(models);

        let answer = local
            .chat(&model, &self.system_prompt, history, message)
            .await
            .log_soft_failure("local model chat")
            .ok()
            .filter(|a| usable(a));
        if answer.is_some() {
            return answer;
        }

        tracing::info!(model = %model, "Retrying local model without system prompt");
        local
            .chat_plain(&model, message)
            .await
            .log_soft_failure("local model plain chat")
            .ok()
            .filter(|a| usable(a))
    }

    async fn ask_cloud(&self, cloud: &CloudModel, history: &[ChatTurn], message: &str) -> Option<String> {
        let prompts = [
            providers::build_prompt_with_history(&self.system_prompt, history, message),
            providers::build_simple_prompt(&self.system_prompt, message),
        ];

        for prompt in &prompts {
            let answer = cloud
                .generate(prompt)
                .await
                .log_soft_failure("cloud model generation")
                .ok()
                .filter(|a| usable(a));
            if answer.is_some() {
                return answer;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;
    use crate::db::{DailyMenu, Holiday};
    use crate::test_utils::{ModelStub, TestDir};
    use chrono::NaiveDate;
    use serde_json::json;

    const QUESTION: &str = "試験勉強のコツを教えて";
    const LOCAL_ANSWER: &str = "過去問を時間を計って解くのがおすすめです。";
    const CLOUD_ANSWER: &str = "短い時間で何度も復習すると覚えやすいですよ。";

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn data_lookup_wins() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        store
            .daily_menu()
            .save(&vec![DailyMenu {
                date: "2026-10-19".into(),
                food: "唐揚げ定食".into(),
            }])
            .await
            .unwrap();

        let generator = ResponseGenerator::with_seed(&AiConfig::disabled(), 1);
        let reply = generator
            .respond(&store, "今日のメニューは？", &[], true, now())
            .await
            .unwrap();

        assert_eq!(reply.source, ReplySource::CafeteriaData);
        assert!(reply.text.contains("唐揚げ定食"));
        assert!(!reply.local_available);
    }

    #[tokio::test]
    async fn holiday_reason_is_reported() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        store
            .holidays()
            .save(&vec![Holiday {
                date: "2026-10-19".into(),
                reason: Some("設備点検".into()),
                extra: Default::default(),
            }])
            .await
            .unwrap();

        let generator = ResponseGenerator::with_seed(&AiConfig::disabled(), 2);
        let reply = generator
            .respond(&store, "Holiday today?", &[], true, now())
            .await
            .unwrap();

        assert!(reply.text.contains("設備点検"));
    }

    #[tokio::test]
    async fn without_models_falls_back_to_rules() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();

        let generator = ResponseGenerator::with_seed(&AiConfig::disabled(), 3);
        let reply = generator
            .respond(&store, "こんにちは", &[], true, now())
            .await
            .unwrap();

        assert_eq!(reply.source, ReplySource::Basic);
        assert!(!reply.models_available);
        assert!(reply.text.starts_with("こんにちは"));
    }

    #[tokio::test]
    async fn same_seed_same_reply() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();

        let a = ResponseGenerator::with_seed(&AiConfig::disabled(), 9);
        let b = ResponseGenerator::with_seed(&AiConfig::disabled(), 9);
        let ra = a.respond(&store, "ok", &[], false, now()).await.unwrap();
        let rb = b.respond(&store, "ok", &[], false, now()).await.unwrap();
        assert_eq!(ra.text, rb.text);
    }

    #[tokio::test]
    async fn corrupted_data_is_an_error() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        std::fs::write(store.holidays().path(), "[{").unwrap();

        let generator = ResponseGenerator::with_seed(&AiConfig::disabled(), 4);
        assert!(generator
            .respond(&store, "hello", &[], true, now())
            .await
            .is_err());
    }

    fn stub_config(stub: &ModelStub, local: bool, cloud_models: &[&str]) -> AiConfig {
        AiConfig {
            local_enabled: local,
            local_url: stub.url().to_string(),
            cloud_enabled: !cloud_models.is_empty(),
            cloud_url: stub.url().to_string(),
            cloud_token: Some("hf_test".into()),
            cloud_models: cloud_models.iter().map(|m| m.to_string()).collect(),
            system_prompt: Some("SYS".into()),
        }
    }

    fn installed() -> Option<serde_json::Value> {
        Some(json!({"models": [{"name": "phi3:latest"}, {"name": "llama3:8b"}]}))
    }

    #[actix_web::test]
    async fn local_model_answer_beats_rules() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        let stub = ModelStub::start(
            installed(),
            vec![(200, json!({"message": {"content": LOCAL_ANSWER}}))],
            vec![],
        );
        let history = [
            ChatTurn { role: "user".into(), content: "こんにちは".into() },
            ChatTurn { role: "assistant".into(), content: "こんにちは！".into() },
        ];

        let generator = ResponseGenerator::with_seed(&stub_config(&stub, true, &[]), 5);
        let reply = generator
            .respond(&store, QUESTION, &history, true, now())
            .await
            .unwrap();

        assert_eq!(reply.source, ReplySource::LocalModel);
        assert_eq!(reply.text, LOCAL_ANSWER);
        assert!(reply.local_available);
        assert!(reply.models_available);

        let requests = stub.chat_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["model"], "llama3:8b");
        let messages = requests[0]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "SYS");
        assert_eq!(messages[3]["content"], QUESTION);

        stub.stop().await;
    }

    #[actix_web::test]
    async fn short_local_answer_is_retried_without_system_prompt() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        let stub = ModelStub::start(
            installed(),
            vec![
                (200, json!({"message": {"content": "0123456789"}})),
                (200, json!({"response": LOCAL_ANSWER})),
            ],
            vec![],
        );

        let generator = ResponseGenerator::with_seed(&stub_config(&stub, true, &[]), 6);
        let reply = generator.respond(&store, QUESTION, &[], true, now()).await.unwrap();

        assert_eq!(reply.source, ReplySource::LocalModel);
        assert_eq!(reply.text, LOCAL_ANSWER);

        let requests = stub.chat_requests();
        assert_eq!(requests.len(), 2);
        let plain = requests[1]["messages"].as_array().unwrap();
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0]["role"], "user");
        assert_eq!(plain[0]["content"], QUESTION);

        stub.stop().await;
    }

    #[actix_web::test]
    async fn failing_local_model_falls_through_to_cloud_in_order() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        let echoed = format!(
            "{}{}",
            providers::build_prompt_with_history("SYS", &[], QUESTION),
            CLOUD_ANSWER
        );
        let stub = ModelStub::start(
            installed(),
            vec![(404, json!({"error": "model not found"}))],
            vec![
                ("org/loading", 503, json!({"error": "Model is currently loading"})),
                ("org/terse", 200, json!([{"generated_text": "はい"}])),
                ("org/good", 200, json!([{"generated_text": echoed}])),
            ],
        );

        let config = stub_config(&stub, true, &["org/loading", "org/terse", "org/good"]);
        let generator = ResponseGenerator::with_seed(&config, 7);
        let reply = generator.respond(&store, QUESTION, &[], true, now()).await.unwrap();

        assert_eq!(reply.source, ReplySource::CloudModel);
        assert_eq!(reply.text, CLOUD_ANSWER);
        assert!(reply.local_available);
        // Conversación completa y reintento plano, ambos fallidos
        assert_eq!(stub.chat_requests().len(), 2);
        assert_eq!(stub.cloud_calls(), vec!["org/loading", "org/terse", "org/good"]);

        stub.stop().await;
    }

    #[actix_web::test]
    async fn every_model_failing_uses_rules() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        let stub = ModelStub::start(
            None,
            vec![(200, json!({"message": {"content": LOCAL_ANSWER}}))],
            vec![
                ("org/loading", 503, json!({"error": "Model is currently loading"})),
                ("org/broken", 200, json!({"error": "internal failure"})),
            ],
        );

        let config = stub_config(&stub, true, &["org/loading", "org/broken"]);
        let generator = ResponseGenerator::with_seed(&config, 8);
        let reply = generator.respond(&store, QUESTION, &[], true, now()).await.unwrap();

        assert_eq!(reply.source, ReplySource::Basic);
        assert!(!reply.text.is_empty());
        assert!(!reply.local_available);
        assert!(reply.models_available);
        assert!(stub.chat_requests().is_empty());
        // Prompt con historial y prompt simple, cada uno recorre la lista
        assert_eq!(
            stub.cloud_calls(),
            vec!["org/loading", "org/broken", "org/loading", "org/broken"]
        );

        stub.stop().await;
    }

    #[actix_web::test]
    async fn models_are_skipped_when_not_requested_or_data_answers() {
        let dir = TestDir::new();
        let store = JsonStore::init(dir.path()).await.unwrap();
        let stub = ModelStub::start(
            installed(),
            vec![(200, json!({"message": {"content": LOCAL_ANSWER}}))],
            vec![("org/good", 200, json!([{"generated_text": CLOUD_ANSWER}]))],
        );
        let generator = ResponseGenerator::with_seed(&stub_config(&stub, true, &["org/good"]), 9);

        let reply = generator.respond(&store, QUESTION, &[], false, now()).await.unwrap();
        assert_eq!(reply.source, ReplySource::Basic);
        assert!(reply.local_available);

        let reply = generator
            .respond(&store, "今日のメニューは？", &[], true, now())
            .await
            .unwrap();
        assert_eq!(reply.source, ReplySource::CafeteriaData);

        assert!(stub.chat_requests().is_empty());
        assert!(stub.cloud_calls().is_empty());

        stub.stop().await;
    }

    #[test]
    fn short_model_answers_are_rejected() {
        assert!(!usable("はい"));
        assert!(!usable("   0123456789   "));
        assert!(usable("本日の定食はカレーライスです"));
    }
}
