//! Caller-side composition of the prompt builder and one or more model
//! adapters.
//!
//! The adapters themselves never retry. This manager owns the fallback
//! policy: the primary adapter is tried first and each failure moves on to
//! the next configured adapter, with every attempt written to the event log.

use std::sync::Arc;

use log::Level;
use serde::Serialize;

use crate::agents::{ModelAdapter, ProviderKind};
use crate::errors::{PalError, Result};
use crate::logging::log_event;
use crate::prompt::{CompanionState, PromptBuilder, Stage};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanionReply {
    pub text: String,
    pub stage: Stage,
    pub provider: ProviderKind,
    pub model: String,
}

#[derive(Clone)]
pub struct ModelManager {
    builder: PromptBuilder,
    adapters: Vec<Arc<ModelAdapter>>,
}

impl ModelManager {
    pub fn new(builder: PromptBuilder, primary: Arc<ModelAdapter>) -> Self {
        Self {
            builder,
            adapters: vec![primary],
        }
    }

    /// Append an adapter to try when every earlier one has failed.
    pub fn with_fallback(mut self, adapter: Arc<ModelAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn builder(&self) -> &PromptBuilder {
        &self.builder
    }

    pub fn adapters(&self) -> &[Arc<ModelAdapter>] {
        &self.adapters
    }

    /// Build the stage prompt once and run it through the adapters in order.
    pub async fn reply(&self, state: &CompanionState, user_message: &str) -> Result<CompanionReply> {
        let plan = self.builder.build(state, user_message);
        let options = plan.options();

        let mut last_err: Option<PalError> = None;
        for (attempt, adapter) in self.adapters.iter().enumerate() {
            if attempt > 0 {
                log_event(
                    Level::Info,
                    Some("AI-0202"),
                    "ai.runtime",
                    "Falling back to next provider",
                    None,
                    Some(serde_json::json!({
                        "attempt": attempt + 1,
                        "provider": adapter.provider(),
                    })),
                );
            }
            match adapter.generate(&plan.prompt, Some(&options)).await {
                Ok(text) => {
                    log_invocation_success(adapter, plan.stage, &text);
                    return Ok(CompanionReply {
                        text,
                        stage: plan.stage,
                        provider: adapter.provider(),
                        model: adapter.model(),
                    });
                }
                Err(err) => {
                    log_invocation_failure(adapter, &err);
                    last_err = Some(err);
                }
            }
        }

        // `new` always installs a primary adapter, so at least one attempt ran.
        Err(last_err.unwrap_or_else(|| PalError::Configuration {
            provider: ProviderKind::Local,
            message: "no model adapter configured".to_string(),
        }))
    }
}

fn log_invocation_success(adapter: &ModelAdapter, stage: Stage, text: &str) {
    let preview = text.chars().take(200).collect::<String>();
    log_event(
        Level::Info,
        Some("AI-0200"),
        "ai.runtime",
        "AI generation succeeded",
        None,
        Some(serde_json::json!({
            "provider": adapter.provider(),
            "model": adapter.model(),
            "stage": stage,
            "preview": preview,
        })),
    );
}

fn log_invocation_failure(adapter: &ModelAdapter, error: &PalError) {
    log_event(
        Level::Warn,
        Some("AI-0201"),
        "ai.runtime",
        "AI provider invocation failed",
        Some(error.explain()),
        Some(serde_json::json!({
            "provider": adapter.provider(),
            "model": adapter.model(),
            "error_code": error.code(),
            "error": error.to_string(),
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::transport::testing::ScriptedTransport;
    use crate::agents::ProviderConfig;

    #[tokio::test]
    async fn primary_reply_carries_stage_and_limits() {
        let transport = ScriptedTransport::new().reply(200, r#"{"response":"goo"}"#);
        let adapter = Arc::new(ModelAdapter::with_transport(
            ProviderConfig::new(ProviderKind::Ollama),
            transport.clone(),
        ));
        let manager = ModelManager::new(PromptBuilder::new(), adapter);

        let reply = manager
            .reply(&CompanionState::with_level(0), "hi")
            .await
            .unwrap();
        assert_eq!(reply.text, "goo");
        assert_eq!(reply.stage, Stage::Sensorimotor);
        assert_eq!(reply.provider, ProviderKind::Ollama);

        let sent = transport.requests();
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["options"]["num_predict"], serde_json::json!(10));
        assert!(body["prompt"].as_str().unwrap().contains("User says: \"hi\""));
    }

    #[tokio::test]
    async fn falls_back_after_primary_failure() {
        let unconfigured = Arc::new(ModelAdapter::with_transport(
            ProviderConfig::new(ProviderKind::OpenAi),
            ScriptedTransport::new(),
        ));
        let local = ScriptedTransport::new().reply(200, r#"{"response":"ball!"}"#);
        let fallback = Arc::new(ModelAdapter::with_transport(
            ProviderConfig::new(ProviderKind::Local),
            local,
        ));
        let manager = ModelManager::new(PromptBuilder::new(), unconfigured).with_fallback(fallback);

        let reply = manager
            .reply(&CompanionState::with_level(3), "hi")
            .await
            .unwrap();
        assert_eq!(reply.text, "ball!");
        assert_eq!(reply.provider, ProviderKind::Local);
        assert_eq!(reply.model, "tinyllama");
    }

    #[tokio::test]
    async fn last_error_surfaces_when_all_fail() {
        let first = Arc::new(ModelAdapter::with_transport(
            ProviderConfig::new(ProviderKind::Ollama),
            ScriptedTransport::new().fail("connection refused"),
        ));
        let second = Arc::new(ModelAdapter::with_transport(
            ProviderConfig::new(ProviderKind::Gemini),
            ScriptedTransport::new(),
        ));
        let manager = ModelManager::new(PromptBuilder::new(), first).with_fallback(second);

        let err = manager
            .reply(&CompanionState::with_level(12), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, PalError::Configuration { provider: ProviderKind::Gemini, .. }));
    }
}
