use std::sync::Arc;
use std::time::Duration;

use log::Level;
use serde::Serialize;
use serde_json::{json, Value};

use super::config::{EffectiveParams, GenerateOptions, ProviderConfig, ProviderKind};
use super::providers;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::errors::{PalError, Result};
use crate::logging::{fingerprint, log_event};

/// Hard ceiling for a single provider exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub provider: ProviderKind,
    pub healthy: bool,
    pub detail: String,
}

/// Single-attempt bridge to one configured provider.
///
/// The adapter holds no mutable state, so one instance may serve concurrent
/// calls. To switch providers build a new adapter instead of mutating one.
pub struct ModelAdapter {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
}

impl ModelAdapter {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let transport = ReqwestTransport::new().map_err(|err| PalError::Configuration {
            provider: config.provider,
            message: err.to_string(),
        })?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        if config.provider.is_local() && config.api_key.is_some() {
            log::debug!(
                target: "ai.adapter",
                "ignoring API key configured for {}",
                config.provider
            );
        }
        Self { config, transport }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn provider(&self) -> ProviderKind {
        self.config.provider
    }

    pub fn model(&self) -> String {
        self.config.resolved_model()
    }

    /// Generate one reply for `prompt`.
    ///
    /// Missing credentials fail before any request is built. A well-formed
    /// body without a reply field yields `Ok("")` so the conversation keeps
    /// going.
    pub async fn generate(&self, prompt: &str, options: Option<&GenerateOptions>) -> Result<String> {
        self.config.validate()?;
        let params = EffectiveParams::merge(&self.config, options);
        let request = providers::generate_request(&self.config, prompt, &params)?;

        log::debug!(
            target: "ai.adapter",
            "dispatching {} generation model={} prompt_sha={} prompt_chars={}",
            self.config.provider,
            params.model,
            fingerprint(&[prompt]),
            prompt.chars().count()
        );

        let response = self.exchange(request).await?;
        let body = self.decode(&response)?;
        let raw = providers::extract_reply(self.config.provider, &body);
        let reply = providers::truncate_at_stop(&raw, &params.stop);

        if reply.is_empty() {
            log_event(
                Level::Warn,
                Some("AI-0204"),
                "ai.adapter",
                "Provider returned no usable reply text",
                Some("An empty utterance was returned to keep the conversation alive"),
                Some(json!({
                    "provider": self.config.provider,
                    "model": params.model,
                    "raw_chars": raw.chars().count(),
                })),
            );
        }
        Ok(reply)
    }

    /// Local runtimes are checked over the network; cloud providers are only
    /// checked for a configured credential so health checks never spend quota.
    pub async fn health_check(&self) -> HealthStatus {
        let provider = self.config.provider;
        let display = provider.seed().display;
        let status = match self.config.validate() {
            Err(PalError::Configuration { message, .. }) => HealthStatus {
                provider,
                healthy: false,
                detail: format!("{display}: {message}"),
            },
            Err(err) => HealthStatus {
                provider,
                healthy: false,
                detail: err.to_string(),
            },
            Ok(()) if !provider.is_local() => HealthStatus {
                provider,
                healthy: true,
                detail: format!("{display}: credential configured"),
            },
            Ok(()) => match self.fetch_catalog().await {
                Ok(models) => HealthStatus {
                    provider,
                    healthy: true,
                    detail: format!("reachable, {} model(s) available", models.len()),
                },
                Err(err) => HealthStatus {
                    provider,
                    healthy: false,
                    detail: err.to_string(),
                },
            },
        };

        log_event(
            if status.healthy { Level::Info } else { Level::Warn },
            Some("AI-0203"),
            "ai.adapter",
            "Provider health check finished",
            None,
            Some(json!({
                "provider": provider,
                "provider_name": display,
                "healthy": status.healthy,
                "detail": status.detail,
            })),
        );
        status
    }

    /// Models the provider can serve. Providers without a catalogue report
    /// the configured model.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.config.validate()?;
        if !self.config.provider.seed().has_catalog {
            return Ok(vec![self.config.resolved_model()]);
        }
        self.fetch_catalog().await
    }

    async fn fetch_catalog(&self) -> Result<Vec<String>> {
        let Some(request) = providers::catalog_request(&self.config)? else {
            return Ok(vec![self.config.resolved_model()]);
        };
        let response = self.exchange(request).await?;
        let body = self.decode(&response)?;
        Ok(providers::extract_models(&body))
    }

    // The deadline drops the transport future, which tears down the socket.
    async fn exchange(&self, request: HttpRequest) -> Result<HttpResponse> {
        let provider = self.config.provider;
        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.transport.send(request))
            .await
            .map_err(|_| PalError::Timeout {
                provider,
                after: REQUEST_TIMEOUT,
            })?
            .map_err(|err| PalError::Transport {
                provider,
                status: None,
                message: err.to_string(),
            })?;

        if !response.is_success() {
            let message = providers::extract_error_message(&response.body)
                .unwrap_or_else(|| format!("HTTP {}", response.status));
            return Err(PalError::Transport {
                provider,
                status: Some(response.status),
                message,
            });
        }
        Ok(response)
    }

    fn decode(&self, response: &HttpResponse) -> Result<Value> {
        serde_json::from_str(&response.body).map_err(|err| PalError::ResponseParse {
            provider: self.config.provider,
            message: err.to_string(),
        })
    }
}
