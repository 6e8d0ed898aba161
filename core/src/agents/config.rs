use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::providers::{self, ProviderSeed};
use crate::errors::PalError;

/// Closed set of supported model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Local,
    Ollama,
    #[serde(rename = "openai")]
    OpenAi,
    Azure,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Local,
        ProviderKind::Ollama,
        ProviderKind::OpenAi,
        ProviderKind::Azure,
        ProviderKind::Gemini,
    ];

    pub fn id(self) -> &'static str {
        self.seed().id
    }

    pub fn seed(self) -> &'static ProviderSeed {
        providers::seed_for(self)
    }

    /// Local runtimes speak the Ollama wire protocol and take no credential.
    pub fn is_local(self) -> bool {
        matches!(self, ProviderKind::Local | ProviderKind::Ollama)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Resolved settings for one adapter instance. Read-only once handed to
/// [`ModelAdapter`](super::ModelAdapter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            api_key: None,
            endpoint: None,
            model: None,
            api_version: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Parse a JSON settings blob and reject it early if it cannot be used.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: ProviderConfig =
            serde_json::from_str(raw).context("provider settings are not valid JSON")?;
        config
            .validate()
            .with_context(|| format!("provider settings for {} are incomplete", config.provider))?;
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Credential check performed before any network traffic.
    pub fn validate(&self) -> crate::errors::Result<()> {
        let seed = self.provider.seed();
        if seed.requires_api_key && self.api_key().is_none() {
            return Err(PalError::Configuration {
                provider: self.provider,
                message: "API key is not configured".to_string(),
            });
        }
        if self.resolved_endpoint().is_none() {
            let message = if seed.requires_api_key {
                "API key is set but the endpoint is not configured"
            } else {
                "endpoint is not configured"
            };
            return Err(PalError::Configuration {
                provider: self.provider,
                message: message.to_string(),
            });
        }
        Ok(())
    }

    /// Non-blank API key, if the provider uses one at all.
    pub fn api_key(&self) -> Option<&str> {
        if self.provider.is_local() {
            return None;
        }
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .or(self.provider.seed().base_url)
            .map(|url| url.trim_end_matches('/').to_string())
    }

    pub fn resolved_model(&self) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(self.provider.seed().default_model)
            .to_string()
    }

    pub fn resolved_api_version(&self) -> &str {
        self.api_version
            .as_deref()
            .unwrap_or(providers::AZURE_API_VERSION)
    }
}

/// Per-call generation overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stop: Vec<String>,
}

/// Parameters after merging call options over instance configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EffectiveParams {
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stop: Vec<String>,
}

impl EffectiveParams {
    pub(crate) fn merge(config: &ProviderConfig, options: Option<&GenerateOptions>) -> Self {
        Self {
            model: config.resolved_model(),
            temperature: options
                .and_then(|o| o.temperature)
                .or(config.temperature),
            max_tokens: options.and_then(|o| o.max_tokens).or(config.max_tokens),
            stop: options.map(|o| o.stop.clone()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_providers_require_a_key() {
        for kind in [ProviderKind::OpenAi, ProviderKind::Gemini] {
            let err = ProviderConfig::new(kind).validate().unwrap_err();
            assert!(matches!(err, PalError::Configuration { .. }));
            assert!(ProviderConfig::new(kind).with_api_key("k").validate().is_ok());
        }
        let blank = ProviderConfig::new(ProviderKind::OpenAi).with_api_key("   ");
        assert!(blank.validate().is_err());
    }

    #[test]
    fn azure_needs_endpoint_as_well_as_key() {
        let keyed = ProviderConfig::new(ProviderKind::Azure).with_api_key("k");
        let err = keyed.validate().unwrap_err();
        assert!(err.to_string().contains("endpoint"));
        assert!(keyed
            .with_endpoint("https://pal.openai.azure.com/")
            .validate()
            .is_ok());
    }

    #[test]
    fn local_providers_ignore_keys() {
        let config = ProviderConfig::new(ProviderKind::Ollama).with_api_key("secret");
        assert!(config.validate().is_ok());
        assert_eq!(config.api_key(), None);
        assert_eq!(
            config.resolved_endpoint().as_deref(),
            Some("http://127.0.0.1:11434")
        );
    }

    #[test]
    fn defaults_fill_missing_model_and_trim_endpoint() {
        let config = ProviderConfig::new(ProviderKind::OpenAi)
            .with_endpoint("https://proxy.example.com/v1/")
            .with_model("  ");
        assert_eq!(config.resolved_model(), "gpt-4o-mini");
        assert_eq!(
            config.resolved_endpoint().as_deref(),
            Some("https://proxy.example.com/v1")
        );
    }

    #[test]
    fn from_json_reads_camel_case_and_validates() {
        let config = ProviderConfig::from_json(
            r#"{"provider":"openai","apiKey":"sk-test","maxTokens":40,"temperature":0.5}"#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.max_tokens, Some(40));

        let err = ProviderConfig::from_json(r#"{"provider":"gemini"}"#).unwrap_err();
        assert!(err.to_string().contains("gemini"));
        assert!(ProviderConfig::from_json(r#"{"provider":"mystery"}"#).is_err());
    }

    #[test]
    fn call_options_override_instance_defaults() {
        let config = ProviderConfig::new(ProviderKind::Ollama)
            .with_temperature(0.3)
            .with_max_tokens(64);
        let options = GenerateOptions {
            temperature: None,
            max_tokens: Some(10),
            stop: vec!["User:".into()],
        };
        let params = EffectiveParams::merge(&config, Some(&options));
        assert_eq!(params.temperature, Some(0.3));
        assert_eq!(params.max_tokens, Some(10));
        assert_eq!(params.stop, vec!["User:".to_string()]);
        assert_eq!(params.model, "llama3.2");
    }
}
