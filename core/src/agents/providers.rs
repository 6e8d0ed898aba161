//! Static provider catalogue plus the wire-format knowledge for each backend:
//! request envelopes, URLs, auth placement and where the reply text lives.

use serde_json::{json, Value};

use super::config::{EffectiveParams, ProviderConfig, ProviderKind};
use super::transport::HttpRequest;
use crate::errors::{PalError, Result};

pub const AZURE_API_VERSION: &str = "2024-02-15-preview";

#[derive(Debug)]
pub struct ProviderSeed {
    pub kind: ProviderKind,
    pub id: &'static str,
    pub display: &'static str,
    pub base_url: Option<&'static str>,
    pub default_model: &'static str,
    pub requires_api_key: bool,
    pub has_catalog: bool,
}

pub static PROVIDER_SEEDS: [ProviderSeed; 5] = [
    ProviderSeed {
        kind: ProviderKind::Local,
        id: "local",
        display: "Bundled local model",
        base_url: Some("http://127.0.0.1:8080"),
        default_model: "tinyllama",
        requires_api_key: false,
        has_catalog: true,
    },
    ProviderSeed {
        kind: ProviderKind::Ollama,
        id: "ollama",
        display: "Ollama",
        base_url: Some("http://127.0.0.1:11434"),
        default_model: "llama3.2",
        requires_api_key: false,
        has_catalog: true,
    },
    ProviderSeed {
        kind: ProviderKind::OpenAi,
        id: "openai",
        display: "OpenAI",
        base_url: Some("https://api.openai.com/v1"),
        default_model: "gpt-4o-mini",
        requires_api_key: true,
        has_catalog: false,
    },
    ProviderSeed {
        kind: ProviderKind::Azure,
        id: "azure",
        display: "Azure OpenAI",
        base_url: None,
        default_model: "gpt-4o-mini",
        requires_api_key: true,
        has_catalog: false,
    },
    ProviderSeed {
        kind: ProviderKind::Gemini,
        id: "gemini",
        display: "Google Gemini",
        base_url: Some("https://generativelanguage.googleapis.com/v1beta"),
        default_model: "gemini-1.5-flash",
        requires_api_key: true,
        has_catalog: false,
    },
];

pub fn seed_for(kind: ProviderKind) -> &'static ProviderSeed {
    // Seeds are declared in the same order as `ProviderKind::ALL`.
    let idx = ProviderKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default();
    &PROVIDER_SEEDS[idx]
}

/// Build the generation request for the configured provider.
pub(crate) fn generate_request(
    config: &ProviderConfig,
    prompt: &str,
    params: &EffectiveParams,
) -> Result<HttpRequest> {
    let base = endpoint(config)?;
    let request = match config.provider {
        ProviderKind::Local | ProviderKind::Ollama => {
            let mut options = serde_json::Map::new();
            insert_opt(&mut options, "temperature", params.temperature.map(Value::from));
            insert_opt(&mut options, "num_predict", params.max_tokens.map(Value::from));
            if !params.stop.is_empty() {
                options.insert("stop".into(), json!(params.stop));
            }
            HttpRequest::post(
                format!("{base}/api/generate"),
                json!({
                    "model": params.model,
                    "prompt": prompt,
                    "stream": false,
                    "options": options,
                }),
            )
        }
        ProviderKind::OpenAi => {
            let mut body = json!({
                "model": params.model,
                "messages": [{"role": "user", "content": prompt}],
            });
            apply_chat_params(&mut body, params, true);
            HttpRequest::post(format!("{base}/chat/completions"), body)
                .bearer_auth(require_key(config)?)
        }
        ProviderKind::Azure => {
            let mut body = json!({
                "messages": [{"role": "user", "content": prompt}],
            });
            apply_chat_params(&mut body, params, false);
            HttpRequest::post(
                format!(
                    "{base}/openai/deployments/{}/chat/completions?api-version={}",
                    params.model,
                    config.resolved_api_version()
                ),
                body,
            )
            .header("api-key", require_key(config)?)
        }
        ProviderKind::Gemini => {
            let mut generation = serde_json::Map::new();
            insert_opt(&mut generation, "temperature", params.temperature.map(Value::from));
            insert_opt(
                &mut generation,
                "maxOutputTokens",
                params.max_tokens.map(Value::from),
            );
            if !params.stop.is_empty() {
                generation.insert("stopSequences".into(), json!(params.stop));
            }
            HttpRequest::post(
                format!(
                    "{base}/models/{}:generateContent?key={}",
                    params.model,
                    require_key(config)?
                ),
                json!({
                    "contents": [{"parts": [{"text": prompt}]}],
                    "generationConfig": generation,
                }),
            )
        }
    };
    Ok(request)
}

/// Model catalogue request; only local runtimes expose one.
pub(crate) fn catalog_request(config: &ProviderConfig) -> Result<Option<HttpRequest>> {
    if !config.provider.seed().has_catalog {
        return Ok(None);
    }
    Ok(Some(HttpRequest::get(format!("{}/api/tags", endpoint(config)?))))
}

/// Pull the reply text out of a decoded body. Missing fields yield `""`.
pub(crate) fn extract_reply(kind: ProviderKind, body: &Value) -> String {
    let text = match kind {
        ProviderKind::Local | ProviderKind::Ollama => body.get("response"),
        ProviderKind::OpenAi | ProviderKind::Azure => body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content")),
        ProviderKind::Gemini => body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|cand| cand.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.get(0))
            .and_then(|part| part.get("text")),
    };
    text.and_then(Value::as_str).unwrap_or_default().to_string()
}

pub(crate) fn extract_models(body: &Value) -> Vec<String> {
    body.get("models")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m.get("name").or_else(|| m.get("model")))
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Provider-supplied error text from a failed response, if any.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

/// Cut a reply at the first stop sequence, for envelopes without native stop
/// support and for providers that echo the sequence back.
pub(crate) fn truncate_at_stop(reply: &str, stop: &[String]) -> String {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| reply.find(s.as_str()))
        .min()
        .unwrap_or(reply.len());
    reply[..cut].trim().to_string()
}

fn endpoint(config: &ProviderConfig) -> Result<String> {
    config
        .resolved_endpoint()
        .ok_or_else(|| PalError::Configuration {
            provider: config.provider,
            message: "endpoint is not configured".to_string(),
        })
}

fn require_key(config: &ProviderConfig) -> Result<&str> {
    config.api_key().ok_or_else(|| PalError::Configuration {
        provider: config.provider,
        message: "API key is not configured".to_string(),
    })
}

fn apply_chat_params(body: &mut Value, params: &EffectiveParams, with_stop: bool) {
    if let Some(map) = body.as_object_mut() {
        insert_opt(map, "temperature", params.temperature.map(Value::from));
        insert_opt(map, "max_tokens", params.max_tokens.map(Value::from));
        if with_stop && !params.stop.is_empty() {
            map.insert("stop".into(), json!(params.stop));
        }
    }
}

fn insert_opt(map: &mut serde_json::Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::GenerateOptions;

    fn params(config: &ProviderConfig) -> EffectiveParams {
        let options = GenerateOptions {
            temperature: Some(0.5),
            max_tokens: Some(30),
            stop: vec!["User:".into()],
        };
        EffectiveParams::merge(config, Some(&options))
    }

    #[test]
    fn seeds_line_up_with_kinds() {
        for kind in ProviderKind::ALL {
            assert_eq!(seed_for(kind).kind, kind);
        }
    }

    #[test]
    fn ollama_envelope_uses_num_predict() {
        let config = ProviderConfig::new(ProviderKind::Ollama);
        let request = generate_request(&config, "hello", &params(&config)).unwrap();
        assert_eq!(request.url, "http://127.0.0.1:11434/api/generate");
        assert!(request.headers.is_empty());
        let body = request.body.unwrap();
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["prompt"], json!("hello"));
        assert_eq!(body["options"]["num_predict"], json!(30));
        assert_eq!(body["options"]["stop"], json!(["User:"]));
    }

    #[test]
    fn openai_envelope_carries_bearer_and_stop() {
        let config = ProviderConfig::new(ProviderKind::OpenAi).with_api_key("sk-1");
        let request = generate_request(&config, "hello", &params(&config)).unwrap();
        assert_eq!(request.url, "https://api.openai.com/v1/chat/completions");
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), "Bearer sk-1".to_string())));
        let body = request.body.unwrap();
        assert_eq!(body["messages"][0]["role"], json!("user"));
        assert_eq!(body["max_tokens"], json!(30));
        assert_eq!(body["stop"], json!(["User:"]));
    }

    #[test]
    fn azure_url_embeds_deployment_and_version() {
        let config = ProviderConfig::new(ProviderKind::Azure)
            .with_api_key("az")
            .with_endpoint("https://pal.openai.azure.com/")
            .with_model("pal-deploy");
        let request = generate_request(&config, "hello", &params(&config)).unwrap();
        assert_eq!(
            request.url,
            "https://pal.openai.azure.com/openai/deployments/pal-deploy/chat/completions?api-version=2024-02-15-preview"
        );
        assert!(request
            .headers
            .contains(&("api-key".to_string(), "az".to_string())));
        let body = request.body.unwrap();
        assert!(body.get("model").is_none());
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn gemini_key_goes_in_query() {
        let config = ProviderConfig::new(ProviderKind::Gemini).with_api_key("g-key");
        let request = generate_request(&config, "hello", &params(&config)).unwrap();
        assert!(request
            .url
            .ends_with("/models/gemini-1.5-flash:generateContent?key=g-key"));
        assert!(request.headers.is_empty());
        let body = request.body.unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], json!("hello"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], json!(30));
        assert_eq!(body["generationConfig"]["stopSequences"], json!(["User:"]));
    }

    #[test]
    fn reply_paths_default_to_empty() {
        let gemini = json!({"candidates": [{"content": {"parts": [{"text": "hey"}]}}]});
        assert_eq!(extract_reply(ProviderKind::Gemini, &gemini), "hey");
        let openai = json!({"choices": [{"message": {"content": "yo"}}]});
        assert_eq!(extract_reply(ProviderKind::Azure, &openai), "yo");
        assert_eq!(extract_reply(ProviderKind::OpenAi, &json!({"choices": []})), "");
        assert_eq!(extract_reply(ProviderKind::Ollama, &json!({"response": 3})), "");
    }

    #[test]
    fn error_messages_come_from_either_shape() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"Invalid API key"}}"#).as_deref(),
            Some("Invalid API key")
        );
        assert_eq!(
            extract_error_message(r#"{"error":"model 'x' not found"}"#).as_deref(),
            Some("model 'x' not found")
        );
        assert_eq!(extract_error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn truncation_uses_earliest_stop() {
        let stop = vec!["User:".to_string(), "\nPal:".to_string()];
        assert_eq!(truncate_at_stop(" ba ba\nPal: goo User: hi", &stop), "ba ba");
        assert_eq!(truncate_at_stop("mama", &stop), "mama");
        assert_eq!(truncate_at_stop("mama", &[String::new()]), "mama");
    }

    #[test]
    fn catalog_models_are_listed_by_name() {
        let body = json!({"models": [{"name": "llama3.2:latest"}, {"model": "phi3"}, {}]});
        assert_eq!(extract_models(&body), vec!["llama3.2:latest", "phi3"]);
        let config = ProviderConfig::new(ProviderKind::OpenAi).with_api_key("k");
        assert!(catalog_request(&config).unwrap().is_none());
    }
}
