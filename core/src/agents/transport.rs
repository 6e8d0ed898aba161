//! HTTP seam between the adapter and the network.
//!
//! [`ModelAdapter`](super::ModelAdapter) only ever talks to a
//! [`HttpTransport`]; production code uses [`ReqwestTransport`], tests swap in
//! an in-memory double. Transports report connection-level failures only.
//! Status codes are handed back untouched so the adapter can decide what a
//! non-2xx answer means for each provider.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection-level failure (DNS, refused connection, broken stream).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// A single request/response exchange. Dropping the returned future must
/// abort the exchange; the adapter relies on that to enforce its deadline.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportFailure> {
        let client = Client::builder()
            .user_agent("PalCore/0.1")
            .build()
            .map_err(|err| TransportFailure(format!("failed to construct HTTP client: {err}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| TransportFailure(redact(&err.without_url().to_string())))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| TransportFailure(redact(&err.without_url().to_string())))?;
        Ok(HttpResponse { status, body })
    }
}

// Gemini carries its key in the query string; keep it out of error text.
fn redact(message: &str) -> String {
    match message.find("key=") {
        Some(idx) => {
            let tail = &message[idx + 4..];
            let end = tail
                .find(|c: char| c == '&' || c == ')' || c.is_whitespace())
                .unwrap_or(tail.len());
            format!("{}key=***{}", &message[..idx], &tail[end..])
        }
        None => message.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_hides_query_keys() {
        assert_eq!(
            redact("error sending request for url (https://x/y?key=abc123)"),
            "error sending request for url (https://x/y?key=***)"
        );
        assert_eq!(redact("connection refused"), "connection refused");
    }

    #[test]
    fn request_builders_attach_headers() {
        let request = HttpRequest::post("http://h/p", serde_json::json!({}))
            .bearer_auth("tok")
            .header("api-key", "k");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.headers,
            vec![
                ("Authorization".to_string(), "Bearer tok".to_string()),
                ("api-key".to_string(), "k".to_string()),
            ]
        );
        assert!(HttpResponse { status: 204, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 401, body: String::new() }.is_success());
    }
}
