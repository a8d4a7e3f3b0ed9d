//! Provider gateway — one chat/vision completion call per invocation.
//!
//! Both supported backends speak the OpenAI-compatible chat-completions
//! shape; HuggingFace calls are routed through the Featherless AI hosted
//! inference provider. Errors leave here unclassified — mapping status
//! codes onto the retry policy is the failover engine's job.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use badil_core::types::{ApiKey, InferenceRequest, ProviderKind, UserContent};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
const HF_ROUTER_BASE_URL: &str = "https://router.huggingface.co/featherless-ai";

/// Raw failure from a provider call, surfaced unmodified.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unsupported provider kind: {0}")]
    UnsupportedProvider(ProviderKind),

    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// Uniform adapter over the inference backends.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Issue one completion call with the given credential and return the
    /// first choice's text. Always a plain string — downstream parsing is
    /// the caller's concern.
    async fn complete(
        &self,
        key: &ApiKey,
        request: &InferenceRequest,
    ) -> Result<String, BackendError>;
}

/// reqwest-backed implementation against the live provider endpoints.
pub struct HttpBackend {
    client: reqwest::Client,
    groq_base_url: String,
    hf_base_url: String,
}

impl HttpBackend {
    pub fn new() -> Self {
        Self::with_base_urls(GROQ_BASE_URL, HF_ROUTER_BASE_URL)
    }

    pub fn with_base_urls(groq: &str, hf: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            groq_base_url: groq.trim_end_matches('/').to_string(),
            hf_base_url: hf.trim_end_matches('/').to_string(),
        }
    }

    fn base_url(&self, kind: ProviderKind) -> Result<&str, BackendError> {
        match kind {
            ProviderKind::Groq => Ok(&self.groq_base_url),
            ProviderKind::HuggingFace => Ok(&self.hf_base_url),
            ProviderKind::Unknown => Err(BackendError::UnsupportedProvider(kind)),
        }
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the request as OpenAI-style role-tagged messages. Images travel
/// as an `image_url` content part (data URIs included).
fn build_messages(request: &InferenceRequest) -> Vec<serde_json::Value> {
    let user = match &request.user {
        UserContent::Text { text } => json!({
            "role": "user",
            "content": [{"type": "text", "text": text}],
        }),
        UserContent::ImageUrl { url } => json!({
            "role": "user",
            "content": [{"type": "image_url", "image_url": {"url": url}}],
        }),
    };
    vec![
        json!({"role": "system", "content": request.system}),
        user,
    ]
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    async fn complete(
        &self,
        key: &ApiKey,
        request: &InferenceRequest,
    ) -> Result<String, BackendError> {
        let base = self.base_url(key.provider)?;
        let body = json!({
            "model": key.model,
            "messages": build_messages(request),
        });

        debug!(provider = %key.provider, model = %key.model, "Issuing chat completion");

        let response = self
            .client
            .post(format!("{base}/v1/chat/completions"))
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", key.secret))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Http { status, body });
        }

        // Parse from text so a garbled body classifies as malformed, not as
        // a transport failure.
        let text = response.text().await?;
        let completion: ChatCompletion =
            serde_json::from_str(&text).map_err(|e| BackendError::Malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::Malformed("no choices in completion".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_dispatch() {
        let backend = HttpBackend::new();
        assert!(backend.base_url(ProviderKind::Groq).unwrap().contains("groq"));
        assert!(
            backend
                .base_url(ProviderKind::HuggingFace)
                .unwrap()
                .contains("featherless")
        );
        assert!(matches!(
            backend.base_url(ProviderKind::Unknown),
            Err(BackendError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn test_custom_base_url_trims_slash() {
        let backend = HttpBackend::with_base_urls("http://localhost:9999/", "http://localhost:9998");
        assert_eq!(backend.base_url(ProviderKind::Groq).unwrap(), "http://localhost:9999");
    }

    #[test]
    fn test_build_messages_text() {
        let request = InferenceRequest::text("Be terse.", "hello");
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "Be terse.");
        assert_eq!(messages[1]["content"][0]["type"], "text");
        assert_eq!(messages[1]["content"][0]["text"], "hello");
    }

    #[test]
    fn test_build_messages_image() {
        let request = InferenceRequest::image("Identify.", "data:image/jpeg;base64,AAAA");
        let messages = build_messages(&request);
        assert_eq!(messages[1]["content"][0]["type"], "image_url");
        let url = messages[1]["content"][0]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_completion_deserialization() {
        let json = r#"{"id":"cmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"[7 Up, PepsiCo, Soft Drink]"}}]}"#;
        let completion: ChatCompletion = serde_json::from_str(json).unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("[7 Up, PepsiCo, Soft Drink]")
        );
    }

    #[test]
    fn test_completion_without_choices() {
        let completion: ChatCompletion = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(completion.choices.is_empty());
    }
}
