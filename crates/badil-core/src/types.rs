use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which inference backend a credential targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Groq,
    #[serde(rename = "hf")]
    HuggingFace,
    /// Unrecognized kind string in a provisioned store. Loaded as data so
    /// one bad row cannot poison the whole store; never invokable.
    Unknown,
}

// Hand-written so an unrecognized kind string maps to Unknown instead of
// rejecting the whole store file.
impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "groq" => ProviderKind::Groq,
            "hf" => ProviderKind::HuggingFace,
            _ => ProviderKind::Unknown,
        })
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderKind::Groq => "groq",
            ProviderKind::HuggingFace => "hf",
            ProviderKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A provisioned provider credential, carried as one unit with the model
/// name it requests.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub provider: ProviderKind,
    pub secret: String,
    pub model: String,
    /// Set when the key was taken out of service. Never cleared — the
    /// cooldown policy reinterprets it instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retired_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn new(provider: ProviderKind, secret: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            secret: secret.into(),
            model: model.into(),
            retired_at: None,
        }
    }

    /// Redacted form safe for logs: provider kind plus the last four
    /// characters of the secret.
    pub fn redacted(&self) -> String {
        let tail: String = self
            .secret
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{}:...{tail}", self.provider)
    }
}

// The bearer token must not leak through Debug formatting in logs.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("provider", &self.provider)
            .field("secret", &self.redacted())
            .field("model", &self.model)
            .field("retired_at", &self.retired_at)
            .finish()
    }
}

/// An immutable prompt: one system instruction plus one user part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub system: String,
    pub user: UserContent,
}

/// The user half of a prompt — plain text or a ready-made image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserContent {
    Text { text: String },
    ImageUrl { url: String },
}

impl InferenceRequest {
    pub fn text(system: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: UserContent::Text { text: text.into() },
        }
    }

    pub fn image(system: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: UserContent::ImageUrl { url: url.into() },
        }
    }
}
