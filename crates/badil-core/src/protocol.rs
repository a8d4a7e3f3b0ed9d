//! Analyze-socket wire protocol.
//!
//! Clients speak JSON-over-WebSocket: one request frame in, a stream of
//! typed result frames out.

use serde::{Deserialize, Serialize};

/// Client -> server frame: either a base64 product photo or a company name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientFrame {
    Image { image_data: String },
    Company { company_name: String },
}

/// Server -> client frame. Serialized as `{"type": ..., "value": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Identified brand name.
    Company(String),
    /// Identified product category.
    ProductType(String),
    /// Whether the identified company is boycotted.
    Boycott(bool),
    /// Boycott cause text.
    Cause(String),
    /// Alternative products, exact matches first.
    Alternative(Vec<AlternativeEntry>),
    /// All providers throttled or retired — try again later.
    Unavailable(String),
    Error(String),
}

/// One alternative product as shown to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeEntry {
    pub product_name: String,
    pub company_name: String,
    pub product_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_website: Option<String>,
    pub is_exact_match: bool,
}
