//! Gemini `generateContent` payload types.
//!
//! Request types serialize to the exact wire shape. Response types are
//! deliberately lenient: every field is optional and unknown fields are
//! ignored, so that classification in `extract` decides what a body means.

use crate::models::Role;
use serde::{Deserialize, Serialize};

/// Role of a turn on the wire. Gemini only knows `user` and `model`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Model,
}

impl From<Role> for WireRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Assistant => WireRole::Model,
            Role::System | Role::User => WireRole::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<WireRole>,
    pub parts: Vec<Part>,
}

/// Untagged union of text and inline media content parts.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

/// Base64 image payload; field names are snake_case on the wire.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    /// `-1` lets the model pick its own budget.
    pub thinking_budget: i32,
}

impl GenerationConfig {
    pub fn unbounded_thinking() -> Self {
        Self {
            thinking_config: ThinkingConfig {
                thinking_budget: -1,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Top-level `generateContent` response envelope.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Entries may be `null`; those carry nothing to classify.
    pub candidates: Option<Vec<Option<Candidate>>>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
    pub safety_ratings: Option<Vec<SafetyRating>>,
}

impl Candidate {
    /// Concatenation of all non-empty text parts, if there are any.
    pub fn joined_text(&self) -> Option<String> {
        let parts = self.content.as_ref()?.parts.as_ref()?;
        let texts: Vec<&str> = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .filter(|t| !t.is_empty())
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
    pub safety_ratings: Option<Vec<SafetyRating>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SafetyRating {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub probability: Option<String>,
}

impl SafetyRating {
    pub fn new(category: &str, probability: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            probability: Some(probability.to_string()),
        }
    }
}

/// `CATEGORY: PROBABILITY` pairs joined with `, `.
pub fn summarize_ratings(ratings: &[SafetyRating]) -> String {
    ratings
        .iter()
        .map(|r| {
            format!(
                "{}: {}",
                r.category.as_deref().unwrap_or_default(),
                r.probability.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
