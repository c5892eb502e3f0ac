//! Classification of raw `generateContent` responses.
//!
//! [`ResponseShape::decode`] is total: any status/body pair maps to exactly one
//! shape. Precedence on a success status is answer, prompt block, abnormal
//! finish, error object, then unrecognized.

use super::types::{summarize_ratings, GenerateContentResponse, SafetyRating};
use crate::ai::RawResponse;
use crate::models::ConnectionMethod;
use crate::{Error, Result};
use serde_json::Value;

/// Diagnostic excerpts are cut to this many characters.
pub const EXCERPT_LEN: usize = 200;

const NORMAL_FINISH: &str = "STOP";

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Body was not JSON.
    Unparseable { status: u16, raw: String },
    /// Non-success status with a JSON body.
    ErrorStatus { status: u16, body: Value },
    /// Concatenated text of the leading candidate.
    Answer(String),
    Blocked {
        reason: String,
        safety_ratings: Option<Vec<SafetyRating>>,
    },
    /// `decode` never fills `partial`: any text part yields `Answer` first.
    /// The field exists so the partial-content rendering can be built and
    /// unit-tested directly.
    AbnormalFinish {
        reason: String,
        safety_ratings: Vec<SafetyRating>,
        partial: Option<String>,
    },
    /// Success status carrying an `error` object.
    ErrorBody { message: Option<String> },
    /// JSON that does not fit the response envelope.
    Malformed,
    Unrecognized,
}

impl ResponseShape {
    pub fn decode(response: &RawResponse) -> Self {
        let status = response.status;

        let value: Value = match serde_json::from_str(&response.body) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Gemini response (status {}) is not JSON: {}", status, e);
                return ResponseShape::Unparseable {
                    status,
                    raw: response.body.clone(),
                };
            }
        };

        if !(200..300).contains(&status) {
            return ResponseShape::ErrorStatus {
                status,
                body: value,
            };
        }

        // Scalars and arrays hold no envelope fields; only `null` is unusable.
        if !value.is_object() && !value.is_null() {
            return ResponseShape::Unrecognized;
        }

        let parsed: GenerateContentResponse = match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Gemini response does not match the expected envelope: {}", e);
                return ResponseShape::Malformed;
            }
        };

        let leading = parsed
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(Option::as_ref);
        let leading_text = leading.and_then(|c| c.joined_text());

        if let Some(text) = leading_text {
            return ResponseShape::Answer(text);
        }

        if let Some(feedback) = parsed.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                return ResponseShape::Blocked {
                    reason,
                    safety_ratings: feedback.safety_ratings,
                };
            }
        }

        if let Some(candidate) = leading {
            if let Some(reason) = candidate
                .finish_reason
                .as_deref()
                .filter(|r| *r != NORMAL_FINISH)
            {
                return ResponseShape::AbnormalFinish {
                    reason: reason.to_string(),
                    safety_ratings: candidate.safety_ratings.clone().unwrap_or_default(),
                    partial: None,
                };
            }
        }

        match parsed.error {
            Some(error) if is_truthy(&error) => ResponseShape::ErrorBody {
                message: error_message(&error).map(str::to_string),
            },
            _ => ResponseShape::Unrecognized,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, ResponseShape::Answer(_))
    }

    /// Shapes the caller receives as an error rather than as text.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            ResponseShape::Unparseable { .. } | ResponseShape::ErrorStatus { .. }
        )
    }

    /// Human-readable rendering of the shape.
    pub fn describe(&self, method: ConnectionMethod) -> String {
        let proxied = method == ConnectionMethod::Proxy;

        match self {
            ResponseShape::Unparseable { status, raw } => format!(
                "API Error ({}). Response: {}",
                status_line(*status),
                excerpt(raw)
            ),
            ResponseShape::ErrorStatus { status, body } => format!(
                "API Error via {} ({}){}",
                method,
                status_line(*status),
                error_detail(body)
            ),
            ResponseShape::Answer(text) => text.clone(),
            ResponseShape::Blocked {
                reason,
                safety_ratings,
            } => {
                let mut text = format!("Request blocked by API: {}", reason);
                if let Some(ratings) = safety_ratings {
                    text.push_str(&format!(" - Details: {}", summarize_ratings(ratings)));
                }
                text
            }
            ResponseShape::AbnormalFinish {
                reason,
                safety_ratings,
                partial,
            } => {
                let mut text = format!("Request finished unexpectedly. Reason: {}", reason);
                if !safety_ratings.is_empty() {
                    text.push_str(&format!(
                        " (Safety Ratings: {})",
                        summarize_ratings(safety_ratings)
                    ));
                }
                if let Some(partial) = partial {
                    text.push_str(&format!("\nPartial content: {}", partial));
                }
                text
            }
            ResponseShape::ErrorBody { message } => format!(
                "{}Gemini API Error: {}",
                if proxied { "Proxied " } else { "" },
                message.as_deref().unwrap_or("Unknown error")
            ),
            ResponseShape::Malformed => format!(
                "Error: Failed to process {}Gemini response content.",
                if proxied { "proxied " } else { "" }
            ),
            ResponseShape::Unrecognized => format!(
                "Error: Could not parse {}Gemini response.",
                if proxied { "proxied " } else { "" }
            ),
        }
    }

    /// Provider errors become [`Error::Api`]; every other shape is returned
    /// as text, including block and abnormal-finish notices.
    pub fn into_outcome(self, method: ConnectionMethod) -> Result<String> {
        let text = self.describe(method);
        if self.is_provider_error() {
            tracing::error!("{}", text);
            return Err(Error::Api(text));
        }
        if !self.is_answer() {
            tracing::warn!("Gemini returned a degraded outcome: {}", excerpt(&text));
        }
        Ok(text)
    }
}

/// Classify and render in one step.
pub fn extract(response: &RawResponse, method: ConnectionMethod) -> Result<String> {
    ResponseShape::decode(response).into_outcome(method)
}

fn status_line(status: u16) -> String {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("");
    format!("{} {}", status, reason).trim_end().to_string()
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_LEN).collect()
}

fn error_message(error: &Value) -> Option<&str> {
    let message = match error {
        Value::String(message) => Some(message.as_str()),
        _ => error.get("message").and_then(Value::as_str),
    };
    message.filter(|m| !m.is_empty())
}

/// `null`, `false`, `0` and `""` count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn error_detail(body: &Value) -> String {
    match body.get("error").filter(|e| is_truthy(e)) {
        Some(error) => match error_message(error) {
            Some(message) => format!(": {}", message),
            None => format!(". Response: {}", excerpt(&error.to_string())),
        },
        None if !body.is_null() => format!(". Response: {}", excerpt(&body.to_string())),
        None => String::new(),
    }
}
