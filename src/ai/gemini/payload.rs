use super::types::{Content, GenerateContentRequest, GenerationConfig, InlineData, Part, WireRole};
use crate::models::{ConnectionMethod, Message, Role, DEFAULT_THINKING_MODELS};
use crate::{Error, Result};

/// Translates a conversation into a `generateContent` request body.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    model_name: String,
    method: ConnectionMethod,
    mime_type: String,
    thinking_models: Vec<String>,
}

impl PayloadBuilder {
    pub fn new(model_name: &str, method: ConnectionMethod, mime_type: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            method,
            mime_type: mime_type.to_string(),
            thinking_models: DEFAULT_THINKING_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }

    pub fn with_thinking_models(mut self, thinking_models: Vec<String>) -> Self {
        self.thinking_models = thinking_models;
        self
    }

    pub fn method(&self) -> ConnectionMethod {
        self.method
    }

    /// Build the request body without touching `messages`.
    ///
    /// A leading system message becomes the system instruction. Every other
    /// message is a turn: assistant maps to `model`, anything else to `user`.
    /// Turns without parts are dropped, then a single leading `model` turn
    /// is dropped.
    pub fn build(&self, messages: &[Message]) -> Result<GenerateContentRequest> {
        let (system, turns) = match messages.split_first() {
            Some((first, rest)) if first.role == Role::System => (first.text(), rest),
            _ => (None, messages),
        };

        let mut contents: Vec<Content> = Vec::with_capacity(turns.len());
        for message in turns {
            let role = WireRole::from(message.role);
            let parts = self.parts_for(message, role);

            if parts.is_empty() {
                continue;
            }
            contents.push(Content {
                role: Some(role),
                parts,
            });
        }

        if contents.first().map(|c| c.role) == Some(Some(WireRole::Model)) {
            tracing::debug!("Dropping leading model turn");
            contents.remove(0);
        }

        if contents.is_empty() {
            return Err(Error::EmptyConversation {
                method: self.method,
            });
        }

        let generation_config = self
            .thinking_models
            .iter()
            .any(|m| m == &self.model_name)
            .then(GenerationConfig::unbounded_thinking);

        tracing::debug!(
            "Built Gemini payload: {} turn(s), system instruction: {}, thinking config: {}",
            contents.len(),
            system.is_some(),
            generation_config.is_some()
        );

        Ok(GenerateContentRequest {
            contents,
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part::Text {
                    text: text.to_string(),
                }],
            }),
            generation_config,
        })
    }

    fn parts_for(&self, message: &Message, role: WireRole) -> Vec<Part> {
        let mut parts = Vec::with_capacity(1 + message.images.len());

        if let Some(text) = message.text() {
            parts.push(Part::Text {
                text: text.to_string(),
            });
        }

        if role == WireRole::User {
            parts.extend(message.images.iter().map(|data| Part::InlineData {
                inline_data: InlineData {
                    mime_type: self.mime_type.clone(),
                    data: data.clone(),
                },
            }));
        }

        parts
    }
}
