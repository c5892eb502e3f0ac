//! Data models and structures
//!
//! Defines conversation messages, connection settings, and the tunable
//! options the request pipeline is built from.

use crate::{prompts, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Models that get `thinkingConfig.thinkingBudget = -1` attached.
pub const DEFAULT_THINKING_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn of a conversation.
///
/// `images` holds base64 payloads and is only sent for user turns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            images: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Content if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMethod {
    #[default]
    Direct,
    Proxy,
}

impl fmt::Display for ConnectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMethod::Direct => f.write_str("direct"),
            ConnectionMethod::Proxy => f.write_str("proxy"),
        }
    }
}

impl std::str::FromStr for ConnectionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "direct" => Ok(ConnectionMethod::Direct),
            "proxy" => Ok(ConnectionMethod::Proxy),
            other => Err(Error::Config(format!(
                "Unknown connection method '{}'. Expected 'direct' or 'proxy'.",
                other
            ))),
        }
    }
}

/// Raw, unvalidated connection settings as supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default)]
    pub method: ConnectionMethod,
    pub model_name: Option<String>,
    pub api_key: Option<String>,
    pub proxy_url: Option<String>,
    pub gateway_key: Option<String>,
}

/// Validated connection settings; exactly one variant's fields are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    Direct {
        api_key: String,
        model_name: String,
    },
    Proxy {
        proxy_url: String,
        gateway_key: String,
        model_name: String,
    },
}

impl ConnectionConfig {
    pub fn method(&self) -> ConnectionMethod {
        match self {
            ConnectionConfig::Direct { .. } => ConnectionMethod::Direct,
            ConnectionConfig::Proxy { .. } => ConnectionMethod::Proxy,
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            ConnectionConfig::Direct { model_name, .. }
            | ConnectionConfig::Proxy { model_name, .. } => model_name,
        }
    }
}

/// Blank values count as missing; present values are returned verbatim.
fn required(value: &Option<String>, message: &str) -> Result<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Config(message.to_string()))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ApiSettings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            method: optional_env("GEMINI_METHOD")
                .map(|m| m.parse::<ConnectionMethod>())
                .transpose()?
                .unwrap_or_default(),
            model_name: optional_env("GEMINI_MODEL"),
            api_key: optional_env("GEMINI_API_KEY"),
            proxy_url: optional_env("GEMINI_PROXY_URL"),
            gateway_key: optional_env("GEMINI_GATEWAY_KEY"),
        })
    }

    /// Validate the settings for the selected method. The model name is
    /// checked first, then the method's credentials.
    pub fn resolve(&self) -> Result<ConnectionConfig> {
        let model_name = required(&self.model_name, "Cloud Gemini model name not set.")?;

        match self.method {
            ConnectionMethod::Proxy => Ok(ConnectionConfig::Proxy {
                proxy_url: required(
                    &self.proxy_url,
                    "API Gateway Endpoint not configured for proxy method.",
                )?,
                gateway_key: required(
                    &self.gateway_key,
                    "Gateway API Key not configured for proxy method.",
                )?,
                model_name,
            }),
            ConnectionMethod::Direct => Ok(ConnectionConfig::Direct {
                api_key: required(&self.api_key, "Cloud Gemini API Key not configured.")?,
                model_name,
            }),
        }
    }
}

/// Deployment-level knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub base_url: String,
    pub thinking_models: Vec<String>,
    pub clarification_system_prompt: String,
    /// Template with a `{{request}}` placeholder for the original user text.
    pub clarification_user_template: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            thinking_models: DEFAULT_THINKING_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            clarification_system_prompt: prompts::CLARIFY_SYSTEM.to_string(),
            clarification_user_template: prompts::CLARIFY_USER.to_string(),
        }
    }
}

impl PipelineOptions {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut options = Self::default();
        if let Some(base_url) = optional_env("GEMINI_BASE_URL") {
            options.base_url = base_url.trim_end_matches('/').to_string();
        }
        options
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
