//! Gemini request relay with a prompt clarification pass.
//!
//! Sends role-tagged conversations (text plus optional images) to the Gemini
//! `generateContent` API, either directly with an API key or through a proxy
//! gateway. Before the real request, the first user message is rewritten into
//! one concrete instruction by a separate clarification call.

pub mod ai;
pub mod error;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
