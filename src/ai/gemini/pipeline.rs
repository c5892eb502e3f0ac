use super::clarify::ClarificationStage;
use super::client::{Endpoint, ReqwestTransport};
use super::extract::ResponseShape;
use super::payload::PayloadBuilder;
use crate::ai::Transport;
use crate::models::{ApiSettings, Message, PipelineOptions};
use crate::Result;

/// Build, send, and classify one request.
pub(crate) async fn exchange(
    transport: &dyn Transport,
    endpoint: &Endpoint,
    builder: &PayloadBuilder,
    messages: &[Message],
) -> Result<ResponseShape> {
    let request = builder.build(messages)?;
    let body = serde_json::to_string(&request)?;
    let response = transport.post(endpoint, body).await?;
    Ok(ResponseShape::decode(&response))
}

/// Clarifies the first user message, then sends the final request.
pub struct RequestPipeline {
    transport: Box<dyn Transport>,
    options: PipelineOptions,
}

impl RequestPipeline {
    pub fn new(transport: Box<dyn Transport>, options: PipelineOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run both round trips and return the final text outcome.
    ///
    /// Configuration errors are returned before any network call. Provider
    /// errors are returned unchanged; every other failure, from either round
    /// trip, is wrapped into [`crate::Error::Communication`].
    pub async fn send(
        &self,
        settings: &ApiSettings,
        conversation: &[Message],
        mime_type: &str,
    ) -> Result<String> {
        let config = settings.resolve()?;
        let method = config.method();
        let endpoint = Endpoint::for_connection(&config, &self.options.base_url);
        let builder = PayloadBuilder::new(config.model_name(), method, mime_type)
            .with_thinking_models(self.options.thinking_models.clone());

        tracing::debug!(
            "Sending {} message(s) to {} via {} method",
            conversation.len(),
            config.model_name(),
            method
        );

        self.run(&endpoint, &builder, conversation)
            .await
            .map_err(|e| {
                tracing::error!("Gemini request via {} failed: {}", method, e);
                e.into_communication(method)
            })
    }

    async fn run(
        &self,
        endpoint: &Endpoint,
        builder: &PayloadBuilder,
        conversation: &[Message],
    ) -> Result<String> {
        let stage = ClarificationStage::new(self.transport.as_ref(), endpoint, builder)
            .with_prompts(
                &self.options.clarification_system_prompt,
                &self.options.clarification_user_template,
            );
        let messages = stage.clarify(conversation).await?;

        exchange(self.transport.as_ref(), endpoint, builder, &messages)
            .await?
            .into_outcome(builder.method())
    }
}

impl Default for RequestPipeline {
    fn default() -> Self {
        Self::new(Box::new(ReqwestTransport::new()), PipelineOptions::default())
    }
}
