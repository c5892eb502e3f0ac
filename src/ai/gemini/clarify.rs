use super::client::Endpoint;
use super::payload::PayloadBuilder;
use super::pipeline::exchange;
use crate::ai::Transport;
use crate::models::{Message, Role};
use crate::{prompts, Result};

/// Rewrites the first non-blank user message into one concrete instruction
/// using a separate provider call.
pub struct ClarificationStage<'a> {
    transport: &'a dyn Transport,
    endpoint: &'a Endpoint,
    builder: &'a PayloadBuilder,
    system_prompt: &'a str,
    user_template: &'a str,
}

impl<'a> ClarificationStage<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        endpoint: &'a Endpoint,
        builder: &'a PayloadBuilder,
    ) -> Self {
        Self {
            transport,
            endpoint,
            builder,
            system_prompt: prompts::CLARIFY_SYSTEM,
            user_template: prompts::CLARIFY_USER,
        }
    }

    pub fn with_prompts(mut self, system_prompt: &'a str, user_template: &'a str) -> Self {
        self.system_prompt = system_prompt;
        self.user_template = user_template;
        self
    }

    /// Index of the first user message with non-whitespace content.
    pub fn find_target(conversation: &[Message]) -> Option<usize> {
        conversation.iter().position(|m| {
            m.role == Role::User
                && m.content
                    .as_deref()
                    .is_some_and(|c| !c.trim().is_empty())
        })
    }

    /// The two-message conversation sent to the clarification call.
    pub fn instruction(&self, original: &str) -> Vec<Message> {
        vec![
            Message::system(self.system_prompt),
            Message::user(prompts::render(self.user_template, &[("request", original)])),
        ]
    }

    /// Returns a new conversation with the target message rewritten, or a copy
    /// of the input when there is nothing to clarify or the rewrite is blank.
    ///
    /// Errors from the round trip are returned to the caller.
    pub async fn clarify(&self, conversation: &[Message]) -> Result<Vec<Message>> {
        let Some(index) = Self::find_target(conversation) else {
            tracing::debug!("No user message to clarify");
            return Ok(conversation.to_vec());
        };

        let original = conversation[index].content.as_deref().unwrap_or_default();
        let shape = exchange(
            self.transport,
            self.endpoint,
            self.builder,
            &self.instruction(original),
        )
        .await?;

        if !shape.is_answer() && !shape.is_provider_error() {
            tracing::warn!("Clarification did not produce an answer; using its notice as the task");
        }
        let clarified = shape.into_outcome(self.builder.method())?;

        if clarified.trim().is_empty() {
            tracing::debug!("Clarification returned blank text; keeping original request");
            return Ok(conversation.to_vec());
        }

        tracing::info!("Clarified user request at index {}", index);

        Ok(conversation
            .iter()
            .enumerate()
            .map(|(i, message)| {
                if i == index {
                    Message {
                        content: Some(clarified.clone()),
                        ..message.clone()
                    }
                } else {
                    message.clone()
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockTransport, RawResponse};
    use crate::models::ConnectionMethod;
    use crate::Error;

    fn endpoint() -> Endpoint {
        Endpoint {
            url: "https://gateway.example.com/gemini".to_string(),
            headers: Vec::new(),
        }
    }

    fn builder() -> PayloadBuilder {
        PayloadBuilder::new("gemini-2.5-flash", ConnectionMethod::Proxy, "image/png")
    }

    #[test]
    fn test_find_target_skips_blank_and_non_user_messages() {
        let conversation = vec![
            Message::system("sys"),
            Message::assistant("hello"),
            Message::user("   "),
            Message::user("like this video"),
            Message::user("second"),
        ];
        assert_eq!(ClarificationStage::find_target(&conversation), Some(3));
        assert_eq!(
            ClarificationStage::find_target(&[Message::system("only")]),
            None
        );
    }

    #[tokio::test]
    async fn test_clarify_rewrites_first_user_message() {
        let transport = MockTransport::new()
            .with_text_response("Like the current playing video on YouTube.");
        let (endpoint, builder) = (endpoint(), builder());
        let stage = ClarificationStage::new(&transport, &endpoint, &builder);

        let conversation = vec![
            Message::system("You are an agent."),
            Message::user("like this video").with_images(vec!["AAA".to_string()]),
            Message::user("and subscribe"),
        ];
        let clarified = stage.clarify(&conversation).await.unwrap();

        assert_eq!(
            clarified[1].content.as_deref(),
            Some("Like the current playing video on YouTube.")
        );
        assert_eq!(clarified[1].images, vec!["AAA".to_string()]);
        assert_eq!(clarified[2], conversation[2]);
        assert_eq!(conversation[1].content.as_deref(), Some("like this video"));

        let sent = &transport.requests()[0].body;
        assert_eq!(
            sent["contents"][0]["parts"][0]["text"],
            "ORIGINAL: like this video"
        );
        assert!(sent["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("task clarifier"));
    }

    #[tokio::test]
    async fn test_clarify_without_target_makes_no_call() {
        let transport = MockTransport::new();
        let (endpoint, builder) = (endpoint(), builder());
        let stage = ClarificationStage::new(&transport, &endpoint, &builder);

        let conversation = vec![Message::system("sys"), Message::assistant("hi")];
        let clarified = stage.clarify(&conversation).await.unwrap();

        assert_eq!(clarified, conversation);
        assert_eq!(transport.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_clarification_keeps_original() {
        let transport = MockTransport::new().with_text_response("  \n ");
        let (endpoint, builder) = (endpoint(), builder());
        let stage = ClarificationStage::new(&transport, &endpoint, &builder);

        let conversation = vec![Message::user("open mail")];
        assert_eq!(stage.clarify(&conversation).await.unwrap(), conversation);
    }

    #[tokio::test]
    async fn test_custom_prompts() {
        let transport = MockTransport::new().with_text_response("Open youtube.com.");
        let (endpoint, builder) = (endpoint(), builder());
        let stage = ClarificationStage::new(&transport, &endpoint, &builder)
            .with_prompts("Rewrite tersely.", "Task: {{request}}");

        stage
            .clarify(&[Message::user("search for youtube")])
            .await
            .unwrap();

        let sent = &transport.requests()[0].body;
        assert_eq!(sent["systemInstruction"]["parts"][0]["text"], "Rewrite tersely.");
        assert_eq!(
            sent["contents"][0]["parts"][0]["text"],
            "Task: search for youtube"
        );
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let transport = MockTransport::new().with_response(RawResponse::json(
            401,
            &serde_json::json!({ "error": { "message": "bad gateway key" } }),
        ));
        let (endpoint, builder) = (endpoint(), builder());
        let stage = ClarificationStage::new(&transport, &endpoint, &builder);

        let err = stage
            .clarify(&[Message::user("open mail")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(err.to_string().contains("bad gateway key"));
    }
}
