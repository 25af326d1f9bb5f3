// sampling-workbench/src/provider/echo.rs
use async_trait::async_trait;
use sampling_protocol::{
    CapabilityDescriptor, CompletionRequest, CompletionResponse, Pricing, ProviderError, Role,
    TokenUsage,
};

use super::CapabilityProvider;
use crate::estimator::{estimate_input_tokens, estimate_text_tokens};

/// Provider that answers by echoing the last user message.
///
/// Useful for exercising the AI path without network access or credentials.
pub struct EchoProvider {
    capability: CapabilityDescriptor,
}

impl EchoProvider {
    /// Create an echo provider with zero pricing
    pub fn new() -> Self {
        Self {
            capability: CapabilityDescriptor::new("echo", "echo-model-1.0", Pricing::new(0.0, 0.0)),
        }
    }

    /// Advertise a different descriptor, e.g. to preview pricing
    pub fn with_capability(mut self, capability: CapabilityDescriptor) -> Self {
        self.capability = capability;
        self
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for EchoProvider {
    fn active_capability(&self) -> Option<CapabilityDescriptor> {
        Some(self.capability.clone())
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        _server_id: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        // Find the last user message content
        let last_user = request
            .messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::User)
            .find_map(|m| m.content.as_text())
            .ok_or_else(|| ProviderError::validation("No user text to echo"))?;

        let text = format!("You said: {}", last_user);
        let usage = TokenUsage {
            input_tokens: estimate_input_tokens(&request.messages),
            output_tokens: estimate_text_tokens(&text),
            thinking_tokens: None,
        };

        Ok(CompletionResponse::new(text, self.capability.model.clone())
            .with_usage(usage)
            .with_stop_reason("end_turn"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampling_protocol::Message;

    fn request(messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            messages,
            model_preferences: None,
            system_prompt: None,
            temperature: None,
            max_tokens: 100,
            stop_sequences: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_echoes_last_user_message() {
        let provider = EchoProvider::new();
        let response = provider
            .complete(
                "srv",
                &request(vec![
                    Message::user("first"),
                    Message::assistant("reply"),
                    Message::user("second"),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(response.text, "You said: second");
        assert_eq!(response.model, "echo-model-1.0");
        assert!(response.usage.is_some());
    }

    #[tokio::test]
    async fn test_no_user_text_is_validation_error() {
        let provider = EchoProvider::new();
        let err = provider
            .complete("srv", &request(vec![Message::assistant("only me")]))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}
