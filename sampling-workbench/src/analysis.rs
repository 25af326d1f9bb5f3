// sampling-workbench/src/analysis.rs
use sampling_protocol::{CapabilityDescriptor, CreateMessageParams, MessageContent, Role};
use serde::Serialize;

use crate::estimator::{estimate_input_tokens, estimate_text_tokens};

const PREVIEW_CHARS: usize = 100;

/// Summary of one message in a request's conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub preview: String,
    pub estimated_tokens: u64,
}

/// Shape of a request's conversation, for reviewers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub thread_length: usize,
    pub estimated_tokens: u64,
    /// Share of the model's context window the conversation fills, at most 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window_usage: Option<f64>,
    pub turns: Vec<ConversationTurn>,
}

/// Break a request's conversation into turns with previews and token counts
pub fn analyze(
    params: &CreateMessageParams,
    capability: Option<&CapabilityDescriptor>,
) -> ConversationContext {
    let turns: Vec<ConversationTurn> = params
        .messages
        .iter()
        .map(|message| ConversationTurn {
            role: message.role,
            preview: preview(&message.content),
            estimated_tokens: message.content.as_text().map_or(0, estimate_text_tokens),
        })
        .collect();

    // Rounded once over the whole conversation, not per turn
    let estimated_tokens = estimate_input_tokens(&params.messages);

    let context_window_usage = capability
        .and_then(|capability| capability.max_context_tokens)
        .filter(|max| *max > 0)
        .map(|max| (estimated_tokens as f64 / f64::from(max)).min(1.0));

    ConversationContext {
        thread_length: turns.len(),
        estimated_tokens,
        context_window_usage,
        turns,
    }
}

fn preview(content: &MessageContent) -> String {
    match content {
        MessageContent::Text { text, .. } => {
            if text.chars().count() > PREVIEW_CHARS {
                let head: String = text.chars().take(PREVIEW_CHARS - 3).collect();
                format!("{}...", head)
            } else {
                text.clone()
            }
        }
        MessageContent::Image { mime_type, .. } => format!("[Image: {}]", mime_type),
        MessageContent::Audio { mime_type, .. } => format!("[Audio: {}]", mime_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampling_protocol::{Message, Pricing};

    #[test]
    fn test_long_text_is_truncated() {
        let long = "a".repeat(150);
        let params = CreateMessageParams::new(vec![Message::user(long), Message::assistant("short")]);
        let context = analyze(&params, None);

        assert_eq!(context.thread_length, 2);
        assert_eq!(context.turns[0].preview.chars().count(), 100);
        assert!(context.turns[0].preview.ends_with("..."));
        assert_eq!(context.turns[1].preview, "short");
        assert_eq!(context.turns[1].role, Role::Assistant);
        assert_eq!(context.estimated_tokens, 39);
        assert_eq!(context.context_window_usage, None);
    }

    #[test]
    fn test_exactly_100_chars_is_kept() {
        let text = "b".repeat(100);
        let params = CreateMessageParams::new(vec![Message::user(text.clone())]);
        assert_eq!(analyze(&params, None).turns[0].preview, text);
    }

    #[test]
    fn test_binary_content_preview() {
        let params = CreateMessageParams::new(vec![Message {
            role: Role::User,
            content: MessageContent::Image {
                data: "aGVsbG8=".to_string(),
                mime_type: "image/png".to_string(),
                annotations: None,
            },
        }]);
        let context = analyze(&params, None);
        assert_eq!(context.turns[0].preview, "[Image: image/png]");
        assert_eq!(context.turns[0].estimated_tokens, 0);
    }

    #[test]
    fn test_context_window_usage_is_clamped() {
        let params = CreateMessageParams::new(vec![Message::user("x".repeat(400))]);
        let small = CapabilityDescriptor::new("p", "m", Pricing::new(0.0, 0.0))
            .with_max_context_tokens(50);
        let large = CapabilityDescriptor::new("p", "m", Pricing::new(0.0, 0.0))
            .with_max_context_tokens(1000);

        assert_eq!(analyze(&params, Some(&small)).context_window_usage, Some(1.0));
        assert_eq!(analyze(&params, Some(&large)).context_window_usage, Some(0.1));
    }
}
