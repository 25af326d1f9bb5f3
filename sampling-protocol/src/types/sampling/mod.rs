// sampling-protocol/src/types/sampling/mod.rs
use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Optional hints attached to a content block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    /// Who the content is intended for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Vec<Role>>,

    /// Relative importance (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

/// Sampling message content types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageContent {
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
    #[serde(rename = "image", rename_all = "camelCase")]
    Image {
        data: String,
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
    #[serde(rename = "audio", rename_all = "camelCase")]
    Audio {
        data: String,
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
    },
}

impl MessageContent {
    /// Plain text content without annotations
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text {
            text: text.into(),
            annotations: None,
        }
    }

    /// The text payload, if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Number of text characters carried by this block; binary payloads count as zero
    pub fn text_len(&self) -> usize {
        self.as_text().map(|t| t.chars().count()).unwrap_or(0)
    }
}

/// One turn in a sampling conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::text(text),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::text(text),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::text(text),
        }
    }
}

/// Model hint for sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHint {
    pub name: String,
}

impl ModelHint {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Model preferences for sampling. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPreferences {
    /// Hints for specific models or model families, in order of preference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<ModelHint>>,

    /// Priority for cost (0.0-1.0), higher values prefer cheaper models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_priority: Option<f32>,

    /// Priority for speed (0.0-1.0), higher values prefer faster models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_priority: Option<f32>,

    /// Priority for intelligence (0.0-1.0), higher values prefer more capable models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intelligence_priority: Option<f32>,
}

impl ModelPreferences {
    /// Returns the name of the first priority weight outside [0, 1], if any
    pub fn out_of_range_priority(&self) -> Option<&'static str> {
        [
            ("costPriority", self.cost_priority),
            ("speedPriority", self.speed_priority),
            ("intelligencePriority", self.intelligence_priority),
        ]
        .into_iter()
        .find(|(_, value)| matches!(value, Some(v) if !(0.0..=1.0).contains(v)))
        .map(|(name, _)| name)
    }

    /// Whether any hint names the given model (case-insensitive substring)
    pub fn hints_model(&self, model: &str) -> bool {
        let model = model.to_lowercase();
        self.hints
            .iter()
            .flatten()
            .any(|hint| hint.name.to_lowercase().contains(&model))
    }
}

/// Which server context the requester wants included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IncludeContext {
    None,
    ThisServer,
    AllServers,
}

/// Params for creating a sampling message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageParams {
    /// The conversation messages to include
    pub messages: Vec<Message>,

    /// Model preferences for selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_preferences: Option<ModelPreferences>,

    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Optional context inclusion mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_context: Option<IncludeContext>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Optional temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Sequences that end generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    /// Free-form metadata supplied by the requesting server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl CreateMessageParams {
    /// Params with the given messages and everything else unset
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_preferences(mut self, preferences: ModelPreferences) -> Self {
        self.model_preferences = Some(preferences);
        self
    }

    /// Iterate the text payloads of all messages
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().filter_map(|m| m.content.as_text())
    }
}

/// Reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    EndTurn,
    StopSequence,
    MaxTokens,
    ContentFilter,
    ToolUse,
    /// Response authored by an operator rather than a model
    Manual,
}

impl StopReason {
    /// Map a provider-specific stop string onto the closed set.
    ///
    /// Unknown or missing reasons map to `EndTurn`.
    pub fn from_provider(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return StopReason::EndTurn;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "length" | "max_tokens" | "maxtokens" => StopReason::MaxTokens,
            "stop_sequence" | "stopsequence" => StopReason::StopSequence,
            "content_filter" | "safety" => StopReason::ContentFilter,
            "tool_calls" | "function_call" | "tool_use" => StopReason::ToolUse,
            "manual" => StopReason::Manual,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token accounting for a single resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_tokens: Option<u64>,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.thinking_tokens.unwrap_or(0)
    }
}

/// Response for a sampling message creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageResult {
    /// The role of the response message
    pub role: Role,

    /// The content of the response
    pub content: MessageContent,

    /// The model (or sentinel) that produced the response
    pub model: String,

    /// The reason why generation stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,

    /// Token usage, measured or estimated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}
