// sampling-protocol/src/types/capability.rs
use serde::{Deserialize, Serialize};

/// Token pricing for a provider, per 1k tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
    /// Separate rate for thinking tokens, where the vendor bills them apart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_per_1k: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Pricing {
    pub fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
            thinking_per_1k: None,
            currency: default_currency(),
        }
    }

    pub fn with_thinking(mut self, thinking_per_1k: f64) -> Self {
        self.thinking_per_1k = Some(thinking_per_1k);
        self
    }

    /// Thinking rate, falling back to the output rate
    pub fn thinking_rate(&self) -> f64 {
        self.thinking_per_1k.unwrap_or(self.output_per_1k)
    }
}

/// Boolean feature flags advertised by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    pub structured_output: bool,
    pub batch_mode: bool,
    pub parallel_function_calls: bool,
    /// Model accepts a reasoning-effort setting that scales output tokens
    pub extended_reasoning: bool,
    /// Model bills separate thinking tokens
    pub extended_thinking: bool,
}

/// Individually gated provider features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    StructuredOutput,
    BatchMode,
    ParallelFunctionCalls,
    ExtendedReasoning,
    ExtendedThinking,
}

/// Metadata describing the active LLM backend. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    pub provider_id: String,
    pub model: String,
    pub pricing: Pricing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_tokens: Option<u32>,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl CapabilityDescriptor {
    pub fn new(provider_id: &str, model: &str, pricing: Pricing) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            model: model.to_string(),
            pricing,
            max_context_tokens: None,
            features: FeatureFlags::default(),
        }
    }

    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    pub fn with_max_context_tokens(mut self, tokens: u32) -> Self {
        self.max_context_tokens = Some(tokens);
        self
    }

    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::StructuredOutput => self.features.structured_output,
            Feature::BatchMode => self.features.batch_mode,
            Feature::ParallelFunctionCalls => self.features.parallel_function_calls,
            Feature::ExtendedReasoning => self.features.extended_reasoning,
            Feature::ExtendedThinking => self.features.extended_thinking,
        }
    }
}

/// Reasoning effort for models that scale output with deliberation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    /// Output-token multiplier; `None` for minimal effort
    pub fn multiplier(self) -> Option<f64> {
        match self {
            ReasoningEffort::Minimal => None,
            ReasoningEffort::Low => Some(1.2),
            ReasoningEffort::Medium => Some(1.5),
            ReasoningEffort::High => Some(2.0),
        }
    }
}

/// Thinking budget for models that bill thinking tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThinkingBudget {
    Low,
    Medium,
    High,
}

impl ThinkingBudget {
    /// Thinking tokens as a fraction of input tokens
    pub fn fraction(self) -> f64 {
        match self {
            ThinkingBudget::Low => 0.2,
            ThinkingBudget::Medium => 0.4,
            ThinkingBudget::High => 0.6,
        }
    }
}

/// Per-model estimation settings chosen by the operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimateOptions {
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Thinking mode is enabled when a budget is set
    pub thinking: Option<ThinkingBudget>,
}

/// Which surcharge contributed to an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurchargeKind {
    Reasoning,
    Thinking,
}

/// Approximate cost of a request before it is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Total cost including any surcharge, rounded to 4 decimal places
    pub cost: f64,
    /// Surcharge portion of `cost`, rounded to 4 decimal places
    pub surcharge: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surcharge_kind: Option<SurchargeKind>,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_reads_flags() {
        let capability = CapabilityDescriptor::new("anthropic", "claude", Pricing::new(0.003, 0.015))
            .with_features(FeatureFlags {
                extended_thinking: true,
                ..Default::default()
            });
        assert!(capability.supports(Feature::ExtendedThinking));
        assert!(!capability.supports(Feature::ExtendedReasoning));
    }

    #[test]
    fn test_thinking_rate_falls_back_to_output() {
        assert_eq!(Pricing::new(0.001, 0.002).thinking_rate(), 0.002);
        assert_eq!(Pricing::new(0.001, 0.002).with_thinking(0.005).thinking_rate(), 0.005);
    }

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let json = serde_json::json!({
            "providerId": "openai",
            "model": "gpt-5",
            "pricing": {"inputPer1k": 0.00125, "outputPer1k": 0.01}
        });
        let capability: CapabilityDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(capability.pricing.currency, "USD");
        assert_eq!(capability.features, FeatureFlags::default());
    }
}
