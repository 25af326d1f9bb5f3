// sampling-workbench/src/estimator.rs
//! Approximate token and cost estimation.
//!
//! Token counts use a fixed 4 characters per token ratio. This is a rough
//! heuristic, not a tokenizer: real counts differ by model and language.

use sampling_protocol::{
    CapabilityDescriptor, CostEstimate, EstimateOptions, Feature, Message, Pricing, SurchargeKind,
    TokenUsage,
};
use thiserror::Error;

/// Characters per token assumed by every estimate
pub const CHARS_PER_TOKEN: usize = 4;

/// Output tokens assumed for a typical short completion
pub const OUTPUT_TOKEN_CAP: u32 = 150;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("price {name} is not a finite non-negative number: {value}")]
    InvalidPrice { name: &'static str, value: f64 },
}

/// Estimated token count for a piece of text
pub fn estimate_text_tokens(text: &str) -> u64 {
    tokens_for_chars(text.chars().count())
}

/// Estimated input tokens for a conversation, counting text content only
pub fn estimate_input_tokens(messages: &[Message]) -> u64 {
    tokens_for_chars(messages.iter().map(|m| m.content.text_len()).sum())
}

fn tokens_for_chars(chars: usize) -> u64 {
    chars.div_ceil(CHARS_PER_TOKEN) as u64
}

/// Estimate the cost of sending `messages` with the given `max_tokens`.
///
/// At most one surcharge applies. A reasoning surcharge takes precedence over
/// a thinking surcharge when the model supports both.
pub fn estimate(
    messages: &[Message],
    max_tokens: u32,
    capability: &CapabilityDescriptor,
    options: &EstimateOptions,
) -> Result<CostEstimate, EstimateError> {
    let pricing = &capability.pricing;
    validate_pricing(pricing)?;

    let input_tokens = estimate_input_tokens(messages);
    let output_tokens = u64::from(max_tokens.min(OUTPUT_TOKEN_CAP));

    let base = per_1k(input_tokens as f64, pricing.input_per_1k)
        + per_1k(output_tokens as f64, pricing.output_per_1k);

    let reasoning = options
        .reasoning_effort
        .filter(|_| capability.supports(Feature::ExtendedReasoning))
        .and_then(|effort| effort.multiplier());
    let thinking = options
        .thinking
        .filter(|_| capability.supports(Feature::ExtendedThinking));

    let (surcharge, surcharge_kind) = if let Some(multiplier) = reasoning {
        let scaled = output_tokens as f64 * multiplier;
        let extra = scaled - output_tokens as f64;
        (per_1k(extra, pricing.output_per_1k), Some(SurchargeKind::Reasoning))
    } else if let Some(budget) = thinking {
        let thinking_tokens = input_tokens as f64 * budget.fraction();
        (
            per_1k(thinking_tokens, pricing.thinking_rate()),
            Some(SurchargeKind::Thinking),
        )
    } else {
        (0.0, None)
    };

    Ok(CostEstimate {
        input_tokens,
        output_tokens,
        cost: round4(base + surcharge),
        surcharge: round4(surcharge),
        surcharge_kind,
        currency: pricing.currency.clone(),
    })
}

/// Price measured usage, including thinking tokens when reported
pub fn price_usage(usage: &TokenUsage, pricing: &Pricing) -> Result<f64, EstimateError> {
    validate_pricing(pricing)?;
    let thinking = usage
        .thinking_tokens
        .map(|t| per_1k(t as f64, pricing.thinking_rate()))
        .unwrap_or(0.0);
    Ok(round4(
        per_1k(usage.input_tokens as f64, pricing.input_per_1k)
            + per_1k(usage.output_tokens as f64, pricing.output_per_1k)
            + thinking,
    ))
}

fn validate_pricing(pricing: &Pricing) -> Result<(), EstimateError> {
    let rates = [
        ("inputPer1k", Some(pricing.input_per_1k)),
        ("outputPer1k", Some(pricing.output_per_1k)),
        ("thinkingPer1k", pricing.thinking_per_1k),
    ];
    for (name, value) in rates {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(EstimateError::InvalidPrice { name, value });
            }
        }
    }
    Ok(())
}

fn per_1k(tokens: f64, price: f64) -> f64 {
    tokens / 1000.0 * price
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
