// sampling-workbench/src/routing.rs
//! Decides how an incoming request is resolved under the configured sampling mode.

use sampling_protocol::SamplingRequest;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How incoming requests are resolved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SamplingMode {
    /// Every request waits for a human
    #[default]
    Manual,
    /// Every request goes straight to the LLM provider
    Ai,
    /// Rules pick per request; unmatched requests fall back
    #[serde(rename_all = "camelCase")]
    Hybrid {
        #[serde(default)]
        rules: Vec<ApprovalRule>,
        #[serde(default)]
        fallback_to_human: bool,
    },
}

/// A named condition/action pair evaluated in hybrid mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRule {
    pub name: String,
    pub condition: RuleCondition,
    pub action: RuleAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum RuleCondition {
    /// Server display name or id equals the value
    TrustedServer(String),
    /// Estimated cost is at most the value
    LowCost(f64),
    /// Any text message contains the value, ignoring case
    ContentContains(String),
    /// The request's model hints mention the value
    ModelHint(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "reason", rename_all = "camelCase")]
pub enum RuleAction {
    AutoApprove,
    RequireReview,
    Reject(String),
}

/// Where a request should go next
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Leave pending for an operator
    Human,
    /// Resolve through the provider
    Ai,
    /// Reject with the given reason
    Reject(String),
}

impl ApprovalRule {
    pub fn new(name: &str, condition: RuleCondition, action: RuleAction) -> Self {
        Self {
            name: name.to_string(),
            condition,
            action,
        }
    }

    pub fn matches(&self, request: &SamplingRequest) -> bool {
        self.condition.matches(request)
    }
}

impl RuleCondition {
    pub fn matches(&self, request: &SamplingRequest) -> bool {
        match self {
            RuleCondition::TrustedServer(server) => {
                request.server_name == *server || request.server_id == *server
            }
            RuleCondition::LowCost(max_cost) => request
                .estimate
                .as_ref()
                .map_or(false, |estimate| estimate.cost <= *max_cost),
            RuleCondition::ContentContains(pattern) => {
                let pattern = pattern.to_lowercase();
                request
                    .params
                    .texts()
                    .any(|text| text.to_lowercase().contains(&pattern))
            }
            RuleCondition::ModelHint(model) => request
                .params
                .model_preferences
                .as_ref()
                .map_or(false, |preferences| preferences.hints_model(model)),
        }
    }
}

/// Route a freshly created request
pub fn route(mode: &SamplingMode, request: &SamplingRequest) -> Route {
    match mode {
        SamplingMode::Manual => Route::Human,
        SamplingMode::Ai => Route::Ai,
        SamplingMode::Hybrid {
            rules,
            fallback_to_human,
        } => match rules.iter().find(|rule| rule.matches(request)) {
            Some(rule) => {
                debug!(request_id = %request.id, rule = %rule.name, "Approval rule matched");
                match &rule.action {
                    RuleAction::AutoApprove => Route::Ai,
                    RuleAction::RequireReview => Route::Human,
                    RuleAction::Reject(reason) => Route::Reject(reason.clone()),
                }
            }
            None if *fallback_to_human => Route::Human,
            None => Route::Ai,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampling_protocol::{
        CostEstimate, CreateMessageParams, Message, ModelHint, ModelPreferences,
    };

    fn request(server_name: &str, text: &str) -> SamplingRequest {
        SamplingRequest::new(
            "req-1".to_string(),
            "srv-1".to_string(),
            server_name.to_string(),
            CreateMessageParams::new(vec![Message::user(text)]),
        )
    }

    fn estimate(cost: f64) -> CostEstimate {
        CostEstimate {
            input_tokens: 10,
            output_tokens: 10,
            cost,
            surcharge: 0.0,
            surcharge_kind: None,
            currency: "USD".to_string(),
        }
    }

    fn hybrid(rules: Vec<ApprovalRule>, fallback_to_human: bool) -> SamplingMode {
        SamplingMode::Hybrid {
            rules,
            fallback_to_human,
        }
    }

    #[test]
    fn test_manual_and_ai_modes() {
        let req = request("Weather", "hi");
        assert_eq!(route(&SamplingMode::Manual, &req), Route::Human);
        assert_eq!(route(&SamplingMode::Ai, &req), Route::Ai);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mode = hybrid(
            vec![
                ApprovalRule::new(
                    "block secrets",
                    RuleCondition::ContentContains("PASSWORD".to_string()),
                    RuleAction::Reject("contains credentials".to_string()),
                ),
                ApprovalRule::new(
                    "trusted",
                    RuleCondition::TrustedServer("Weather".to_string()),
                    RuleAction::AutoApprove,
                ),
            ],
            true,
        );
        assert_eq!(
            route(&mode, &request("Weather", "my password is hunter2")),
            Route::Reject("contains credentials".to_string())
        );
        assert_eq!(route(&mode, &request("Weather", "forecast")), Route::Ai);
        assert_eq!(route(&mode, &request("Other", "forecast")), Route::Human);
    }

    #[test]
    fn test_unmatched_without_fallback_goes_to_ai() {
        let mode = hybrid(Vec::new(), false);
        assert_eq!(route(&mode, &request("Any", "hi")), Route::Ai);
    }

    #[test]
    fn test_low_cost_requires_estimate() {
        let condition = RuleCondition::LowCost(0.01);
        let mut req = request("Any", "hi");
        assert!(!condition.matches(&req));

        req.estimate = Some(estimate(0.005));
        assert!(condition.matches(&req));

        req.estimate = Some(estimate(0.02));
        assert!(!condition.matches(&req));
    }

    #[test]
    fn test_model_hint_condition() {
        let mut req = request("Any", "hi");
        let condition = RuleCondition::ModelHint("claude".to_string());
        assert!(!condition.matches(&req));

        req.params.model_preferences = Some(ModelPreferences {
            hints: Some(vec![ModelHint::new("Claude-3-Sonnet")]),
            ..Default::default()
        });
        assert!(condition.matches(&req));
    }

    #[test]
    fn test_mode_from_json() {
        let mode: SamplingMode = serde_json::from_str(
            r#"{
                "mode": "hybrid",
                "fallbackToHuman": true,
                "rules": [
                    {"name": "cheap", "condition": {"type": "lowCost", "value": 0.05}, "action": {"type": "autoApprove"}},
                    {"name": "no", "condition": {"type": "contentContains", "value": "secret"}, "action": {"type": "reject", "reason": "nope"}}
                ]
            }"#,
        )
        .unwrap();

        match mode {
            SamplingMode::Hybrid {
                rules,
                fallback_to_human,
            } => {
                assert!(fallback_to_human);
                assert_eq!(rules.len(), 2);
                assert_eq!(rules[0].condition, RuleCondition::LowCost(0.05));
                assert_eq!(rules[1].action, RuleAction::Reject("nope".to_string()));
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }
}
