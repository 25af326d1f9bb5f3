use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use sampling_workbench::sampling_protocol::{
    CapabilityDescriptor, CompletionRequest, CompletionResponse, CreateMessageParams,
    FeatureFlags, Message, Pricing, ProviderError,
};
use sampling_workbench::{
    ApprovalRule, CapabilityProvider, EchoProvider, HumanResponse, ResolutionMode, RuleAction,
    RuleCondition, SamplingMode, StaticServerDirectory, TracingNotifier, Workbench,
    WorkbenchConfig,
};
use tracing::{info, Level};
use tracing_subscriber::fmt;

/// Echo backend that fails its first call, to show the retry path
struct FlakyEcho {
    inner: EchoProvider,
    calls: AtomicU32,
}

#[async_trait]
impl CapabilityProvider for FlakyEcho {
    fn active_capability(&self) -> Option<CapabilityDescriptor> {
        self.inner.active_capability()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn complete(
        &self,
        server_id: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(ProviderError::from_message("503 Service Unavailable"));
        }
        self.inner.complete(server_id, request).await
    }
}

fn load_config() -> Result<WorkbenchConfig> {
    // Optional JSON config path as the first argument
    if let Some(path) = std::env::args().nth(1) {
        let json = std::fs::read_to_string(&path)?;
        return Ok(WorkbenchConfig::from_json(&json)?);
    }

    let mut config = WorkbenchConfig::default();
    config.retry.initial_delay_ms = 200;
    config.mode = SamplingMode::Hybrid {
        rules: vec![
            ApprovalRule::new(
                "block credentials",
                RuleCondition::ContentContains("password".to_string()),
                RuleAction::Reject("Request contains credentials".to_string()),
            ),
            ApprovalRule::new(
                "trust weather",
                RuleCondition::TrustedServer("Weather".to_string()),
                RuleAction::AutoApprove,
            ),
        ],
        fallback_to_human: true,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = fmt::Subscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let capability = CapabilityDescriptor::new(
        "echo",
        "echo-model-1.0",
        Pricing::new(0.003, 0.015).with_thinking(0.01),
    )
    .with_max_context_tokens(200_000)
    .with_features(FeatureFlags {
        extended_thinking: true,
        ..Default::default()
    });

    let workbench = Workbench::builder()
        .with_config(load_config()?)
        .with_provider(FlakyEcho {
            inner: EchoProvider::new().with_capability(capability),
            calls: AtomicU32::new(0),
        })
        .with_server_directory(
            StaticServerDirectory::new()
                .with_server("weather", "Weather")
                .with_server("notes", "Notes"),
        )
        .with_notifier(TracingNotifier)
        .build()?;

    // Log every registry change as JSON
    let mut events = workbench.subscribe();
    let event_log = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                info!(target: "workbench_demo::events", "{}", json);
            }
        }
    });

    // Trusted server: resolved by the LLM, retrying once
    let forecast = workbench
        .handle_incoming(
            "weather",
            CreateMessageParams::new(vec![Message::user("Summarize tomorrow's forecast")])
                .with_max_tokens(300),
            Some("msg-1".to_string()),
        )
        .await?;
    info!(status = %forecast.status, cost = ?forecast.cost, "Forecast request settled");

    // Rejected by rule
    let leaked = workbench
        .handle_incoming(
            "notes",
            CreateMessageParams::new(vec![Message::user("My password is hunter2")]),
            None,
        )
        .await?;
    info!(status = %leaked.status, reason = ?leaked.rejection_reason, "Notes request settled");

    // Falls back to review; answered by an operator
    let question = workbench
        .handle_incoming(
            "notes",
            CreateMessageParams::new(vec![Message::user("What should I title this note?")]),
            None,
        )
        .await?;
    let context = workbench.analyze(&question.id).await?;
    info!(turns = context.thread_length, tokens = context.estimated_tokens, "Reviewing request");

    let answered = workbench
        .approve_and_process(
            &question.id,
            ResolutionMode::Human(HumanResponse::new("Weekly planning")),
        )
        .await?;

    // Capture the operator's answer and replay it for a repeat question
    let template = workbench.save_as_template(&answered.id, "note title").await?;
    let repeat = workbench
        .handle_incoming(
            "notes",
            CreateMessageParams::new(vec![Message::user("What should I title this note?")]),
            None,
        )
        .await?;
    workbench.apply_template(&repeat.id, &template.id).await?;

    // Pause automation; later arrivals wait for review
    workbench.set_mode(SamplingMode::Manual).await?;
    let held = workbench
        .handle_incoming(
            "weather",
            CreateMessageParams::new(vec![Message::user("Any storms this week?")]),
            None,
        )
        .await?;
    info!(status = %held.status, "Weather request held for review");

    let stats = workbench.stats();
    info!("Stats: {}", serde_json::to_string_pretty(&stats)?);
    for request in workbench.get_history().await {
        info!(id = %request.id, server = %request.server_name, status = %request.status, "History");
    }

    drop(workbench);
    event_log.await?;
    Ok(())
}
