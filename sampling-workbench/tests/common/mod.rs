//! Shared fixtures for workbench integration tests: scripted providers,
//! recording notification sinks and misbehaving collaborators.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use sampling_workbench::sampling_protocol::{
    CapabilityDescriptor, CompletionRequest, CompletionResponse, CreateMessageParams, Message,
    Pricing, ProviderError, TokenUsage,
};
use sampling_workbench::{
    CapabilityProvider, NotificationKind, NotificationSink, ServerDirectory, Workbench,
    WorkbenchConfig,
};

pub type Outcome = Result<CompletionResponse, ProviderError>;

/// Capability used by most tests: $0.003 / $0.015 per 1k tokens
pub fn capability() -> CapabilityDescriptor {
    CapabilityDescriptor::new("test", "test-model", Pricing::new(0.003, 0.015))
        .with_max_context_tokens(8000)
}

pub fn reply(text: &str) -> CompletionResponse {
    CompletionResponse::new(text, "test-model")
        .with_usage(TokenUsage {
            input_tokens: 12,
            output_tokens: 34,
            thinking_tokens: None,
        })
        .with_stop_reason("end_turn")
}

pub fn params(text: &str) -> CreateMessageParams {
    CreateMessageParams::new(vec![Message::user(text)]).with_max_tokens(500)
}

/// Provider that plays back queued outcomes, then repeats a fallback
pub struct ScriptedProvider {
    capability: CapabilityDescriptor,
    available: AtomicBool,
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    latency: Duration,
    calls: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(fallback: Outcome) -> Self {
        Self {
            capability: capability(),
            available: AtomicBool::new(true),
            script: Mutex::new(VecDeque::new()),
            fallback,
            latency: Duration::from_millis(50),
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always succeeds with `text`
    pub fn succeeding(text: &str) -> Self {
        Self::new(Ok(reply(text)))
    }

    /// Always fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::new(Err(error))
    }

    /// Outcomes returned, in order, before the fallback applies
    pub fn with_script(self, outcomes: Vec<Outcome>) -> Self {
        *self.script.lock().unwrap() = outcomes.into();
        self
    }

    pub fn with_capability(mut self, capability: CapabilityDescriptor) -> Self {
        self.capability = capability;
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilityProvider for ScriptedProvider {
    fn active_capability(&self) -> Option<CapabilityDescriptor> {
        Some(self.capability.clone())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(
        &self,
        _server_id: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        tokio::time::sleep(self.latency).await;
        outcome
    }
}

/// Notification sink that remembers everything it was told
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingSink {
    pub fn entries(&self) -> Vec<(NotificationKind, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, kind: NotificationKind, message: &str) -> Result<()> {
        self.entries.lock().unwrap().push((kind, message.to_string()));
        Ok(())
    }
}

/// Sink that always fails
pub struct BrokenSink;

impl NotificationSink for BrokenSink {
    fn notify(&self, _kind: NotificationKind, _message: &str) -> Result<()> {
        Err(anyhow!("sink unavailable"))
    }
}

/// Directory that always fails
pub struct BrokenDirectory;

impl ServerDirectory for BrokenDirectory {
    fn server_name(&self, server_id: &str) -> Result<String> {
        Err(anyhow!("lookup failed for {}", server_id))
    }
}

/// Workbench wired to a provider and a recording sink
pub fn workbench_with(
    config: WorkbenchConfig,
    provider: Option<Arc<ScriptedProvider>>,
    sink: Arc<RecordingSink>,
) -> Workbench {
    let mut builder = Workbench::builder()
        .with_config(config)
        .with_shared_notifier(sink);
    if let Some(provider) = provider {
        builder = builder.with_shared_provider(provider);
    }
    builder.build().unwrap()
}

pub fn workbench(provider: Arc<ScriptedProvider>, sink: Arc<RecordingSink>) -> Workbench {
    workbench_with(WorkbenchConfig::default(), Some(provider), sink)
}
