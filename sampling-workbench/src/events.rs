// sampling-workbench/src/events.rs
use sampling_protocol::{ReplayTemplate, SamplingRequest};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::routing::SamplingMode;

/// Change notifications for observers. Every payload is an owned snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RegistryEvent {
    Created { request: SamplingRequest },
    Approved { request: SamplingRequest, edited: bool },
    Rejected { request: SamplingRequest },
    Resolved { request: SamplingRequest },
    #[serde(rename_all = "camelCase")]
    Removed { request_id: String },
    TemplateSaved { template: ReplayTemplate },
    TemplateApplied { template: ReplayTemplate, request: SamplingRequest },
    #[serde(rename_all = "camelCase")]
    TemplateDeleted { template_id: String },
    ModeChanged { previous: SamplingMode, mode: SamplingMode },
}

/// Broadcast sender shared by the registry and the template library
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RegistryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.tx.subscribe()
    }

    /// Send to current subscribers; having none is not an error
    pub fn emit(&self, event: RegistryEvent) {
        let _ = self.tx.send(event);
    }
}
