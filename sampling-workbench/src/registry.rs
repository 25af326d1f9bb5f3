// sampling-workbench/src/registry.rs
//! Authoritative store of sampling requests and their lifecycle.
//!
//! ```text
//! pending --approve--> approved --resolve--> completed | error
//! pending --reject---> rejected
//! pending --replay---> completed
//! ```
//!
//! Pending and approved requests live in the active set. Settled requests move
//! into a fixed-capacity history, most recent first.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use sampling_protocol::{
    CostEstimate, CreateMessageParams, CreateMessageResult, ProviderError, RequestStatus,
    SamplingRequest,
};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{WorkbenchError, WorkbenchResult};
use crate::events::{EventBus, RegistryEvent};

/// Terminal outcome of an approved request
#[derive(Debug, Clone)]
pub enum Resolution {
    Success {
        response: CreateMessageResult,
        cost: Option<f64>,
    },
    Failure {
        error: ProviderError,
    },
}

/// Aggregate counters, updated with atomic increments
#[derive(Debug, Default)]
pub struct RegistryCounters {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    replayed: AtomicU64,
    timed_resolutions: AtomicU64,
    resolution_ms: AtomicU64,
    cost_micros: AtomicU64,
}

/// Point-in-time view of the aggregate counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rejected_requests: u64,
    pub replayed_requests: u64,
    pub average_resolution_ms: f64,
    pub total_cost: f64,
}

impl RegistryCounters {
    fn record_created(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    fn record_resolution(&self, success: bool, duration_ms: u64, cost: Option<f64>) {
        if success {
            self.successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.timed_resolutions.fetch_add(1, Ordering::Relaxed);
        self.resolution_ms.fetch_add(duration_ms, Ordering::Relaxed);
        self.add_cost(cost);
    }

    fn record_replayed(&self) {
        self.successful.fetch_add(1, Ordering::Relaxed);
        self.replayed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn add_cost(&self, cost: Option<f64>) {
        if let Some(cost) = cost.filter(|c| c.is_finite() && *c > 0.0) {
            self.cost_micros
                .fetch_add((cost * 1_000_000.0).round() as u64, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> RegistryStats {
        let timed = self.timed_resolutions.load(Ordering::Relaxed);
        let average_resolution_ms = if timed == 0 {
            0.0
        } else {
            self.resolution_ms.load(Ordering::Relaxed) as f64 / timed as f64
        };
        RegistryStats {
            total_requests: self.total.load(Ordering::Relaxed),
            successful_requests: self.successful.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            rejected_requests: self.rejected.load(Ordering::Relaxed),
            replayed_requests: self.replayed.load(Ordering::Relaxed),
            average_resolution_ms,
            total_cost: self.cost_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        }
    }
}

struct ActiveEntry {
    seq: u64,
    request: SamplingRequest,
    approved_instant: Option<Instant>,
    // Set while a backend call owns the request
    resolving: bool,
}

/// Request registry. Owned by the workbench; observers only see snapshots.
pub struct RequestRegistry {
    active: HashMap<String, ActiveEntry>,
    history: VecDeque<SamplingRequest>,
    capacity: usize,
    next_seq: u64,
    counters: Arc<RegistryCounters>,
    events: EventBus,
}

impl RequestRegistry {
    /// Create a registry keeping at most `capacity` settled requests
    pub fn new(capacity: usize, events: EventBus) -> Self {
        Self {
            active: HashMap::new(),
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_seq: 0,
            counters: Arc::new(RegistryCounters::default()),
            events,
        }
    }

    /// Shared handle to the aggregate counters
    pub fn counters(&self) -> Arc<RegistryCounters> {
        self.counters.clone()
    }

    pub fn stats(&self) -> RegistryStats {
        self.counters.snapshot()
    }

    /// Register a new pending request
    pub fn insert(&mut self, request: SamplingRequest) -> WorkbenchResult<SamplingRequest> {
        if request.status != RequestStatus::Pending {
            return Err(WorkbenchError::invalid_transition(&request.id, request.status, "register"));
        }
        if self.contains(&request.id) {
            return Err(WorkbenchError::Validation(format!(
                "Duplicate request id: {}",
                request.id
            )));
        }
        validate_params(&request.params)?;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.counters.record_created();

        info!(
            request_id = %request.id,
            server = %request.server_name,
            messages = request.params.messages.len(),
            "Sampling request pending"
        );

        self.active.insert(
            request.id.clone(),
            ActiveEntry {
                seq,
                request: request.clone(),
                approved_instant: None,
                resolving: false,
            },
        );
        self.events.emit(RegistryEvent::Created {
            request: request.clone(),
        });
        Ok(request)
    }

    /// pending -> approved, optionally replacing the params with an edited copy
    pub fn approve(
        &mut self,
        id: &str,
        edited: Option<CreateMessageParams>,
    ) -> WorkbenchResult<SamplingRequest> {
        if let Some(params) = &edited {
            validate_params(params)?;
        }
        let entry = self.active_entry(id, "approve")?;
        if entry.request.status != RequestStatus::Pending {
            return Err(WorkbenchError::invalid_transition(id, entry.request.status, "approve"));
        }

        let was_edited = edited.is_some();
        if let Some(params) = edited {
            entry.request.params = params;
        }
        entry.request.status = RequestStatus::Approved;
        entry.request.approved_at = Some(Utc::now());
        entry.approved_instant = Some(Instant::now());

        let snapshot = entry.request.clone();
        info!(request_id = %id, edited = was_edited, "Sampling request approved");
        self.events.emit(RegistryEvent::Approved {
            request: snapshot.clone(),
            edited: was_edited,
        });
        Ok(snapshot)
    }

    /// Replace the cost estimate of an unsettled request
    pub fn set_estimate(&mut self, id: &str, estimate: Option<CostEstimate>) -> WorkbenchResult<()> {
        let entry = self.active_entry(id, "re-estimate")?;
        entry.request.estimate = estimate;
        Ok(())
    }

    /// pending -> rejected. Blank reasons fail without touching the request.
    pub fn reject(&mut self, id: &str, reason: &str) -> WorkbenchResult<SamplingRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkbenchError::EmptyRejectionReason);
        }
        let status = self.active_entry(id, "reject")?.request.status;
        if status != RequestStatus::Pending {
            return Err(WorkbenchError::invalid_transition(id, status, "reject"));
        }

        let mut request = self.take_active(id)?;
        request.status = RequestStatus::Rejected;
        request.rejection_reason = Some(reason.to_string());
        request.resolved_at = Some(Utc::now());
        self.counters.record_rejected();

        info!(request_id = %id, reason, "Sampling request rejected");
        self.settle(request.clone());
        self.events.emit(RegistryEvent::Rejected {
            request: request.clone(),
        });
        Ok(request)
    }

    /// Mark an approved request as owned by one resolution attempt.
    ///
    /// A second claim, or a direct `resolve`, fails until the owner either
    /// settles the request with `resolve_claimed` or hands it back with `release`.
    pub fn claim(&mut self, id: &str) -> WorkbenchResult<SamplingRequest> {
        let entry = self.active_entry(id, "process")?;
        if entry.request.status != RequestStatus::Approved {
            return Err(WorkbenchError::invalid_transition(id, entry.request.status, "process"));
        }
        if entry.resolving {
            return Err(WorkbenchError::invalid_transition(
                id,
                entry.request.status,
                "start a second resolution of",
            ));
        }
        entry.resolving = true;
        debug!(request_id = %id, "Sampling request claimed for resolution");
        Ok(entry.request.clone())
    }

    /// Hand a claimed request back so it can be resolved again
    pub fn release(&mut self, id: &str) -> WorkbenchResult<()> {
        let entry = self.active_entry(id, "release")?;
        entry.resolving = false;
        Ok(())
    }

    /// approved -> completed | error, recording the time since approval.
    /// Refused while another caller holds a claim on the request.
    pub fn resolve(&mut self, id: &str, resolution: Resolution) -> WorkbenchResult<SamplingRequest> {
        let entry = self.active_entry(id, "resolve")?;
        if entry.request.status != RequestStatus::Approved {
            return Err(WorkbenchError::invalid_transition(id, entry.request.status, "resolve"));
        }
        if entry.resolving {
            return Err(WorkbenchError::invalid_transition(
                id,
                entry.request.status,
                "resolve an in-progress",
            ));
        }
        self.finish(id, resolution)
    }

    /// Settle a request previously taken with `claim`
    pub fn resolve_claimed(
        &mut self,
        id: &str,
        resolution: Resolution,
    ) -> WorkbenchResult<SamplingRequest> {
        let entry = self.active_entry(id, "resolve")?;
        if !entry.resolving {
            return Err(WorkbenchError::invalid_transition(
                id,
                entry.request.status,
                "resolve an unclaimed",
            ));
        }
        self.finish(id, resolution)
    }

    /// pending -> completed with a replayed response, skipping approval
    pub fn complete_from_replay(
        &mut self,
        id: &str,
        response: CreateMessageResult,
    ) -> WorkbenchResult<SamplingRequest> {
        self.ensure_pending(id, "replay onto")?;

        let mut request = self.take_active(id)?;
        request.status = RequestStatus::Completed;
        request.response = Some(response);
        request.duration_ms = Some(0);
        request.resolved_at = Some(Utc::now());
        self.counters.record_replayed();

        info!(request_id = %id, "Sampling request completed from replay template");
        self.settle(request.clone());
        Ok(request)
    }

    /// Fail unless the request exists and is pending
    pub fn ensure_pending(&self, id: &str, action: &'static str) -> WorkbenchResult<()> {
        match self.get(id) {
            None => Err(WorkbenchError::RequestNotFound(id.to_string())),
            Some(request) if request.status != RequestStatus::Pending => {
                Err(WorkbenchError::invalid_transition(id, request.status, action))
            }
            Some(_) => Ok(()),
        }
    }

    /// Drop a pending or settled request. In-flight requests cannot be removed.
    pub fn remove(&mut self, id: &str) -> WorkbenchResult<SamplingRequest> {
        if let Some(entry) = self.active.get(id) {
            if entry.request.status == RequestStatus::Approved {
                return Err(WorkbenchError::invalid_transition(id, entry.request.status, "remove"));
            }
        }
        let removed = match self.active.remove(id) {
            Some(entry) => entry.request,
            None => {
                let index = self
                    .history
                    .iter()
                    .position(|r| r.id == id)
                    .ok_or_else(|| WorkbenchError::RequestNotFound(id.to_string()))?;
                self.history
                    .remove(index)
                    .ok_or_else(|| WorkbenchError::RequestNotFound(id.to_string()))?
            }
        };
        debug!(request_id = %id, "Sampling request removed");
        self.events.emit(RegistryEvent::Removed {
            request_id: id.to_string(),
        });
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<SamplingRequest> {
        self.active
            .get(id)
            .map(|entry| entry.request.clone())
            .or_else(|| self.history.iter().find(|r| r.id == id).cloned())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.active.contains_key(id) || self.history.iter().any(|r| r.id == id)
    }

    /// Pending requests, oldest first
    pub fn pending(&self) -> Vec<SamplingRequest> {
        self.active_with_status(RequestStatus::Pending)
    }

    /// Approved requests awaiting resolution, oldest first
    pub fn in_flight(&self) -> Vec<SamplingRequest> {
        self.active_with_status(RequestStatus::Approved)
    }

    /// Settled requests, most recent first
    pub fn history(&self) -> Vec<SamplingRequest> {
        self.history.iter().cloned().collect()
    }

    fn finish(&mut self, id: &str, resolution: Resolution) -> WorkbenchResult<SamplingRequest> {
        let entry = self.active_entry(id, "resolve")?;
        let duration_ms = entry
            .approved_instant
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0);

        let mut request = self.take_active(id)?;
        request.duration_ms = Some(duration_ms);
        request.resolved_at = Some(Utc::now());

        match resolution {
            Resolution::Success { response, cost } => {
                request.status = RequestStatus::Completed;
                request.response = Some(response);
                request.cost = cost;
                self.counters.record_resolution(true, duration_ms, cost);
                info!(request_id = %id, duration_ms, "Sampling request completed");
            }
            Resolution::Failure { error } => {
                warn!(request_id = %id, duration_ms, %error, "Sampling request failed");
                request.status = RequestStatus::Error;
                request.error = Some(error);
                self.counters.record_resolution(false, duration_ms, None);
            }
        }

        self.settle(request.clone());
        self.events.emit(RegistryEvent::Resolved {
            request: request.clone(),
        });
        Ok(request)
    }

    fn active_with_status(&self, status: RequestStatus) -> Vec<SamplingRequest> {
        let mut entries: Vec<&ActiveEntry> = self
            .active
            .values()
            .filter(|entry| entry.request.status == status)
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.request.clone()).collect()
    }

    fn active_entry(&mut self, id: &str, action: &'static str) -> WorkbenchResult<&mut ActiveEntry> {
        if let Some(settled) = self.history.iter().find(|r| r.id == id) {
            return Err(WorkbenchError::invalid_transition(id, settled.status, action));
        }
        self.active
            .get_mut(id)
            .ok_or_else(|| WorkbenchError::RequestNotFound(id.to_string()))
    }

    fn take_active(&mut self, id: &str) -> WorkbenchResult<SamplingRequest> {
        self.active
            .remove(id)
            .map(|entry| entry.request)
            .ok_or_else(|| WorkbenchError::RequestNotFound(id.to_string()))
    }

    fn settle(&mut self, request: SamplingRequest) {
        self.history.push_front(request);
        while self.history.len() > self.capacity {
            if let Some(evicted) = self.history.pop_back() {
                debug!(request_id = %evicted.id, "Evicted from history");
            }
        }
    }
}

/// Check the structural rules every stored request must satisfy
pub(crate) fn validate_params(params: &CreateMessageParams) -> WorkbenchResult<()> {
    if params.messages.is_empty() {
        return Err(WorkbenchError::Validation(
            "A sampling request needs at least one message".to_string(),
        ));
    }
    if let Some(name) = params
        .model_preferences
        .as_ref()
        .and_then(|p| p.out_of_range_priority())
    {
        return Err(WorkbenchError::Validation(format!(
            "{} must be between 0 and 1",
            name
        )));
    }
    if let Some(temperature) = params.temperature {
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(WorkbenchError::Validation(format!(
                "Invalid temperature: {}",
                temperature
            )));
        }
    }
    if params.max_tokens == Some(0) {
        return Err(WorkbenchError::Validation(
            "maxTokens must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
