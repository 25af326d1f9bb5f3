// sampling-workbench/src/workbench.rs
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sampling_protocol::{
    constants::{metadata_keys, HUMAN_OPERATOR_MODEL, UNKNOWN_SERVER_NAME},
    CapabilityDescriptor, CompletionRequest, CompletionResponse, CostEstimate,
    CreateMessageParams, CreateMessageResult, Message, MessageContent, ReplayTemplate,
    Role, SamplingRequest, StopReason, TokenUsage,
};

use crate::analysis::{self, ConversationContext};
use crate::collaborators::{NotificationKind, NotificationSink, ServerDirectory};
use crate::config::{validate_mode, WorkbenchConfig};
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::estimator;
use crate::events::{EventBus, RegistryEvent};
use crate::provider::CapabilityProvider;
use crate::registry::{
    validate_params, RegistryCounters, RegistryStats, RequestRegistry, Resolution,
};
use crate::retry::{RetryError, RetryPolicy};
use crate::routing::{self, Route, SamplingMode};
use crate::templates::TemplateLibrary;

/// Text typed by an operator in answer to a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanResponse {
    pub text: String,
    /// Attributed model; defaults to the human operator sentinel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl HumanResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// How an approved request gets its response
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionMode {
    Human(HumanResponse),
    Ai,
}

/// Workbench builder
pub struct WorkbenchBuilder {
    config: WorkbenchConfig,
    provider: Option<Arc<dyn CapabilityProvider>>,
    directory: Option<Arc<dyn ServerDirectory>>,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl WorkbenchBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: WorkbenchConfig::default(),
            provider: None,
            directory: None,
            notifier: None,
        }
    }

    pub fn with_config(mut self, config: WorkbenchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the LLM backend used in AI mode
    pub fn with_provider<P: CapabilityProvider>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Set an LLM backend the caller keeps a handle to
    pub fn with_shared_provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_server_directory<D: ServerDirectory + 'static>(mut self, directory: D) -> Self {
        self.directory = Some(Arc::new(directory));
        self
    }

    pub fn with_notifier<N: NotificationSink + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    pub fn with_shared_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the workbench
    pub fn build(self) -> WorkbenchResult<Workbench> {
        self.config.validate()?;

        let session_id = self
            .config
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let events = EventBus::new(self.config.event_capacity);
        let registry = RequestRegistry::new(self.config.history_capacity, events.clone());

        info!(%session_id, mode = ?self.config.mode, "Sampling workbench ready");

        Ok(Workbench {
            retry: RetryPolicy::from(&self.config.retry),
            mode: RwLock::new(self.config.mode.clone()),
            config: self.config,
            session_id,
            provider: self.provider,
            directory: self.directory,
            notifier: self.notifier,
            events,
            counters: registry.counters(),
            registry: Arc::new(RwLock::new(registry)),
            templates: Arc::new(RwLock::new(TemplateLibrary::new())),
        })
    }
}

impl Default for WorkbenchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates review and resolution of sampling requests.
///
/// All registry and template mutations go through this type. Methods take
/// `&self`, so independent requests can be resolved concurrently.
pub struct Workbench {
    config: WorkbenchConfig,
    session_id: String,
    retry: RetryPolicy,
    // Starts as `config.mode`; replaced by `set_mode`
    mode: RwLock<SamplingMode>,
    provider: Option<Arc<dyn CapabilityProvider>>,
    directory: Option<Arc<dyn ServerDirectory>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    events: EventBus,
    counters: Arc<RegistryCounters>,
    registry: Arc<RwLock<RequestRegistry>>,
    templates: Arc<RwLock<TemplateLibrary>>,
}

impl Workbench {
    pub fn builder() -> WorkbenchBuilder {
        WorkbenchBuilder::new()
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Routing mode applied to newly arriving requests
    pub async fn mode(&self) -> SamplingMode {
        self.mode.read().await.clone()
    }

    /// Switch the routing mode for requests that arrive from now on.
    /// Requests already registered keep their state. Returns the previous mode.
    pub async fn set_mode(&self, mode: SamplingMode) -> WorkbenchResult<SamplingMode> {
        validate_mode(&mode)?;
        let previous = {
            let mut current = self.mode.write().await;
            std::mem::replace(&mut *current, mode.clone())
        };
        info!(previous = ?previous, mode = ?mode, "Sampling mode changed");
        self.events.emit(RegistryEvent::ModeChanged {
            previous: previous.clone(),
            mode,
        });
        Ok(previous)
    }

    /// Receive a snapshot event after every mutation
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Whether AI resolution is possible right now
    pub fn has_capability(&self) -> bool {
        self.provider.as_ref().map_or(false, |provider| {
            provider.is_available() && provider.active_capability().is_some()
        })
    }

    /// Descriptor of the configured backend, available or not
    pub fn capability(&self) -> Option<CapabilityDescriptor> {
        self.provider
            .as_ref()
            .and_then(|provider| provider.active_capability())
    }

    /// Estimate what sending `messages` would cost. Absent when no backend is
    /// configured or its pricing is unusable.
    pub fn estimate_cost(&self, messages: &[Message], max_tokens: u32) -> Option<CostEstimate> {
        let capability = self.capability()?;
        match estimator::estimate(messages, max_tokens, &capability, &self.config.estimate) {
            Ok(estimate) => Some(estimate),
            Err(e) => {
                debug!(error = %e, "Cost estimate unavailable");
                None
            }
        }
    }

    /// Register a new pending request
    pub async fn create_request(
        &self,
        server_id: &str,
        params: CreateMessageParams,
        protocol_message_id: Option<String>,
    ) -> WorkbenchResult<SamplingRequest> {
        let mut request = SamplingRequest::new(
            Uuid::new_v4().to_string(),
            server_id.to_string(),
            self.server_name(server_id),
            params,
        );
        request.protocol_message_id = protocol_message_id;
        request.estimate = self.estimate_for(&request.params);

        let request = self.registry.write().await.insert(request)?;
        self.notify(
            NotificationKind::Info,
            &format!("New sampling request from {}", request.server_name),
        );
        Ok(request)
    }

    /// Register a request and route it according to the current mode
    pub async fn handle_incoming(
        &self,
        server_id: &str,
        params: CreateMessageParams,
        protocol_message_id: Option<String>,
    ) -> WorkbenchResult<SamplingRequest> {
        let request = self
            .create_request(server_id, params, protocol_message_id)
            .await?;

        let route = routing::route(&*self.mode.read().await, &request);
        match route {
            Route::Human => Ok(request),
            Route::Reject(reason) => self.reject(&request.id, &reason).await,
            Route::Ai if !self.has_capability() => {
                warn!(request_id = %request.id, "No LLM provider for automatic resolution");
                self.notify(
                    NotificationKind::Warning,
                    &format!(
                        "Request from {} needs review: no LLM provider configured",
                        request.server_name
                    ),
                );
                Ok(request)
            }
            Route::Ai => self.approve_and_process(&request.id, ResolutionMode::Ai).await,
        }
    }

    /// pending -> approved, optionally with edited params
    pub async fn approve(
        &self,
        id: &str,
        edited: Option<CreateMessageParams>,
    ) -> WorkbenchResult<SamplingRequest> {
        let mut registry = self.registry.write().await;
        registry.ensure_pending(id, "approve")?;
        if let Some(params) = &edited {
            validate_params(params)?;
            registry.set_estimate(id, self.estimate_for(params))?;
        }
        registry.approve(id, edited)
    }

    /// pending -> rejected
    pub async fn reject(&self, id: &str, reason: &str) -> WorkbenchResult<SamplingRequest> {
        let request = self.registry.write().await.reject(id, reason)?;
        self.notify(
            NotificationKind::Info,
            &format!("Rejected sampling request from {}", request.server_name),
        );
        Ok(request)
    }

    /// Approve a pending request and resolve it
    pub async fn approve_and_process(
        &self,
        id: &str,
        mode: ResolutionMode,
    ) -> WorkbenchResult<SamplingRequest> {
        self.approve_and_process_cancellable(id, mode, &CancellationToken::new())
            .await
    }

    /// Approve a pending request and resolve it, abandoning AI retries when
    /// `cancel` fires. A token cancelled before the call leaves the request
    /// pending; one cancelled mid-resolution leaves it approved.
    pub async fn approve_and_process_cancellable(
        &self,
        id: &str,
        mode: ResolutionMode,
        cancel: &CancellationToken,
    ) -> WorkbenchResult<SamplingRequest> {
        // Checked before approval so a refused call leaves the request pending
        match &mode {
            ResolutionMode::Ai if !self.has_capability() => {
                return Err(WorkbenchError::CapabilityUnavailable)
            }
            ResolutionMode::Human(response) => validate_human(response)?,
            ResolutionMode::Ai => {}
        }
        if cancel.is_cancelled() {
            debug!(request_id = %id, "Cancelled before approval");
            return Err(WorkbenchError::Cancelled(id.to_string()));
        }

        self.approve(id, None).await?;
        self.process_approved(id, mode, cancel).await
    }

    /// Resolve a request that is already approved
    pub async fn process_approved(
        &self,
        id: &str,
        mode: ResolutionMode,
        cancel: &CancellationToken,
    ) -> WorkbenchResult<SamplingRequest> {
        match mode {
            ResolutionMode::Human(response) => self.submit_human_response(id, response).await,
            ResolutionMode::Ai => self.resolve_with_ai(id, cancel).await,
        }
    }

    /// approved -> completed with operator-supplied text
    pub async fn submit_human_response(
        &self,
        id: &str,
        response: HumanResponse,
    ) -> WorkbenchResult<SamplingRequest> {
        validate_human(&response)?;

        let request = {
            let mut registry = self.registry.write().await;
            let request = registry
                .get(id)
                .ok_or_else(|| WorkbenchError::RequestNotFound(id.to_string()))?;
            let result = human_result(&request, response);
            registry.resolve(
                id,
                Resolution::Success {
                    response: result,
                    cost: None,
                },
            )?
        };

        self.notify(
            NotificationKind::Success,
            &format!("Sent operator response to {}", request.server_name),
        );
        Ok(request)
    }

    async fn resolve_with_ai(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> WorkbenchResult<SamplingRequest> {
        let provider = self
            .provider
            .as_ref()
            .filter(|provider| provider.is_available())
            .ok_or(WorkbenchError::CapabilityUnavailable)?;
        let capability = provider
            .active_capability()
            .ok_or(WorkbenchError::CapabilityUnavailable)?;

        // Held until settled or released; a second resolution is refused meanwhile
        let request = self.registry.write().await.claim(id)?;

        let completion = self.completion_request(&request);
        let server_id = request.server_id.as_str();
        let provider = provider.as_ref();
        let completion_ref = &completion;

        info!(request_id = %id, model = %capability.model, "Resolving sampling request with LLM");
        let outcome = self
            .retry
            .run(cancel, |attempt| async move {
                if attempt > 0 {
                    debug!(request_id = %id, attempt, "Retrying completion");
                }
                provider.complete(server_id, completion_ref).await
            })
            .await;

        match outcome {
            Ok(response) => {
                let (result, cost) = ai_result(&request, &capability, response);
                let request = self.registry.write().await.resolve_claimed(
                    id,
                    Resolution::Success {
                        response: result,
                        cost,
                    },
                )?;
                self.notify(
                    NotificationKind::Success,
                    &format!(
                        "Completed sampling request from {} in {}ms",
                        request.server_name,
                        request.duration_ms.unwrap_or(0)
                    ),
                );
                Ok(request)
            }
            Err(RetryError::Failed { attempts, error }) => {
                let message = error.to_string();
                let request = self
                    .registry
                    .write()
                    .await
                    .resolve_claimed(id, Resolution::Failure { error })?;
                self.notify(
                    NotificationKind::Error,
                    &format!(
                        "Sampling request from {} failed after {} attempt(s): {}",
                        request.server_name, attempts, message
                    ),
                );
                Ok(request)
            }
            Err(RetryError::Cancelled { attempts }) => {
                info!(request_id = %id, attempts, "Sampling request resolution cancelled");
                if let Err(e) = self.registry.write().await.release(id) {
                    debug!(request_id = %id, error = %e, "Release after cancellation failed");
                }
                self.notify(
                    NotificationKind::Warning,
                    &format!("Cancelled sampling request from {}", request.server_name),
                );
                Err(WorkbenchError::Cancelled(id.to_string()))
            }
        }
    }

    pub async fn get_request(&self, id: &str) -> Option<SamplingRequest> {
        self.registry.read().await.get(id)
    }

    /// Pending requests, oldest first
    pub async fn get_pending(&self) -> Vec<SamplingRequest> {
        self.registry.read().await.pending()
    }

    /// Approved requests still being resolved
    pub async fn get_in_flight(&self) -> Vec<SamplingRequest> {
        self.registry.read().await.in_flight()
    }

    /// Settled requests, most recent first
    pub async fn get_history(&self) -> Vec<SamplingRequest> {
        self.registry.read().await.history()
    }

    pub async fn delete_request(&self, id: &str) -> WorkbenchResult<SamplingRequest> {
        self.registry.write().await.remove(id)
    }

    /// Aggregate counters; read without taking the registry lock
    pub fn stats(&self) -> RegistryStats {
        self.counters.snapshot()
    }

    pub async fn analyze(&self, id: &str) -> WorkbenchResult<ConversationContext> {
        let request = self
            .get_request(id)
            .await
            .ok_or_else(|| WorkbenchError::RequestNotFound(id.to_string()))?;
        Ok(analysis::analyze(&request.params, self.capability().as_ref()))
    }

    /// Capture a completed request's response under `name`
    pub async fn save_as_template(
        &self,
        request_id: &str,
        name: &str,
    ) -> WorkbenchResult<ReplayTemplate> {
        let request = self
            .get_request(request_id)
            .await
            .ok_or_else(|| WorkbenchError::RequestNotFound(request_id.to_string()))?;
        let template = self.templates.write().await.save(&request, name)?;

        self.events.emit(RegistryEvent::TemplateSaved {
            template: template.clone(),
        });
        self.notify(
            NotificationKind::Success,
            &format!("Saved replay template '{}'", template.name),
        );
        Ok(template)
    }

    /// Complete a pending request with a template's captured response
    pub async fn apply_template(
        &self,
        request_id: &str,
        template_id: &str,
    ) -> WorkbenchResult<SamplingRequest> {
        let (request, template) = {
            // Lock order: registry before templates
            let mut registry = self.registry.write().await;
            let mut templates = self.templates.write().await;

            let response = templates
                .get(template_id)
                .map(|template| template.response.clone())
                .ok_or_else(|| WorkbenchError::TemplateNotFound(template_id.to_string()))?;
            let request = registry.complete_from_replay(request_id, response)?;
            let template = templates.mark_used(template_id)?;
            (request, template)
        };

        self.events.emit(RegistryEvent::TemplateApplied {
            template: template.clone(),
            request: request.clone(),
        });
        self.notify(
            NotificationKind::Success,
            &format!(
                "Replayed template '{}' for {}",
                template.name, request.server_name
            ),
        );
        Ok(request)
    }

    pub async fn delete_template(&self, template_id: &str) -> WorkbenchResult<ReplayTemplate> {
        let template = self.templates.write().await.delete(template_id)?;
        self.events.emit(RegistryEvent::TemplateDeleted {
            template_id: template.id.clone(),
        });
        Ok(template)
    }

    pub async fn get_template(&self, template_id: &str) -> Option<ReplayTemplate> {
        self.templates.read().await.get(template_id).cloned()
    }

    pub async fn list_templates(&self) -> Vec<ReplayTemplate> {
        self.templates.read().await.list()
    }

    fn estimate_for(&self, params: &CreateMessageParams) -> Option<CostEstimate> {
        self.estimate_cost(&params.messages, self.max_tokens_for(params))
    }

    fn max_tokens_for(&self, params: &CreateMessageParams) -> u32 {
        params.max_tokens.unwrap_or(self.config.default_max_tokens)
    }

    fn server_name(&self, server_id: &str) -> String {
        let Some(directory) = &self.directory else {
            return UNKNOWN_SERVER_NAME.to_string();
        };
        directory.server_name(server_id).unwrap_or_else(|e| {
            debug!(%server_id, error = %e, "Server name lookup failed");
            UNKNOWN_SERVER_NAME.to_string()
        })
    }

    fn notify(&self, kind: NotificationKind, message: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(kind, message) {
                debug!(error = %e, "Notification sink failed");
            }
        }
    }

    /// Provider-agnostic request carrying caller identity for the backend
    fn completion_request(&self, request: &SamplingRequest) -> CompletionRequest {
        let params = &request.params;

        let mut metadata = serde_json::Map::new();
        metadata.insert(metadata_keys::CALLER.to_string(), json!(self.config.client.name));
        metadata.insert(
            metadata_keys::CALLER_VERSION.to_string(),
            json!(self.config.client.version),
        );
        metadata.insert(metadata_keys::SESSION_ID.to_string(), json!(self.session_id));
        metadata.insert(metadata_keys::REQUEST_ID.to_string(), json!(request.id));
        metadata.insert(metadata_keys::SERVER_ID.to_string(), json!(request.server_id));
        metadata.insert(
            metadata_keys::TIMESTAMP.to_string(),
            json!(Utc::now().to_rfc3339()),
        );
        if let Some(message_id) = &request.protocol_message_id {
            metadata.insert(
                metadata_keys::PROTOCOL_MESSAGE_ID.to_string(),
                json!(message_id),
            );
        }

        CompletionRequest {
            messages: params.messages.clone(),
            model_preferences: params.model_preferences.clone(),
            system_prompt: params.system_prompt.clone(),
            temperature: params.temperature.or(self.config.default_temperature),
            max_tokens: self.max_tokens_for(params),
            stop_sequences: params.stop_sequences.clone().unwrap_or_default(),
            metadata,
        }
    }
}

fn validate_human(response: &HumanResponse) -> WorkbenchResult<()> {
    if response.text.trim().is_empty() {
        return Err(WorkbenchError::Validation(
            "Human response text must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn human_result(request: &SamplingRequest, response: HumanResponse) -> CreateMessageResult {
    let usage = TokenUsage {
        input_tokens: estimator::estimate_input_tokens(&request.params.messages),
        output_tokens: estimator::estimate_text_tokens(&response.text),
        thinking_tokens: None,
    };
    CreateMessageResult {
        role: Role::Assistant,
        content: MessageContent::text(response.text),
        model: response
            .model
            .unwrap_or_else(|| HUMAN_OPERATOR_MODEL.to_string()),
        stop_reason: Some(StopReason::Manual),
        usage: Some(usage),
    }
}

/// Convert a backend response, pricing it from reported usage when present
fn ai_result(
    request: &SamplingRequest,
    capability: &CapabilityDescriptor,
    response: CompletionResponse,
) -> (CreateMessageResult, Option<f64>) {
    let estimated_cost = request.estimate.as_ref().map(|estimate| estimate.cost);
    let (usage, cost) = match response.usage {
        Some(usage) => {
            let cost = match estimator::price_usage(&usage, &capability.pricing) {
                Ok(cost) => Some(cost),
                Err(e) => {
                    debug!(request_id = %request.id, error = %e, "Falling back to estimated cost");
                    estimated_cost
                }
            };
            (usage, cost)
        }
        None => {
            let usage = TokenUsage {
                input_tokens: estimator::estimate_input_tokens(&request.params.messages),
                output_tokens: estimator::estimate_text_tokens(&response.text),
                thinking_tokens: None,
            };
            (usage, estimated_cost)
        }
    };

    let result = CreateMessageResult {
        role: Role::Assistant,
        content: MessageContent::text(response.text),
        model: response.model,
        stop_reason: Some(StopReason::from_provider(response.stop_reason.as_deref())),
        usage: Some(usage),
    };
    (result, cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EchoProvider;
    use sampling_protocol::{Pricing, RequestStatus};

    fn params(text: &str) -> CreateMessageParams {
        CreateMessageParams::new(vec![Message::user(text)]).with_max_tokens(100)
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let config = WorkbenchConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            Workbench::builder().with_config(config).build(),
            Err(WorkbenchError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_session_id_from_config() {
        let config = WorkbenchConfig {
            session_id: Some("session-1".to_string()),
            ..Default::default()
        };
        let workbench = Workbench::builder().with_config(config).build().unwrap();
        assert_eq!(workbench.session_id(), "session-1");
    }

    #[tokio::test]
    async fn test_unknown_server_name_without_directory() {
        let workbench = Workbench::builder().build().unwrap();
        let request = workbench.create_request("srv", params("hi"), None).await.unwrap();
        assert_eq!(request.server_name, UNKNOWN_SERVER_NAME);
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.estimate.is_none());
        assert!(!workbench.has_capability());
    }

    #[tokio::test]
    async fn test_completion_request_metadata() {
        let config = WorkbenchConfig {
            session_id: Some("session-1".to_string()),
            default_temperature: Some(0.3),
            ..Default::default()
        };
        let workbench = Workbench::builder()
            .with_config(config)
            .with_provider(EchoProvider::new())
            .build()
            .unwrap();
        let request = workbench
            .create_request("srv-9", params("hi"), Some("msg-42".to_string()))
            .await
            .unwrap();

        let completion = workbench.completion_request(&request);
        assert_eq!(completion.max_tokens, 100);
        assert_eq!(completion.temperature, Some(0.3));
        assert_eq!(completion.metadata["sessionId"], "session-1");
        assert_eq!(completion.metadata["requestId"], json!(request.id));
        assert_eq!(completion.metadata["serverId"], "srv-9");
        assert_eq!(completion.metadata["protocolMessageId"], "msg-42");
        assert_eq!(completion.metadata["caller"], "sampling-workbench");
        assert!(completion.metadata.contains_key("timestamp"));
    }

    #[test]
    fn test_ai_result_prices_reported_usage() {
        let capability = CapabilityDescriptor::new("p", "m", Pricing::new(1.0, 2.0));
        let request = SamplingRequest::new(
            "r".to_string(),
            "s".to_string(),
            "S".to_string(),
            params("hello"),
        );
        let response = CompletionResponse::new("ok", "m").with_usage(TokenUsage {
            input_tokens: 1000,
            output_tokens: 500,
            thinking_tokens: None,
        });

        let (result, cost) = ai_result(&request, &capability, response);
        assert_eq!(cost, Some(2.0));
        assert_eq!(result.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(result.model, "m");
    }

    #[test]
    fn test_ai_result_estimates_missing_usage() {
        let capability = CapabilityDescriptor::new("p", "m", Pricing::new(1.0, 2.0));
        let request = SamplingRequest::new(
            "r".to_string(),
            "s".to_string(),
            "S".to_string(),
            params("12345678"),
        );
        let response = CompletionResponse::new("abcd", "m").with_stop_reason("length");

        let (result, cost) = ai_result(&request, &capability, response);
        assert_eq!(cost, None);
        assert_eq!(result.stop_reason, Some(StopReason::MaxTokens));
        assert_eq!(
            result.usage,
            Some(TokenUsage {
                input_tokens: 2,
                output_tokens: 1,
                thinking_tokens: None
            })
        );
    }
}
