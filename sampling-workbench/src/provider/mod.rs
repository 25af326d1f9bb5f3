// sampling-workbench/src/provider/mod.rs
pub mod echo;

use async_trait::async_trait;
use sampling_protocol::{CapabilityDescriptor, CompletionRequest, CompletionResponse, ProviderError};

/// LLM backend used to resolve sampling requests in AI mode
#[async_trait]
pub trait CapabilityProvider: Send + Sync + 'static {
    /// Descriptor of the configured backend, or `None` when nothing is configured
    fn active_capability(&self) -> Option<CapabilityDescriptor>;

    /// Whether the backend can take requests right now
    fn is_available(&self) -> bool;

    /// Run one completion. Failures carry their error kind so the caller can
    /// decide whether to retry.
    async fn complete(
        &self,
        server_id: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;
}

pub use echo::EchoProvider;
