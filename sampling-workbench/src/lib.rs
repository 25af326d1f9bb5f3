// sampling-workbench/src/lib.rs
pub mod analysis;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod estimator;
pub mod events;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod routing;
pub mod templates;
pub mod workbench;

pub use collaborators::{
    NotificationKind, NotificationSink, ServerDirectory, StaticServerDirectory, TracingNotifier,
};
pub use config::WorkbenchConfig;
pub use error::{WorkbenchError, WorkbenchResult};
pub use events::RegistryEvent;
pub use provider::{CapabilityProvider, EchoProvider};
pub use registry::RegistryStats;
pub use retry::{run_with_backoff, RetryConfig, RetryError, RetryPolicy};
pub use routing::{ApprovalRule, RuleAction, RuleCondition, SamplingMode};
pub use workbench::{HumanResponse, ResolutionMode, Workbench, WorkbenchBuilder};

pub use sampling_protocol;
