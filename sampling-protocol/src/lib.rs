// sampling-protocol/src/lib.rs
pub mod constants;
pub mod messages;
pub mod types;

// Re-export commonly used items
pub use messages::{CompletionRequest, CompletionResponse};
pub use types::*;
