// sampling-protocol/src/messages/mod.rs
pub mod completion;

pub use completion::*;
