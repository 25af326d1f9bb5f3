// sampling-protocol/src/types/mod.rs
mod client;
pub mod capability;
pub mod error;
pub mod request;
pub mod sampling;

pub use capability::*;
pub use client::*;
pub use error::*;
pub use request::*;
pub use sampling::*;
