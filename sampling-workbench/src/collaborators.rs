// sampling-workbench/src/collaborators.rs
//! Narrow interfaces to the parts of the host application the engine does not own.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Resolves server ids to display names
pub trait ServerDirectory: Send + Sync {
    fn server_name(&self, server_id: &str) -> Result<String>;
}

/// Fixed id -> name mapping
#[derive(Debug, Clone, Default)]
pub struct StaticServerDirectory {
    names: HashMap<String, String>,
}

impl StaticServerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, server_id: &str, name: &str) -> Self {
        self.names.insert(server_id.to_string(), name.to_string());
        self
    }
}

impl ServerDirectory for StaticServerDirectory {
    fn server_name(&self, server_id: &str) -> Result<String> {
        self.names
            .get(server_id)
            .cloned()
            .ok_or_else(|| anyhow!("Server not found: {}", server_id))
    }
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Fire-and-forget sink for user-facing notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str) -> Result<()>;
}

/// Writes notifications to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) -> Result<()> {
        match kind {
            NotificationKind::Info | NotificationKind::Success => info!(?kind, "{}", message),
            NotificationKind::Warning => warn!("{}", message),
            NotificationKind::Error => error!("{}", message),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directory_lookup() {
        let directory = StaticServerDirectory::new().with_server("srv-1", "Weather");
        assert_eq!(directory.server_name("srv-1").unwrap(), "Weather");
        assert!(directory.server_name("srv-2").is_err());
    }
}
