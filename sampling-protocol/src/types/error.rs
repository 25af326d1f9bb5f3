// sampling-protocol/src/types/error.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed classification of backend failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Auth,
    Validation,
    NotFound,
    Transient,
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not found",
            ErrorKind::Transient => "transient",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Failure reported by a capability provider, kept verbatim on errored requests
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// Phrases and HTTP status codes that identify one failure class.
///
/// Status codes only match as whole tokens, so "1403 ms" is not a 403.
struct Markers {
    phrases: &'static [&'static str],
    status_codes: &'static [&'static str],
}

const AUTH: Markers = Markers {
    phrases: &[
        "api key",
        "api_key",
        "unauthorized",
        "unauthenticated",
        "authentication",
        "forbidden",
        "permission denied",
    ],
    status_codes: &["401", "403"],
};
const NOT_FOUND: Markers = Markers {
    phrases: &["not found", "no such model"],
    status_codes: &["404"],
};
const TRANSIENT: Markers = Markers {
    phrases: &[
        "rate limit",
        "rate_limit",
        "too many requests",
        "timeout",
        "timed out",
        "connection",
        "unavailable",
        "overloaded",
    ],
    status_codes: &["429", "502", "503"],
};
const VALIDATION: Markers = Markers {
    phrases: &["invalid", "validation", "bad request"],
    status_codes: &["400"],
};

impl Markers {
    fn matches(&self, lower: &str) -> bool {
        self.phrases.iter().any(|phrase| lower.contains(phrase))
            || lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| self.status_codes.contains(&token))
    }
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Classify a free-text failure by substring.
    ///
    /// Heuristic for providers that only surface a message; providers that
    /// know the failure class should construct the kind directly.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        // Auth first so "invalid api key" is not a validation failure;
        // transient before validation so "invalid response, retry later
        // (503)" stays retryable.
        let kind = if AUTH.matches(&lower) {
            ErrorKind::Auth
        } else if NOT_FOUND.matches(&lower) {
            ErrorKind::NotFound
        } else if TRANSIENT.matches(&lower) {
            ErrorKind::Transient
        } else if VALIDATION.matches(&lower) {
            ErrorKind::Validation
        } else {
            ErrorKind::Unknown
        };
        Self::new(kind, message)
    }

    /// Auth, validation and not-found failures are never retried
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Auth | ErrorKind::Validation | ErrorKind::NotFound => false,
            ErrorKind::Transient | ErrorKind::Unknown => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_invalid_api_key_as_auth() {
        let err = ProviderError::from_message("Invalid API key provided");
        assert_eq!(err.kind, ErrorKind::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classifies_rate_limit_as_transient() {
        let err = ProviderError::from_message("429: Rate limit exceeded");
        assert_eq!(err.kind, ErrorKind::Transient);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classifies_missing_model() {
        assert_eq!(ProviderError::from_message("model gpt-9 not found").kind, ErrorKind::NotFound);
        assert_eq!(ProviderError::from_message("invalid temperature").kind, ErrorKind::Validation);
        assert_eq!(ProviderError::from_message("something odd").kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_status_codes_match_whole_tokens_only() {
        let err = ProviderError::from_message("Rate limit exceeded: retry after 1403 ms");
        assert_eq!(err.kind, ErrorKind::Transient);
        assert!(err.is_retryable());

        assert_eq!(ProviderError::from_message("quota 4041 reached, timeout").kind, ErrorKind::Transient);
        assert_eq!(ProviderError::from_message("HTTP/1.1 403").kind, ErrorKind::Auth);
        assert_eq!(ProviderError::from_message("status=404").kind, ErrorKind::NotFound);
        assert_eq!(ProviderError::from_message("error 4000 occurred").kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_display_includes_kind() {
        let err = ProviderError::transient("upstream timed out");
        assert_eq!(err.to_string(), "transient error: upstream timed out");
    }
}
