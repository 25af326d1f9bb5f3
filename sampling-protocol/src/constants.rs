// sampling-protocol/src/constants.rs

/// Model identifier recorded on responses authored by a human operator
pub const HUMAN_OPERATOR_MODEL: &str = "human-operator";

/// Display name used when the server directory cannot resolve a server id
pub const UNKNOWN_SERVER_NAME: &str = "Unknown server";

/// Default values applied when a request or config leaves them unset
pub mod defaults {
    /// Max tokens used when a sampling request omits `maxTokens`
    pub const MAX_TOKENS: u32 = 1000;

    /// Number of settled requests kept in history
    pub const HISTORY_CAPACITY: usize = 100;

    /// Buffered registry events per subscriber
    pub const EVENT_CAPACITY: usize = 256;

    /// Backend attempts per AI resolution (including the first)
    pub const MAX_ATTEMPTS: u32 = 4;

    /// Delay before the first retry
    pub const INITIAL_DELAY_MS: u64 = 1000;

    /// Upper bound on a single backoff delay, before jitter
    pub const MAX_DELAY_MS: u64 = 30_000;

    /// Jitter as a fraction of the computed delay
    pub const JITTER_RATIO: f64 = 0.1;
}

/// Metadata keys attached to outbound completion requests
pub mod metadata_keys {
    pub const CALLER: &str = "caller";
    pub const CALLER_VERSION: &str = "callerVersion";
    pub const SESSION_ID: &str = "sessionId";
    pub const REQUEST_ID: &str = "requestId";
    pub const SERVER_ID: &str = "serverId";
    pub const TIMESTAMP: &str = "timestamp";
    pub const PROTOCOL_MESSAGE_ID: &str = "protocolMessageId";
}
