//! Error types for the LinkGen core library.
//!
//! Each module has its own error enum to provide clear error boundaries.
//! The library uses `thiserror` for structured, typed errors.

/// Errors related to configuration loading, parsing, and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration field is absent.
    #[error("missing required config field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration field has an unacceptable value.
    #[error("invalid value for config field '{field}': {message}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// A description of why the value is invalid.
        message: String,
    },

    /// The configuration file does not exist at the specified path.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// The path that was searched.
        path: String,
    },

    /// TOML deserialization failed.
    #[error("failed to parse config file: {source}")]
    ParseError {
        /// The underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Errors from interacting with an LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP request to the LLM endpoint failed (no response received).
    #[error("LLM HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// LLM API returned an HTTP error response.
    #[error("LLM API error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message decoded from the API response.
        message: String,
    },

    /// LLM provider rate limit hit.
    #[error("LLM rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Response had no choices, or the message content was empty after trimming.
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// Structured-output parsing failed after fence-stripping and JSON decode.
    #[error("failed to parse LLM response at stage '{stage}': {detail}")]
    ResponseError {
        /// Which use-case stage failed to parse (e.g. "drafts_validation").
        stage: String,
        /// The prompt that produced the response, for diagnosis.
        prompt: String,
        /// The raw response text.
        raw_response: String,
        /// Human-readable detail.
        detail: String,
    },

    /// Retry budget exhausted without a successful attempt.
    #[error("retry budget exhausted after {attempts} attempts (last status: {last_status:?})")]
    RetryExhausted {
        /// Total attempts made.
        attempts: u32,
        /// HTTP status of the last attempt, if any.
        last_status: Option<u16>,
    },

    /// The caller's cancellation token fired mid-call or mid-backoff.
    #[error("LLM call cancelled")]
    Cancelled,

    /// Caller passed an invalid argument (empty topic, zero count, etc).
    #[error("invalid LLM request: {0}")]
    InvalidRequest(String),
}

/// Errors from SQLite storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to connect to the SQLite database.
    #[error("database connection error: {source}")]
    Connection {
        /// The underlying SQLx error.
        #[source]
        source: sqlx::Error,
    },

    /// Database migration failed.
    #[error("database migration error: {source}")]
    Migration {
        /// The underlying migration error.
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    /// A database query failed.
    #[error("database query error: {source}")]
    Query {
        /// The underlying SQLx error.
        #[source]
        source: sqlx::Error,
    },
}

/// Errors from the prompt-template engine.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Strict-mode substitution hit a placeholder with no bound value.
    #[error("unbound template variable: {0}")]
    Unbound(String),

    /// Validation found a template missing its required variables for its type.
    #[error("template missing required variables for type {prompt_type}: {missing:?}")]
    MissingRequiredVariables {
        /// The prompt type being validated ("ideas" or "drafts").
        prompt_type: String,
        /// The required variable names that were not referenced.
        missing: Vec<String>,
    },
}

/// Domain-level errors surfaced by entities and use-cases.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Generic input validation failure.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced idea does not exist (or does not belong to the caller).
    #[error("idea not found: {0}")]
    IdeaNotFound(String),

    /// A referenced draft does not exist.
    #[error("draft not found: {0}")]
    DraftNotFound(String),

    /// A referenced topic does not exist.
    #[error("topic not found: {0}")]
    TopicNotFound(String),

    /// A referenced user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A referenced prompt does not exist.
    #[error("prompt not found: {0}")]
    PromptNotFound(String),

    /// Caller does not own the referenced entity.
    #[error("unauthorized access to {0}")]
    Unauthorized(String),

    /// A state-machine transition was rejected.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// The draft's current status.
        from: String,
        /// The status the caller attempted to transition to.
        to: String,
    },

    /// The idea's `expires_at` has already passed.
    #[error("idea {0} has expired")]
    IdeaExpired(String),

    /// The idea has already been consumed by a prior draft-generation run.
    #[error("idea {0} has already been used")]
    IdeaAlreadyUsed(String),

    /// A mutation was attempted on a draft in the terminal `published` state.
    #[error("draft {0} is already published")]
    DraftAlreadyPublished(String),

    /// A draft's refinement history exceeds the configured bound.
    #[error("draft {draft_id} has reached the refinement limit of {limit}")]
    RefinementLimitExceeded {
        /// Draft id.
        draft_id: String,
        /// The configured limit.
        limit: u32,
    },

    /// Attempted to delete a prompt that a topic still references by name.
    #[error("prompt '{0}' is in use by one or more topics")]
    PromptInUse(String),

    /// An unexpected internal failure; the external message is sanitised.
    #[error("internal error")]
    Internal,
}

/// Errors surfaced by use-case orchestration (the composition layer over
/// prompt engine, LLM client, and repositories).
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Domain-level error from entity construction or repository lookups.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage-layer error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// LLM client error.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Prompt-template error.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Caller-supplied input failed validation before any I/O occurred.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors from the message-queue transport (publish/consume).
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Failed to connect or reconnect to the broker.
    #[error("queue connection error: {0}")]
    Connection(String),

    /// Publish was attempted but the broker did not acknowledge it.
    #[error("publish not acknowledged: {0}")]
    PublishFailed(String),

    /// Message payload could not be deserialized.
    #[error("failed to decode queue message: {0}")]
    Decode(String),

    /// Underlying transport error.
    #[error("queue transport error: {0}")]
    Transport(#[from] async_nats::Error),
}
