//! Failure classification
//!
//! Maps a raw error message to a stable failure code. Codes end up on task
//! records and drive the retry decision, so the keyword order below matters:
//! the first match wins.

use std::fmt;

/// Message used when an error renders as an empty string
const FALLBACK_MESSAGE: &str = "UnknownError";

/// Closed set of failure codes recorded on tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    ConfigMissing,
    AuthRequired,
    RateLimited,
    ProviderError,
    ModelError,
    TaskCancelled,
    ToolError,
    UnknownAgent,
    Unknown,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::ConfigMissing => "CONFIG_MISSING",
            FailureCode::AuthRequired => "AUTH_REQUIRED",
            FailureCode::RateLimited => "RATE_LIMITED",
            FailureCode::ProviderError => "PROVIDER_ERROR",
            FailureCode::ModelError => "MODEL_ERROR",
            FailureCode::TaskCancelled => "TASK_CANCELLED",
            FailureCode::ToolError => "TOOL_ERROR",
            FailureCode::UnknownAgent => "UNKNOWN_AGENT",
            FailureCode::Unknown => "UNKNOWN",
        }
    }

    /// Only transient provider-side failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureCode::RateLimited | FailureCode::ProviderError | FailureCode::ModelError
        )
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result copied onto the task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureInfo {
    pub code: FailureCode,
    pub retryable: bool,
    pub message: String,
}

impl FailureInfo {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            retryable: code.is_retryable(),
            message: message.into(),
        }
    }
}

/// Classify an error by its message
pub fn classify(message: &str) -> FailureInfo {
    let message = if message.is_empty() {
        FALLBACK_MESSAGE
    } else {
        message
    };
    FailureInfo::new(code_for(&message.to_lowercase()), message)
}

/// Classify any error through its `Display` output
pub fn classify_error(error: &dyn std::error::Error) -> FailureInfo {
    classify(&error.to_string())
}

fn code_for(low: &str) -> FailureCode {
    let has = |needle: &str| low.contains(needle);

    if has("not configured") || (has("missing") && (has("key") || has("token"))) {
        return FailureCode::ConfigMissing;
    }

    if has("invalid_grant") || (has("token") && (has("expired") || has("invalid"))) {
        return FailureCode::AuthRequired;
    }
    if has("401") || has("403") || has("unauthorized") || has("forbidden") {
        return FailureCode::AuthRequired;
    }

    if has("429") || has("rate limit") || has("too many requests") {
        return FailureCode::RateLimited;
    }

    if has("500") || has("502") || has("503") || has("504") || has("server error") {
        return FailureCode::ProviderError;
    }

    if has("anthropic") || has("openai") || (has("model") && has("error")) {
        return FailureCode::ModelError;
    }

    if has("cancel") {
        return FailureCode::TaskCancelled;
    }

    if has("tool") {
        return FailureCode::ToolError;
    }

    FailureCode::Unknown
}
