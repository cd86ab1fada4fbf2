use thiserror::Error;

/// A generation request that did not produce a usable reply.
///
/// Transport errors, non-success statuses and malformed bodies all land here.
/// Callers are not expected to branch on the cause; `reason` exists for logs.
#[derive(Debug, Clone, Error)]
#[error("generation request failed: {reason}")]
pub struct RequestFailure {
    reason: String,
}

impl RequestFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The request task went away without reporting a result.
    pub fn abandoned() -> Self {
        Self::new("request task ended without a result")
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<reqwest::Error> for RequestFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown persona `{0}` (expected one of: assistant, expert, friend)")]
pub struct ParsePersonaError(pub String);
