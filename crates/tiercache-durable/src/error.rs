//! Error types for durable tier backends.

/// Errors that can occur when talking to a durable tier.
///
/// None of these ever reach a cache caller: the cache manager logs them
/// with the operation and key involved and degrades to a miss or a no-op.
#[derive(Debug, thiserror::Error)]
pub enum DurableError {
    /// The backing service could not be reached or refused the request.
    #[error("durable tier unavailable: {reason}")]
    Unavailable { reason: String },

    /// The call did not finish before its deadline.
    #[error("durable tier call timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend was configured with invalid settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DurableError {
    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a timeout error from the elapsed deadline.
    pub fn timeout(deadline: std::time::Duration) -> Self {
        Self::Timeout {
            millis: deadline.as_millis() as u64,
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }

    /// Short, stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Timeout { .. } => "timeout",
            Self::Serialization(_) => "serialization",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

impl From<serde_json::Error> for DurableError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
