use std::error::Error as StdError;

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed channel errors shared by every adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A destination string could not be parsed.
    #[error("invalid target \"{target}\": {reason}")]
    InvalidTarget { target: String, reason: String },

    /// The platform accepted the request but refused to deliver it.
    #[error("platform rejected {action}: retcode {retcode}: {message}")]
    Rejected {
        action: String,
        retcode: i64,
        message: String,
    },

    /// Operation is currently unavailable (adapter offline, not configured).
    #[error("channel operation unavailable: {message}")]
    Unavailable { message: String },

    /// Wrapped source error from an external dependency.
    #[error("channel operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_target(target: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
