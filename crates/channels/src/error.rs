use std::error::Error as StdError;

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors returned by channel collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The reply target (message id, chat) was rejected.
    #[error("invalid reply target: {message}")]
    InvalidTarget { message: String },

    /// The platform is not connected or not configured.
    #[error("channel unavailable: {message}")]
    Unavailable { message: String },

    /// The looked-up user does not exist or is not visible to the bot.
    #[error("unknown user: {open_id}")]
    UnknownUser { open_id: String },

    /// Wrapped error from the transport or SDK.
    #[error("channel operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_target(message: impl std::fmt::Display) -> Self {
        Self::InvalidTarget {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_user(open_id: impl std::fmt::Display) -> Self {
        Self::UnknownUser {
            open_id: open_id.to_string(),
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
