use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{provider} API key not configured")]
    NotConfigured { provider: &'static str },

    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response from the backend.
    #[error("{operation} request failed: {status} - {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} response contained no result")]
    EmptyResponse { operation: &'static str },

    #[error("audio file {file_key:?} unavailable: {message}")]
    Audio { file_key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    #[must_use]
    pub fn audio(file_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Audio {
            file_key: file_key.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
