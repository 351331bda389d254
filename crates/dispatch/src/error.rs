use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The inbound event is not something the dispatcher handles.
    #[error("unsupported {field}: {value:?}")]
    Unsupported { field: &'static str, value: String },

    #[error("audio message {msg_id} has no file key")]
    MissingFileKey { msg_id: String },

    #[error(transparent)]
    Session(#[from] larkbot_sessions::Error),

    #[error(transparent)]
    Engine(#[from] larkbot_providers::Error),

    #[error(transparent)]
    Channel(#[from] larkbot_channels::Error),

    #[error(transparent)]
    Records(#[from] larkbot_records::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn unsupported(field: &'static str, value: impl Into<String>) -> Self {
        Self::Unsupported {
            field,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl larkbot_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

larkbot_common::impl_context!();
