use tokio_tungstenite::tungstenite;

/// Connection-level failures. Any of these ends the current subscription and
/// the listener reconnects after its fixed delay.
#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("websocket error: {0}")]
    Stream(#[from] tungstenite::Error),

    #[error("invalid subscription url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0}")]
    Message(String),
}

impl ListenError {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// A frame arrived on a healthy connection but its payload is unusable.
#[derive(Debug, thiserror::Error)]
#[error("malformed ntfy frame: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Setup and lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Media(#[from] ntfy_relay_media::Error),

    #[error("invalid share-notice pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("forward service is already running")]
    AlreadyRunning,

    #[error("forward service has been stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, Error>;
