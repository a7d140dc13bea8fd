use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("backend unreachable: {0}")]
    Network(#[source] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("backend responded with {status}: {message}")]
    Server { status: StatusCode, message: String },
    /// The backend rejected an import.
    #[error("upload rejected with {status}: {message}")]
    Upload { status: StatusCode, message: String },
    #[error("malformed response body: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid backend base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server { status, .. } | Self::Upload { status, .. } => Some(*status),
            Self::Network(err) | Self::Decode(err) => err.status(),
            Self::InvalidBaseUrl { .. } => None,
        }
    }
}
