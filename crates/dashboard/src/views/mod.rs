//! View state for the two dashboard pages, independent of HTTP transport.

pub mod dashboard;
pub mod upload;

pub use dashboard::{DashboardView, Download};
pub use upload::{FileResetPolicy, UploadView};

use engagement_client::ClientError;

/// Progress of one asynchronous view action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

impl LoadState {
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Short user-facing description of a client failure.
pub fn describe_failure(error: &ClientError) -> String {
    match error {
        ClientError::Network(_) => {
            "Backend unreachable; check the API URL and retry.".to_string()
        }
        ClientError::Server { status, message } => {
            format!("Backend error ({status}): {message}")
        }
        ClientError::Upload { status, message } => {
            format!("Upload rejected ({status}): {message}")
        }
        ClientError::Decode(_) => "Backend sent an unreadable response.".to_string(),
        ClientError::InvalidBaseUrl { url, .. } => {
            format!("Backend URL '{url}' is invalid.")
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
