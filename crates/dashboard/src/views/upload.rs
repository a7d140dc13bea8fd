//! CSV upload form state.

use engagement_client::EngagementApi;
use shared::domain::CsvUpload;
use tracing::{info, warn};

use super::describe_failure;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "CSV uploaded successfully!";
pub const UPLOAD_FAILURE_MESSAGE: &str = "Upload failed.";

/// What happens to the selected file once a submission completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileResetPolicy {
    /// Keep the selection after success and failure alike.
    #[default]
    Retain,
    /// Drop the selection after a successful import only.
    ClearOnSuccess,
}

impl std::str::FromStr for FileResetPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "clear_on_success" => Ok(Self::ClearOnSuccess),
            other => Err(format!("unknown upload reset policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadView {
    pub selected_file: Option<CsvUpload>,
    pub status_message: String,
    pub last_error: Option<String>,
    policy: FileResetPolicy,
}

impl UploadView {
    pub fn new(policy: FileResetPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn select(&mut self, file: CsvUpload) {
        self.selected_file = Some(file);
    }

    /// Sends the selected file to the backend. Without a selection nothing
    /// happens, including no change to the status message.
    pub async fn submit(&mut self, api: &dyn EngagementApi) {
        let Some(file) = self.selected_file.as_ref() else {
            return;
        };

        match api.import_csv(file).await {
            Ok(result) => {
                info!(
                    file_name = %file.file_name,
                    backend_message = result.message.as_deref().unwrap_or_default(),
                    "CSV import accepted"
                );
                self.status_message = UPLOAD_SUCCESS_MESSAGE.to_string();
                self.last_error = None;
                if self.policy == FileResetPolicy::ClearOnSuccess {
                    self.selected_file = None;
                }
            }
            Err(error) => {
                warn!(file_name = %file.file_name, %error, "CSV import failed");
                self.reject(describe_failure(&error));
            }
        }
    }

    /// Records a failed submission, keeping the cause apart from the fixed
    /// status message.
    pub fn reject(&mut self, reason: impl Into<String>) {
        self.status_message = UPLOAD_FAILURE_MESSAGE.to_string();
        self.last_error = Some(reason.into());
    }
}
