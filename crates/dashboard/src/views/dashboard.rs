//! Engagement overview: summary metrics, the log table and the CSV export action.

use engagement_client::EngagementApi;
use shared::{
    domain::{EngagementFilters, EngagementRecord, EngagementSummary},
    protocol::EXPORT_FILE_NAME,
};
use tracing::warn;

use super::{describe_failure, LoadState};

const DEFAULT_EXPORT_CONTENT_TYPE: &str = "text/csv";

/// File handed to the browser for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: &'static str,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub records: Vec<EngagementRecord>,
    pub summary: EngagementSummary,
    pub load: LoadState,
    pub export: LoadState,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial fetch. Runs once per view; later calls are no-ops.
    pub async fn mount(&mut self, api: &dyn EngagementApi) {
        if self.load != LoadState::Idle {
            return;
        }
        self.refresh(api).await;
    }

    /// Unfiltered refetch. Data is only replaced when the fetch succeeds.
    pub async fn refresh(&mut self, api: &dyn EngagementApi) {
        self.load = LoadState::Loading;
        match api.fetch_engagement(&EngagementFilters::new()).await {
            Ok(response) => {
                self.records = response.details;
                self.summary = response.summary;
                self.load = LoadState::Loaded;
            }
            Err(error) => {
                warn!(%error, "failed to fetch engagement data");
                self.load = LoadState::Error(describe_failure(&error));
            }
        }
    }

    pub async fn export(&mut self, api: &dyn EngagementApi) -> Option<Download> {
        self.export = LoadState::Loading;
        match api.export_csv(&EngagementFilters::new()).await {
            Ok(payload) => {
                self.export = LoadState::Loaded;
                Some(Download {
                    file_name: EXPORT_FILE_NAME,
                    content_type: payload
                        .content_type
                        .unwrap_or_else(|| DEFAULT_EXPORT_CONTENT_TYPE.to_string()),
                    bytes: payload.bytes,
                })
            }
            Err(error) => {
                warn!(%error, "failed to export engagement data");
                self.export = LoadState::Error(describe_failure(&error));
                None
            }
        }
    }
}
