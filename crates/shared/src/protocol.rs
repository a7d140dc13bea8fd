use serde::{Deserialize, Serialize};

use crate::domain::{EngagementRecord, EngagementSummary};

pub const ENGAGEMENT_ROUTE: &str = "/engagement";
pub const IMPORT_ROUTE: &str = "/engagement/import";
pub const EXPORT_ROUTE: &str = "/engagement/export";

/// Multipart field carrying the CSV file on import.
pub const IMPORT_FILE_FIELD: &str = "file";

pub const EXPORT_FILE_NAME: &str = "engagement_export.csv";
pub const CSV_HEADER: [&str; 4] = ["user", "user_type", "actions", "date"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementResponse {
    #[serde(default)]
    pub summary: EngagementSummary,
    #[serde(default)]
    pub details: Vec<EngagementRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
