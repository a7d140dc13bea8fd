use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{
    domain::EngagementRecord,
    error::{ApiError, ErrorCode},
    protocol::{EngagementResponse, ImportResponse},
};
use storage::{LogFilter, NewEngagementLog, Storage, DATE_FORMAT};
use tracing::info;

use crate::{
    csv_io::{parse_import, write_export},
    summary::summarize,
};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Query filters accepted by the read and export endpoints. Empty values are
/// treated as absent.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EngagementQuery {
    pub user_type: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl EngagementQuery {
    pub fn to_filter(&self) -> Result<LogFilter, ApiError> {
        Ok(LogFilter {
            user_type: non_empty(&self.user_type).map(str::to_string),
            from_date: parse_date("from_date", non_empty(&self.from_date))?,
            to_date: parse_date("to_date", non_empty(&self.to_date))?,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                ApiError::validation(format!("{name} must be a date formatted as YYYY-MM-DD"))
            })
        })
        .transpose()
}

pub async fn read_engagement(
    ctx: &ApiContext,
    filter: &LogFilter,
) -> Result<EngagementResponse, ApiError> {
    let logs = ctx.storage.query_logs(filter).await.map_err(internal)?;
    let summary = summarize(&logs);
    Ok(EngagementResponse {
        summary,
        details: logs.into_iter().map(EngagementRecord::from).collect(),
    })
}

pub async fn import_engagement(ctx: &ApiContext, bytes: &[u8]) -> Result<ImportResponse, ApiError> {
    let parsed = parse_import(bytes).map_err(|e| ApiError::validation(e.to_string()))?;
    let imported = ctx
        .storage
        .insert_logs(&parsed.logs)
        .await
        .map_err(internal)?;
    info!(imported, skipped = parsed.skipped, "imported engagement CSV");
    Ok(ImportResponse {
        message: Some(format!("Successfully imported {imported} rows.")),
    })
}

pub async fn export_engagement(ctx: &ApiContext, filter: &LogFilter) -> Result<Vec<u8>, ApiError> {
    let records: Vec<EngagementRecord> = ctx
        .storage
        .query_logs(filter)
        .await
        .map_err(internal)?
        .into_iter()
        .map(EngagementRecord::from)
        .collect();
    write_export(&records).map_err(|e| ApiError::internal(e.to_string()))
}

/// Sample rows used to seed an empty database for local runs.
pub fn demo_logs() -> Vec<NewEngagementLog> {
    [
        ("Gez", "admin", 12, (2025, 7, 10)),
        ("Bob", "client", 8, (2025, 7, 14)),
        ("Eve", "admin", 15, (2025, 7, 12)),
    ]
    .into_iter()
    .filter_map(|(user, user_type, actions, (y, m, d))| {
        Some(NewEngagementLog {
            user: user.to_string(),
            user_type: user_type.to_string(),
            actions,
            date: NaiveDate::from_ymd_opt(y, m, d)?,
        })
    })
    .collect()
}

fn internal(error: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, error.to_string())
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
