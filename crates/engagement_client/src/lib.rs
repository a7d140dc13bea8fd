use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde_json::Value;
use shared::{
    domain::{CsvUpload, EngagementFilters},
    error::ApiError,
    protocol::{
        EngagementResponse, ImportResponse, ENGAGEMENT_ROUTE, EXPORT_ROUTE, IMPORT_FILE_FIELD,
        IMPORT_ROUTE,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod error;

pub use error::ClientError;
pub use reqwest::StatusCode;

const MAX_ERROR_MESSAGE_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// No timeout is applied unless one is configured.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: None,
        }
    }
}

/// Outcome of a successful import. The backend may describe it with a
/// `message`; nothing else in the body is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub message: Option<String>,
}

/// Raw export body. The bytes are handed over untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait EngagementApi: Send + Sync {
    async fn fetch_engagement(
        &self,
        filters: &EngagementFilters,
    ) -> Result<EngagementResponse, ClientError>;
    async fn import_csv(&self, file: &CsvUpload) -> Result<ImportResult, ClientError>;
    async fn export_csv(&self, filters: &EngagementFilters) -> Result<ExportPayload, ClientError>;
}

#[derive(Debug, Clone)]
pub struct EngagementClient {
    http: Client,
    base_url: String,
}

impl EngagementClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Network)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    fn get_with_filters(&self, route: &str, filters: &EngagementFilters) -> RequestBuilder {
        let request = self.http.get(self.endpoint(route));
        if filters.is_empty() {
            request
        } else {
            request.query(filters.pairs())
        }
    }
}

#[async_trait]
impl EngagementApi for EngagementClient {
    async fn fetch_engagement(
        &self,
        filters: &EngagementFilters,
    ) -> Result<EngagementResponse, ClientError> {
        let response = self
            .get_with_filters(ENGAGEMENT_ROUTE, filters)
            .send()
            .await
            .map_err(ClientError::Network)?;
        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            return Err(ClientError::Server { status, message });
        }

        let body: EngagementResponse = response.json().await.map_err(ClientError::Decode)?;
        debug!(records = body.details.len(), "fetched engagement data");
        Ok(body)
    }

    async fn import_csv(&self, file: &CsvUpload) -> Result<ImportResult, ClientError> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str("text/csv")
            .map_err(ClientError::Network)?;
        let form = multipart::Form::new().part(IMPORT_FILE_FIELD, part);

        let response = self
            .http
            .post(self.endpoint(IMPORT_ROUTE))
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::Network)?;
        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            warn!(%status, file_name = %file.file_name, "import rejected by backend");
            return Err(ClientError::Upload { status, message });
        }

        // Only success matters; an unreadable body still counts as an accepted import.
        let message = response
            .json::<ImportResponse>()
            .await
            .ok()
            .and_then(|body| body.message);
        Ok(ImportResult { message })
    }

    async fn export_csv(&self, filters: &EngagementFilters) -> Result<ExportPayload, ClientError> {
        let response = self
            .get_with_filters(EXPORT_ROUTE, filters)
            .send()
            .await
            .map_err(ClientError::Network)?;
        if !response.status().is_success() {
            let (status, message) = failure_details(response).await;
            return Err(ClientError::Server { status, message });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(ClientError::Network)?;
        Ok(ExportPayload {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|source| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    Ok(trimmed.to_string())
}

async fn failure_details(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    (status, failure_message(status, &text))
}

fn failure_message(status: StatusCode, body: &str) -> String {
    if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
        return api_error.message;
    }
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(Value::String(text)) = fields.get(key) {
                return text.clone();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    trimmed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
