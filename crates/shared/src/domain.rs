use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One logged user-activity entry as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub user: String,
    pub user_type: String,
    pub actions: i64,
    pub date: String,
}

/// Backend-computed aggregate metrics. The shape is owned by the backend, so
/// the entries are kept as raw JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngagementSummary(pub Map<String, Value>);

impl EngagementSummary {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// `key: value` pairs for display. Strings are shown without JSON quotes.
    pub fn display_entries(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }
}

/// Query filters forwarded verbatim to the backend, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngagementFilters(Vec<(String, String)>);

impl EngagementFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn user_type(self, user_type: impl Into<String>) -> Self {
        self.with("user_type", user_type)
    }

    pub fn from_date(self, date: impl Into<String>) -> Self {
        self.with("from_date", date)
    }

    pub fn to_date(self, date: impl Into<String>) -> Self {
        self.with("to_date", date)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// A CSV file picked for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CsvUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}
