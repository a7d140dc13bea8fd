use chrono::NaiveDate;
use shared::{domain::EngagementRecord, protocol::CSV_HEADER};
use storage::{NewEngagementLog, DATE_FORMAT};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("CSV file is not valid UTF-8")]
    InvalidEncoding,
    #[error("CSV must contain columns: {}", CSV_HEADER.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[error("unreadable CSV header: {0}")]
    Header(#[source] csv::Error),
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub logs: Vec<NewEngagementLog>,
    pub skipped: usize,
}

struct ColumnIndex {
    user: usize,
    user_type: usize,
    actions: usize,
    date: usize,
}

/// Parses an uploaded CSV. Rows that fail to parse are skipped and counted;
/// only a bad encoding or header rejects the whole file.
pub fn parse_import(bytes: &[u8]) -> Result<ParsedImport, CsvImportError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CsvImportError::InvalidEncoding)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().map_err(CsvImportError::Header)?.clone();
    let columns = locate_columns(&headers)?;

    let mut parsed = ParsedImport::default();
    for (line, row) in reader.records().enumerate() {
        let row_number = line + 2;
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                warn!(row_number, %error, "skipping unreadable CSV row");
                parsed.skipped += 1;
                continue;
            }
        };
        match parse_row(&row, &columns) {
            Ok(log) => parsed.logs.push(log),
            Err(reason) => {
                warn!(row_number, %reason, "skipping invalid CSV row");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

fn locate_columns(headers: &csv::StringRecord) -> Result<ColumnIndex, CsvImportError> {
    let position = |name: &str| headers.iter().position(|header| header == name);
    let missing: Vec<String> = CSV_HEADER
        .iter()
        .filter(|name| position(**name).is_none())
        .map(|name| name.to_string())
        .collect();

    match (
        position("user"),
        position("user_type"),
        position("actions"),
        position("date"),
    ) {
        (Some(user), Some(user_type), Some(actions), Some(date)) => Ok(ColumnIndex {
            user,
            user_type,
            actions,
            date,
        }),
        _ => Err(CsvImportError::MissingColumns { missing }),
    }
}

fn parse_row(row: &csv::StringRecord, columns: &ColumnIndex) -> Result<NewEngagementLog, String> {
    let field = |index: usize, name: &str| {
        row.get(index)
            .ok_or_else(|| format!("missing value for '{name}'"))
    };

    let actions = field(columns.actions, "actions")?;
    let actions = actions
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("actions '{actions}' is not an integer"))?;
    let date = field(columns.date, "date")?;
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| format!("date '{date}' is not YYYY-MM-DD"))?;

    Ok(NewEngagementLog {
        user: field(columns.user, "user")?.to_string(),
        user_type: field(columns.user_type, "user_type")?.to_string(),
        actions,
        date,
    })
}

pub fn write_export(records: &[EngagementRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for record in records {
        let actions = record.actions.to_string();
        writer.write_record([
            record.user.as_str(),
            record.user_type.as_str(),
            actions.as_str(),
            record.date.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|error| csv::Error::from(error.into_error()))
}
