use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use shared::{domain::CsvUpload, protocol::IMPORT_FILE_FIELD};
use tracing::{info, warn};

use crate::{
    render::{render_dashboard, render_upload, DASHBOARD_PATH, EXPORT_PATH, UPLOAD_PATH},
    views::{DashboardView, Download, LoadState, UploadView},
    AppState,
};

/// Largest CSV the upload form accepts, counted over the `file` part.
#[derive(Debug, Clone, Copy)]
struct UploadLimit(usize);

/// Why the upload form could not be turned into a selected file.
#[derive(Debug)]
enum UploadFormError {
    Multipart(MultipartError),
    TooLarge { limit: usize },
}

impl From<MultipartError> for UploadFormError {
    fn from(error: MultipartError) -> Self {
        Self::Multipart(error)
    }
}

impl UploadFormError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Multipart(error) => error.status(),
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn reason(&self) -> String {
        match self {
            Self::Multipart(error) => error.body_text(),
            Self::TooLarge { limit } => format!("File is larger than the {limit} byte upload limit."),
        }
    }
}

pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(DASHBOARD_PATH, get(dashboard_page))
        .route(UPLOAD_PATH, get(upload_page).post(submit_upload))
        .route(EXPORT_PATH, get(export_download))
        .layer(DefaultBodyLimit::disable())
        .layer(Extension(UploadLimit(max_upload_bytes)))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn dashboard_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut view = DashboardView::new();
    view.mount(state.api.as_ref()).await;
    let status = match view.load {
        LoadState::Error(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    (status, Html(render_dashboard(&view)))
}

async fn upload_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_upload(&UploadView::new(state.upload_reset_policy)))
}

async fn submit_upload(
    State(state): State<Arc<AppState>>,
    Extension(UploadLimit(limit)): Extension<UploadLimit>,
    multipart: Multipart,
) -> Response {
    let mut view = UploadView::new(state.upload_reset_policy);
    match read_selected_file(multipart, limit).await {
        Ok(Some(file)) => {
            info!(file_name = %file.file_name, size_bytes = file.bytes.len(), "forwarding CSV upload");
            view.select(file);
        }
        Ok(None) => {}
        Err(error) => {
            warn!(reason = %error.reason(), "rejected upload form");
            view.reject(error.reason());
            return (error.status(), Html(render_upload(&view))).into_response();
        }
    }

    view.submit(state.api.as_ref()).await;
    Html(render_upload(&view)).into_response()
}

/// The `file` part of the upload form, if the user picked one. Browsers send
/// an empty part with an empty file name when nothing was chosen.
async fn read_selected_file(
    mut multipart: Multipart,
    limit: usize,
) -> Result<Option<CsvUpload>, UploadFormError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(IMPORT_FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Ok(None);
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > limit {
                return Err(UploadFormError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Some(CsvUpload::new(file_name, bytes)));
    }
    Ok(None)
}

/// Failed exports redraw the dashboard with only the export error; the logs
/// are not refetched.
async fn export_download(State(state): State<Arc<AppState>>) -> Response {
    let mut view = DashboardView::new();
    match view.export(state.api.as_ref()).await {
        Some(download) => attachment(download),
        None => (StatusCode::BAD_GATEWAY, Html(render_dashboard(&view))).into_response(),
    }
}

fn attachment(download: Download) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&download.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("text/csv")),
    );
    if let Ok(value) = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        download.file_name
    )) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    (StatusCode::OK, headers, download.bytes).into_response()
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
