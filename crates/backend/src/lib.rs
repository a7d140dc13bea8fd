use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        EngagementResponse, ImportResponse, ENGAGEMENT_ROUTE, EXPORT_FILE_NAME, EXPORT_ROUTE,
        IMPORT_FILE_FIELD, IMPORT_ROUTE,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, warn};

pub mod api;
pub mod config;
pub mod csv_io;
pub mod summary;

use api::{export_engagement, import_engagement, read_engagement, ApiContext, EngagementQuery};

#[derive(Clone)]
pub struct AppState {
    pub api: ApiContext,
}

type HttpError = (StatusCode, Json<ApiError>);

pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(ENGAGEMENT_ROUTE, get(http_read_engagement))
        .route(IMPORT_ROUTE, post(http_import_engagement))
        .route(EXPORT_ROUTE, get(http_export_engagement))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %e, "storage health check failed");
        into_http(ApiError::internal(e.to_string()))
    })?;
    Ok("ok")
}

async fn http_read_engagement(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EngagementQuery>,
) -> Result<Json<EngagementResponse>, HttpError> {
    let filter = query.to_filter().map_err(into_http)?;
    let response = read_engagement(&state.api, &filter)
        .await
        .map_err(into_http)?;
    Ok(Json(response))
}

async fn http_import_engagement(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, HttpError> {
    let mut file = None;
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            let code = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ErrorCode::PayloadTooLarge
            } else {
                ErrorCode::Validation
            };
            into_http(ApiError::new(code, e.body_text()))
        })?;
        let Some(field) = field else {
            break;
        };
        if field.name() != Some(IMPORT_FILE_FIELD) {
            continue;
        }
        let bytes = field.bytes().await.map_err(|e| {
            into_http(ApiError::validation(format!("unreadable upload: {}", e.body_text())))
        })?;
        file = Some(bytes);
        break;
    }

    let Some(bytes) = file else {
        warn!("import request without a file part");
        return Err(into_http(ApiError::validation(format!(
            "multipart field '{IMPORT_FILE_FIELD}' is required"
        ))));
    };

    let response = import_engagement(&state.api, &bytes)
        .await
        .map_err(into_http)?;
    Ok(Json(response))
}

async fn http_export_engagement(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EngagementQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let filter = query.to_filter().map_err(into_http)?;
    let body = export_engagement(&state.api, &filter)
        .await
        .map_err(into_http)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename={EXPORT_FILE_NAME}")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((StatusCode::OK, headers, body))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_http(error: ApiError) -> HttpError {
    if error.code == ErrorCode::Internal {
        error!(message = %error.message, "engagement request failed");
    }
    (status_for(error.code), Json(error))
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
