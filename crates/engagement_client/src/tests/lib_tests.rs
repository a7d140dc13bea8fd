use super::*;
use std::sync::Arc;

use axum::{
    extract::{Multipart, RawQuery, State},
    http::{header, StatusCode as HttpStatus},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::error::ErrorCode;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, Default)]
struct ReceivedUpload {
    field_name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct BackendState {
    queries: Arc<Mutex<Vec<Option<String>>>>,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    reject_imports: bool,
}

const EXPORT_BYTES: &[u8] = "user,user_type,actions,date\n\"Zoë, \"\"the\"\" admin\",admin,3,\"2025-07-10\"\n\"multi\nline\",client,1,2025-07-11\n".as_bytes();

async fn handle_engagement(
    State(state): State<BackendState>,
    RawQuery(query): RawQuery,
) -> Json<serde_json::Value> {
    state.queries.lock().await.push(query);
    Json(serde_json::json!({
        "summary": { "total_actions": 42 },
        "details": [
            { "user": "alice", "user_type": "student", "actions": 5, "date": "2024-01-01" },
            { "user": "bob", "user_type": "teacher", "actions": 37, "date": "2024-01-02" }
        ]
    }))
}

async fn handle_import(
    State(state): State<BackendState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        state.uploads.lock().await.push(ReceivedUpload {
            field_name,
            file_name,
            content_type,
            bytes,
        });
    }

    if state.reject_imports {
        return (
            HttpStatus::BAD_REQUEST,
            Json(serde_json::to_value(ApiError::new(
                ErrorCode::Validation,
                "CSV must contain columns: user, user_type, actions, date",
            ))
            .expect("json")),
        );
    }
    (
        HttpStatus::OK,
        Json(serde_json::json!({ "message": "Successfully imported 2 rows." })),
    )
}

async fn handle_export(
    State(state): State<BackendState>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    state.queries.lock().await.push(query);
    (
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        EXPORT_BYTES.to_vec(),
    )
}

async fn handle_failure() -> impl IntoResponse {
    (HttpStatus::INTERNAL_SERVER_ERROR, "database is locked")
}

async fn spawn_backend(state: BackendState) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route(ENGAGEMENT_ROUTE, get(handle_engagement))
        .route(IMPORT_ROUTE, post(handle_import))
        .route(EXPORT_ROUTE, get(handle_export))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_failing_backend() -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route(ENGAGEMENT_ROUTE, get(handle_failure))
        .route(EXPORT_ROUTE, get(handle_failure));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn unreachable_base_url() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn fetch_decodes_summary_and_details_in_order() {
    let state = BackendState::default();
    let base_url = spawn_backend(state.clone()).await.expect("spawn backend");
    let client = EngagementClient::new(base_url).expect("client");

    let response = client
        .fetch_engagement(&EngagementFilters::new())
        .await
        .expect("fetch");

    assert_eq!(response.details.len(), 2);
    assert_eq!(response.details[0].user, "alice");
    assert_eq!(response.details[1].user, "bob");
    assert_eq!(
        response.summary.display_entries(),
        vec![("total_actions".to_string(), "42".to_string())]
    );
    assert_eq!(state.queries.lock().await.as_slice(), &[None]);
}

#[tokio::test]
async fn filters_are_forwarded_verbatim_as_query() {
    let state = BackendState::default();
    let base_url = spawn_backend(state.clone()).await.expect("spawn backend");
    let client = EngagementClient::new(format!("{base_url}/")).expect("client");
    let filters = EngagementFilters::new()
        .user_type("admin")
        .from_date("2025-07-01");

    client.fetch_engagement(&filters).await.expect("fetch");
    client.export_csv(&filters).await.expect("export");

    let queries = state.queries.lock().await;
    let expected = Some("user_type=admin&from_date=2025-07-01".to_string());
    assert_eq!(queries.as_slice(), &[expected.clone(), expected]);
}

#[tokio::test]
async fn identical_fetches_yield_identical_content() {
    let base_url = spawn_backend(BackendState::default())
        .await
        .expect("spawn backend");
    let client = EngagementClient::new(base_url).expect("client");

    let first = client
        .fetch_engagement(&EngagementFilters::new())
        .await
        .expect("first");
    let second = client
        .fetch_engagement(&EngagementFilters::new())
        .await
        .expect("second");
    assert_eq!(first, second);
}

#[tokio::test]
async fn fetch_failure_status_maps_to_server_error() {
    let base_url = spawn_failing_backend().await.expect("spawn backend");
    let client = EngagementClient::new(base_url).expect("client");

    let err = client
        .fetch_engagement(&EngagementFilters::new())
        .await
        .expect_err("should fail");
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(message, "database is locked");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_maps_to_network_error() {
    let client = EngagementClient::new(unreachable_base_url().await).expect("client");

    let err = client
        .fetch_engagement(&EngagementFilters::new())
        .await
        .expect_err("should fail");
    assert!(matches!(err, ClientError::Network(_)), "got {err:?}");

    let err = client
        .import_csv(&CsvUpload::new("logs.csv", b"user\n".to_vec()))
        .await
        .expect_err("should fail");
    assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn import_sends_file_under_fixed_field_name() {
    let state = BackendState::default();
    let base_url = spawn_backend(state.clone()).await.expect("spawn backend");
    let client = EngagementClient::new(base_url).expect("client");
    let csv = b"user,user_type,actions,date\nalice,student,5,2024-01-01\n".to_vec();

    let result = client
        .import_csv(&CsvUpload::new("logs.csv", csv.clone()))
        .await
        .expect("import");
    assert_eq!(
        result.message.as_deref(),
        Some("Successfully imported 2 rows.")
    );

    let uploads = state.uploads.lock().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field_name, "file");
    assert_eq!(uploads[0].file_name.as_deref(), Some("logs.csv"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("text/csv"));
    assert_eq!(uploads[0].bytes, csv);
}

#[tokio::test]
async fn rejected_import_maps_to_upload_error_with_backend_message() {
    let state = BackendState {
        reject_imports: true,
        ..BackendState::default()
    };
    let base_url = spawn_backend(state).await.expect("spawn backend");
    let client = EngagementClient::new(base_url).expect("client");

    let err = client
        .import_csv(&CsvUpload::new("bad.csv", b"name\nalice\n".to_vec()))
        .await
        .expect_err("should fail");
    match err {
        ClientError::Upload { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(message.starts_with("CSV must contain columns"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn export_returns_raw_bytes_untouched() {
    let base_url = spawn_backend(BackendState::default())
        .await
        .expect("spawn backend");
    let client = EngagementClient::new(base_url).expect("client");

    let payload = client
        .export_csv(&EngagementFilters::new())
        .await
        .expect("export");
    assert_eq!(payload.bytes, EXPORT_BYTES);
    assert_eq!(
        payload.content_type.as_deref(),
        Some("text/csv; charset=utf-8")
    );
}

#[tokio::test]
async fn export_failure_maps_to_server_error() {
    let base_url = spawn_failing_backend().await.expect("spawn backend");
    let client = EngagementClient::new(base_url).expect("client");

    let err = client
        .export_csv(&EngagementFilters::new())
        .await
        .expect_err("should fail");
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[test]
fn rejects_invalid_base_url() {
    let err = EngagementClient::new("not a url").expect_err("should fail");
    assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
}

#[test]
fn trailing_slash_is_trimmed_from_base_url() {
    let client = EngagementClient::new("http://localhost:8000/").expect("client");
    assert_eq!(client.base_url(), "http://localhost:8000");
    assert_eq!(
        client.endpoint(ENGAGEMENT_ROUTE),
        "http://localhost:8000/engagement"
    );
}

#[test]
fn failure_message_prefers_structured_bodies() {
    assert_eq!(
        failure_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail":"bad date"}"#),
        "bad date"
    );
    assert_eq!(
        failure_message(StatusCode::BAD_GATEWAY, "   "),
        "Bad Gateway"
    );
}
