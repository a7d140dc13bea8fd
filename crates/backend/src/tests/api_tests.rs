use super::*;

async fn setup() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.insert_logs(&demo_logs()).await.expect("seed");
    ApiContext { storage }
}

#[tokio::test]
async fn read_without_filters_returns_everything_with_summary() {
    let ctx = setup().await;
    let response = read_engagement(&ctx, &LogFilter::default())
        .await
        .expect("read");
    assert_eq!(response.details.len(), 3);
    assert_eq!(response.summary.0["active_users"], 3);
    assert_eq!(response.summary.0["engagement_score"], 35);
}

#[tokio::test]
async fn query_filters_are_parsed_and_applied() {
    let ctx = setup().await;
    let query = EngagementQuery {
        user_type: Some("admin".into()),
        from_date: Some("2025-07-11".into()),
        to_date: Some(String::new()),
    };
    let response = read_engagement(&ctx, &query.to_filter().expect("filter"))
        .await
        .expect("read");
    let users: Vec<&str> = response.details.iter().map(|r| r.user.as_str()).collect();
    assert_eq!(users, ["Eve"]);
}

#[test]
fn malformed_date_filter_is_a_validation_error() {
    let query = EngagementQuery {
        from_date: Some("July 1st".into()),
        ..EngagementQuery::default()
    };
    let err = query.to_filter().expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("from_date"));
}

#[tokio::test]
async fn import_reports_count_and_persists_rows() {
    let ctx = setup().await;
    let response = import_engagement(
        &ctx,
        b"user,user_type,actions,date\nalice,student,5,2024-01-01\nbad,row,x,2024-01-01\n",
    )
    .await
    .expect("import");
    assert_eq!(
        response.message.as_deref(),
        Some("Successfully imported 1 rows.")
    );
    assert_eq!(ctx.storage.count_logs().await.expect("count"), 4);
}

#[tokio::test]
async fn import_with_missing_columns_is_rejected_atomically() {
    let ctx = setup().await;
    let err = import_engagement(&ctx, b"user,actions\nalice,5\n")
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(ctx.storage.count_logs().await.expect("count"), 3);
}

#[tokio::test]
async fn export_writes_header_and_filtered_rows() {
    let ctx = setup().await;
    let filter = LogFilter {
        user_type: Some("client".into()),
        ..LogFilter::default()
    };
    let bytes = export_engagement(&ctx, &filter).await.expect("export");
    assert_eq!(
        String::from_utf8(bytes).expect("utf8"),
        "user,user_type,actions,date\nBob,client,8,2025-07-14\n"
    );
}
