use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_apply_without_file_or_env() {
    assert_eq!(resolve_settings(None, no_env), Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let settings = resolve_settings(
        Some("bind_addr = \"0.0.0.0:9000\"\nmax_upload_bytes = 1024\n"),
        no_env,
    );
    assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    assert_eq!(settings.max_upload_bytes, 1024);
}

#[test]
fn app_prefixed_env_wins_over_plain_env_and_file() {
    let settings = resolve_settings(Some("bind_addr = \"0.0.0.0:9000\"\n"), |key| match key {
        "BACKEND_BIND" => Some("127.0.0.1:1111".into()),
        "APP__BIND_ADDR" => Some("127.0.0.1:2222".into()),
        "DATABASE_URL" => Some("./data/other.db".into()),
        _ => None,
    });
    assert_eq!(settings.bind_addr, "127.0.0.1:2222");
    assert_eq!(settings.database_url, "sqlite://./data/other.db");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_memory_and_explicit_urls() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("sqlite:C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}
