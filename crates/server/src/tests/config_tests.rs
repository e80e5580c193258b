use super::*;

use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_urls_with_scheme_and_memory_urls() {
    assert_eq!(
        normalize_database_url("sqlite://./data/x.db"),
        "sqlite://./data/x.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn single_colon_sqlite_prefix_is_expanded() {
    assert_eq!(
        normalize_database_url("sqlite:data\\admin.db"),
        "sqlite://data/admin.db"
    );
}

#[test]
fn blank_database_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        Settings::default().database_url
    );
}

#[test]
fn missing_config_file_yields_defaults() {
    let settings = load_settings_from("definitely-not-a-config-file").expect("settings");
    assert_eq!(settings.jwt.cookie_name, "jwt");
    assert!(settings.dev_user.is_none());
}

#[test]
fn reads_nested_sections_from_toml_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("admin_server_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("server.toml");
    fs::write(
        &path,
        r#"
bind_addr = "0.0.0.0:9000"

[jwt]
secret = "file-secret"
ttl_seconds = 120

[dev_user]
username = "admin"
password = "admin123"
email = "admin@example.com"
"#,
    )
    .expect("write config");

    let settings = load_settings_from(path.to_string_lossy().as_ref()).expect("settings");
    assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    assert_eq!(settings.jwt.secret, "file-secret");
    assert_eq!(settings.jwt.ttl_seconds, 120);
    assert_eq!(settings.jwt.cookie_name, "jwt");
    let dev = settings.dev_user.expect("dev user");
    assert_eq!(dev.username, "admin");
    assert_eq!(settings.jwt.auth_config().ttl_seconds, 120);

    fs::remove_dir_all(temp_root).expect("cleanup");
}
