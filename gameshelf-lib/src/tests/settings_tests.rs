use super::*;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

#[test]
fn partial_file_keeps_defaults() {
    let settings: Settings = toml::from_str(
        r#"
        [server]
        bind = "0.0.0.0:8080"

        [catalog]
        timeout_secs = 3
        "#,
    )
    .unwrap();
    assert_eq!(settings.server.bind, "0.0.0.0:8080");
    assert_eq!(settings.catalog.timeout_secs, 3);
    assert_eq!(settings.catalog.page_size, 12);
    assert_eq!(settings.catalog.base_url, "https://api.rawg.io/api");
    assert_eq!(settings.auth.token_ttl_hours, 168);
    assert_eq!(settings.catalog_timeout(), Duration::from_secs(3));
}

#[test]
fn env_overrides_file_values() {
    let mut settings = Settings::default();
    settings.apply_overrides(|key| match key {
        "GAMESHELF_BIND" => Some("0.0.0.0:9000".to_string()),
        "GAMESHELF_DATABASE" => Some("/tmp/shelf.db".to_string()),
        "JWT_SECRET" => Some(SECRET.to_string()),
        "ALLOWED_ORIGINS" => Some("https://shelf.example, http://localhost:3000,".to_string()),
        _ => None,
    });
    assert_eq!(settings.server.bind, "0.0.0.0:9000");
    assert_eq!(
        settings.server.allowed_origins,
        ["https://shelf.example", "http://localhost:3000"]
    );
    assert_eq!(settings.database.path, PathBuf::from("/tmp/shelf.db"));
    assert_eq!(settings.jwt_secret().unwrap(), SECRET);
}

#[test]
fn empty_env_values_are_ignored() {
    let mut settings = Settings::default();
    settings.apply_overrides(|_| Some(String::new()));
    assert_eq!(settings, Settings::default());
}

#[test]
fn jwt_secret_is_required_and_long() {
    let mut settings = Settings::default();
    assert!(settings.validate().is_err());

    settings.auth.jwt_secret = Some("short".to_string());
    assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));

    settings.auth.jwt_secret = Some(SECRET.to_string());
    assert!(settings.validate().is_ok());
}

#[test]
fn out_of_range_catalog_values_fail_validation() {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = Some(SECRET.to_string());

    settings.catalog.page_size = 41;
    assert!(settings.validate().is_err());

    settings.catalog.page_size = 20;
    settings.catalog.timeout_secs = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn token_lifetime_is_bounded() {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = Some(SECRET.to_string());

    settings.auth.token_ttl_hours = 0;
    assert!(settings.validate().is_err());

    settings.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS + 1;
    assert!(settings.validate().is_err());

    settings.auth.token_ttl_hours = i64::MAX;
    assert!(settings.validate().is_err());

    settings.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
    assert!(settings.validate().is_ok());
}

#[test]
fn allowed_origins_must_be_bare_origins() {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = Some(SECRET.to_string());
    assert_eq!(settings.server.allowed_origins, ["http://localhost:5173"]);

    settings.server.allowed_origins = vec!["localhost:5173".to_string()];
    assert!(settings.validate().is_err());

    settings.server.allowed_origins = vec!["https://shelf.example/".to_string()];
    assert!(settings.validate().is_err());

    settings.server.allowed_origins = Vec::new();
    assert!(settings.validate().is_ok());
}

#[test]
fn display_masks_the_secret() {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = Some(SECRET.to_string());
    let shown = settings.to_display_string();
    assert!(!shown.contains(SECRET));
    assert!(shown.contains("[catalog]"));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        Settings::load(Some(&missing)),
        Err(SettingsError::Io { .. })
    ));
}

#[test]
fn load_reads_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[database]\npath = \"/data/shelf.db\"\n").unwrap();
    let settings = Settings::load(Some(&path)).unwrap();
    assert_eq!(settings.database.path, PathBuf::from("/data/shelf.db"));

    std::fs::write(&path, "[database\n").unwrap();
    assert!(matches!(
        Settings::load(Some(&path)),
        Err(SettingsError::Parse { .. })
    ));
}
