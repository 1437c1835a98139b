use super::*;

#[test]
fn env_beats_file() {
    let (key, source) = resolve(Some("from-env".into()), Some("from-file".into()));
    assert_eq!(key.as_deref(), Some("from-env"));
    assert_eq!(source, ApiKeySource::EnvVar("RAWG_API_KEY"));
}

#[test]
fn file_used_when_env_missing_or_blank() {
    let (key, source) = resolve(None, Some("from-file".into()));
    assert_eq!(key.as_deref(), Some("from-file"));
    assert_eq!(source, ApiKeySource::ConfigFile);

    let (key, _) = resolve(Some("   ".into()), Some("from-file".into()));
    assert_eq!(key.as_deref(), Some("from-file"));
}

#[test]
fn nothing_set_is_missing() {
    let (key, source) = resolve(None, None);
    assert_eq!(key, None);
    assert_eq!(source, ApiKeySource::Missing);
    assert_eq!(source.to_string(), "not set");
}

#[test]
fn file_round_trip() {
    let dir = std::env::temp_dir().join(format!("gameshelf-creds-{}", std::process::id()));
    let path = dir.join("nested").join("credentials.toml");
    write_file_key(&path, "abc123").unwrap();
    assert_eq!(read_file_key(&path).as_deref(), Some("abc123"));

    std::fs::write(&path, "not = [valid").unwrap();
    assert_eq!(read_file_key(&path), None);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn file_without_rawg_section_has_no_key() {
    let dir = std::env::temp_dir().join(format!("gameshelf-creds-empty-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("credentials.toml");
    std::fs::write(&path, "[other]\nvalue = 1\n").unwrap();
    assert_eq!(read_file_key(&path), None);
    let _ = std::fs::remove_dir_all(&dir);
}
