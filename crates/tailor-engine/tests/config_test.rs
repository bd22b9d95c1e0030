use std::io::Write;
use tailor_engine::config::loader::{ConfigError, ConfigLoader};
use tailor_engine::config::schema::TailorConfig;
use tempfile::NamedTempFile;

#[test]
fn test_default_values() {
    let config = TailorConfig::default();
    assert_eq!(config.remote.port, 9001);
    assert_eq!(config.panel.path, "sidepanel.html");
    assert_eq!(config.messaging.response_timeout_ms, 5000);
    assert!(config.store.path.ends_with("store.json"));
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
remote:
  port: 9123
panel:
  path: "panel/index.html"
store:
  path: "/tmp/tailor-test/store.json"
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("Failed to load config from file");

    assert_eq!(config.remote.port, 9123);
    assert_eq!(config.panel.path, "panel/index.html");
    assert_eq!(
        config.store.path,
        std::path::PathBuf::from("/tmp/tailor-test/store.json")
    );
    assert_eq!(config.messaging.response_timeout_ms, 5000);
}

#[tokio::test]
async fn test_load_from_partial_config() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
messaging:
  response_timeout_ms: 250
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("Should load partial config");
    assert_eq!(config.messaging.response_timeout_ms, 250);
    assert_eq!(
        config.messaging.response_timeout(),
        std::time::Duration::from_millis(250)
    );
    assert_eq!(config.remote.port, 9001);
}

#[tokio::test]
async fn test_load_from_empty_file() {
    let file = NamedTempFile::new().unwrap();
    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("Empty file should yield defaults");
    assert_eq!(config.remote.port, 9001);
}

#[tokio::test]
async fn test_load_from_nonexistent_file() {
    let result =
        ConfigLoader::load_from(std::path::Path::new("/nonexistent/path/config.yaml")).await;
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[tokio::test]
async fn test_explicit_path_must_exist() {
    let result = ConfigLoader::load(Some(std::path::Path::new("/nonexistent/tailor.yaml"))).await;
    match result {
        Err(ConfigError::Io { path, .. }) => {
            assert_eq!(path, std::path::PathBuf::from("/nonexistent/tailor.yaml"))
        }
        other => panic!("expected an Io error, got {:?}", other.map(|c| c.remote.port)),
    }
}

#[tokio::test]
async fn test_explicit_path_skips_search() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "remote:\n  port: 9555").unwrap();

    let config = ConfigLoader::load(Some(file.path())).await.unwrap();
    assert_eq!(config.remote.port, 9555);
}

#[tokio::test]
async fn test_relative_store_path_follows_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("tailor.yaml");
    std::fs::write(&config_path, "store:\n  path: data/store.json\n").unwrap();

    let config = ConfigLoader::load_from(&config_path).await.unwrap();
    assert_eq!(config.store.path, dir.path().join("data").join("store.json"));
}

#[test]
fn test_candidate_paths_start_with_working_directory() {
    let paths = ConfigLoader::candidate_paths();
    assert_eq!(paths[0], std::path::PathBuf::from("./tailor.yaml"));
    assert!(paths.iter().skip(1).all(|p| p.ends_with(".tailor/config.yaml")));
}

#[tokio::test]
async fn test_load_with_type_mismatch() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
remote:
  port: "not_a_number"
"#
    )
    .unwrap();

    let result = ConfigLoader::load_from(file.path()).await;
    assert!(
        matches!(result, Err(ConfigError::Parse { .. })),
        "Should fail on type mismatch"
    );
}
