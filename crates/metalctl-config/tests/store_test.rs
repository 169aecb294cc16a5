// Loading and saving the context file on disk.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use metalctl_config::{ConfigError, ConfigFile, Context, load, save};

#[test]
fn explicit_missing_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Missing { .. }));
}

#[test]
fn explicit_path_with_broken_yaml_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "contexts: [this is: not a map").unwrap();

    assert!(matches!(load(Some(&path)), Err(ConfigError::Figment(_))));
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let mut file = ConfigFile::default();
    file.add_context(
        "prod",
        Context {
            url: "https://metal.example.com".into(),
            hmac: Some("secret".into()),
            ..Context::default()
        },
        true,
    )
    .unwrap();
    file.add_context(
        "dev",
        Context {
            url: "http://localhost:8080".into(),
            ..Context::default()
        },
        false,
    )
    .unwrap();
    file.set_current("dev").unwrap();

    save(&file, &path).unwrap();
    let loaded = load(Some(&path)).unwrap();

    assert_eq!(loaded.file, file);
    assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
    assert_eq!(loaded.save_path(), path);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("current: dev"));
    assert!(raw.contains("previous: prod"));
}

#[test]
fn save_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "current: old\n").unwrap();

    save(&ConfigFile::default(), &path).unwrap();

    let loaded = load(Some(&path)).unwrap();
    assert_eq!(loaded.file.current, "");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
