use lumilio_fs::{ConfigFormat, ConfigStore, Error, NormalizedPath};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    patterns: Vec<String>,
}

fn sample() -> Sample {
    Sample {
        name: "family".into(),
        patterns: vec!["*.tmp".into(), ".DS_Store".into(), "Thumbs.db".into()],
    }
}

#[test]
fn test_yaml_round_trip_for_extensionless_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(".lumiliorepo"));
    let store = ConfigStore::new();

    store.save_as(&path, &sample(), ConfigFormat::Yaml).unwrap();
    let loaded: Sample = store.load_as(&path, ConfigFormat::Yaml).unwrap();

    assert_eq!(loaded, sample());
}

#[test]
fn test_extension_detection() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::new();

    for name in ["c.json", "c.toml", "c.yaml", "c.yml"] {
        let path = NormalizedPath::new(temp.path().join(name));
        store.save(&path, &sample()).unwrap();
        let loaded: Sample = store.load(&path).unwrap();
        assert_eq!(loaded, sample(), "round trip through {name}");
    }
}

#[test]
fn test_extensionless_detection_is_unsupported() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(".lumiliorepo"));

    let err = ConfigStore::new().save(&path, &sample()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join(".lumiliorepo");
    fs::write(&file, "name: [unclosed").unwrap();

    let err = ConfigStore::new()
        .load_as::<Sample>(&NormalizedPath::new(&file), ConfigFormat::Yaml)
        .unwrap_err();

    match err {
        Error::ConfigParse { format, .. } => assert_eq!(format, "YAML"),
        other => panic!("expected ConfigParse, got {other:?}"),
    }
}
