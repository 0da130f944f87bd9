use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Name of the manifest file looked up in each directory.
pub const MANIFEST_NAME: &str = "package.json";

/// The nearest manifest above some starting directory, reduced to the parts
/// the runner cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    /// Directory containing the manifest.
    pub directory: PathBuf,
    /// Script name to command text. Empty when the manifest has no scripts.
    pub scripts: BTreeMap<String, String>,
}

impl ManifestInfo {
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }
}

/// Walk upward from `start` and return the first manifest found.
///
/// Only a missing file moves the search to the parent directory. Any other I/O
/// failure stops the walk where it happened, so a permission problem is never
/// mistaken for "no manifest here".
pub fn locate(start: &Path) -> Result<ManifestInfo> {
    let mut candidate = start;
    loop {
        let path = candidate.join(MANIFEST_NAME);
        trace!(path = %path.display(), "looking for manifest");
        match File::open(&path) {
            Ok(file) => {
                let scripts = read_scripts(file, &path)?;
                debug!(
                    directory = %candidate.display(),
                    scripts = scripts.len(),
                    "found manifest"
                );
                return Ok(ManifestInfo {
                    directory: candidate.to_path_buf(),
                    scripts,
                });
            }
            Err(err) if err.kind() == ErrorKind::NotFound => match candidate.parent() {
                Some(parent) => candidate = parent,
                None => {
                    return Err(Error::ManifestNotFound {
                        start: start.to_path_buf(),
                    });
                }
            },
            Err(source) => return Err(Error::ManifestUnreadable { path, source }),
        }
    }
}

// Takes the file by value so the handle is closed however parsing ends.
fn read_scripts(file: File, path: &Path) -> Result<BTreeMap<String, String>> {
    let malformed = |source: serde_json::Error| Error::ManifestMalformed {
        path: path.to_path_buf(),
        source,
    };

    let mut manifest: Map<String, Value> = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| {
            if source.is_io() {
                Error::ManifestUnreadable {
                    path: path.to_path_buf(),
                    source: source.into(),
                }
            } else {
                malformed(source)
            }
        })?;

    match manifest.remove("scripts") {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(scripts) => serde_json::from_value(scripts).map_err(malformed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, contents: &str) {
        fs::create_dir_all(dir).expect("create dir");
        fs::write(dir.join(MANIFEST_NAME), contents).expect("write manifest");
    }

    #[test]
    fn finds_manifest_in_start_directory() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"scripts": {"build": "make"}}"#);

        let info = locate(tmp.path()).expect("manifest");
        assert_eq!(info.directory, tmp.path());
        assert_eq!(info.script("build"), Some("make"));
    }

    #[test]
    fn nearest_manifest_wins() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"scripts": {"which": "outer"}}"#);
        let middle = tmp.path().join("a");
        write_manifest(&middle, r#"{"scripts": {"which": "middle"}}"#);
        let start = middle.join("b").join("c");
        fs::create_dir_all(&start).expect("create start");

        let info = locate(&start).expect("manifest");
        assert_eq!(info.directory, middle);
        assert_eq!(info.script("which"), Some("middle"));
    }

    #[test]
    fn missing_scripts_field_is_empty() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"name": "demo", "version": "1.0.0"}"#);

        let info = locate(tmp.path()).expect("manifest");
        assert!(info.scripts.is_empty());
        assert_eq!(info.script("test"), None);
    }

    #[test]
    fn null_scripts_field_is_empty() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"scripts": null}"#);

        let info = locate(tmp.path()).expect("manifest");
        assert!(info.scripts.is_empty());
    }

    #[test]
    fn other_fields_are_ignored() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(
            tmp.path(),
            r#"{"dependencies": {"left-pad": 1}, "scripts": {"a": "echo a"}, "private": true}"#,
        );

        let info = locate(tmp.path()).expect("manifest");
        assert_eq!(info.scripts.len(), 1);
    }

    #[test]
    fn non_string_script_is_malformed() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"scripts": {"build": 42}}"#);

        let err = locate(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestMalformed { .. }), "{err:?}");
    }

    #[test]
    fn scripts_must_be_an_object() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"scripts": ["build"]}"#);

        let err = locate(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestMalformed { .. }), "{err:?}");
    }

    #[test]
    fn top_level_must_be_an_object() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"[{"scripts": {}}]"#);

        let err = locate(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestMalformed { .. }), "{err:?}");
    }

    #[test]
    fn invalid_json_stops_the_walk() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"scripts": {"ok": "true"}}"#);
        let inner = tmp.path().join("inner");
        write_manifest(&inner, "{ not json");

        let err = locate(&inner).unwrap_err();
        match err {
            Error::ManifestMalformed { path, .. } => assert_eq!(path, inner.join(MANIFEST_NAME)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn manifest_directory_is_unreadable() {
        // A directory named package.json opens fine on Unix but cannot be read.
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir(tmp.path().join(MANIFEST_NAME)).expect("create dir");

        let err = locate(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestUnreadable { .. }), "{err:?}");
        assert!(!err.is_expected());
    }
}
