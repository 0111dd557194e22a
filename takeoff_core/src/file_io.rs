//! # File I/O Module
//!
//! Loading project snapshots and saving calc run output:
//! - **Version validation**: snapshots from an incompatible schema are rejected
//! - **Atomic saves**: write to `.tmp`, re-read and verify, rename over the target
//!
//! ## Example
//!
//! ```rust,no_run
//! use takeoff_core::catalog::InMemoryCatalog;
//! use takeoff_core::file_io::{load_snapshot, save_run};
//! use takeoff_core::run::run_calculation;
//! use takeoff_core::trace::NOOP_TRACE;
//! use std::path::Path;
//!
//! let snapshot = load_snapshot(Path::new("project.json"))?;
//! let run = run_calculation(&snapshot, &InMemoryCatalog::dpwh_defaults(), &NOOP_TRACE)?;
//! save_run(&run, Path::new("project.boq.json"))?;
//! # Ok::<(), takeoff_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::errors::{CalcError, CalcResult};
use crate::project::{ProjectSnapshot, SCHEMA_VERSION};
use crate::run::CalcRun;

/// Load a project snapshot from a JSON file.
///
/// # Returns
///
/// * `Err(CalcError::FileError)` - I/O error
/// * `Err(CalcError::SerializationError)` - Invalid JSON
/// * `Err(CalcError::VersionMismatch)` - Schema version is incompatible
pub fn load_snapshot(path: &Path) -> CalcResult<ProjectSnapshot> {
    let contents = read_to_string(path)?;
    parse_snapshot(&contents).map_err(|e| match e {
        CalcError::SerializationError { reason } => CalcError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), reason),
        },
        other => other,
    })
}

/// Parse a snapshot from a JSON string and validate its schema version.
pub fn parse_snapshot(json: &str) -> CalcResult<ProjectSnapshot> {
    let snapshot: ProjectSnapshot = serde_json::from_str(json).map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })?;
    validate_version(&snapshot.meta.version)?;
    Ok(snapshot)
}

/// Save a calc run as pretty JSON with atomic write semantics.
pub fn save_run(run: &CalcRun, path: &Path) -> CalcResult<()> {
    save_json(run, path)
}

/// Save a snapshot as pretty JSON with atomic write semantics.
pub fn save_snapshot(snapshot: &ProjectSnapshot, path: &Path) -> CalcResult<()> {
    save_json(snapshot, path)
}

/// The save process:
/// 1. Serialize to JSON
/// 2. Write to a temporary file next to the target and fsync it
/// 3. Read the temporary file back and check it parses
/// 4. Rename over the target (atomic on most filesystems)
fn save_json<T: Serialize>(value: &T, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension("json.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    let written = read_to_string(&tmp_path)?;
    if let Err(e) = serde_json::from_str::<serde_json::Value>(&written) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CalcError::file_error(
            "verify temp file",
            tmp_path.display().to_string(),
            e.to_string(),
        ));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

fn read_to_string(path: &Path) -> CalcResult<String> {
    let mut file = File::open(path).map_err(|e| CalcError::file_error("open", path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions a newer minor is a breaking change
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::run::run_calculation;
    use crate::trace::NOOP_TRACE;
    use std::env::temp_dir;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        temp_dir().join(format!("takeoff_test_{}.json", name))
    }

    #[test]
    fn test_snapshot_save_and_load() {
        let path = temp_path("snapshot_roundtrip");
        let snapshot = ProjectSnapshot::new("Residence", "24-017");
        save_snapshot(&snapshot, &path).unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.meta.project_code, "24-017");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let path = temp_path("atomic_run");
        let snapshot = ProjectSnapshot::new("Empty", "0");
        let run = run_calculation(&snapshot, &InMemoryCatalog::new(), &NOOP_TRACE).unwrap();
        save_run(&run, &path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["lines"].as_array().unwrap().is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let result = load_snapshot(Path::new("/nonexistent/takeoff/project.json"));
        assert!(matches!(result, Err(CalcError::FileError { .. })));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse_snapshot("{ not json"), Err(CalcError::SerializationError { .. })));
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_parse_rejects_future_schema() {
        let json = r#"{"meta":{"version":"2.0.0","created":"2024-05-01T08:00:00Z","modified":"2024-05-01T08:00:00Z"}}"#;
        assert_eq!(
            parse_snapshot(json).unwrap_err(),
            CalcError::VersionMismatch { file_version: "2.0.0".into(), expected_version: SCHEMA_VERSION.into() }
        );
    }
}
