//! Output naming and atomic file writes.

use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::RunError;

/// Output base name for an input file: its file name up to the first
/// `.` (`"spa.2024.kml"` -> `"spa"`).
///
/// Returns `None` when that leaves nothing, e.g. for `".kml"`.
pub fn base_name(kml_file: &Path) -> Option<&str> {
    let file_name = kml_file.file_name()?.to_str()?;
    let base = file_name.split('.').next()?;
    (!base.is_empty()).then_some(base)
}

/// Write every `(path, contents)` pair, all or nothing as far as the
/// filesystem allows.
///
/// Each file is first written in full to a temporary file next to its
/// destination.  Only once every temporary file exists are they renamed
/// into place, so a missing or unwritable directory leaves no output
/// behind.
pub fn write_all_atomic(outputs: &[(&Path, &[u8])]) -> Result<(), RunError> {
    let staged = outputs
        .iter()
        .map(|&(path, contents)| stage(path, contents).map(|tmp| (path, tmp)))
        .collect::<Result<Vec<_>, _>>()?;

    for (path, tmp) in staged {
        tmp.persist(path).map_err(|e| RunError::OutputWrite {
            path: path.to_path_buf(),
            source: e.error,
        })?;
    }
    Ok(())
}

/// Write `contents` to a temporary file in `path`'s directory.
fn stage(path: &Path, contents: &[u8]) -> Result<NamedTempFile, RunError> {
    let write_error = |source| RunError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = Builder::new()
        .prefix(".trackmap.")
        .tempfile_in(dir)
        .map_err(write_error)?;
    tmp.write_all(contents).map_err(write_error)?;
    tmp.flush().map_err(write_error)?;
    Ok(tmp)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_name_stops_at_first_dot() {
        assert_eq!(base_name(Path::new("monza.kml")), Some("monza"));
        assert_eq!(base_name(Path::new("spa.2024.kml")), Some("spa"));
        assert_eq!(base_name(Path::new("imola")), Some("imola"));
    }

    #[test]
    fn base_name_uses_file_name_only() {
        assert_eq!(base_name(Path::new("europe/zandvoort.kml")), Some("zandvoort"));
    }

    #[test]
    fn base_name_rejects_empty() {
        assert_eq!(base_name(Path::new(".kml")), None);
        assert_eq!(base_name(Path::new("")), None);
    }

    #[test]
    fn writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.coordinates");
        write_all_atomic(&[(a.as_path(), b"png"), (b.as_path(), b"{}")]).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), b"png");
        assert_eq!(std::fs::read(&b).unwrap(), b"{}");
        // No temporary files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.coordinates");
        std::fs::write(&a, "old contents that are longer").unwrap();
        write_all_atomic(&[(a.as_path(), b"new")]).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), b"new");
    }

    #[test]
    fn missing_directory_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("missing").join("bad.coordinates");
        let result = write_all_atomic(&[(good.as_path(), b"png"), (bad.as_path(), b"{}")]);
        assert!(
            matches!(result, Err(RunError::OutputWrite { ref path, .. }) if *path == bad),
            "got {result:?}"
        );
        assert!(!good.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
