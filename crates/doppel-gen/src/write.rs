//! Atomic artifact writes.
//!
//! The artifact is written to a temporary file next to its destination and
//! renamed into place, so an interrupted run never leaves half a file.

use crate::error::{GenError, GenResult};
use crate::render::Artifact;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `artifact` into `out_dir`, creating the directory if needed.
///
/// Returns the destination path. A destination that already holds the same
/// text is left untouched.
pub fn write_artifact(artifact: &Artifact, out_dir: &Path) -> GenResult<PathBuf> {
    std::fs::create_dir_all(out_dir).map_err(|e| GenError::io(out_dir, e))?;
    let path = out_dir.join(&artifact.file_name);

    if std::fs::read_to_string(&path).is_ok_and(|existing| existing == artifact.contents) {
        tracing::debug!(path = %path.display(), "artifact unchanged");
        return Ok(path);
    }

    let mut tmp = tempfile::Builder::new()
        .prefix(".doppel-")
        .suffix(".tmp")
        .tempfile_in(out_dir)
        .map_err(|e| GenError::io(out_dir, e))?;
    tmp.write_all(artifact.contents.as_bytes())
        .and_then(|()| tmp.flush())
        .map_err(|e| GenError::io(tmp.path(), e))?;
    tmp.persist(&path).map_err(|e| GenError::io(&path, e.error))?;

    tracing::info!(
        path = %path.display(),
        bytes = artifact.contents.len(),
        "wrote artifact"
    );
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn artifact(contents: &str) -> Artifact {
        Artifact {
            type_name: "Engine".to_string(),
            file_name: "engine_mock.rs".to_string(),
            contents: contents.to_string(),
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let path = write_artifact(&artifact("one"), &out).unwrap();
        assert_eq!(path, out.join("engine_mock.rs"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one");
        assert_eq!(entries(&out), vec!["engine_mock.rs"]);
    }

    #[test]
    fn test_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(&artifact("one"), dir.path()).unwrap();
        let path = write_artifact(&artifact("two"), dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "two");
        assert_eq!(entries(dir.path()), vec!["engine_mock.rs"]);
    }

    #[test]
    fn test_unwritable_destination_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = write_artifact(&artifact("one"), &blocker).unwrap_err();
        assert!(matches!(err, GenError::Io { .. }));
    }
}
