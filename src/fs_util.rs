use std::fs;
use std::path::Path;

use crate::error::SetupError;

/// Removes the file if present. Returns whether anything was deleted; the
/// caller decides whether a failure here is fatal.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, SetupError> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path)
        .map_err(|err| SetupError::Filesystem(format!("remove {}: {err}", path.display())))?;
    Ok(true)
}

pub fn ensure_dir(path: &Path) -> Result<(), SetupError> {
    fs::create_dir_all(path)
        .map_err(|err| SetupError::Filesystem(format!("create {}: {err}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_absent_file_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let removed = remove_file_if_exists(&temp.path().join("missing.zip")).unwrap();
        assert!(!removed);
    }

    #[test]
    fn removes_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bundle.zip");
        std::fs::write(&path, b"payload").unwrap();

        let removed = remove_file_if_exists(&path).unwrap();
        assert!(removed);
        assert!(!path.exists());
    }

    #[test]
    fn removing_a_directory_surfaces_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("not-a-file");
        std::fs::create_dir(&dir).unwrap();

        assert!(remove_file_if_exists(&dir).is_err());
        assert!(dir.exists());
    }
}
