use crate::error::GuardError;
use std::{fs, io::ErrorKind, path::Path};

/// Reads a file after verifying it is not a symlink and is within `max_bytes`.
///
/// NOTE: narrow TOCTOU window between `symlink_metadata()` and `fs::read()`.
/// The inputs here are project files owned by the repository being checked,
/// so the check exists to catch planted symlinks, not a racing attacker.
pub fn read_validated(path: &Path, max_bytes: u64) -> Result<Vec<u8>, GuardError> {
    let meta = fs::symlink_metadata(path).map_err(|e| GuardError::io(path, e))?;
    if meta.file_type().is_symlink() {
        return Err(GuardError::Symlink(path.to_path_buf()));
    }
    if meta.len() > max_bytes {
        return Err(GuardError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max: max_bytes,
        });
    }
    fs::read(path).map_err(|e| GuardError::io(path, e))
}

/// Like [`read_validated`], but a file that does not exist yields `Ok(None)`.
pub fn read_optional(path: &Path, max_bytes: u64) -> Result<Option<Vec<u8>>, GuardError> {
    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GuardError::io(path, e)),
        Ok(_) => read_validated(path, max_bytes).map(Some),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_optional_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let got = read_optional(&dir.path().join("absent.json"), 1024).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn test_read_validated_rejects_oversized() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.json");
        fs::write(&file, vec![b' '; 65]).unwrap();

        let err = read_validated(&file, 64).unwrap_err();
        assert!(err.to_string().contains("too large"), "error: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn test_read_optional_rejects_symlink() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.json");
        fs::write(&real, b"{}").unwrap();
        let link = dir.path().join("link.json");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let err = read_optional(&link, 1024).unwrap_err();
        assert!(err.to_string().contains("symlink"), "error: {err}");
    }
}
