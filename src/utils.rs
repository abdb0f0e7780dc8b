use crate::store::error::StoreError;
use log::info;
use std::io;
use std::path::Path;

/// Creates the directory that will hold `file`, if it does not exist yet.
pub fn ensure_parent_dir_exists(file: &Path) -> Result<(), StoreError> {
    let Some(dir) = file.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    match std::fs::metadata(dir) {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(StoreError::NotADirectory(dir.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", dir.display());
            std::fs::create_dir_all(dir)
                .map_err(|e| StoreError::DirCreation(dir.to_path_buf(), e))
        }
        Err(e) => Err(StoreError::Metadata(dir.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_nested_parent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let file = tmp.path().join("a").join("b").join("log.csv");

        ensure_parent_dir_exists(&file).expect("created");
        assert!(tmp.path().join("a").join("b").is_dir());

        // Second call is a no-op
        ensure_parent_dir_exists(&file).expect("still fine");
    }

    #[test]
    fn test_parent_is_a_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"x").expect("write");

        let err = ensure_parent_dir_exists(&blocker.join("log.csv")).expect_err("not a dir");
        assert!(matches!(err, StoreError::NotADirectory(_)));
    }

    #[test]
    fn test_bare_file_name_needs_no_directory() {
        ensure_parent_dir_exists(Path::new("log.csv")).expect("nothing to create");
    }
}
