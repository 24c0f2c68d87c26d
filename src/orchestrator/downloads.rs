use crate::error::ExportError;
use crate::export::Download;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write a download into `dir` under its fixed filename, replacing any previous file.
pub fn save_download(dir: &Path, download: &Download) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(download.filename);
    std::fs::write(&path, &download.bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = download.bytes.len(), "download saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let first = Download {
            filename: "variance-analysis-results.txt",
            bytes: b"one".to_vec(),
        };
        let path = save_download(&target, &first).unwrap();
        let second = Download {
            bytes: b"two".to_vec(),
            ..first
        };
        assert_eq!(save_download(&target, &second).unwrap(), path);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "two");
    }

    #[test]
    fn unwritable_target_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"").unwrap();
        let err = save_download(
            &file,
            &Download {
                filename: "x.txt",
                bytes: vec![],
            },
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }
}
