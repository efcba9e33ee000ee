//! Result storage.
//!
//! Every successful transformation writes one file into the output
//! directory under a collision-free name, which the response hands back to
//! the client for a later `/api/download/:filename` fetch. Nothing else is
//! persisted; uploads stay in memory for the lifetime of their request.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ApiError;

#[derive(Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Open (and create if needed) the output directory.
    pub fn new(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Persist a result and return the filename to report to the client.
    pub async fn store(&self, prefix: &str, data: &[u8]) -> Result<String, ApiError> {
        let filename = format!("{prefix}-{}.pdf", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&filename), data).await?;
        Ok(filename)
    }

    /// Read a previously stored result back.
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        if !Self::is_safe_name(filename) {
            return Err(ApiError::NotFound(filename.to_string()));
        }
        tokio::fs::read(self.dir.join(filename))
            .await
            .map_err(|_| ApiError::NotFound(filename.to_string()))
    }

    /// Only names we generated are ever served back; anything that could
    /// escape the output directory is treated as unknown.
    pub(crate) fn is_safe_name(name: &str) -> bool {
        !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn safe_names() {
        assert!(Storage::is_safe_name("merged-abc123.pdf"));
        assert!(!Storage::is_safe_name(""));
        assert!(!Storage::is_safe_name("../etc/passwd"));
        assert!(!Storage::is_safe_name("a/b.pdf"));
        assert!(!Storage::is_safe_name("a\\b.pdf"));
        assert!(!Storage::is_safe_name("..hidden"));
    }

    #[tokio::test]
    async fn store_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();

        let filename = storage.store("merged", b"%PDF-data").await.unwrap();
        assert!(filename.starts_with("merged-"));
        assert!(filename.ends_with(".pdf"));

        let data = storage.read(&filename).await.unwrap();
        assert_eq!(data, b"%PDF-data");
    }

    #[tokio::test]
    async fn read_unknown_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        assert!(matches!(
            storage.read("missing.pdf").await,
            Err(ApiError::NotFound(_))
        ));
    }
}
