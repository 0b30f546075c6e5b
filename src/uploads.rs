//! Disk storage for client attachments.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::models::StoredFile;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid filename pattern"));

const FALLBACK_NAME: &str = "upload";

/// A file part received in a request, held in memory until the rest of the
/// request has been validated.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
    path_prefix: String,
}

impl UploadDir {
    pub fn new(root: PathBuf, path_prefix: String) -> Self {
        Self { root, path_prefix }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path component of `original`, with anything outside
    /// `[A-Za-z0-9._-]` replaced by `_`.
    pub fn stored_name(original: &str) -> String {
        let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
        let base = Path::new(base)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let cleaned = UNSAFE_CHARS.replace_all(&base, "_");
        if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
            FALLBACK_NAME.to_string()
        } else {
            cleaned.into_owned()
        }
    }

    /// Writes every upload, creating the directory on first use. A file with
    /// the same stored name is overwritten. On failure, files already written
    /// by this call are removed.
    pub async fn store_all(&self, uploads: &[PendingUpload]) -> io::Result<Vec<StoredFile>> {
        if uploads.is_empty() {
            return Ok(Vec::new());
        }
        tokio::fs::create_dir_all(&self.root).await?;

        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let name = Self::stored_name(&upload.original_name);
            if let Err(e) = tokio::fs::write(self.root.join(&name), &upload.bytes).await {
                self.discard(&stored).await;
                return Err(e);
            }
            debug!("Stored upload {} as {}", upload.original_name, name);
            stored.push(StoredFile {
                filename: upload.original_name.clone(),
                path: format!("{}/{}", self.path_prefix, name),
            });
        }
        Ok(stored)
    }

    /// Best-effort removal of files written by [`UploadDir::store_all`].
    pub async fn discard(&self, files: &[StoredFile]) {
        for file in files {
            let Some(name) = file.path.rsplit('/').next() else {
                continue;
            };
            if let Err(e) = tokio::fs::remove_file(self.root.join(name)).await {
                warn!("Could not remove orphaned upload {}: {}", file.path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, bytes: &[u8]) -> PendingUpload {
        PendingUpload {
            original_name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn stored_name_strips_directories_and_odd_characters() {
        assert_eq!(UploadDir::stored_name("brief.pdf"), "brief.pdf");
        assert_eq!(UploadDir::stored_name("../../etc/passwd"), "passwd");
        assert_eq!(UploadDir::stored_name("C:\\docs\\logo final.png"), "logo_final.png");
        assert_eq!(UploadDir::stored_name(".."), "upload");
        assert_eq!(UploadDir::stored_name(""), "upload");
    }

    #[actix_web::test]
    async fn store_all_creates_directory_and_records_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("uploads");
        let dir = UploadDir::new(root.clone(), "client-desk/uploads".into());

        let stored = dir
            .store_all(&[upload("logo final.png", b"png"), upload("brief.pdf", b"pdf")])
            .await
            .unwrap();

        assert_eq!(stored[0].filename, "logo final.png");
        assert_eq!(stored[0].path, "client-desk/uploads/logo_final.png");
        assert_eq!(std::fs::read(root.join("brief.pdf")).unwrap(), b"pdf");
    }

    #[actix_web::test]
    async fn discard_removes_written_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = UploadDir::new(tmp.path().to_path_buf(), "client-desk/uploads".into());
        let stored = dir.store_all(&[upload("a.txt", b"a")]).await.unwrap();
        dir.discard(&stored).await;
        assert!(!tmp.path().join("a.txt").exists());
    }

    #[actix_web::test]
    async fn nothing_is_created_without_uploads() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("never");
        let dir = UploadDir::new(root.clone(), "x/uploads".into());
        assert!(dir.store_all(&[]).await.unwrap().is_empty());
        assert!(!root.exists());
    }
}
