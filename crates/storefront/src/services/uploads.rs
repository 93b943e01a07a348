//! Product image uploads.
//!
//! Images are written to the upload directory on local disk and referenced
//! from products as `uploads/<file>`, relative to the static directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

/// Accepted image extensions (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Prefix of stored image references.
const URL_PREFIX: &str = "uploads";

/// Errors from validating or storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please choose an image to upload")]
    MissingFile,

    #[error("Only png, jpg, jpeg and gif images are allowed")]
    UnsupportedType,

    #[error("The image file name is not usable")]
    InvalidFilename,

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the uploader can fix this by choosing another file.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Whether the filename has an accepted image extension.
#[must_use]
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Directory parts are dropped, whitespace becomes `_`, anything outside
/// `[A-Za-z0-9._-]` is removed and leading dots/underscores are stripped.
/// Returns `None` if nothing usable is left.
#[must_use]
pub fn secure_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_owned())
    }
}

/// Writes product images into the upload directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory images are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and store an uploaded image, returning its `uploads/<file>`
    /// reference.
    ///
    /// An existing file is never overwritten; on a name clash the new file
    /// gets a short random prefix.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::MissingFile` for an empty upload,
    /// `UnsupportedType` for a disallowed extension, `InvalidFilename` when
    /// the name sanitizes to nothing, and `Io` if writing fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        if filename.trim().is_empty() || bytes.is_empty() {
            return Err(UploadError::MissingFile);
        }
        if !allowed_file(filename) {
            return Err(UploadError::UnsupportedType);
        }
        let name = secure_filename(filename).ok_or(UploadError::InvalidFilename)?;
        // Sanitizing can strip the extension (e.g. "x.p ng").
        if !allowed_file(&name) {
            return Err(UploadError::UnsupportedType);
        }

        fs::create_dir_all(&self.dir).await?;

        let stored = match self.write_new(&name, bytes).await {
            Err(UploadError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {
                let prefix = uuid::Uuid::new_v4().simple().to_string();
                let unique = format!("{}_{name}", prefix.get(..8).unwrap_or(&prefix));
                self.write_new(&unique, bytes).await?;
                unique
            }
            other => {
                other?;
                name
            }
        };

        debug!(file = %stored, "Stored upload");
        Ok(format!("{URL_PREFIX}/{stored}"))
    }

    /// Delete an image stored by [`save`](Self::save), e.g. when the product
    /// it was uploaded for could not be written.
    ///
    /// Only plain `uploads/<file>` references are touched. Failures are
    /// logged, not returned.
    #[instrument(skip(self))]
    pub async fn discard(&self, reference: &str) {
        let Some(name) = reference
            .strip_prefix(URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| secure_filename(name).as_deref() == Some(*name))
        else {
            warn!("Refusing to discard unrecognized upload reference");
            return;
        };

        match fs::remove_file(self.dir.join(name)).await {
            Ok(()) => debug!("Discarded upload"),
            Err(e) => warn!(error = %e, "Failed to discard upload"),
        }
    }

    async fn write_new(&self, name: &str, bytes: &[u8]) -> Result<(), UploadError> {
        let path = self.dir.join(name);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let written = match file.write_all(bytes).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(error = %cleanup, file = %name, "Failed to remove partial upload");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store() -> UploadStore {
        UploadStore::new(std::env::temp_dir().join(format!("emporium-uploads-{}", uuid::Uuid::new_v4())))
    }

    #[test]
    fn test_allowed_file_is_case_insensitive() {
        assert!(allowed_file("tea.png"));
        assert!(allowed_file("TEA.JPG"));
        assert!(allowed_file("archive.tar.gif"));
        assert!(!allowed_file("tea.webp"));
        assert!(!allowed_file("png"));
        assert!(!allowed_file("tea."));
    }

    #[test]
    fn test_secure_filename_strips_paths_and_symbols() {
        assert_eq!(secure_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(secure_filename(r"C:\photos\my tea.png").as_deref(), Some("my_tea.png"));
        assert_eq!(secure_filename("ｔea<script>.png").as_deref(), Some("eascript.png"));
        assert_eq!(secure_filename("..").as_deref(), None);
        assert_eq!(secure_filename("   ").as_deref(), None);
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_reference() {
        let store = temp_store();
        let url = store.save("green tea.PNG", b"\x89PNG").await.unwrap();

        assert_eq!(url, "uploads/green_tea.PNG");
        let written = fs::read(store.dir().join("green_tea.PNG")).await.unwrap();
        assert_eq!(written, b"\x89PNG");

        fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_never_overwrites() {
        let store = temp_store();
        let first = store.save("tea.gif", b"one").await.unwrap();
        let second = store.save("tea.gif", b"two").await.unwrap();

        assert_ne!(first, second);
        assert!(second.starts_with("uploads/") && second.ends_with("_tea.gif"));
        assert_eq!(fs::read(store.dir().join("tea.gif")).await.unwrap(), b"one");

        fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn test_discard_removes_only_stored_images() {
        let store = temp_store();
        let url = store.save("tea.png", b"\x89PNG").await.unwrap();
        let outside = store.dir().join("keep.png");
        fs::write(&outside, b"keep").await.unwrap();

        store.discard(&url).await;
        assert!(!fs::try_exists(store.dir().join("tea.png")).await.unwrap());

        for reference in ["keep.png", "uploads/../keep.png", "static/keep.png"] {
            store.discard(reference).await;
        }
        // already gone; only logged
        store.discard(&url).await;
        assert!(fs::try_exists(&outside).await.unwrap());

        fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_rejects_bad_uploads() {
        let store = temp_store();
        assert!(matches!(store.save("", b"x").await, Err(UploadError::MissingFile)));
        assert!(matches!(store.save("tea.png", b"").await, Err(UploadError::MissingFile)));
        assert!(matches!(
            store.save("tea.exe", b"x").await,
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            store.save("!!!.png", b"x").await,
            Err(UploadError::UnsupportedType)
        ));
        assert!(UploadError::UnsupportedType.is_user_error());
    }
}
