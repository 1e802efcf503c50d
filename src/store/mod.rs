//! Storage backends.
//!
//! Every document lives in exactly one [`DocumentStore`]: a folder on the
//! local filesystem ([`LocalStore`]) or a Google Drive folder
//! ([`DriveStore`]). The trait covers the three capabilities the pipeline
//! needs — enumerate, read, rename — so everything downstream of discovery is
//! backend-agnostic and tests can substitute an in-memory fake.
//!
//! The two implementations deliberately do **not** behave identically on
//! rename: the local store probes for collisions and appends `_1`, `_2`, …
//! before the extension, while the Drive store updates the title with no
//! duplicate check (Drive tolerates duplicate titles; the filesystem does
//! not). See the per-store docs.

mod drive;
mod local;

pub use drive::{DriveStore, TRANSCRIPT_MIME};
pub use local::LocalStore;

use crate::error::StoreError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Fixed extension local discovery filters on.
pub const TRANSCRIPT_EXTENSION: &str = "pdf";

/// A backend-specific reference to one document.
///
/// Opaque to the pipeline beyond what reporting and formatting need: a
/// display name and the original extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentHandle {
    /// A file on the local filesystem.
    Local(PathBuf),
    /// A Drive file, addressed by id; `title` is its name at discovery time.
    Remote { id: String, title: String },
}

impl DocumentHandle {
    /// The document's user-facing name (file name or Drive title).
    pub fn display_name(&self) -> String {
        match self {
            DocumentHandle::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            DocumentHandle::Remote { title, .. } => title.clone(),
        }
    }

    /// The document's original extension, without the dot. Falls back to
    /// [`TRANSCRIPT_EXTENSION`] when the name carries none.
    pub fn extension(&self) -> &str {
        let ext = match self {
            DocumentHandle::Local(path) => path.extension().and_then(|e| e.to_str()),
            DocumentHandle::Remote { title, .. } => {
                title.rsplit_once('.').map(|(_, ext)| ext).filter(|e| !e.is_empty())
            }
        };
        ext.unwrap_or(TRANSCRIPT_EXTENSION)
    }
}

/// One storage backend: enumerate, read, rename.
///
/// Implementations are injected into [`crate::run`] as `Arc<dyn
/// DocumentStore>`; the pipeline never branches on the concrete backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Enumerate the candidate documents in the configured location.
    ///
    /// An empty result is not an error here; the orchestration entry point
    /// decides that an empty batch is fatal. Errors mean the location itself
    /// could not be queried (network fault, revoked credentials).
    async fn list(&self) -> Result<Vec<DocumentHandle>, StoreError>;

    /// Fetch the raw bytes of one document.
    async fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>, StoreError>;

    /// Rename one document to `target_name`, returning the name actually
    /// applied (which may carry a collision suffix on backends that
    /// disambiguate).
    async fn rename(&self, handle: &DocumentHandle, target_name: &str)
        -> Result<String, StoreError>;

    /// Human-readable description of the store's location, for error
    /// messages and the fatal empty-discovery report.
    fn location(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_handle_display_name_is_the_file_name() {
        let handle = DocumentHandle::Local(PathBuf::from("/scans/batch-1/scan_001.pdf"));
        assert_eq!(handle.display_name(), "scan_001.pdf");
        assert_eq!(handle.extension(), "pdf");
    }

    #[test]
    fn remote_handle_uses_title() {
        let handle = DocumentHandle::Remote {
            id: "1a2b3c".into(),
            title: "Nguyễn Văn A.PDF".into(),
        };
        assert_eq!(handle.display_name(), "Nguyễn Văn A.PDF");
        assert_eq!(handle.extension(), "PDF");
    }

    #[test]
    fn extension_falls_back_when_missing() {
        let handle = DocumentHandle::Remote {
            id: "x".into(),
            title: "no-extension".into(),
        };
        assert_eq!(handle.extension(), TRANSCRIPT_EXTENSION);

        let trailing_dot = DocumentHandle::Remote {
            id: "y".into(),
            title: "weird.".into(),
        };
        assert_eq!(trailing_dot.extension(), TRANSCRIPT_EXTENSION);
    }
}
