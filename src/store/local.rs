//! Local-filesystem backend.
//!
//! Discovery is a non-recursive scan of one folder for `*.pdf` files, sorted
//! by path so batches (and the anonymizer's numbering) are deterministic.
//! Renames happen inside that folder and are collision-safe: when the target
//! name is taken, a numeric suffix is inserted before the extension (`X.pdf`,
//! `X_1.pdf`, `X_2.pdf`, …) until a free name is found. A document that
//! already carries its target name keeps it, so repeated runs over the same
//! folder are stable. The actual rename is a single `rename(2)` call, so the
//! source file stays untouched until the final name is known and either the
//! whole rename happens or nothing does.

use super::{DocumentHandle, DocumentStore, TRANSCRIPT_EXTENSION};
use crate::error::StoreError;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A folder of transcript PDFs on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStore {
    folder: PathBuf,
}

impl LocalStore {
    /// Create a store over `folder`. The folder is not required to exist
    /// yet; a missing folder simply lists as empty.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    fn io_error(&self, path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// First free path for `target_name` inside the folder, probing
    /// `name_1.ext`, `name_2.ext`, … on collision. Returns the path together
    /// with the file name actually chosen. `source` never counts as occupied,
    /// so a document that already carries its target name keeps it across
    /// repeated runs instead of collecting suffixes.
    async fn next_free_path(
        &self,
        source: &Path,
        target_name: &str,
    ) -> Result<(PathBuf, String), StoreError> {
        let mut candidate_name = target_name.to_string();
        let mut candidate = self.folder.join(&candidate_name);
        let (stem, ext) = match target_name.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (target_name, None),
        };
        let mut counter = 1u32;
        while candidate != source
            && tokio::fs::try_exists(&candidate)
                .await
                .map_err(|e| self.io_error(&candidate, e))?
        {
            candidate_name = match ext {
                Some(ext) => format!("{stem}_{counter}.{ext}"),
                None => format!("{stem}_{counter}"),
            };
            candidate = self.folder.join(&candidate_name);
            counter += 1;
        }
        Ok((candidate, candidate_name))
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn list(&self) -> Result<Vec<DocumentHandle>, StoreError> {
        let mut dir = match tokio::fs::read_dir(&self.folder).await {
            Ok(dir) => dir,
            // A missing folder has nothing in it; the orchestrator turns an
            // empty batch into the fatal NoDocuments error with the folder
            // name in the message.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(folder = %self.folder.display(), "folder does not exist, listing empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(&self.folder, e)),
        };

        let mut handles = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| self.io_error(&self.folder, e))?
        {
            let path = entry.path();
            let is_pdf = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(TRANSCRIPT_EXTENSION));
            if !is_pdf {
                continue;
            }
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| self.io_error(&path, e))?;
            if file_type.is_file() {
                handles.push(DocumentHandle::Local(path));
            }
        }

        handles.sort_by(|a, b| match (a, b) {
            (DocumentHandle::Local(a), DocumentHandle::Local(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        });
        debug!(folder = %self.folder.display(), count = handles.len(), "listed local folder");
        Ok(handles)
    }

    async fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>, StoreError> {
        let DocumentHandle::Local(path) = handle else {
            return Err(StoreError::UnsupportedHandle { backend: "local" });
        };
        tokio::fs::read(path)
            .await
            .map_err(|e| self.io_error(path, e))
    }

    async fn rename(
        &self,
        handle: &DocumentHandle,
        target_name: &str,
    ) -> Result<String, StoreError> {
        let DocumentHandle::Local(path) = handle else {
            return Err(StoreError::UnsupportedHandle { backend: "local" });
        };
        let (target_path, final_name) = self.next_free_path(path, target_name).await?;
        tokio::fs::rename(path, &target_path)
            .await
            .map_err(|e| self.io_error(path, e))?;
        debug!(from = %path.display(), to = %target_path.display(), "renamed");
        Ok(final_name)
    }

    fn location(&self) -> String {
        format!("'{}'", self.folder.display())
    }
}
