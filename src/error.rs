//! Error types for the transcript-renamer library.
//!
//! Failure modes split by blast radius:
//!
//! * [`RenameError`] — **Fatal**: the run cannot proceed at all (nothing to
//!   process, a backend transport fault during listing or renaming, invalid
//!   configuration). Returned as `Err(RenameError)` from [`crate::run`] and
//!   [`crate::scramble`].
//!
//! * [`StoreError`] — one backend operation failed. Read-side occurrences are
//!   downgraded by the orchestrator to a per-document [`crate::Outcome`] so a
//!   single unreadable document never aborts the batch; list/rename
//!   occurrences escalate into [`RenameError::Store`].
//!
//! * [`MappingError`] — the identifier→name mapping could not be loaded.
//!   Always fatal, and always before any document is touched.
//!
//! * [`OcrError`] — OCR engine lifecycle. Model download/load failures are
//!   fatal at startup; a recognition failure mid-run is logged and treated as
//!   a no-match for that resolution step only.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the transcript-renamer library.
///
/// Per-document failures are not errors at all: they are classified into
/// [`crate::Outcome`] values and collected in the [`crate::BatchReport`].
#[derive(Debug, Error)]
pub enum RenameError {
    // ── Discovery ─────────────────────────────────────────────────────────
    /// Discovery returned no candidate documents.
    #[error("No PDF documents found in {location}\nCheck the folder/Drive folder id and that the documents end in .pdf.")]
    NoDocuments { location: String },

    // ── Backend transport ─────────────────────────────────────────────────
    /// Listing or renaming failed at the storage backend.
    #[error(transparent)]
    Store(#[from] StoreError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to the pdfium library: {0}\n\n\
Install a prebuilt pdfium (https://github.com/bblanchon/pdfium-binaries) and either:\n\
  • place libpdfium next to the executable or in the working directory,\n\
  • install it system-wide, or\n\
  • set TRENAME_PDFIUM_PATH=/dir/containing/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),
}

/// A fault in one storage-backend operation.
///
/// The orchestrator decides the blast radius: a failed `read` becomes a
/// per-document [`crate::Outcome::NoIdentifier`], while a failed `list` or
/// `rename` aborts the run via [`RenameError::Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Local filesystem fault.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP transport fault (connection, TLS, timeout).
    #[error("network error while {context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote API answered with a non-success status.
    #[error("Drive API returned HTTP {status} while {context}: {detail}")]
    Api {
        context: String,
        status: u16,
        detail: String,
    },

    /// A handle from one backend was passed to the other.
    #[error("document handle does not belong to this {backend} store")]
    UnsupportedHandle { backend: &'static str },
}

/// Failure to load the identifier→name mapping. Always fatal.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The workbook could not be opened or parsed.
    #[error("failed to read workbook '{path}': {detail}\nCheck the path points to a valid .xlsx file.")]
    Workbook { path: PathBuf, detail: String },

    /// The named worksheet does not exist in the workbook.
    #[error("worksheet '{sheet}' not found in the workbook")]
    SheetNotFound { sheet: String },

    /// The header row has no column with the configured name.
    #[error("column '{column}' not found in the header row\nSet --id-column / --name-column to match the spreadsheet.")]
    MissingColumn { column: String },

    /// The mapping endpoint could not be reached or answered non-2xx.
    #[error("failed to fetch mapping from '{url}': {detail}")]
    Http { url: String, detail: String },

    /// The endpoint answered 2xx but the body is not the expected shape.
    #[error("mapping endpoint returned unexpected JSON: {detail}\nExpected an array of objects.")]
    InvalidPayload { detail: String },

    /// No row in the payload carries the configured field.
    #[error("field '{field}' is missing from every row of the mapping payload")]
    MissingField { field: String },

    /// The source parsed fine but produced zero usable entries.
    #[error("mapping source produced no entries")]
    Empty,
}

/// OCR engine lifecycle errors.
#[derive(Debug, Error)]
pub enum OcrError {
    /// A model file could not be downloaded.
    #[error("failed to download OCR model from '{url}': {reason}\nCheck your connection, or point --model-dir at a directory that already contains the .rten models.")]
    ModelDownload { url: String, reason: String },

    /// A model file exists but rten could not load it.
    #[error("failed to load OCR model '{path}': {detail}\nDelete the file to force a fresh download.")]
    ModelLoad { path: PathBuf, detail: String },

    /// The ocrs engine rejected the loaded models.
    #[error("failed to initialise the OCR engine: {0}")]
    EngineInit(String),

    /// Text recognition over one raster failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Filesystem fault while managing model files.
    #[error("I/O error while preparing OCR models: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_documents_display() {
        let e = RenameError::NoDocuments {
            location: "'./scans'".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("./scans"), "got: {msg}");
    }

    #[test]
    fn store_api_display() {
        let e = StoreError::Api {
            context: "renaming file 'abc123'".into(),
            status: 403,
            detail: "insufficient permissions".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("abc123"));
    }

    #[test]
    fn store_error_is_transparent_in_rename_error() {
        let store = StoreError::Api {
            context: "listing folder".into(),
            status: 500,
            detail: "backend".into(),
        };
        let wrapped = RenameError::from(store);
        assert!(wrapped.to_string().contains("HTTP 500"));
    }

    #[test]
    fn missing_column_display() {
        let e = MappingError::MissingColumn {
            column: "MSSV".into(),
        };
        assert!(e.to_string().contains("MSSV"));
        assert!(e.to_string().contains("--id-column"));
    }

    #[test]
    fn model_load_display_names_path() {
        let e = OcrError::ModelLoad {
            path: PathBuf::from("/data/text-detection.rten"),
            detail: "truncated file".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("text-detection.rten"));
        assert!(msg.contains("truncated file"));
    }
}
