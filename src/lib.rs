//! # transcript-renamer
//!
//! Rename scanned transcript PDFs after the student they belong to.
//!
//! ## Why this crate?
//!
//! Faculty offices receive transcript scans under meaningless names
//! (`Scan0001.pdf`, `IMG_2041.pdf`). Each document carries the student's
//! 7-digit ID printed in the top-left corner of its second page, and the
//! office already keeps an ID → full-name roster. This crate reads the ID
//! straight off the scan with on-device OCR (no cloud API, transcripts are
//! personal data) and renames the file to
//! `{id}_Bảng điểm_{full name}.pdf` — the same pipeline whether the
//! documents sit in a local folder or a Google Drive folder.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Discover  list PDFs in the folder (local dir or Drive query)
//!  ├─ 2. Fetch     read document bytes
//!  ├─ 3. Extract   render page 2, crop the ID corner, OCR at 100 then
//!  │               125 DPI until a 7-digit ID appears (spawn_blocking)
//!  ├─ 4. Resolve   look the ID up in the roster (.xlsx or JSON endpoint)
//!  ├─ 5. Rename    commit the new name on the backend
//!  └─ 6. Report    per-document outcome + run totals
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transcript_renamer::{
//!     ensure_models, load_workbook_mapping, run, LocalStore, OcrsRecognizer,
//!     RenameConfig, TranscriptExtractor,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenameConfig::default();
//!
//!     // OCR models auto-download on first run (~12 MB).
//!     let models = ensure_models(None).await?;
//!     let recognizer = Arc::new(OcrsRecognizer::load(&models)?);
//!     let extractor = TranscriptExtractor::new(recognizer, &config);
//!
//!     let mapping = load_workbook_mapping(
//!         "students.xlsx", "Sheet1", "student_id", "full_name",
//!     )?;
//!     let store = LocalStore::new("./transcripts");
//!
//!     let report = run(&store, &extractor, &mapping, &config).await?;
//!     println!("renamed {}/{}", report.renamed, report.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `trename` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! transcript-renamer = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod run;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CropRegion, RenameConfig, RenameConfigBuilder};
pub use error::{MappingError, OcrError, RenameError, StoreError};
pub use mapping::{fetch_endpoint_mapping, load_workbook_mapping, NameMapping};
pub use pipeline::extract::{pdfium_available, IdentifierExtractor, TranscriptExtractor};
pub use pipeline::filename::{target_filename, TRANSCRIPT_LABEL};
pub use pipeline::ocr::{default_model_dir, ensure_models, ModelPaths, OcrsRecognizer, TextRecognizer};
pub use progress::{NoopProgressCallback, ProgressCallback, RenameProgressCallback};
pub use report::{BatchReport, DocumentReport, Outcome};
pub use run::{run, scramble};
pub use store::{DocumentHandle, DocumentStore, DriveStore, LocalStore};
