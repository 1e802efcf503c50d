//! Progress-callback trait for per-document pipeline events.
//!
//! Inject an [`Arc<dyn RenameProgressCallback>`] via
//! [`crate::config::RenameConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline works through the batch.
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal progress bar, a log file, or a GUI without
//! the library knowing how the host application communicates. The pipeline is
//! strictly sequential, so events arrive in document order from a single
//! task; the trait is still `Send + Sync` because the run itself may be
//! spawned onto another Tokio task.
//!
//! # Example
//!
//! ```rust
//! use transcript_renamer::{Outcome, RenameConfig, RenameProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     renamed: AtomicUsize,
//! }
//!
//! impl RenameProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, _index: usize, _total: usize, name: &str, outcome: &Outcome) {
//!         if outcome.is_renamed() {
//!             self.renamed.fetch_add(1, Ordering::SeqCst);
//!         }
//!         eprintln!("{name}: {outcome:?}");
//!     }
//! }
//!
//! let config = RenameConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { renamed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::report::Outcome;
use std::sync::Arc;

/// Called by the pipeline as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RenameProgressCallback: Send + Sync {
    /// Called once after discovery, before any document is read.
    ///
    /// # Arguments
    /// * `total` — number of documents that will be processed
    fn on_run_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a document is read and OCR'd.
    ///
    /// # Arguments
    /// * `index`    — 1-indexed position in the batch
    /// * `total`    — total documents in the batch
    /// * `filename` — the document's current display name
    fn on_document_start(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a document reaches its terminal outcome.
    ///
    /// # Arguments
    /// * `index`    — 1-indexed position in the batch
    /// * `total`    — total documents in the batch
    /// * `filename` — the document's display name at the start of processing
    /// * `outcome`  — the terminal classification for this document
    fn on_document_complete(&self, index: usize, total: usize, filename: &str, outcome: &Outcome) {
        let _ = (index, total, filename, outcome);
    }

    /// Called once after every document has been attempted.
    ///
    /// # Arguments
    /// * `total`   — total documents in the batch
    /// * `renamed` — documents that reached [`Outcome::Renamed`]
    fn on_run_complete(&self, total: usize, renamed: usize) {
        let _ = (total, renamed);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl RenameProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenameConfig`].
pub type ProgressCallback = Arc<dyn RenameProgressCallback>;
