//! Integration tests for the rename pipeline over in-memory fakes.
//!
//! The production extractor needs pdfium and the OCR models on disk; these
//! tests swap the extractor and the store for scripted fakes so the decision
//! path — fetch → extract → look up → rename — and its edge cases run
//! everywhere, in milliseconds, with no external setup.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use transcript_renamer::{
    run, scramble, DocumentHandle, DocumentStore, IdentifierExtractor, NameMapping, Outcome,
    RenameConfig, RenameError, RenameProgressCallback, StoreError,
};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// In-memory store: scripted documents, a rename log, optional read and
/// rename failures.
struct FakeStore {
    documents: Vec<(String, Vec<u8>)>,
    unreadable: Vec<String>,
    fail_renames: bool,
    renames: Mutex<Vec<(String, String)>>,
}

impl FakeStore {
    fn new(documents: &[(&str, &[u8])]) -> Self {
        Self {
            documents: documents
                .iter()
                .map(|(title, bytes)| (title.to_string(), bytes.to_vec()))
                .collect(),
            unreadable: Vec::new(),
            fail_renames: false,
            renames: Mutex::new(Vec::new()),
        }
    }

    fn with_unreadable(mut self, title: &str) -> Self {
        self.unreadable.push(title.to_string());
        self
    }

    fn with_failing_renames(mut self) -> Self {
        self.fail_renames = true;
        self
    }

    /// `(old title, applied name)` pairs, in call order.
    fn rename_log(&self) -> Vec<(String, String)> {
        self.renames.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn list(&self) -> Result<Vec<DocumentHandle>, StoreError> {
        Ok(self
            .documents
            .iter()
            .enumerate()
            .map(|(i, (title, _))| DocumentHandle::Remote {
                id: format!("doc-{i}"),
                title: title.clone(),
            })
            .collect())
    }

    async fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>, StoreError> {
        let title = handle.display_name();
        if self.unreadable.contains(&title) {
            return Err(StoreError::Api {
                context: format!("downloading '{title}'"),
                status: 403,
                detail: "insufficient permissions".into(),
            });
        }
        Ok(self
            .documents
            .iter()
            .find(|(t, _)| *t == title)
            .map(|(_, bytes)| bytes.clone())
            .unwrap_or_default())
    }

    async fn rename(
        &self,
        handle: &DocumentHandle,
        target_name: &str,
    ) -> Result<String, StoreError> {
        if self.fail_renames {
            return Err(StoreError::Api {
                context: format!("renaming '{}'", handle.display_name()),
                status: 403,
                detail: "folder is read-only".into(),
            });
        }
        self.renames
            .lock()
            .unwrap()
            .push((handle.display_name(), target_name.to_string()));
        Ok(target_name.to_string())
    }

    fn location(&self) -> String {
        "fake store".to_string()
    }
}

/// Extractor keyed on document bytes; no rendering or OCR involved.
struct FakeExtractor {
    by_bytes: HashMap<Vec<u8>, String>,
}

impl FakeExtractor {
    fn new(entries: &[(&[u8], &str)]) -> Self {
        Self {
            by_bytes: entries
                .iter()
                .map(|(bytes, id)| (bytes.to_vec(), id.to_string()))
                .collect(),
        }
    }

    fn finds_nothing() -> Self {
        Self {
            by_bytes: HashMap::new(),
        }
    }
}

#[async_trait]
impl IdentifierExtractor for FakeExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Option<String> {
        self.by_bytes.get(&bytes).cloned()
    }
}

fn roster(entries: &[(&str, &str)]) -> NameMapping {
    NameMapping::from_entries(
        entries
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string())),
    )
}

// ── Rename runs ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolved_document_gets_the_canonical_name() {
    let store = FakeStore::new(&[("Scan0001.pdf", b"doc-a")]);
    let extractor = FakeExtractor::new(&[(b"doc-a", "2410001")]);
    let mapping = roster(&[("2410001", "Nguyễn Văn A")]);
    let config = RenameConfig::default();

    let report = run(&store, &extractor, &mapping, &config).await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.renamed, 1);
    assert!(report.is_clean());
    assert_eq!(
        store.rename_log(),
        vec![(
            "Scan0001.pdf".to_string(),
            "2410001_Bảng điểm_Nguyễn Văn A.pdf".to_string()
        )]
    );
    assert_eq!(
        report.documents[0].outcome,
        Outcome::Renamed {
            new_name: "2410001_Bảng điểm_Nguyễn Văn A.pdf".into()
        }
    );
}

#[tokio::test]
async fn extension_of_the_source_document_is_kept() {
    let store = FakeStore::new(&[("scan.PDF", b"doc-a")]);
    let extractor = FakeExtractor::new(&[(b"doc-a", "2410001")]);
    let mapping = roster(&[("2410001", "Student A")]);

    let report = run(&store, &extractor, &mapping, &RenameConfig::default())
        .await
        .unwrap();

    assert_eq!(report.renamed, 1);
    assert_eq!(
        store.rename_log()[0].1,
        "2410001_Bảng điểm_Student A.PDF"
    );
}

#[tokio::test]
async fn unknown_identifier_leaves_the_document_alone() {
    let store = FakeStore::new(&[("Scan0001.pdf", b"doc-a")]);
    let extractor = FakeExtractor::new(&[(b"doc-a", "2410001")]);
    // Empty roster: every extracted ID misses.
    let mapping = roster(&[]);

    let report = run(&store, &extractor, &mapping, &RenameConfig::default())
        .await
        .unwrap();

    assert_eq!(report.renamed, 0);
    assert_eq!(report.no_name_match, 1);
    assert!(store.rename_log().is_empty(), "rename must not be called");
    assert_eq!(
        report.documents[0].outcome,
        Outcome::NoNameMatch {
            identifier: "2410001".into()
        }
    );
}

#[tokio::test]
async fn missing_identifier_is_reported_not_fatal() {
    let store = FakeStore::new(&[("blurry.pdf", b"doc-a")]);
    let extractor = FakeExtractor::finds_nothing();
    let mapping = roster(&[("2410001", "Student A")]);

    let report = run(&store, &extractor, &mapping, &RenameConfig::default())
        .await
        .unwrap();

    assert_eq!(report.no_identifier, 1);
    assert!(store.rename_log().is_empty());
    assert_eq!(report.documents[0].outcome, Outcome::NoIdentifier);
}

#[tokio::test]
async fn unreadable_document_is_skipped_and_the_batch_continues() {
    let store = FakeStore::new(&[("locked.pdf", b"doc-a"), ("fine.pdf", b"doc-b")])
        .with_unreadable("locked.pdf");
    let extractor = FakeExtractor::new(&[(b"doc-b", "3920044")]);
    let mapping = roster(&[("3920044", "Trần Thị B")]);

    let report = run(&store, &extractor, &mapping, &RenameConfig::default())
        .await
        .unwrap();

    // The unreadable document degrades to "no identifier"; the next one is
    // still processed and renamed.
    assert_eq!(report.total, 2);
    assert_eq!(report.no_identifier, 1);
    assert_eq!(report.renamed, 1);
    assert_eq!(report.documents[0].filename, "locked.pdf");
    assert_eq!(report.documents[0].outcome, Outcome::NoIdentifier);
    assert_eq!(
        store.rename_log(),
        vec![(
            "fine.pdf".to_string(),
            "3920044_Bảng điểm_Trần Thị B.pdf".to_string()
        )]
    );
}

#[tokio::test]
async fn mixed_batch_partitions_into_the_three_outcomes() {
    let store = FakeStore::new(&[
        ("a.pdf", b"bytes-a"),
        ("b.pdf", b"bytes-b"),
        ("c.pdf", b"bytes-c"),
    ]);
    let extractor = FakeExtractor::new(&[(b"bytes-a", "2410001"), (b"bytes-c", "9999999")]);
    let mapping = roster(&[("2410001", "Student A")]);

    let report = run(&store, &extractor, &mapping, &RenameConfig::default())
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.renamed, 1);
    assert_eq!(report.no_identifier, 1);
    assert_eq!(report.no_name_match, 1);

    // Discovery order is preserved in the report.
    let filenames: Vec<&str> = report.documents.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(filenames, vec!["a.pdf", "b.pdf", "c.pdf"]);

    let unmatched: Vec<(&str, &str)> = report.unmatched_identifiers().collect();
    assert_eq!(unmatched, vec![("9999999", "c.pdf")]);
}

#[tokio::test]
async fn empty_store_aborts_the_run() {
    let store = FakeStore::new(&[]);
    let extractor = FakeExtractor::finds_nothing();
    let mapping = roster(&[]);

    let err = run(&store, &extractor, &mapping, &RenameConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RenameError::NoDocuments { .. }));
    assert!(err.to_string().contains("fake store"));
}

#[tokio::test]
async fn failed_rename_is_fatal() {
    // At rename time the document is fully resolved, so a store fault is
    // environmental and must abort instead of burning through the batch.
    let store = FakeStore::new(&[("a.pdf", b"bytes-a")]).with_failing_renames();
    let extractor = FakeExtractor::new(&[(b"bytes-a", "2410001")]);
    let mapping = roster(&[("2410001", "Student A")]);

    let err = run(&store, &extractor, &mapping, &RenameConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RenameError::Store(_)));
}

// ── Progress events ──────────────────────────────────────────────────────────

struct CountingCallback {
    run_total: AtomicUsize,
    starts: AtomicUsize,
    completes: AtomicUsize,
    final_renamed: AtomicUsize,
}

impl RenameProgressCallback for CountingCallback {
    fn on_run_start(&self, total: usize) {
        self.run_total.store(total, Ordering::SeqCst);
    }
    fn on_document_start(&self, _index: usize, _total: usize, _filename: &str) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }
    fn on_document_complete(
        &self,
        _index: usize,
        _total: usize,
        _filename: &str,
        _outcome: &Outcome,
    ) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }
    fn on_run_complete(&self, _total: usize, renamed: usize) {
        self.final_renamed.store(renamed, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callback_sees_every_document() {
    let store = FakeStore::new(&[("a.pdf", b"bytes-a"), ("b.pdf", b"bytes-b")]);
    let extractor = FakeExtractor::new(&[(b"bytes-a", "2410001")]);
    let mapping = roster(&[("2410001", "Student A")]);

    let callback = Arc::new(CountingCallback {
        run_total: AtomicUsize::new(0),
        starts: AtomicUsize::new(0),
        completes: AtomicUsize::new(0),
        final_renamed: AtomicUsize::new(usize::MAX),
    });
    let config = RenameConfig::builder()
        .progress_callback(Arc::clone(&callback) as Arc<dyn RenameProgressCallback>)
        .build()
        .unwrap();

    let report = run(&store, &extractor, &mapping, &config).await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(callback.run_total.load(Ordering::SeqCst), 2);
    assert_eq!(callback.starts.load(Ordering::SeqCst), 2);
    assert_eq!(callback.completes.load(Ordering::SeqCst), 2);
    assert_eq!(callback.final_renamed.load(Ordering::SeqCst), 1);
}

// ── Scramble runs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn scramble_numbers_documents_in_listing_order() {
    let store = FakeStore::new(&[
        ("Nguyễn Văn A.pdf", b"x"),
        ("Trần Thị B.pdf", b"y"),
        ("no-extension", b"z"),
    ]);

    let report = scramble(&store, &RenameConfig::default()).await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.renamed, 3);
    assert!(report.is_clean());
    assert_eq!(
        store.rename_log(),
        vec![
            ("Nguyễn Văn A.pdf".to_string(), "1.pdf".to_string()),
            ("Trần Thị B.pdf".to_string(), "2.pdf".to_string()),
            // Extension falls back to the transcript default.
            ("no-extension".to_string(), "3.pdf".to_string()),
        ]
    );
}

#[tokio::test]
async fn scramble_on_an_empty_store_aborts() {
    let store = FakeStore::new(&[]);
    let err = scramble(&store, &RenameConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RenameError::NoDocuments { .. }));
}
