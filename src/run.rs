//! Batch entry points.
//!
//! ## Why one orchestrator for both backends?
//!
//! Local folders and Drive folders present the same shape behind
//! [`DocumentStore`]: list, read bytes, rename. The decision path per
//! document (extract → look up → rename) is therefore written once, and
//! the only behavioural difference between backends — how name collisions
//! are treated — lives inside each store's `rename`.
//!
//! Error discipline follows the two tiers described in [`crate::error`]:
//! per-document problems become [`Outcome`]s in the report, while faults
//! that would hit every document (empty folder, a store that cannot commit
//! a rename) abort the run.

use crate::config::RenameConfig;
use crate::error::RenameError;
use crate::mapping::NameMapping;
use crate::pipeline::extract::IdentifierExtractor;
use crate::pipeline::filename::target_filename;
use crate::report::{BatchReport, DocumentReport, Outcome};
use crate::store::{DocumentHandle, DocumentStore};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Rename every transcript in the store after the student it belongs to.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `store` — Document backend (local folder or Drive folder)
/// * `extractor` — Identifier extraction strategy (OCR in production)
/// * `mapping` — Student ID → full name table
/// * `config` — Run configuration
///
/// # Returns
/// `Ok(BatchReport)` on success, even if some documents could not be
/// resolved (check `report.no_identifier` / `report.no_name_match`).
///
/// # Errors
/// Returns `Err(RenameError)` only for faults that invalidate the whole
/// run:
/// - The store lists no documents at all
/// - Discovery fails (folder unreadable, API rejects the query)
/// - A rename the store should be able to perform fails
pub async fn run(
    store: &dyn DocumentStore,
    extractor: &dyn IdentifierExtractor,
    mapping: &NameMapping,
    config: &RenameConfig,
) -> Result<BatchReport, RenameError> {
    let total_start = Instant::now();

    // ── Step 1: Discover documents ───────────────────────────────────────
    let handles = store.list().await?;
    if handles.is_empty() {
        return Err(RenameError::NoDocuments {
            location: store.location(),
        });
    }
    let total = handles.len();
    info!("found {} documents in {}", total, store.location());

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // ── Step 2: Process documents in order ───────────────────────────────
    // Sequential on purpose: rename order stays deterministic, and the
    // OCR engine saturates the CPU on its own.
    let mut documents = Vec::with_capacity(total);
    for (index, handle) in handles.iter().enumerate() {
        let filename = handle.display_name();
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(index + 1, total, &filename);
        }

        let document_start = Instant::now();
        let outcome = process_document(store, extractor, mapping, handle).await?;
        let duration_ms = document_start.elapsed().as_millis() as u64;

        if let Some(ref cb) = config.progress_callback {
            cb.on_document_complete(index + 1, total, &filename, &outcome);
        }
        documents.push(DocumentReport {
            filename,
            outcome,
            duration_ms,
        });
    }

    // ── Step 3: Summarise ────────────────────────────────────────────────
    let report =
        BatchReport::from_documents(documents, total_start.elapsed().as_millis() as u64);
    info!(
        "run complete: {}/{} renamed, {}ms total",
        report.renamed, report.total, report.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(report.total, report.renamed);
    }

    Ok(report)
}

/// Decide one document's fate.
///
/// Per-document faults (unreadable bytes, no identifier, no mapping entry)
/// resolve to a non-renamed [`Outcome`]. A failed rename stays an error:
/// by that point the document is fully resolved, so the fault is
/// environmental (revoked token, read-only folder) and would hit every
/// following document too.
async fn process_document(
    store: &dyn DocumentStore,
    extractor: &dyn IdentifierExtractor,
    mapping: &NameMapping,
    handle: &DocumentHandle,
) -> Result<Outcome, RenameError> {
    let filename = handle.display_name();

    // ── Step 1: Fetch bytes ──────────────────────────────────────────────
    let bytes = match store.read(handle).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("skipping {filename}: read failed: {e}");
            return Ok(Outcome::NoIdentifier);
        }
    };

    // ── Step 2: Extract the student ID ───────────────────────────────────
    let Some(identifier) = extractor.extract(bytes).await else {
        debug!("{filename}: no identifier found");
        return Ok(Outcome::NoIdentifier);
    };

    // ── Step 3: Resolve the full name ────────────────────────────────────
    let Some(full_name) = mapping.lookup(&identifier) else {
        debug!("{filename}: identifier {identifier} has no mapping entry");
        return Ok(Outcome::NoNameMatch { identifier });
    };

    // ── Step 4: Rename ───────────────────────────────────────────────────
    let target = target_filename(&identifier, full_name, handle.extension());
    let new_name = store.rename(handle, &target).await?;
    info!("{filename} → {new_name}");
    Ok(Outcome::Renamed { new_name })
}

/// Anonymise a folder for sharing: rename every document to its 1-based
/// position in listing order (`1.pdf`, `2.pdf`, …).
///
/// No OCR and no mapping are involved; document content is irrelevant.
/// The same [`DocumentStore`] abstraction applies, so a Drive folder can
/// be scrambled the same way as a local one.
pub async fn scramble(
    store: &dyn DocumentStore,
    config: &RenameConfig,
) -> Result<BatchReport, RenameError> {
    let total_start = Instant::now();

    let handles = store.list().await?;
    if handles.is_empty() {
        return Err(RenameError::NoDocuments {
            location: store.location(),
        });
    }
    let total = handles.len();
    info!("scrambling {} documents in {}", total, store.location());

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut documents = Vec::with_capacity(total);
    for (index, handle) in handles.iter().enumerate() {
        let filename = handle.display_name();
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(index + 1, total, &filename);
        }

        let document_start = Instant::now();
        let target = format!("{}.{}", index + 1, handle.extension());
        let new_name = store.rename(handle, &target).await?;
        let outcome = Outcome::Renamed { new_name };
        let duration_ms = document_start.elapsed().as_millis() as u64;

        if let Some(ref cb) = config.progress_callback {
            cb.on_document_complete(index + 1, total, &filename, &outcome);
        }
        documents.push(DocumentReport {
            filename,
            outcome,
            duration_ms,
        });
    }

    let report =
        BatchReport::from_documents(documents, total_start.elapsed().as_millis() as u64);
    info!("scramble complete: {} documents", report.total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(report.total, report.renamed);
    }

    Ok(report)
}
