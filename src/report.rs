//! Outcome classification and end-of-run reporting.
//!
//! Every document ends in exactly one [`Outcome`]. The orchestrator collects
//! one [`DocumentReport`] per document into a [`BatchReport`], which callers
//! use for the end-of-run summary (and which serialises to JSON for
//! machine-readable output).
//!
//! Failures here are data, not errors: a document with no readable identifier
//! is an expected, reportable result of the run, and must never abort the
//! batch.

use serde::{Deserialize, Serialize};

/// Terminal classification of one document's processing attempt.
///
/// Exhaustive and mutually exclusive: extraction either finds an identifier
/// or not; a found identifier either resolves to a name or not; a resolved
/// name leads to the rename. Transport faults while *reading* a document are
/// folded into [`Outcome::NoIdentifier`] (nothing could be extracted);
/// transport faults while *renaming* are fatal and never reach a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The document was renamed; `new_name` is the final name on the backend
    /// (including any collision suffix a local store appended).
    Renamed { new_name: String },
    /// No 7-digit identifier could be extracted at any resolution, or the
    /// document could not be opened/read at all.
    NoIdentifier,
    /// An identifier was extracted but the mapping has no entry for it.
    NoNameMatch { identifier: String },
}

impl Outcome {
    /// True for [`Outcome::Renamed`].
    pub fn is_renamed(&self) -> bool {
        matches!(self, Outcome::Renamed { .. })
    }
}

/// One document's journey through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Display name the document had when it was discovered.
    pub filename: String,
    /// Terminal classification.
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Wall-clock processing time for this document in milliseconds.
    pub duration_ms: u64,
}

/// Aggregated result of a run, in discovery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Per-document reports, ordered as discovered.
    pub documents: Vec<DocumentReport>,
    /// Number of documents attempted.
    pub total: usize,
    /// Documents that reached [`Outcome::Renamed`].
    pub renamed: usize,
    /// Documents with no extractable identifier (including read faults).
    pub no_identifier: usize,
    /// Documents whose identifier is absent from the mapping.
    pub no_name_match: usize,
    /// Total wall-clock time for the run in milliseconds.
    pub total_duration_ms: u64,
}

impl BatchReport {
    /// Aggregate per-document reports into run totals.
    pub fn from_documents(documents: Vec<DocumentReport>, total_duration_ms: u64) -> Self {
        let total = documents.len();
        let renamed = documents.iter().filter(|d| d.outcome.is_renamed()).count();
        let no_identifier = documents
            .iter()
            .filter(|d| matches!(d.outcome, Outcome::NoIdentifier))
            .count();
        let no_name_match = documents
            .iter()
            .filter(|d| matches!(d.outcome, Outcome::NoNameMatch { .. }))
            .count();
        Self {
            documents,
            total,
            renamed,
            no_identifier,
            no_name_match,
            total_duration_ms,
        }
    }

    /// Filenames of documents that yielded no identifier, in batch order.
    pub fn no_identifier_files(&self) -> impl Iterator<Item = &str> {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, Outcome::NoIdentifier))
            .map(|d| d.filename.as_str())
    }

    /// `(identifier, filename)` pairs for documents whose identifier had no
    /// mapping entry, in batch order.
    pub fn unmatched_identifiers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents.iter().filter_map(|d| match &d.outcome {
            Outcome::NoNameMatch { identifier } => Some((identifier.as_str(), d.filename.as_str())),
            _ => None,
        })
    }

    /// True when every document was renamed.
    pub fn is_clean(&self) -> bool {
        self.renamed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(filename: &str, outcome: Outcome) -> DocumentReport {
        DocumentReport {
            filename: filename.into(),
            outcome,
            duration_ms: 10,
        }
    }

    #[test]
    fn counts_partition_the_batch() {
        let batch = BatchReport::from_documents(
            vec![
                report(
                    "a.pdf",
                    Outcome::Renamed {
                        new_name: "2410001_Bảng điểm_A.pdf".into(),
                    },
                ),
                report("b.pdf", Outcome::NoIdentifier),
                report(
                    "c.pdf",
                    Outcome::NoNameMatch {
                        identifier: "2410003".into(),
                    },
                ),
                report("d.pdf", Outcome::NoIdentifier),
            ],
            40,
        );
        assert_eq!(batch.total, 4);
        assert_eq!(batch.renamed, 1);
        assert_eq!(batch.no_identifier, 2);
        assert_eq!(batch.no_name_match, 1);
        assert_eq!(batch.renamed + batch.no_identifier + batch.no_name_match, batch.total);
        assert!(!batch.is_clean());
    }

    #[test]
    fn failure_listings_preserve_batch_order() {
        let batch = BatchReport::from_documents(
            vec![
                report("z.pdf", Outcome::NoIdentifier),
                report(
                    "m.pdf",
                    Outcome::NoNameMatch {
                        identifier: "1234567".into(),
                    },
                ),
                report("a.pdf", Outcome::NoIdentifier),
            ],
            5,
        );
        let no_id: Vec<&str> = batch.no_identifier_files().collect();
        assert_eq!(no_id, vec!["z.pdf", "a.pdf"]);
        let unmatched: Vec<(&str, &str)> = batch.unmatched_identifiers().collect();
        assert_eq!(unmatched, vec![("1234567", "m.pdf")]);
    }

    #[test]
    fn empty_batch_is_clean() {
        let batch = BatchReport::from_documents(vec![], 0);
        assert_eq!(batch.total, 0);
        assert!(batch.is_clean());
    }

    #[test]
    fn report_round_trips_through_json() {
        let batch = BatchReport::from_documents(
            vec![report(
                "scan.pdf",
                Outcome::Renamed {
                    new_name: "2410001_Bảng điểm_Nguyễn Văn A.pdf".into(),
                },
            )],
            123,
        );
        let json = serde_json::to_string(&batch).unwrap();
        let back: BatchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total, 1);
        assert_eq!(back.renamed, 1);
        assert!(json.contains("Nguyễn Văn A"));
    }
}
