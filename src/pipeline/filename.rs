//! Target filename construction.

/// Fixed document-type label between the student ID and the name.
pub const TRANSCRIPT_LABEL: &str = "Bảng điểm";

/// Canonical name for a resolved transcript:
/// `{id}_Bảng điểm_{full name}.{ext}`.
///
/// The full name is inserted verbatim — Vietnamese names keep their
/// diacritics and spaces, since both local filesystems and Drive titles
/// accept them.
pub fn target_filename(identifier: &str, full_name: &str, extension: &str) -> String {
    format!("{identifier}_{TRANSCRIPT_LABEL}_{full_name}.{extension}")
}
