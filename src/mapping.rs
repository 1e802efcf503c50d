//! The identifier→name mapping and its two loaders.
//!
//! The pipeline itself only ever performs keyed lookups against a finished
//! [`NameMapping`]; building it happens once, up front, from one of two
//! sources:
//!
//! * a local `.xlsx` workbook with named identifier/name columns
//!   ([`load_workbook_mapping`]), used alongside the local backend, or
//! * an HTTP endpoint answering a JSON array of row objects
//!   ([`fetch_endpoint_mapping`]), used alongside the Drive backend.
//!
//! Both sources routinely store the 7-digit identifier as a *number* (Excel
//! coerces digit strings, and so do many spreadsheet-to-JSON bridges), so
//! numeric values are rendered back to their digit string without a trailing
//! `.0` before they become keys.

use crate::error::MappingError;
use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Immutable identifier→full-name association, read-only for the run.
///
/// May legitimately be empty: every extracted identifier then reports as
/// [`crate::Outcome::NoNameMatch`].
#[derive(Debug, Clone, Default)]
pub struct NameMapping {
    entries: HashMap<String, String>,
}

impl NameMapping {
    /// Build a mapping from `(identifier, name)` pairs. Later pairs win on
    /// duplicate identifiers, matching how both loaders behave.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up the full name for an identifier.
    pub fn lookup(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load the mapping from an `.xlsx` workbook.
///
/// The first row of `sheet` is the header; `id_column` and `name_column` are
/// matched against trimmed header cells. Rows with an empty identifier or
/// name cell are skipped. An empty (but well-formed) sheet yields an empty
/// mapping, which is not an error.
pub fn load_workbook_mapping(
    path: impl AsRef<Path>,
    sheet: &str,
    id_column: &str,
    name_column: &str,
) -> Result<NameMapping, MappingError> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: XlsxError| MappingError::Workbook {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(MappingError::SheetNotFound {
            sheet: sheet.to_string(),
        });
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| MappingError::Workbook {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let mut rows = range.rows();
    let header = rows.next().unwrap_or(&[]);
    let column_index = |column: &str| -> Result<usize, MappingError> {
        header
            .iter()
            .position(|cell| cell.to_string().trim() == column)
            .ok_or_else(|| MappingError::MissingColumn {
                column: column.to_string(),
            })
    };
    let id_index = column_index(id_column)?;
    let name_index = column_index(name_column)?;

    let mut entries = Vec::new();
    for row in rows {
        let id = row.get(id_index).and_then(cell_text);
        let name = row.get(name_index).and_then(cell_text);
        if let (Some(id), Some(name)) = (id, name) {
            entries.push((id, name));
        }
    }
    if entries.is_empty() {
        warn!(path = %path.display(), sheet, "workbook produced an empty mapping");
    }

    let mapping = NameMapping::from_entries(entries);
    debug!(path = %path.display(), sheet, entries = mapping.len(), "loaded workbook mapping");
    Ok(mapping)
}

/// Fetch the mapping from an HTTP endpoint answering a JSON array of row
/// objects, e.g. `[{"student_id": 2410001, "full_name": "Nguyễn Văn A"}, …]`.
///
/// An empty array is fatal ([`MappingError::Empty`]): the endpoint is the
/// sole source of truth in online mode and an empty answer means it is
/// misconfigured. A field absent from every row is fatal too
/// ([`MappingError::MissingField`]); rows missing just one value are skipped.
pub async fn fetch_endpoint_mapping(
    url: &str,
    id_field: &str,
    name_field: &str,
    timeout_secs: u64,
) -> Result<NameMapping, MappingError> {
    let http_error = |detail: String| MappingError::Http {
        url: url.to_string(),
        detail,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| http_error(e.to_string()))?;
    let payload: Value = client
        .get(url)
        .send()
        .await
        .map_err(|e| http_error(e.to_string()))?
        .error_for_status()
        .map_err(|e| http_error(e.to_string()))?
        .json()
        .await
        .map_err(|e| http_error(e.to_string()))?;

    let mapping = mapping_from_payload(&payload, id_field, name_field)?;
    debug!(url, entries = mapping.len(), "fetched endpoint mapping");
    Ok(mapping)
}

/// Reduce a JSON payload to the mapping. Split from the HTTP call so the
/// shape handling is testable without a server.
fn mapping_from_payload(
    payload: &Value,
    id_field: &str,
    name_field: &str,
) -> Result<NameMapping, MappingError> {
    let rows = payload.as_array().ok_or_else(|| MappingError::InvalidPayload {
        detail: format!("expected a JSON array, got {}", json_kind(payload)),
    })?;
    if rows.is_empty() {
        return Err(MappingError::Empty);
    }

    let mut entries = Vec::new();
    let mut saw_id_field = false;
    let mut saw_name_field = false;
    for (index, row) in rows.iter().enumerate() {
        let object = row.as_object().ok_or_else(|| MappingError::InvalidPayload {
            detail: format!("row {index} is {}, not an object", json_kind(row)),
        })?;
        let id_value = object.get(id_field);
        let name_value = object.get(name_field);
        saw_id_field |= id_value.is_some();
        saw_name_field |= name_value.is_some();
        let id = id_value.and_then(value_text);
        let name = name_value.and_then(value_text);
        if let (Some(id), Some(name)) = (id, name) {
            entries.push((id, name));
        }
    }

    if !saw_id_field {
        return Err(MappingError::MissingField {
            field: id_field.to_string(),
        });
    }
    if !saw_name_field {
        return Err(MappingError::MissingField {
            field: name_field.to_string(),
        });
    }
    Ok(NameMapping::from_entries(entries))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render a spreadsheet cell as mapping text. Numeric cells come back as
/// digit strings (`2410001.0` → `"2410001"`); empty and error cells are
/// `None`.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some((*f as i64).to_string())
        }
        Data::Float(f) => Some(f.to_string()),
        Data::Empty | Data::Error(_) => None,
        other => {
            let text = other.to_string();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

/// Render a JSON field as mapping text, with the same numeric handling as
/// [`cell_text`].
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        (f as i64).to_string()
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        _ => None,
    }
}
