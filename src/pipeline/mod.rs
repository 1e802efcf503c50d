//! Pipeline stages between raw document bytes and a new filename.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. a different OCR engine) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ extract ──▶ lookup ──▶ filename
//!          (render+OCR) (mapping)  (compose)
//! ```
//!
//! 1. [`extract`] — rasterise the identifier page, crop the corner region
//!    and OCR it at escalating densities; runs in `spawn_blocking` because
//!    pdfium and the OCR engine are not async-safe
//! 2. [`ocr`]     — the text-recognition seam and model lifecycle behind
//!    extraction
//! 3. [`filename`] — compose the canonical `{id}_Bảng điểm_{name}.{ext}`
//!    target name
//!
//! Name lookup itself is a plain map probe and lives in [`crate::mapping`].

pub mod extract;
pub mod filename;
pub mod ocr;
