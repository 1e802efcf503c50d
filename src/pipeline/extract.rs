//! Student-ID extraction from transcript documents.
//!
//! ## How a document is read
//!
//! 1. Open the PDF from bytes (never from a path, so Drive and local
//!    documents take the identical route).
//! 2. Render the second page and crop the top-left corner — the region the
//!    faculty template prints the student ID into.
//! 3. OCR the crop at the lowest density first and climb the ladder only
//!    when no ID is found. Low-DPI passes are markedly cheaper and resolve
//!    most clean scans, so escalation is the exception.
//! 4. Scan the recognized text for the first seven consecutive ASCII
//!    digits.
//!
//! Every failure inside a document (unreadable PDF, missing page, OCR
//! error) degrades to "no identifier" rather than an error: one bad scan
//! must not abort a 200-document batch.
//!
//! Rendering and recognition are CPU-bound, so the whole per-document path
//! runs under [`tokio::task::spawn_blocking`].

use crate::config::{CropRegion, RenameConfig};
use crate::error::RenameError;
use crate::pipeline::ocr::TextRecognizer;
use async_trait::async_trait;
use image::GrayImage;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Student IDs are exactly seven digits.
pub const IDENTIFIER_LEN: usize = 7;

// ASCII-only on purpose: OCR noise can contain Unicode digits, which are
// never part of a student ID.
static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[0-9]{7}").expect("valid digit pattern"));

/// Pull a student identifier out of raw document bytes.
///
/// `None` means the document stays untouched; implementations must not fail
/// the batch for a single unreadable document.
#[async_trait]
pub trait IdentifierExtractor: Send + Sync {
    async fn extract(&self, bytes: Vec<u8>) -> Option<String>;
}

/// Production extractor: pdfium render + corner crop + OCR ladder.
pub struct TranscriptExtractor {
    recognizer: Arc<dyn TextRecognizer>,
    page_index: usize,
    roi: CropRegion,
    dpi_steps: Vec<u32>,
}

impl TranscriptExtractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, config: &RenameConfig) -> Self {
        Self {
            recognizer,
            page_index: config.page_index,
            roi: config.roi,
            dpi_steps: config.dpi_steps.clone(),
        }
    }
}

#[async_trait]
impl IdentifierExtractor for TranscriptExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Option<String> {
        let recognizer = Arc::clone(&self.recognizer);
        let page_index = self.page_index;
        let roi = self.roi;
        let dpi_steps = self.dpi_steps.clone();

        let handle = tokio::task::spawn_blocking(move || {
            extract_blocking(recognizer.as_ref(), bytes, page_index, roi, &dpi_steps)
        });
        match handle.await {
            Ok(identifier) => identifier,
            Err(e) => {
                warn!("extraction task failed: {e}");
                None
            }
        }
    }
}

/// Probe for a usable pdfium library.
///
/// Run this once at startup: a missing library would otherwise surface as a
/// silent `NoIdentifier` on every document, which looks like an OCR problem
/// instead of a setup problem.
pub fn pdfium_available() -> Result<(), RenameError> {
    bind_pdfium()
        .map(|_| ())
        .map_err(|e| RenameError::PdfiumBindingFailed(format!("{e:?}")))
}

fn bind_pdfium() -> Result<Pdfium, PdfiumError> {
    // Resolution order: explicit override, current directory, system paths.
    let override_dir = std::env::var("TRENAME_PDFIUM_PATH").unwrap_or_else(|_| "./".to_string());
    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&override_dir))
            .or_else(|_| Pdfium::bind_to_system_library())?;
    Ok(Pdfium::new(bindings))
}

fn extract_blocking(
    recognizer: &dyn TextRecognizer,
    bytes: Vec<u8>,
    page_index: usize,
    roi: CropRegion,
    dpi_steps: &[u32],
) -> Option<String> {
    let pdfium = match bind_pdfium() {
        Ok(pdfium) => pdfium,
        Err(e) => {
            warn!("pdfium unavailable: {e:?}");
            return None;
        }
    };

    let document = match pdfium.load_pdf_from_byte_vec(bytes, None) {
        Ok(document) => document,
        Err(e) => {
            debug!("document failed to open: {e:?}");
            return None;
        }
    };

    let pages = document.pages();
    if page_index >= pages.len() as usize {
        debug!(
            page_index,
            total = pages.len(),
            "document too short for identifier page"
        );
        return None;
    }
    let page = match pages.get(page_index as u16) {
        Ok(page) => page,
        Err(e) => {
            debug!(page_index, "page failed to load: {e:?}");
            return None;
        }
    };

    scan_resolutions(recognizer, dpi_steps, |dpi| render_crop(&page, roi, dpi))
}

/// Walk the DPI ladder until a pass yields an identifier.
///
/// Render or recognition failures at one density fall through to the next;
/// the ladder is exhausted before giving up on the document.
fn scan_resolutions(
    recognizer: &dyn TextRecognizer,
    dpi_steps: &[u32],
    mut render: impl FnMut(u32) -> Option<GrayImage>,
) -> Option<String> {
    for &dpi in dpi_steps {
        let Some(raster) = render(dpi) else {
            continue;
        };
        let text = match recognizer.recognize(&raster) {
            Ok(text) => text,
            Err(e) => {
                debug!(dpi, "recognition failed: {e}");
                continue;
            }
        };
        debug!(dpi, chars = text.len(), "OCR pass finished");
        if let Some(identifier) = find_identifier(&text) {
            debug!(dpi, identifier, "identifier found");
            return Some(identifier.to_string());
        }
    }
    None
}

/// Render one page at `dpi` and crop it to the identifier region, as 8-bit
/// grayscale.
fn render_crop(page: &PdfPage<'_>, roi: CropRegion, dpi: u32) -> Option<GrayImage> {
    // pdfium's native unit is points (1/72 inch), so the scale factor maps
    // point space to the requested density.
    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
    let bitmap = match page.render_with_config(&render_config) {
        Ok(bitmap) => bitmap,
        Err(e) => {
            debug!(dpi, "render failed: {e:?}");
            return None;
        }
    };
    let image = bitmap.as_image();
    let (x, y, width, height) = roi.to_pixel_rect(image.width(), image.height());
    Some(image.crop_imm(x, y, width, height).to_luma8())
}

/// First window of [`IDENTIFIER_LEN`] consecutive ASCII digits, scanning
/// left to right.
///
/// A longer digit run contributes its leading seven digits, so an ID with a
/// stray OCR digit glued onto it still resolves.
pub fn find_identifier(text: &str) -> Option<&str> {
    IDENTIFIER_PATTERN.find(text).map(|m| m.as_str())
}
