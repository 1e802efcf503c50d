//! Text recognition over rasters.
//!
//! OCR runs fully in-process on the ocrs engine (rten runtime, CPU only), so
//! the tool works offline once the two `.rten` models are on disk. Models
//! auto-download on first run to a per-user data dir — about 12 MB total —
//! and are written via a `.part` file so an interrupted download never leaves
//! a truncated model to poison later runs.
//!
//! The [`TextRecognizer`] trait seams the engine out of the extraction
//! logic: the resolution-escalation path is tested with scripted fakes, and
//! the engine itself is constructed exactly once at startup and shared
//! read-only across every extraction call.

use crate::error::OcrError;
use image::GrayImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

const DETECTION_MODEL_FILE: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILE: &str = "text-recognition.rten";

/// Recognize text in an 8-bit grayscale raster.
///
/// Returned text has the detected lines joined with `\n`, ready for the
/// digit-run scan.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, raster: &GrayImage) -> Result<String, OcrError>;
}

/// Resolved on-disk locations of the detection and recognition models.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

/// Production [`TextRecognizer`] backed by [`ocrs::OcrEngine`].
///
/// The engine is immutable after construction and its methods take `&self`,
/// so one instance is shared via `Arc` across the whole run.
pub struct OcrsRecognizer {
    engine: ocrs::OcrEngine,
}

impl OcrsRecognizer {
    /// Build the engine from the two model files.
    pub fn load(paths: &ModelPaths) -> Result<Self, OcrError> {
        let detection_model =
            rten::Model::load_file(&paths.detection).map_err(|e| OcrError::ModelLoad {
                path: paths.detection.clone(),
                detail: e.to_string(),
            })?;
        let recognition_model =
            rten::Model::load_file(&paths.recognition).map_err(|e| OcrError::ModelLoad {
                path: paths.recognition.clone(),
                detail: e.to_string(),
            })?;

        let engine = ocrs::OcrEngine::new(ocrs::OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| OcrError::EngineInit(e.to_string()))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, raster: &GrayImage) -> Result<String, OcrError> {
        let (width, height) = raster.dimensions();
        // One byte per pixel: the raster arrives already grayscale, and ocrs
        // infers the channel count from the buffer length.
        let source = ocrs::ImageSource::from_bytes(raster.as_raw(), (width, height))
            .map_err(|e| OcrError::Recognition(format!("image conversion failed: {e}")))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| OcrError::Recognition(format!("input preparation failed: {e}")))?;
        self.engine
            .get_text(&input)
            .map_err(|e| OcrError::Recognition(format!("text extraction failed: {e}")))
    }
}

/// Per-user directory the models are kept in when no override is given.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trename")
        .join("models")
}

/// Make sure both model files exist under `dir` (or the default dir),
/// downloading whichever is missing. Returns the resolved paths.
pub async fn ensure_models(dir: Option<&Path>) -> Result<ModelPaths, OcrError> {
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(default_model_dir);
    tokio::fs::create_dir_all(&dir).await?;

    let detection = dir.join(DETECTION_MODEL_FILE);
    let recognition = dir.join(RECOGNITION_MODEL_FILE);
    download_if_missing(&detection, DETECTION_MODEL_URL).await?;
    download_if_missing(&recognition, RECOGNITION_MODEL_URL).await?;

    Ok(ModelPaths {
        detection,
        recognition,
    })
}

async fn download_if_missing(path: &Path, url: &str) -> Result<(), OcrError> {
    if tokio::fs::try_exists(path).await? {
        debug!(path = %path.display(), "model already present");
        return Ok(());
    }

    let download_error = |reason: String| OcrError::ModelDownload {
        url: url.to_string(),
        reason,
    };

    info!(url, path = %path.display(), "downloading OCR model");
    let response = reqwest::get(url)
        .await
        .map_err(|e| download_error(e.to_string()))?;
    if !response.status().is_success() {
        return Err(download_error(format!("HTTP {}", response.status())));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| download_error(e.to_string()))?;

    // Stage next to the final path so the rename stays on one filesystem.
    let staged = path.with_extension("rten.part");
    tokio::fs::write(&staged, &bytes).await?;
    tokio::fs::rename(&staged, path).await?;
    info!(path = %path.display(), size = bytes.len(), "model downloaded");
    Ok(())
}
