//! OCRS engine implementation
//!
//! Pure Rust OCR backend using the ocrs library. No system dependencies
//! required; downloads neural network models automatically on first use.
//! Latin-script only, so Arabic documents need the leptess backend.

use crate::config::Config;
use crate::engine::{OcrEngine, Recognition};
use crate::error::OcrError;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// Box color for the annotated copy
const LINE_BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// OCR engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: Arc<OcrsOcrEngine>,
    output_dir: PathBuf,
}

impl OcrsEngine {
    /// Create a new engine, downloading models if needed
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        tracing::info!("Initializing ocrs OCR engine...");

        // Load models (will download if not cached)
        let detection_model_path =
            ensure_model_downloaded(DETECTION_MODEL_URL, "text-detection.rten")?;
        let recognition_model_path =
            ensure_model_downloaded(RECOGNITION_MODEL_URL, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self {
            engine: Arc::new(engine),
            output_dir: config.output_dir.clone(),
        })
    }

    /// Save a copy of the input with one hollow box drawn per detected line.
    fn save_annotated(&self, annotated: &RgbImage, source: &Path) -> Result<PathBuf, OcrError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            OcrError::ProcessingError(format!("Failed to create output directory: {}", e))
        })?;

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let out_path = self.output_dir.join(format!("{}-annotated.png", stem));

        annotated.save(&out_path).map_err(|e| {
            OcrError::ProcessingError(format!("Failed to save annotated image: {}", e))
        })?;

        Ok(out_path)
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies, Latin script only"
    }

    fn recognize(&self, path: &Path) -> Result<Recognition, OcrError> {
        // Load the image using the image crate
        let img = image::open(path)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to load image: {}", e)))?;

        // Convert to RGB8 (HWC format, which is what ImageSource::from_bytes expects)
        let rgb_img = img.into_rgb8();
        let dimensions = rgb_img.dimensions();
        let mut annotated = rgb_img.clone();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::ProcessingError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to prepare input: {}", e)))?;

        // Detect words, group them into lines, recognize each line
        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;

        let lines: Vec<String> = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        // Draw the detected line boxes onto a copy of the input
        let (img_w, img_h) = dimensions;
        for words in &line_rects {
            let mut min_x = f32::MAX;
            let mut min_y = f32::MAX;
            let mut max_x = f32::MIN;
            let mut max_y = f32::MIN;
            for word in words {
                for corner in word.corners() {
                    min_x = min_x.min(corner.x);
                    min_y = min_y.min(corner.y);
                    max_x = max_x.max(corner.x);
                    max_y = max_y.max(corner.y);
                }
            }
            if min_x >= max_x || min_y >= max_y {
                continue;
            }
            let x = min_x.clamp(0.0, img_w.saturating_sub(1) as f32) as i32;
            let y = min_y.clamp(0.0, img_h.saturating_sub(1) as f32) as i32;
            let w = (max_x.min(img_w as f32) - x as f32).max(1.0) as u32;
            let h = (max_y.min(img_h as f32) - y as f32).max(1.0) as u32;
            draw_hollow_rect_mut(&mut annotated, Rect::at(x, y).of_size(w, h), LINE_BOX_COLOR);
        }

        let annotated_path = self.save_annotated(&annotated, path)?;

        tracing::debug!(
            "ocrs recognized {} lines, annotated copy at {:?}",
            lines.len(),
            annotated_path
        );

        Ok(Recognition {
            lines,
            annotated_image: Some(annotated_path),
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec![
            "image/png".to_string(),
            "image/jpeg".to_string(),
            "image/gif".to_string(),
            "image/bmp".to_string(),
            "image/webp".to_string(),
            "image/tiff".to_string(),
        ]
    }

    fn supported_languages(&self) -> Vec<String> {
        // ocrs currently only supports English/Latin alphabet
        vec!["eng".to_string()]
    }
}

// ============================================================================
// Model download helpers
// ============================================================================

/// Ensure model is downloaded and return its path
fn ensure_model_downloaded(url: &str, filename: &str) -> Result<PathBuf, OcrError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ocr-extract");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create cache directory: {}", e))
    })?;

    let model_path = cache_dir.join(filename);

    if !model_path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &model_path)?;
        tracing::info!("Downloaded {} to {:?}", filename, model_path);
    } else {
        tracing::info!("Using cached model from {:?}", model_path);
    }

    Ok(model_path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download model: {}", e)))?;

    let mut file = File::create(path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create model file: {}", e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read response body: {}", e))
    })?;

    file.write_all(&buffer)
        .map_err(|e| OcrError::InitializationError(format!("Failed to write model file: {}", e)))?;

    Ok(())
}
