//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR backend via the tesseract-static crate (statically
//! linked, no system dependencies). The only backend here with Arabic
//! training data, which is what the display normalizer exists for.
//! Downloads tessdata automatically on first use.
//!
//! tesseract-static exposes no box geometry, so no annotated copy is saved.

use crate::config::Config;
use crate::engine::{OcrEngine, Recognition};
use crate::error::OcrError;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Language the engine recognizes
    language: String,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let language = config.language.clone();

        // Ensure tessdata is available (download if needed)
        let tessdata_path = ensure_tessdata_available(&language)?;

        // Validate that tessdata is accessible by doing a test initialization
        let test_tess = Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
            OcrError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(test_tess);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self {
            tessdata_path,
            language,
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - supports Arabic and other non-Latin scripts"
    }

    fn recognize(&self, path: &Path) -> Result<Recognition, OcrError> {
        // Load image using the image crate
        let img = image::open(path)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to load image: {}", e)))?;

        // Convert to RGB8 for consistent handling
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        // Convert to BMP in memory (BMP is always supported by leptonica)
        let mut bmp_data = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut bmp_data);
            rgb_img
                .write_to(&mut cursor, image::ImageFormat::Bmp)
                .map_err(|e| {
                    OcrError::ProcessingError(format!("Failed to convert to BMP: {}", e))
                })?;
        }

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language))
            .map_err(|e| OcrError::ProcessingError(format!("Failed to create Tesseract: {}", e)))?;

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            OcrError::ProcessingError(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to get text: {}", e)))?;

        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Recognition {
            lines,
            annotated_image: None,
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
        // Tesseract supports many languages - return common ones.
        // Users can install additional language packs.
        vec![
            "ara".to_string(),     // Arabic
            "fra".to_string(),     // French
            "eng".to_string(),     // English
            "deu".to_string(),     // German
            "spa".to_string(),     // Spanish
            "ita".to_string(),     // Italian
            "por".to_string(),     // Portuguese
            "fas".to_string(),     // Persian
            "urd".to_string(),     // Urdu
            "rus".to_string(),     // Russian
            "chi_sim".to_string(), // Chinese Simplified
        ]
    }
}

// ============================================================================
// Tessdata download helpers
// ============================================================================

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, OcrError> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ocr-extract")
        .join("tessdata");

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create tessdata directory: {}", e))
    })?;

    let traineddata_file = format!("{}.traineddata", language);
    let traineddata_path = cache_dir.join(&traineddata_file);

    if !traineddata_path.exists() {
        let url = tessdata_url(language);
        tracing::info!(
            "Downloading tessdata for '{}' (this may take a moment)...",
            language
        );
        download_file(&url, &traineddata_path)?;
        tracing::info!("Downloaded tessdata to {:?}", traineddata_path);
    } else {
        tracing::info!("Using cached tessdata from {:?}", cache_dir);
    }

    // Return the directory path (Tesseract expects the directory, not the file)
    cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| OcrError::InitializationError("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url).call().map_err(|e| {
        OcrError::InitializationError(format!("Failed to download tessdata: {}", e))
    })?;

    let mut file = File::create(path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create tessdata file: {}", e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read tessdata response: {}", e))
    })?;

    file.write_all(&buffer).map_err(|e| {
        OcrError::InitializationError(format!("Failed to write tessdata file: {}", e))
    })?;

    Ok(())
}
