use crate::error::OcrError;
use std::path::{Path, PathBuf};

/// What an OCR backend produces for one image: the recognized text lines in
/// reading order, plus the annotated copy it saved when it can draw one.
#[derive(Debug, Clone)]
pub struct Recognition {
    pub lines: Vec<String>,
    pub annotated_image: Option<PathBuf>,
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text in an image file, line by line
    fn recognize(&self, path: &Path) -> Result<Recognition, OcrError>;

    /// Get supported MIME types
    fn supported_formats(&self) -> Vec<String>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
