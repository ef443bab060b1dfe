//! Image-to-text pipeline: recognize, normalize, aggregate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::normalize::{ArabicDisplayShaper, DisplayShaper, LineNormalizer};

/// Result of one full extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Newline-joined, display-normalized text.
    pub text: String,
    /// Annotated copy saved by the engine, when available.
    pub annotated_image: Option<PathBuf>,
    /// Lines kept verbatim because display normalization fell back.
    pub degraded_lines: usize,
}

/// Runs an image through an OCR backend and the display normalizer.
pub struct Extractor<S = ArabicDisplayShaper> {
    engine: Arc<dyn OcrEngine>,
    normalizer: LineNormalizer<S>,
}

impl Extractor {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self::with_normalizer(engine, LineNormalizer::new())
    }
}

impl<S: DisplayShaper> Extractor<S> {
    /// Build an extractor around a pre-built normalizer, so callers pick
    /// the shaper.
    pub fn with_normalizer(engine: Arc<dyn OcrEngine>, normalizer: LineNormalizer<S>) -> Self {
        Self { engine, normalizer }
    }

    /// Extract display-ready text from an image file.
    ///
    /// Engine failures surface as errors and are not retried here; per-line
    /// normalization failures degrade to the raw line and are only counted.
    pub fn extract(&self, path: &Path) -> Result<Extraction, OcrError> {
        let recognition = self.engine.recognize(path)?;

        let mut lines = Vec::with_capacity(recognition.lines.len());
        let mut degraded_lines = 0;
        for raw in &recognition.lines {
            let normalized = self.normalizer.normalize(raw);
            if normalized.fell_back {
                degraded_lines += 1;
            }
            lines.push(normalized.text);
        }

        if degraded_lines > 0 {
            tracing::warn!(
                "{} of {} lines kept without display normalization",
                degraded_lines,
                recognition.lines.len()
            );
        }

        Ok(Extraction {
            text: lines.join("\n"),
            annotated_image: recognition.annotated_image,
            degraded_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Recognition;

    struct FixedEngine {
        lines: Vec<String>,
    }

    impl OcrEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn description(&self) -> &'static str {
            "test double"
        }
        fn recognize(&self, _path: &Path) -> Result<Recognition, OcrError> {
            Ok(Recognition {
                lines: self.lines.clone(),
                annotated_image: None,
            })
        }
        fn supported_formats(&self) -> Vec<String> {
            vec![]
        }
        fn supported_languages(&self) -> Vec<String> {
            vec![]
        }
    }

    struct BrokenEngine;

    impl OcrEngine for BrokenEngine {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn description(&self) -> &'static str {
            "test double"
        }
        fn recognize(&self, _path: &Path) -> Result<Recognition, OcrError> {
            Err(OcrError::ProcessingError("unreadable image".to_string()))
        }
        fn supported_formats(&self) -> Vec<String> {
            vec![]
        }
        fn supported_languages(&self) -> Vec<String> {
            vec![]
        }
    }

    /// Rejects any Arabic-containing text, so normalization must fall back.
    struct ArabicRejectingShaper;

    impl DisplayShaper for ArabicRejectingShaper {
        fn reshape(&self, text: &str) -> Result<String, OcrError> {
            if text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c)) {
                Err(OcrError::NormalizationError(
                    "unsupported characters".to_string(),
                ))
            } else {
                Ok(text.to_string())
            }
        }
        fn reorder(&self, text: &str) -> Result<String, OcrError> {
            Ok(text.to_string())
        }
    }

    #[test]
    fn joins_normalized_lines_in_order() {
        let extractor = Extractor::new(Arc::new(FixedEngine {
            lines: vec!["first line".to_string(), "second line".to_string()],
        }));
        let extraction = extractor.extract(Path::new("ignored.png")).unwrap();
        assert_eq!(extraction.text, "first line\nsecond line");
        assert_eq!(extraction.degraded_lines, 0);
    }

    #[test]
    fn no_lines_yields_empty_text() {
        let extractor = Extractor::new(Arc::new(FixedEngine { lines: vec![] }));
        let extraction = extractor.extract(Path::new("ignored.png")).unwrap();
        assert_eq!(extraction.text, "");
    }

    #[test]
    fn counts_degraded_lines_and_keeps_their_raw_text() {
        let extractor = Extractor::with_normalizer(
            Arc::new(FixedEngine {
                lines: vec!["hello world".to_string(), "مرحبا  world".to_string()],
            }),
            LineNormalizer::with_shaper(ArabicRejectingShaper),
        );
        let extraction = extractor.extract(Path::new("ignored.png")).unwrap();
        assert_eq!(extraction.degraded_lines, 1);
        // The degraded line comes back verbatim, spacing included.
        assert_eq!(extraction.text, "hello world\nمرحبا  world");
    }

    #[test]
    fn engine_failure_is_surfaced_not_retried() {
        let extractor = Extractor::new(Arc::new(BrokenEngine));
        assert!(extractor.extract(Path::new("ignored.png")).is_err());
    }
}
