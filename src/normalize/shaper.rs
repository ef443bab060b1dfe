//! Reshaping and bidi collaborators behind a swappable seam.
//!
//! The token-reversal heuristic in `line` is tuned to one engine's output
//! ordering; keeping the shaping passes behind a trait lets tests
//! substitute doubles and lets the heuristic be replaced without touching
//! aggregation or the HTTP surface.

use ar_reshaper::ArabicReshaper;
use unicode_bidi::BidiInfo;

use crate::error::OcrError;

/// Converts logical-order text into what an LTR rendering widget can draw.
pub trait DisplayShaper: Send + Sync {
    /// Map Arabic letters to their contextual presentation forms.
    fn reshape(&self, text: &str) -> Result<String, OcrError>;

    /// Reorder mixed-direction runs into visual order (UAX-9).
    fn reorder(&self, text: &str) -> Result<String, OcrError>;
}

/// Production shaper: `ar-reshaper` for letterforms, `unicode-bidi` for
/// run reordering with an LTR base level.
pub struct ArabicDisplayShaper {
    reshaper: ArabicReshaper,
}

impl ArabicDisplayShaper {
    pub fn new() -> Self {
        Self {
            reshaper: ArabicReshaper::default(),
        }
    }
}

impl Default for ArabicDisplayShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayShaper for ArabicDisplayShaper {
    fn reshape(&self, text: &str) -> Result<String, OcrError> {
        Ok(self.reshaper.reshape(text))
    }

    fn reorder(&self, text: &str) -> Result<String, OcrError> {
        // Base level is forced to LTR: the consumer is a left-to-right
        // rendering widget, not a bidi-aware one.
        let info = BidiInfo::new(text, Some(unicode_bidi::LTR_LEVEL));
        if info.paragraphs.is_empty() {
            return Ok(text.to_string());
        }
        let mut out = String::with_capacity(text.len());
        for para in &info.paragraphs {
            out.push_str(&info.reorder_line(para, para.range.clone()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorder_is_identity_for_ltr_text() {
        let shaper = ArabicDisplayShaper::new();
        assert_eq!(shaper.reorder("Hello World 123").unwrap(), "Hello World 123");
    }

    #[test]
    fn reorder_reverses_rtl_run_for_ltr_display() {
        let shaper = ArabicDisplayShaper::new();
        let visual = shaper.reorder("abc سلام").unwrap();
        assert!(visual.starts_with("abc "));
        let reversed_run: String = "سلام".chars().rev().collect();
        assert!(visual.ends_with(&reversed_run));
    }

    #[test]
    fn reorder_empty_is_empty() {
        let shaper = ArabicDisplayShaper::new();
        assert_eq!(shaper.reorder("").unwrap(), "");
    }

    #[test]
    fn reshape_leaves_latin_untouched() {
        let shaper = ArabicDisplayShaper::new();
        assert_eq!(shaper.reshape("Hello 123").unwrap(), "Hello 123");
    }

    #[test]
    fn reshape_maps_arabic_to_presentation_forms() {
        let shaper = ArabicDisplayShaper::new();
        // meem-ha-meem-dal: no ligatures involved, so the character count
        // is stable but every letter moves to a presentation form.
        let shaped = shaper.reshape("محمد").unwrap();
        assert_ne!(shaped, "محمد");
        assert_eq!(shaped.chars().count(), 4);
        assert!(shaped
            .chars()
            .all(|c| !('\u{0600}'..='\u{06FF}').contains(&c)));
    }
}
