//! Per-line normalization for display.
//!
//! The OCR backends emit Arabic runs with characters in an order the
//! reshaping pass expects reversed, so Arabic-containing tokens are
//! reversed at the codepoint level before reshaping and bidi resolution.
//! This corrects one engine's observed ordering; it is not general bidi
//! handling, and token order within a line is never changed.
//!
//! TODO: verify the reversal against native Arabic fixtures recognized by
//! the leptess backend.

use crate::normalize::shaper::{ArabicDisplayShaper, DisplayShaper};

/// Inclusive codepoint range treated as Arabic script.
const ARABIC_BLOCK: std::ops::RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

fn contains_arabic(token: &str) -> bool {
    token.chars().any(|c| ARABIC_BLOCK.contains(&c))
}

/// Reverse the codepoints of Arabic-containing tokens, keeping token order.
/// Runs of whitespace collapse to single spaces.
fn reverse_arabic_tokens(line: &str) -> String {
    line.split_whitespace()
        .map(|token| {
            if contains_arabic(token) {
                token.chars().rev().collect()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of normalizing one line. `fell_back` marks a line kept verbatim
/// because a shaping pass failed, so callers can observe degradation
/// instead of mistaking it for success.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub text: String,
    pub fell_back: bool,
}

/// Converts one line of recognized text into display order for a
/// left-to-right rendering widget.
pub struct LineNormalizer<S = ArabicDisplayShaper> {
    shaper: S,
}

impl LineNormalizer<ArabicDisplayShaper> {
    pub fn new() -> Self {
        Self {
            shaper: ArabicDisplayShaper::new(),
        }
    }
}

impl Default for LineNormalizer<ArabicDisplayShaper> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DisplayShaper> LineNormalizer<S> {
    pub fn with_shaper(shaper: S) -> Self {
        Self { shaper }
    }

    /// Normalize one recognized line.
    ///
    /// Never fails: if reshaping or reordering errors, the original line is
    /// returned unchanged with `fell_back` set and the failure is logged.
    /// OCR output is noisy; one malformed line must not sink the whole
    /// extraction. Repeated application is not idempotent, the shaping
    /// passes are not self-inverse.
    pub fn normalize(&self, line: &str) -> Normalized {
        let logical = reverse_arabic_tokens(line);
        match self
            .shaper
            .reshape(&logical)
            .and_then(|shaped| self.shaper.reorder(&shaped))
        {
            Ok(text) => Normalized {
                text,
                fell_back: false,
            },
            Err(err) => {
                tracing::warn!("Display normalization failed, keeping raw line: {}", err);
                Normalized {
                    text: line.to_string(),
                    fell_back: true,
                }
            }
        }
    }

    /// Normalize every line in order and join the results with newlines.
    /// Total: per-line failures degrade to passthrough, an empty input
    /// yields an empty string.
    pub fn aggregate<I, T>(&self, lines: I) -> String
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        lines
            .into_iter()
            .map(|line| self.normalize(line.as_ref()).text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;

    struct IdentityShaper;

    impl DisplayShaper for IdentityShaper {
        fn reshape(&self, text: &str) -> Result<String, OcrError> {
            Ok(text.to_string())
        }
        fn reorder(&self, text: &str) -> Result<String, OcrError> {
            Ok(text.to_string())
        }
    }

    struct FailingShaper;

    impl DisplayShaper for FailingShaper {
        fn reshape(&self, _text: &str) -> Result<String, OcrError> {
            Err(OcrError::NormalizationError("reshape exploded".to_string()))
        }
        fn reorder(&self, text: &str) -> Result<String, OcrError> {
            Ok(text.to_string())
        }
    }

    fn reversed(s: &str) -> String {
        s.chars().rev().collect()
    }

    #[test]
    fn latin_line_is_identity_up_to_whitespace() {
        let normalizer = LineNormalizer::with_shaper(IdentityShaper);
        assert_eq!(normalizer.normalize("Hello World").text, "Hello World");
        assert_eq!(normalizer.normalize("Hello   World").text, "Hello World");
    }

    #[test]
    fn arabic_token_is_reversed_latin_token_kept() {
        let normalizer = LineNormalizer::with_shaper(IdentityShaper);
        let out = normalizer.normalize("مرحبا world");
        assert_eq!(out.text, format!("{} world", reversed("مرحبا")));
        assert!(!out.fell_back);
    }

    #[test]
    fn token_order_is_preserved() {
        let normalizer = LineNormalizer::with_shaper(IdentityShaper);
        let out = normalizer.normalize("abc مرحبا def");
        assert_eq!(out.text, format!("abc {} def", reversed("مرحبا")));
    }

    #[test]
    fn single_arabic_char_classifies_whole_token() {
        let normalizer = LineNormalizer::with_shaper(IdentityShaper);
        let out = normalizer.normalize("abجc");
        assert_eq!(out.text, reversed("abجc"));
    }

    #[test]
    fn failing_shaper_falls_back_to_original_line() {
        let normalizer = LineNormalizer::with_shaper(FailingShaper);
        let out = normalizer.normalize("مرحبا  world");
        // Original line comes back untouched, spacing included.
        assert_eq!(out.text, "مرحبا  world");
        assert!(out.fell_back);
    }

    #[test]
    fn empty_line_normalizes_to_empty() {
        let normalizer = LineNormalizer::with_shaper(IdentityShaper);
        assert_eq!(normalizer.normalize("").text, "");
    }

    #[test]
    fn aggregate_empty_is_empty() {
        let normalizer = LineNormalizer::with_shaper(IdentityShaper);
        assert_eq!(normalizer.aggregate(Vec::<String>::new()), "");
    }

    #[test]
    fn aggregate_single_line_has_no_trailing_newline() {
        let normalizer = LineNormalizer::with_shaper(IdentityShaper);
        assert_eq!(normalizer.aggregate(["hello"]), "hello");
    }

    #[test]
    fn aggregate_joins_with_newlines_in_order() {
        let normalizer = LineNormalizer::with_shaper(IdentityShaper);
        assert_eq!(
            normalizer.aggregate(["one", "مرحبا"]),
            format!("one\n{}", reversed("مرحبا"))
        );
    }

    #[test]
    fn production_shaper_passes_latin_lines_through() {
        let normalizer = LineNormalizer::new();
        let out = normalizer.normalize("Invoice 42");
        assert_eq!(out.text, "Invoice 42");
        assert!(!out.fell_back);
    }
}
