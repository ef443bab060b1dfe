//! Arabic display-text normalization.
//!
//! OCR backends hand back recognized lines in their own logical order;
//! this module turns each line into the form a left-to-right text widget
//! renders correctly: Arabic-containing tokens reversed at the codepoint
//! level, letters reshaped into contextual presentation forms, and
//! mixed-direction runs resolved into visual order.

pub mod line;
pub mod shaper;

pub use line::{LineNormalizer, Normalized};
pub use shaper::{ArabicDisplayShaper, DisplayShaper};
