//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a [`crate::LayoutEngine`].
///
/// Every field has a default, so a partial JSON/TOML document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Average glyph advance as a fraction of the font size, used by
    /// [`crate::text::ApproximateFontMetrics`] when no font provider is given.
    pub approximate_char_width: f32,
    /// `line-height: normal` as a multiple of the font size for the
    /// approximate metrics.
    pub line_height_ratio: f32,
    /// Ascent as a fraction of the font size for the approximate metrics.
    pub ascent_ratio: f32,
    /// Nesting depth at which layout gives up with
    /// [`crate::LayoutError::TooDeep`].
    pub max_depth: usize,
    /// Give an auto-height root box at least the viewport's height.
    pub root_fills_viewport: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            approximate_char_width: 0.6,
            line_height_ratio: 1.2,
            ascent_ratio: 0.8,
            max_depth: 512,
            root_fills_viewport: true,
        }
    }
}
