//! Text measurement: the `TextMeasurer` seam and a static display-face metric table.
//!
//! The layout engine never touches fonts directly. It asks a `TextMeasurer` for
//! the bounding box of a string at a pixel size; the production measurer is the
//! cosmic-text typesetter, tests use `DisplayMetrics`.
//!
//! `DisplayMetrics` widths are em units for a condensed caption face (Impact-like).
//! They are an approximation, good enough to estimate a layout when real
//! shaping is unavailable. Table covers ASCII 0x20..=0x7E, index = (char as usize) - 32.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel bounding box of a measured string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// The measurer could not produce metrics for this string and size.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    #[error("no font could shape {text:?} at {font_size}px")]
    NoGlyphs { text: String, font_size: u32 },

    #[error("font size {0}px is not measurable")]
    InvalidSize(u32),
}

/// Measures text for a font binding chosen by the implementor.
pub trait TextMeasurer {
    fn measure(&mut self, text: &str, font_size: u32) -> Result<TextExtent, MeasureError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Static metric table
// ────────────────────────────────────────────────────────────────────────────

/// Character-width table for a condensed display face, in em units.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1..15]=punctuation  [16..25]=0-9  [26..32]=:;<=>?@
/// [33..58]=A-Z  [59..64]=[\]^_`  [65..90]=a-z  [91..94]={|}~
/// ```
pub struct DisplayMetrics {
    widths: [f32; 95],
    /// Width used for code points outside the table (including Devanagari).
    pub average_char_width: f32,
    /// Line box height in em units.
    pub line_height: f32,
}

impl DisplayMetrics {
    /// Width of `s` in em units.
    pub fn measure_em(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }

    /// Pixel extent of `s` set at `font_size`. Empty strings are zero-width, one line high.
    pub fn extent(&self, s: &str, font_size: u32) -> TextExtent {
        let size = font_size as f32;
        TextExtent {
            width: self.measure_em(s) * size,
            height: self.line_height * size,
        }
    }
}

impl TextMeasurer for &'static DisplayMetrics {
    fn measure(&mut self, text: &str, font_size: u32) -> Result<TextExtent, MeasureError> {
        if font_size == 0 {
            return Err(MeasureError::InvalidSize(font_size));
        }
        Ok(self.extent(text, font_size))
    }
}

/// Condensed caption face.
pub static DISPLAY_METRICS: DisplayMetrics = DisplayMetrics {
    #[rustfmt::skip]
    widths: [
        // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
        0.18, 0.26, 0.38, 0.58, 0.52, 0.74, 0.62, 0.20, 0.30, 0.30, 0.38, 0.52, 0.22, 0.32, 0.22, 0.36,
        // 0     1     2     3     4     5     6     7     8     9
        0.52, 0.40, 0.50, 0.50, 0.52, 0.50, 0.52, 0.44, 0.52, 0.52,
        // :     ;     <     =     >     ?     @
        0.22, 0.22, 0.52, 0.52, 0.52, 0.48, 0.80,
        // A     B     C     D     E     F     G     H     I     J     K     L     M
        0.56, 0.56, 0.54, 0.56, 0.46, 0.44, 0.56, 0.58, 0.28, 0.32, 0.56, 0.42, 0.72,
        // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
        0.58, 0.56, 0.52, 0.56, 0.54, 0.50, 0.46, 0.58, 0.54, 0.80, 0.52, 0.50, 0.44,
        // [     \     ]     ^     _     `
        0.30, 0.36, 0.30, 0.52, 0.46, 0.30,
        // a     b     c     d     e     f     g     h     i     j     k     l     m
        0.44, 0.46, 0.42, 0.46, 0.44, 0.28, 0.46, 0.46, 0.24, 0.24, 0.44, 0.24, 0.66,
        // n     o     p     q     r     s     t     u     v     w     x     y     z
        0.46, 0.44, 0.46, 0.46, 0.32, 0.40, 0.30, 0.46, 0.42, 0.62, 0.40, 0.42, 0.36,
        // {     |     }     ~
        0.34, 0.26, 0.34, 0.52,
    ],
    average_char_width: 0.50,
    line_height: 1.0,
};

/// The static display metrics as a measurer.
pub fn display_measurer() -> &'static DisplayMetrics {
    &DISPLAY_METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_empty_is_zero_width() {
        assert_eq!(DISPLAY_METRICS.measure_em(""), 0.0);
        let extent = DISPLAY_METRICS.extent("", 40);
        assert_eq!(extent.width, 0.0);
        assert_eq!(extent.height, 40.0);
    }

    #[test]
    fn test_measure_ascii() {
        // "Hi" = H(0.58) + i(0.24)
        let width = DISPLAY_METRICS.measure_em("Hi");
        assert!((width - 0.82).abs() < 1e-4, "got {width}");
    }

    #[test]
    fn test_non_ascii_falls_back_to_average() {
        let width = DISPLAY_METRICS.measure_em("छ");
        assert!((width - DISPLAY_METRICS.average_char_width).abs() < 1e-6);
    }

    #[test]
    fn test_extent_scales_with_font_size() {
        let small = DISPLAY_METRICS.extent("HELLO", 10);
        let large = DISPLAY_METRICS.extent("HELLO", 20);
        assert!((large.width - 2.0 * small.width).abs() < 1e-3);
        assert!((large.height - 2.0 * small.height).abs() < 1e-3);
    }

    #[test]
    fn test_measurer_rejects_zero_size() {
        let mut measurer = display_measurer();
        assert_eq!(
            measurer.measure("x", 0),
            Err(MeasureError::InvalidSize(0))
        );
        assert!(measurer.measure("x", 12).is_ok());
    }

    #[test]
    fn test_uppercase_wider_than_lowercase() {
        assert!(DISPLAY_METRICS.measure_em("MEME") > DISPLAY_METRICS.measure_em("meme"));
    }

    #[test]
    fn test_every_capital_at_least_as_wide_as_its_lowercase() {
        for upper in 'A'..='Z' {
            let lower = upper.to_ascii_lowercase();
            let (u, l) = (
                DISPLAY_METRICS.measure_em(&upper.to_string()),
                DISPLAY_METRICS.measure_em(&lower.to_string()),
            );
            assert!(u >= l, "{upper} is {u} em but {lower} is {l} em");
        }
    }
}
