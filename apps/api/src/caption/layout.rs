//! Caption layout engine: finds the largest font size whose wrapped caption fits the banner.
//!
//! # Search
//! - Ceiling from three length tiers (short captions get bigger type), capped by banner height / 3.
//! - Walk down from the ceiling in fixed steps to the floor. At each size: greedy
//!   word-wrap at 85% of image width, then accept if the block is narrow enough and
//!   both its measured and computed heights fit in 85% of the banner.
//! - Nothing fits: use the floor size and its wrapping as-is. The caption may
//!   overflow the banner; that is the chosen policy, not an error.
//!
//! A failing measurer at some size just skips that size. At the floor, a failing
//! measurer is replaced by the static display metrics so a layout always comes back.
//!
//! The result depends only on its inputs (given a deterministic measurer) and is
//! reused unchanged for every frame of an animation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::caption::metrics::{display_measurer, MeasureError, TextExtent, TextMeasurer};

// ────────────────────────────────────────────────────────────────────────────
// Parameters
// ────────────────────────────────────────────────────────────────────────────

/// A ceiling tier: captions with at most `max_words` words and `max_chars` chars start at `font_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeTier {
    pub max_words: usize,
    pub max_chars: usize,
    pub font_size: u32,
}

/// Tunables for the font-size search and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Checked in order; the first matching tier sets the ceiling.
    pub tiers: Vec<SizeTier>,
    /// Ceiling for captions longer than every tier.
    pub long_caption_size: u32,
    /// Ceiling is never above `banner_height / banner_divisor`.
    pub banner_divisor: u32,
    pub floor: u32,
    pub step: u32,
    /// Fraction of image width a line may occupy.
    pub width_fraction: f32,
    /// Fraction of banner height the block may occupy.
    pub height_fraction: f32,
    /// Added to the centered vertical origin, in pixels. Negative moves the block up.
    pub vertical_bias: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            tiers: vec![
                SizeTier {
                    max_words: 3,
                    max_chars: 15,
                    font_size: 70,
                },
                SizeTier {
                    max_words: 6,
                    max_chars: 30,
                    font_size: 55,
                },
            ],
            long_caption_size: 45,
            banner_divisor: 3,
            floor: 25,
            step: 3,
            width_fraction: 0.85,
            height_fraction: 0.85,
            vertical_bias: -2.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

/// A sized, wrapped and positioned caption.
///
/// `origin_x`/`origin_y` are the top-left of the text block in image pixels.
/// Each line is centered within `bounding_width` using `line_widths`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLayout {
    pub lines: Vec<String>,
    pub line_widths: Vec<f32>,
    pub font_size: u32,
    pub line_spacing: u32,
    pub bounding_width: f32,
    pub bounding_height: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    /// False when no size satisfied the constraints and the floor was used.
    pub fitted: bool,
}

impl CaptionLayout {
    /// Horizontal offset of line `index` inside the block.
    pub fn line_offset_x(&self, index: usize) -> f32 {
        let width = self.line_widths.get(index).copied().unwrap_or(0.0);
        (self.bounding_width - width) / 2.0
    }

    /// Vertical offset of line `index` inside the block.
    pub fn line_offset_y(&self, index: usize) -> f32 {
        (index as u32 * (self.font_size + self.line_spacing)) as f32
    }
}

/// A wrapped caption at one font size with its measurements.
#[derive(Debug, Clone)]
struct Block {
    lines: Vec<String>,
    extents: Vec<TextExtent>,
    font_size: u32,
    line_spacing: u32,
    width: f32,
    measured_height: f32,
    computed_height: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out `text` inside the bottom banner of an `image_width × image_height` image.
pub fn layout<M: TextMeasurer + ?Sized>(
    text: &str,
    image_width: u32,
    image_height: u32,
    banner_height: u32,
    measure: &mut M,
    params: &LayoutParams,
) -> CaptionLayout {
    let ceiling = initial_ceiling(text, banner_height, params);
    let floor = params.floor.min(ceiling);
    let max_width = image_width as f32 * params.width_fraction;
    let max_height = banner_height as f32 * params.height_fraction;

    if text.split_whitespace().next().is_none() {
        return empty_layout(ceiling, image_width, image_height, banner_height, params);
    }

    let mut size = ceiling;
    loop {
        match build_block(text, size, max_width, measure) {
            Ok(block) if fits(&block, max_width, max_height) => {
                debug!(font_size = size, lines = block.lines.len(), "Caption fits");
                return place(block, true, image_width, image_height, banner_height, params);
            }
            Ok(block) => {
                debug!(
                    font_size = size,
                    width = block.width,
                    height = block.measured_height,
                    "Caption does not fit, shrinking"
                );
            }
            Err(e) => {
                debug!(font_size = size, error = %e, "Measurement failed, shrinking");
            }
        }
        match size.checked_sub(params.step.max(1)) {
            Some(next) if next >= floor => size = next,
            _ => break,
        }
    }

    // The step sequence can jump past the floor, so the floor is checked here too.
    let (block, fitted) = match build_block(text, floor, max_width, measure) {
        Ok(block) => {
            let fitted = fits(&block, max_width, max_height);
            (block, fitted)
        }
        Err(e) => {
            warn!(font_size = floor, error = %e, "Measurement failed at floor size, estimating");
            let mut estimator = display_measurer();
            let block = build_block(text, floor, max_width, &mut estimator)
                .unwrap_or_else(|_| unmeasured_block(text, floor));
            (block, false)
        }
    };
    debug!(font_size = floor, lines = block.lines.len(), fitted, "Caption uses floor size");
    place(block, fitted, image_width, image_height, banner_height, params)
}

/// Starting font size for `text`: the first matching tier, capped by the banner.
pub fn initial_ceiling(text: &str, banner_height: u32, params: &LayoutParams) -> u32 {
    let word_count = text.split_whitespace().count();
    let char_count = text.chars().count();
    let tier_size = params
        .tiers
        .iter()
        .find(|t| word_count <= t.max_words && char_count <= t.max_chars)
        .map(|t| t.font_size)
        .unwrap_or(params.long_caption_size);
    let cap = banner_height / params.banner_divisor.max(1);
    tier_size.min(cap).max(1)
}

/// Greedy word wrap. A line closes as soon as adding the next word overflows
/// `max_width`; a single word wider than `max_width` becomes its own line.
pub fn wrap_lines<M: TextMeasurer + ?Sized>(
    text: &str,
    max_width: f32,
    font_size: u32,
    measure: &mut M,
) -> Result<Vec<String>, MeasureError> {
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        let candidate = current.join(" ");
        let extent = measure.measure(&candidate, font_size)?;

        if extent.width > max_width {
            if current.len() > 1 {
                current.pop();
                lines.push(current.join(" "));
                current = vec![word];
            } else {
                lines.push(candidate);
                current.clear();
            }
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    Ok(lines)
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn build_block<M: TextMeasurer + ?Sized>(
    text: &str,
    font_size: u32,
    max_width: f32,
    measure: &mut M,
) -> Result<Block, MeasureError> {
    let lines = wrap_lines(text, max_width, font_size, measure)?;
    let extents = lines
        .iter()
        .map(|line| measure.measure(line, font_size))
        .collect::<Result<Vec<_>, _>>()?;

    let line_spacing = font_size / 4;
    let count = lines.len() as u32;
    let gaps = count.saturating_sub(1);

    let width = extents.iter().map(|e| e.width).fold(0.0_f32, f32::max);
    let measured_height =
        extents.iter().map(|e| e.height).sum::<f32>() + (line_spacing * gaps) as f32;
    let computed_height = font_size * count + line_spacing * gaps;

    Ok(Block {
        lines,
        extents,
        font_size,
        line_spacing,
        width,
        measured_height,
        computed_height,
    })
}

fn fits(block: &Block, max_width: f32, max_height: f32) -> bool {
    block.width <= max_width
        && block.measured_height <= max_height
        && block.computed_height as f32 <= max_height
}

/// Last resort when even the estimator fails: one word per line, sized by the font size alone.
fn unmeasured_block(text: &str, font_size: u32) -> Block {
    let lines: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    let line_spacing = font_size / 4;
    let count = lines.len() as u32;
    let gaps = count.saturating_sub(1);
    let height = font_size * count + line_spacing * gaps;
    Block {
        extents: vec![TextExtent::default(); lines.len()],
        lines,
        font_size,
        line_spacing,
        width: 0.0,
        measured_height: height as f32,
        computed_height: height,
    }
}

fn place(
    block: Block,
    fitted: bool,
    image_width: u32,
    image_height: u32,
    banner_height: u32,
    params: &LayoutParams,
) -> CaptionLayout {
    let banner_top = image_height.saturating_sub(banner_height) as f32;
    let origin_x = (image_width as f32 - block.width) / 2.0;
    let origin_y =
        banner_top + (banner_height as f32 - block.measured_height) / 2.0 + params.vertical_bias;

    CaptionLayout {
        line_widths: block.extents.iter().map(|e| e.width).collect(),
        lines: block.lines,
        font_size: block.font_size,
        line_spacing: block.line_spacing,
        bounding_width: block.width,
        bounding_height: block.measured_height,
        origin_x,
        origin_y,
        fitted,
    }
}

fn empty_layout(
    font_size: u32,
    image_width: u32,
    image_height: u32,
    banner_height: u32,
    params: &LayoutParams,
) -> CaptionLayout {
    let block = Block {
        lines: Vec::new(),
        extents: Vec::new(),
        font_size,
        line_spacing: font_size / 4,
        width: 0.0,
        measured_height: 0.0,
        computed_height: 0,
    };
    place(block, true, image_width, image_height, banner_height, params)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
