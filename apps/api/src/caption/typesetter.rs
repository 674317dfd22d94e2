//! cosmic-text backed `Typesetter`: real shaping for measurement and glyph rasterization.
//!
//! Font selection follows the script of the line being set: Devanagari text asks
//! for a Devanagari family, everything else for the display family. cosmic-text
//! falls back to any installed face that covers the glyphs when the requested
//! family is missing.

use std::path::Path;
use std::sync::Arc;

use cosmic_text::{fontdb, Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};
use image::{Rgba, RgbaImage};
use tracing::{debug, info};

use crate::caption::compositor::{Typesetter, TypesetterFactory};
use crate::caption::metrics::{MeasureError, TextExtent, TextMeasurer};
use crate::emotion::script::contains_devanagari;

pub const DISPLAY_FAMILY: &str = "Impact";
pub const DEVANAGARI_FAMILY: &str = "Noto Sans Devanagari";

/// Line box height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.0;

/// Font database scanned once at startup.
///
/// Every render gets its own `CosmicTypesetter` over a copy of the database;
/// shaping and glyph caches live and die with that render.
#[derive(Clone)]
pub struct FontLibrary {
    locale: String,
    db: Arc<fontdb::Database>,
}

impl FontLibrary {
    /// Loads system fonts, plus every font file under `font_dir` when given.
    pub fn load(font_dir: Option<&Path>) -> Self {
        let mut font_system = FontSystem::new();
        if let Some(dir) = font_dir {
            font_system.db_mut().load_fonts_dir(dir);
            info!(dir = %dir.display(), "Loaded extra fonts");
        }
        info!(faces = font_system.db().len(), "Font database ready");

        let (locale, db) = font_system.into_locale_and_db();
        Self {
            locale,
            db: Arc::new(db),
        }
    }
}

impl TypesetterFactory for FontLibrary {
    fn typesetter(&self) -> Box<dyn Typesetter + Send> {
        let font_system =
            FontSystem::new_with_locale_and_db(self.locale.clone(), fontdb::Database::clone(&self.db));
        Box::new(CosmicTypesetter::with_font_system(font_system))
    }
}

pub struct CosmicTypesetter {
    font_system: FontSystem,
    cache: SwashCache,
}

impl CosmicTypesetter {
    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system,
            cache: SwashCache::new(),
        }
    }

    fn family_for(text: &str) -> &'static str {
        if contains_devanagari(text) {
            DEVANAGARI_FAMILY
        } else {
            DISPLAY_FAMILY
        }
    }

    /// Shapes `text` as a single unwrapped line.
    fn shape(&mut self, text: &str, font_size: u32) -> Buffer {
        let size = font_size as f32;
        let family = Self::family_for(text);
        let mut buffer = Buffer::new(
            &mut self.font_system,
            Metrics::new(size, size * LINE_HEIGHT_FACTOR),
        );
        {
            let mut borrowed = buffer.borrow_with(&mut self.font_system);
            borrowed.set_size(None, None);
            borrowed.set_text(text, Attrs::new().family(Family::Name(family)), Shaping::Advanced);
            borrowed.shape_until_scroll(true);
        }
        buffer
    }
}

impl TextMeasurer for CosmicTypesetter {
    fn measure(&mut self, text: &str, font_size: u32) -> Result<TextExtent, MeasureError> {
        if font_size == 0 {
            return Err(MeasureError::InvalidSize(font_size));
        }
        let line_height = font_size as f32 * LINE_HEIGHT_FACTOR;
        if text.trim().is_empty() {
            return Ok(TextExtent {
                width: 0.0,
                height: line_height,
            });
        }

        let buffer = self.shape(text, font_size);
        let mut width = 0.0_f32;
        let mut height = 0.0_f32;
        let mut glyphs = 0usize;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            height += run.line_height;
            glyphs += run.glyphs.len();
        }

        if glyphs == 0 {
            return Err(MeasureError::NoGlyphs {
                text: text.to_string(),
                font_size,
            });
        }
        Ok(TextExtent {
            width,
            height: height.max(line_height),
        })
    }
}

impl Typesetter for CosmicTypesetter {
    fn draw_text(
        &mut self,
        target: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        font_size: u32,
        color: Rgba<u8>,
    ) {
        if font_size == 0 || text.trim().is_empty() {
            return;
        }
        let mut buffer = self.shape(text, font_size);
        let [r, g, b, a] = color.0;
        let origin_x = x.round() as i32;
        let origin_y = y.round() as i32;

        let Self {
            font_system, cache, ..
        } = self;
        let mut painted = 0usize;
        buffer
            .borrow_with(font_system)
            .draw(cache, Color::rgba(r, g, b, a), |gx, gy, w, h, c| {
                let coverage = c.a();
                if coverage == 0 {
                    return;
                }
                let src = Rgba([c.r(), c.g(), c.b(), coverage]);
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        blend_pixel(target, origin_x + gx + dx, origin_y + gy + dy, src);
                    }
                }
                painted += 1;
            });
        debug!(text, font_size, painted, "Drew caption line");
    }
}

/// Source-over blend of `src` onto the pixel at `(x, y)`; out-of-bounds writes are dropped.
fn blend_pixel(target: &mut RgbaImage, x: i32, y: i32, src: Rgba<u8>) {
    if x < 0 || y < 0 || x as u32 >= target.width() || y as u32 >= target.height() {
        return;
    }
    let dst = target.get_pixel_mut(x as u32, y as u32);
    let alpha = src.0[3] as u32;
    let inverse = 255 - alpha;
    for channel in 0..3 {
        let blended = src.0[channel] as u32 * alpha + dst.0[channel] as u32 * inverse;
        dst.0[channel] = ((blended + 127) / 255) as u8;
    }
    dst.0[3] = dst.0[3].max(src.0[3]);
}
