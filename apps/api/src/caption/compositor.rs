//! Frame compositor: paints the banner and the outlined caption onto raster frames.
//!
//! One `CaptionLayout` is computed from frame 0 and drawn onto every frame. Draw
//! order per frame is fixed: banner fill, outline pass, fill pass. The fill pass
//! runs last so outline strokes never cover it.

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::caption::layout::{layout as compute_layout, CaptionLayout, LayoutParams};
use crate::caption::metrics::TextMeasurer;

/// One raster frame and the delay before the next one, if the source had timing.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image: RgbaImage,
    pub delay_ms: Option<u32>,
}

impl Frame {
    pub fn still(image: RgbaImage) -> Self {
        Self {
            image,
            delay_ms: None,
        }
    }
}

/// Raster surface the compositor draws on.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Fills the rectangle, clipped to the canvas.
    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>);
    /// Draws a single line of text with its top-left at `(x, y)`.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: u32, color: Rgba<u8>);
}

/// A `TextMeasurer` that can also rasterize the text it measures.
pub trait Typesetter: TextMeasurer {
    fn draw_text(
        &mut self,
        target: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        font_size: u32,
        color: Rgba<u8>,
    );
}

/// Hands out a fresh `Typesetter` per render, so concurrent renders share no
/// mutable font state.
pub trait TypesetterFactory: Send + Sync {
    fn typesetter(&self) -> Box<dyn Typesetter + Send>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionStyle {
    /// Share of frame height covered by the banner, measured from the bottom.
    pub banner_ratio: f32,
    pub banner_color: Rgba<u8>,
    pub outline_color: Rgba<u8>,
    pub fill_color: Rgba<u8>,
    pub outline_width: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            banner_ratio: 0.20,
            banner_color: Rgba([0, 0, 0, 255]),
            outline_color: Rgba([0, 0, 0, 255]),
            fill_color: Rgba([255, 255, 255, 255]),
            outline_width: 2,
        }
    }
}

pub fn banner_height(image_height: u32, ratio: f32) -> u32 {
    ((image_height as f32 * ratio) as u32).min(image_height)
}

/// Draws banner, outline and fill for `layout` onto `canvas`.
pub fn composite<C: Canvas + ?Sized>(canvas: &mut C, layout: &CaptionLayout, style: &CaptionStyle) {
    let banner = banner_height(canvas.height(), style.banner_ratio);
    let banner_top = canvas.height() - banner;
    let width = canvas.width();
    canvas.fill_rect(0, banner_top, width, banner, style.banner_color);

    let reach = style.outline_width as i32;
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            if dx == 0 && dy == 0 {
                continue;
            }
            draw_lines(canvas, layout, dx as f32, dy as f32, style.outline_color);
        }
    }

    draw_lines(canvas, layout, 0.0, 0.0, style.fill_color);
}

fn draw_lines<C: Canvas + ?Sized>(
    canvas: &mut C,
    layout: &CaptionLayout,
    dx: f32,
    dy: f32,
    color: Rgba<u8>,
) {
    for (i, line) in layout.lines.iter().enumerate() {
        let x = layout.origin_x + layout.line_offset_x(i) + dx;
        let y = layout.origin_y + layout.line_offset_y(i) + dy;
        canvas.draw_text(line, x, y, layout.font_size, color);
    }
}

/// An `RgbaImage` paired with the typesetter that draws text on it.
pub struct FrameCanvas<'a, T: Typesetter + ?Sized> {
    image: &'a mut RgbaImage,
    typesetter: &'a mut T,
}

impl<'a, T: Typesetter + ?Sized> FrameCanvas<'a, T> {
    pub fn new(image: &'a mut RgbaImage, typesetter: &'a mut T) -> Self {
        Self { image, typesetter }
    }
}

impl<T: Typesetter + ?Sized> Canvas for FrameCanvas<'_, T> {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
        let x_end = x.saturating_add(width).min(self.image.width());
        let y_end = y.saturating_add(height).min(self.image.height());
        for py in y..y_end {
            for px in x..x_end {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: u32, color: Rgba<u8>) {
        self.typesetter
            .draw_text(&mut *self.image, text, x, y, font_size, color);
    }
}

/// Captions every frame with `text`.
///
/// Layout is computed once from frame 0's dimensions and reused for the rest.
/// Output has the same length and order as `frames`; delays pass through untouched.
pub fn render_caption<T: Typesetter + ?Sized>(
    mut frames: Vec<Frame>,
    text: &str,
    typesetter: &mut T,
    style: &CaptionStyle,
    params: &LayoutParams,
) -> Vec<Frame> {
    let Some(first) = frames.first() else {
        return frames;
    };
    let (width, height) = first.image.dimensions();
    let banner = banner_height(height, style.banner_ratio);
    let layout = compute_layout(text, width, height, banner, typesetter, params);

    debug!(
        frames = frames.len(),
        font_size = layout.font_size,
        lines = layout.lines.len(),
        fitted = layout.fitted,
        "Rendering caption"
    );

    for frame in frames.iter_mut() {
        let mut canvas = FrameCanvas::new(&mut frame.image, typesetter);
        composite(&mut canvas, &layout, style);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::metrics::{MeasureError, TextExtent, DISPLAY_METRICS};

    #[derive(Debug, Clone, PartialEq)]
    struct DrawCall {
        text: String,
        x: f32,
        y: f32,
        font_size: u32,
        color: Rgba<u8>,
    }

    /// Measures with the display table and records draws instead of painting glyphs.
    #[derive(Default)]
    struct RecordingTypesetter {
        calls: Vec<DrawCall>,
    }

    impl TextMeasurer for RecordingTypesetter {
        fn measure(&mut self, text: &str, font_size: u32) -> Result<TextExtent, MeasureError> {
            Ok(DISPLAY_METRICS.extent(text, font_size))
        }
    }

    impl Typesetter for RecordingTypesetter {
        fn draw_text(
            &mut self,
            _target: &mut RgbaImage,
            text: &str,
            x: f32,
            y: f32,
            font_size: u32,
            color: Rgba<u8>,
        ) {
            self.calls.push(DrawCall {
                text: text.to_string(),
                x,
                y,
                font_size,
                color,
            });
        }
    }

    const GREY: Rgba<u8> = Rgba([128, 128, 128, 255]);

    fn grey_frame(width: u32, height: u32, delay_ms: Option<u32>) -> Frame {
        Frame {
            image: RgbaImage::from_pixel(width, height, GREY),
            delay_ms,
        }
    }

    fn sample_layout() -> CaptionLayout {
        CaptionLayout {
            lines: vec!["HELLO".to_string(), "HI".to_string()],
            line_widths: vec![100.0, 40.0],
            font_size: 20,
            line_spacing: 5,
            bounding_width: 100.0,
            bounding_height: 45.0,
            origin_x: 50.0,
            origin_y: 160.0,
            fitted: true,
        }
    }

    #[test]
    fn test_banner_height_is_bottom_fifth() {
        assert_eq!(banner_height(100, 0.2), 20);
        assert_eq!(banner_height(600, 0.2), 120);
        assert_eq!(banner_height(0, 0.2), 0);
        assert_eq!(banner_height(10, 5.0), 10);
    }

    #[test]
    fn test_two_frames_share_placement_and_banner() {
        let frames = vec![grey_frame(100, 100, Some(80)), grey_frame(100, 100, Some(120))];
        let mut typesetter = RecordingTypesetter::default();
        let out = render_caption(
            frames,
            "hi",
            &mut typesetter,
            &CaptionStyle::default(),
            &LayoutParams::default(),
        );

        assert_eq!(out.len(), 2);
        for frame in &out {
            for y in 0..100 {
                let expected = if y >= 80 { Rgba([0, 0, 0, 255]) } else { GREY };
                assert_eq!(*frame.image.get_pixel(0, y), expected, "row {y}");
                assert_eq!(*frame.image.get_pixel(99, y), expected, "row {y}");
            }
        }

        // 24 outline offsets + 1 fill for a single line, per frame.
        assert_eq!(typesetter.calls.len(), 50);
        let (first, second) = typesetter.calls.split_at(25);
        assert_eq!(first, second);
        assert!(first.iter().all(|c| c.text == "hi"));
    }

    #[test]
    fn test_delays_pass_through_in_order() {
        let frames = vec![
            grey_frame(60, 40, Some(30)),
            grey_frame(60, 40, None),
            grey_frame(60, 40, Some(500)),
        ];
        let out = render_caption(
            frames,
            "mast",
            &mut RecordingTypesetter::default(),
            &CaptionStyle::default(),
            &LayoutParams::default(),
        );
        let delays: Vec<_> = out.iter().map(|f| f.delay_ms).collect();
        assert_eq!(delays, vec![Some(30), None, Some(500)]);
    }

    #[test]
    fn test_empty_frame_list() {
        let out = render_caption(
            Vec::new(),
            "hi",
            &mut RecordingTypesetter::default(),
            &CaptionStyle::default(),
            &LayoutParams::default(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_outline_drawn_before_fill() {
        let mut image = RgbaImage::from_pixel(200, 200, GREY);
        let mut typesetter = RecordingTypesetter::default();
        let style = CaptionStyle::default();
        {
            let mut canvas = FrameCanvas::new(&mut image, &mut typesetter);
            composite(&mut canvas, &sample_layout(), &style);
        }

        // Two lines: 24 outline passes each, then one fill pass each.
        let calls = &typesetter.calls;
        assert_eq!(calls.len(), 50);
        assert!(calls[..48].iter().all(|c| c.color == style.outline_color));
        assert!(calls[48..].iter().all(|c| c.color == style.fill_color));
        assert_eq!(calls[48].text, "HELLO");
        assert_eq!(calls[49].text, "HI");
    }

    #[test]
    fn test_outline_offsets_cover_square_without_center() {
        let mut image = RgbaImage::from_pixel(200, 200, GREY);
        let mut typesetter = RecordingTypesetter::default();
        let style = CaptionStyle {
            outline_width: 1,
            ..CaptionStyle::default()
        };
        {
            let mut canvas = FrameCanvas::new(&mut image, &mut typesetter);
            composite(&mut canvas, &sample_layout(), &style);
        }

        let mut offsets: Vec<(i32, i32)> = typesetter
            .calls
            .iter()
            .filter(|c| c.text == "HELLO" && c.color == style.outline_color)
            .map(|c| ((c.x - 50.0) as i32, (c.y - 160.0) as i32))
            .collect();
        offsets.sort();
        assert_eq!(
            offsets,
            vec![(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)]
        );
    }

    #[test]
    fn test_lines_are_centered_and_stacked() {
        let mut image = RgbaImage::from_pixel(200, 200, GREY);
        let mut typesetter = RecordingTypesetter::default();
        {
            let mut canvas = FrameCanvas::new(&mut image, &mut typesetter);
            composite(&mut canvas, &sample_layout(), &CaptionStyle::default());
        }
        let fills = &typesetter.calls[typesetter.calls.len() - 2..];
        assert_eq!((fills[0].x, fills[0].y), (50.0, 160.0));
        // Second line is 40 wide inside a 100 wide block, one line height + spacing down.
        assert_eq!((fills[1].x, fills[1].y), (80.0, 185.0));
        assert!(fills.iter().all(|c| c.font_size == 20));
    }

    #[test]
    fn test_fill_rect_clips_to_image() {
        let mut image = RgbaImage::from_pixel(10, 10, GREY);
        let mut typesetter = RecordingTypesetter::default();
        let red = Rgba([255, 0, 0, 255]);
        {
            let mut canvas = FrameCanvas::new(&mut image, &mut typesetter);
            canvas.fill_rect(8, 8, 50, 50, red);
        }
        assert_eq!(*image.get_pixel(9, 9), red);
        assert_eq!(*image.get_pixel(7, 9), GREY);
    }
}
