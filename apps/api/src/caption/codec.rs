//! Image bytes <-> frames.
//!
//! GIFs decode to every composited frame with its delay. Any other format the
//! `image` crate reads decodes to one frame without timing. Encoding mirrors
//! that: several frames become a looping GIF, a single frame becomes an RGB PNG.

use std::io::Cursor;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, DynamicImage, ImageFormat};
use thiserror::Error;

use crate::caption::compositor::Frame;

/// Delay used for animation frames whose source carried none.
pub const DEFAULT_DELAY_MS: u32 = 100;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("no frames to encode")]
    NoFrames,
}

/// Encoded output ready to send.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

pub fn decode_frames(bytes: &[u8]) -> Result<Vec<Frame>, CodecError> {
    let format = image::guess_format(bytes)?;
    if format == ImageFormat::Gif {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        let frames = decoder
            .into_frames()
            .collect_frames()?
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let delay_ms = if denom == 0 { 0 } else { numer / denom };
                Frame {
                    image: frame.into_buffer(),
                    delay_ms: Some(delay_ms),
                }
            })
            .collect();
        return Ok(frames);
    }

    let image = image::load_from_memory_with_format(bytes, format)?;
    Ok(vec![Frame::still(image.to_rgba8())])
}

pub fn encode_frames(frames: &[Frame]) -> Result<EncodedImage, CodecError> {
    match frames {
        [] => Err(CodecError::NoFrames),
        [single] => encode_png(single),
        many => encode_gif(many),
    }
}

fn encode_png(frame: &Frame) -> Result<EncodedImage, CodecError> {
    let rgb = DynamicImage::ImageRgba8(frame.image.clone()).to_rgb8();
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(EncodedImage {
        bytes,
        content_type: "image/png",
    })
}

fn encode_gif(frames: &[Frame]) -> Result<EncodedImage, CodecError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames.iter().map(|frame| {
            let delay = Delay::from_numer_denom_ms(frame.delay_ms.unwrap_or(DEFAULT_DELAY_MS), 1);
            image::Frame::from_parts(frame.image.clone(), 0, 0, delay)
        }))?;
    }
    Ok(EncodedImage {
        bytes,
        content_type: "image/gif",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, color: [u8; 4], delay_ms: Option<u32>) -> Frame {
        Frame {
            image: RgbaImage::from_pixel(width, height, Rgba(color)),
            delay_ms,
        }
    }

    #[test]
    fn test_single_frame_encodes_as_png() {
        let encoded = encode_frames(&[solid(8, 6, [200, 10, 10, 255], None)]).unwrap();
        assert_eq!(encoded.content_type, "image/png");
        assert_eq!(image::guess_format(&encoded.bytes).unwrap(), ImageFormat::Png);

        let decoded = decode_frames(&encoded.bytes).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].delay_ms, None);
        assert_eq!(decoded[0].image.dimensions(), (8, 6));
        assert_eq!(*decoded[0].image.get_pixel(3, 3), Rgba([200, 10, 10, 255]));
    }

    #[test]
    fn test_png_output_drops_alpha() {
        let encoded = encode_frames(&[solid(2, 2, [0, 0, 255, 40], None)]).unwrap();
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_animation_keeps_frame_count_and_delays() {
        let frames = vec![
            solid(10, 10, [255, 0, 0, 255], Some(70)),
            solid(10, 10, [0, 255, 0, 255], Some(200)),
            solid(10, 10, [0, 0, 255, 255], None),
        ];
        let encoded = encode_frames(&frames).unwrap();
        assert_eq!(encoded.content_type, "image/gif");

        let decoded = decode_frames(&encoded.bytes).unwrap();
        let delays: Vec<_> = decoded.iter().map(|f| f.delay_ms).collect();
        assert_eq!(delays, vec![Some(70), Some(200), Some(DEFAULT_DELAY_MS)]);
        assert!(decoded.iter().all(|f| f.image.dimensions() == (10, 10)));
    }

    #[test]
    fn test_encode_nothing_fails() {
        assert!(matches!(encode_frames(&[]), Err(CodecError::NoFrames)));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(decode_frames(b"definitely not an image").is_err());
    }
}
