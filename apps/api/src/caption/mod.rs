pub mod codec;
pub mod compositor;
pub mod layout;
pub mod metrics;
pub mod typesetter;

pub use codec::{decode_frames, encode_frames, CodecError, EncodedImage};
pub use compositor::{render_caption, CaptionStyle, TypesetterFactory};
pub use layout::LayoutParams;
pub use typesetter::FontLibrary;
