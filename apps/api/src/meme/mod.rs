// Meme generation: image search, the caption pipeline and its HTTP handler.

pub mod handlers;
pub mod pipeline;
pub mod search;

pub use pipeline::MemePipeline;
pub use search::{GiphyClient, ImageSearch};
