//! HT scanline-block compressors for half-float EXR images.
//!
//! A [`BlockCompressor`] turns one block of container scanlines into a
//! lossless wavelet codestream and back. Two backends exist: one drives the
//! engine line by line and folds samples itself, the other pushes whole
//! stripes and lets the engine fold them through a non-linear point
//! transform. [`chunk`] decides whether a block is stored compressed or raw.

pub mod backend;
pub mod buffer_arena;
pub mod channel_map;
pub mod chunk;
pub mod compressor;
pub mod constants;
pub mod engine;
pub mod error;
pub mod header;
pub mod sign_magnitude;

pub use backend::{ProprietaryCompressor, SoftwareCompressor};
pub use channel_map::ChannelPermutation;
pub use chunk::{CompressedImage, compress_chunk, compress_image, uncompress_chunk, uncompress_image};
pub use compressor::{BlockCompressor, Compression, CompressorConfig, SampleFormat, new_compressor};
pub use error::HtError;
pub use header::{Channel, ChannelSet, DataWindow, ImageHeader, PixelType};
