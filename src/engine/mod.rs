//! Lossless single-tile codestream engine.
//!
//! The engine codes a set of equally sized 16-bit components as one tile. It
//! is split into:
//!
//! - `params`: SIZ, COD and NLT parameter sets.
//! - `markers` / `stream` / `header`: Codestream syntax (markers, main header, tile-part).
//! - `color`: Reversible colour transform and the sign-magnitude NLT.
//! - `dwt`: Reversible 5/3 wavelet.
//! - `bit_io` / `block_coder`: Code-block entropy coding.
//! - `tile`: Packet and code-block layout of the tile body.
//! - `line_codec`: Line-exchange compressor and decompressor.
//! - `stripe_codec`: Stripe push/pull compressor and decompressor.
//! - `message`: Per-instance diagnostic routing.

pub mod bit_io;
pub mod block_coder;
pub mod color;
pub mod dwt;
pub mod header;
pub mod line_codec;
pub mod markers;
pub mod message;
pub mod params;
pub mod stream;
pub mod stripe_codec;
pub mod tile;

pub use line_codec::{LineCompressor, LineDecompressor};
pub use message::{EngineConfig, MessageHandler, MessageLevel};
pub use params::{CodParams, CodeBlockSize, CodestreamParams, NltType, ProgressionOrder, SizParams};
pub use stripe_codec::{StripeCompressor, StripeDecompressor, StripeLayout};
