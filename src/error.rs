use thiserror::Error;

use crate::header::PixelType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HtError {
    // Construction
    #[error("Channel {name:?} is not supported (type {pixel_type:?}, sampling {x_sampling}x{y_sampling})")]
    UnsupportedChannel {
        name: String,
        pixel_type: PixelType,
        x_sampling: i32,
        y_sampling: i32,
    },
    #[error("Duplicate channel name {0:?}")]
    DuplicateChannel(String),
    #[error("Channel set is empty")]
    EmptyChannelSet,
    #[error("Too many channels: {count} (maximum {max})")]
    TooManyChannels { count: usize, max: usize },
    #[error("Invalid data window")]
    InvalidDataWindow,

    // Caller contract
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
    #[error("Row {row} is outside the data window [{min_y}, {max_y}]")]
    RowOutOfRange { row: i32, min_y: i32, max_y: i32 },

    // Decoded data
    #[error(
        "Codestream geometry {actual_width}x{actual_height}x{actual_components} does not match block {expected_width}x{expected_height}x{expected_components}"
    )]
    GeometryMismatch {
        expected_width: usize,
        expected_height: usize,
        expected_components: usize,
        actual_width: usize,
        actual_height: usize,
        actual_components: usize,
    },

    // Engine
    #[error("Invalid codestream: {0}")]
    Codestream(&'static str),
    #[error("Invalid engine parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("Engine protocol violation: {0}")]
    EngineProtocol(&'static str),

    #[error("Malformed chunk list")]
    MalformedChunkList,

    #[error("Unknown compression {0:?}")]
    UnknownCompression(String),
}
