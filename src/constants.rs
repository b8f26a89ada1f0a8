/// Upper bound on channels per part accepted by the HT compressors.
pub const MAX_CHANNEL_COUNT: usize = 6;

/// Block height used when the caller does not configure one.
pub const DEFAULT_BLOCK_HEIGHT: usize = 16000;

/// Block height of the `*256` compression variants.
pub const SHORT_BLOCK_HEIGHT: usize = 256;

pub const SAMPLE_BIT_DEPTH: u8 = 16;
pub const DECOMPOSITION_LEVELS: u8 = 5;

// Code-blocks are 128 samples wide and 32 high for both backends.
pub const CODE_BLOCK_WIDTH: u32 = 128;
pub const CODE_BLOCK_HEIGHT: u32 = 32;

/// Fold constant of the sign-magnitude transform.
pub const SIGN_MAGNITUDE_FOLD: i32 = -32769;

pub const MARKER_START_BYTE: u8 = 0xFF;

// Rice coder context, see block_coder.rs.
pub const RICE_RESET_THRESHOLD: u32 = 64;
pub const RICE_INITIAL_A: u32 = 16;
pub const RICE_MAX_K: u32 = 24;
pub const RICE_QUOTIENT_LIMIT: u32 = 24;

// The size in bytes of the segment length field.
pub const SEGMENT_LENGTH_SIZE: usize = 2;
