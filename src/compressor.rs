//! Scanline-block compressor interface and the shared block geometry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::backend::{ProprietaryCompressor, SoftwareCompressor};
use crate::channel_map::ChannelPermutation;
use crate::constants::{DEFAULT_BLOCK_HEIGHT, MAX_CHANNEL_COUNT, SHORT_BLOCK_HEIGHT};
use crate::engine::{EngineConfig, MessageHandler, SizParams};
use crate::error::HtError;
use crate::header::{DataWindow, ImageHeader};

/// Byte order of the samples exchanged with the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Host byte order.
    Native,
    /// Little-endian, as stored in files.
    Xdr,
}

/// Compresses and decompresses one scanline block at a time.
///
/// The slices returned by [`compress`](Self::compress) and
/// [`uncompress`](Self::uncompress) borrow the compressor's own buffers and are
/// invalidated by the next call.
pub trait BlockCompressor: Send {
    /// Rows per block requested from the container.
    fn num_scan_lines(&self) -> usize;

    fn format(&self) -> SampleFormat;

    /// Encode the block starting at absolute row `start_row`.
    fn compress(&mut self, input: &[u8], start_row: i32) -> Result<&[u8], HtError>;

    /// Decode the block starting at absolute row `start_row`.
    fn uncompress(&mut self, input: &[u8], start_row: i32) -> Result<&[u8], HtError>;
}

/// Per-instance configuration shared by both backends.
#[derive(Debug, Clone, Default)]
pub struct CompressorConfig {
    block_height: usize,
    engine: EngineConfig,
}

impl CompressorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows per block; 0 selects the default of 16000.
    pub fn with_block_height(mut self, block_height: usize) -> Self {
        self.block_height = block_height;
        self
    }

    pub fn set_message_handler(&mut self, handler: Arc<dyn MessageHandler>) {
        self.engine.set_message_handler(handler);
    }

    pub fn with_message_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.set_message_handler(handler);
        self
    }

    /// Block height after applying the default.
    pub fn block_height(&self) -> usize {
        if self.block_height > 0 {
            self.block_height
        } else {
            DEFAULT_BLOCK_HEIGHT
        }
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }
}

/// Block geometry fixed at construction.
#[derive(Debug, Clone)]
pub struct BlockGeometry {
    data_window: DataWindow,
    width: usize,
    channel_count: usize,
    configured_height: usize,
    block_height: usize,
}

impl BlockGeometry {
    pub fn new(header: &ImageHeader, configured_height: usize) -> Result<Self, HtError> {
        let channel_count = header.channels.len();
        if channel_count == 0 {
            return Err(HtError::EmptyChannelSet);
        }
        if channel_count > MAX_CHANNEL_COUNT {
            return Err(HtError::TooManyChannels {
                count: channel_count,
                max: MAX_CHANNEL_COUNT,
            });
        }

        let data_window = header.data_window;
        Ok(Self {
            data_window,
            width: data_window.width(),
            channel_count,
            configured_height,
            block_height: data_window.height().min(configured_height),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn configured_height(&self) -> usize {
        self.configured_height
    }

    /// Rows of the largest block this image produces.
    pub fn block_height(&self) -> usize {
        self.block_height
    }

    /// Rows of the block starting at `start_row`, clamped to the data window.
    pub fn rows(&self, start_row: i32) -> Result<usize, HtError> {
        let dw = &self.data_window;
        if start_row < dw.min_y || start_row > dw.max_y {
            return Err(HtError::RowOutOfRange {
                row: start_row,
                min_y: dw.min_y,
                max_y: dw.max_y,
            });
        }
        let remaining = (dw.max_y as i64 - start_row as i64 + 1) as usize;
        Ok(remaining.min(self.configured_height))
    }

    /// Bytes of a block of `rows` rows.
    pub fn block_size(&self, rows: usize) -> usize {
        self.channel_count * 2 * rows * self.width
    }

    /// Validate an uncompressed input block and return its row count.
    pub fn check_input(&self, input: &[u8], start_row: i32) -> Result<usize, HtError> {
        let rows = self.rows(start_row)?;
        let expected = self.block_size(rows);
        if input.len() != expected {
            return Err(HtError::BufferSizeMismatch {
                expected,
                actual: input.len(),
            });
        }
        Ok(rows)
    }

    /// Compare a decoded SIZ with the block expected at this position.
    pub fn check_decoded(&self, siz: &SizParams, rows: usize) -> Result<(), HtError> {
        let (width, height, components) = (siz.width as usize, siz.height as usize, siz.num_components());
        if width != self.width || height != rows || components != self.channel_count {
            return Err(HtError::GeometryMismatch {
                expected_width: self.width,
                expected_height: rows,
                expected_components: self.channel_count,
                actual_width: width,
                actual_height: height,
                actual_components: components,
            });
        }
        Ok(())
    }

    /// Byte offset of row `y` of `file_channel` inside a block.
    #[inline]
    pub fn line_offset(&self, y: usize, file_channel: usize) -> usize {
        (y * self.channel_count + file_channel) * self.width * 2
    }
}

/// The HT compression variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Software backend, 16000-line blocks.
    Ht,
    /// Software backend, 256-line blocks.
    Ht256,
    /// Proprietary backend, 16000-line blocks.
    Htk,
    /// Proprietary backend, 256-line blocks.
    Htk256,
}

impl Compression {
    pub const ALL: [Compression; 4] = [Self::Ht, Self::Ht256, Self::Htk, Self::Htk256];

    pub fn scan_lines(self) -> usize {
        match self {
            Self::Ht | Self::Htk => DEFAULT_BLOCK_HEIGHT,
            Self::Ht256 | Self::Htk256 => SHORT_BLOCK_HEIGHT,
        }
    }

    pub fn is_proprietary(self) -> bool {
        matches!(self, Self::Htk | Self::Htk256)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ht => "ht",
            Self::Ht256 => "ht256",
            Self::Htk => "htk",
            Self::Htk256 => "htk256",
        }
    }

    /// Compressor for `header` with this variant's block height.
    pub fn new_compressor(
        self,
        header: &ImageHeader,
        max_scan_line_size: usize,
    ) -> Result<Box<dyn BlockCompressor>, HtError> {
        let config = CompressorConfig::new().with_block_height(self.scan_lines());
        self.new_compressor_with(header, max_scan_line_size, config)
    }

    pub fn new_compressor_with(
        self,
        header: &ImageHeader,
        max_scan_line_size: usize,
        config: CompressorConfig,
    ) -> Result<Box<dyn BlockCompressor>, HtError> {
        if self.is_proprietary() {
            Ok(Box::new(ProprietaryCompressor::new(header, max_scan_line_size, config)?))
        } else {
            Ok(Box::new(SoftwareCompressor::new(header, max_scan_line_size, config)?))
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compression {
    type Err = HtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| HtError::UnknownCompression(s.to_string()))
    }
}

/// Compressor for the compression declared in `header`.
pub fn new_compressor(
    header: &ImageHeader,
    max_scan_line_size: usize,
) -> Result<Box<dyn BlockCompressor>, HtError> {
    header.compression.new_compressor(header, max_scan_line_size)
}

/// Permutation and geometry shared by both backends.
pub(crate) fn block_layout(
    header: &ImageHeader,
    config: &CompressorConfig,
) -> Result<(ChannelPermutation, BlockGeometry), HtError> {
    let permutation = ChannelPermutation::build(&header.channels)?;
    let geometry = BlockGeometry::new(header, config.block_height())?;
    Ok((permutation, geometry))
}
