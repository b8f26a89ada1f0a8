//! Storage decisions above the block compressor.
//!
//! A block is only stored compressed when the codestream is strictly smaller
//! than the raw samples. On read, a payload exactly as long as the raw block is
//! taken to be raw.

use crate::compressor::BlockCompressor;
use crate::error::HtError;
use crate::header::ImageHeader;

/// Compress `raw`, falling back to `raw` itself when it would not shrink.
pub fn compress_chunk<'a, C: BlockCompressor + ?Sized>(
    compressor: &'a mut C,
    raw: &'a [u8],
    start_row: i32,
) -> Result<&'a [u8], HtError> {
    let encoded = compressor.compress(raw, start_row)?;
    if encoded.len() < raw.len() {
        Ok(encoded)
    } else {
        log::debug!(
            "block at row {start_row} stored raw ({} >= {} bytes)",
            encoded.len(),
            raw.len()
        );
        Ok(raw)
    }
}

/// Inverse of [`compress_chunk`]; `expected_len` is the raw block size.
pub fn uncompress_chunk<'a, C: BlockCompressor + ?Sized>(
    compressor: &'a mut C,
    data: &'a [u8],
    start_row: i32,
    expected_len: usize,
) -> Result<&'a [u8], HtError> {
    if data.len() == expected_len {
        return Ok(data);
    }
    let decoded = compressor.uncompress(data, start_row)?;
    if decoded.len() != expected_len {
        return Err(HtError::BufferSizeMismatch {
            expected: expected_len,
            actual: decoded.len(),
        });
    }
    Ok(decoded)
}

/// One scanline block of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Absolute first row.
    pub start_row: i32,
    pub rows: usize,
    /// Byte range of the block inside the full image buffer.
    pub offset: usize,
    pub len: usize,
}

/// Walks the data window in blocks of `block_height` rows.
#[derive(Debug, Clone)]
pub struct BlockIter {
    next_row: i64,
    max_y: i64,
    block_height: usize,
    row_size: usize,
    offset: usize,
}

impl BlockIter {
    pub fn new(header: &ImageHeader, block_height: usize) -> Self {
        let dw = header.data_window;
        Self {
            next_row: dw.min_y as i64,
            max_y: dw.max_y as i64,
            block_height: block_height.max(1),
            row_size: header.scan_line_size(),
            offset: 0,
        }
    }
}

impl Iterator for BlockIter {
    type Item = BlockSpan;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row > self.max_y {
            return None;
        }
        let rows = ((self.max_y - self.next_row + 1) as usize).min(self.block_height);
        let span = BlockSpan {
            start_row: self.next_row as i32,
            rows,
            offset: self.offset,
            len: rows * self.row_size,
        };
        self.next_row += rows as i64;
        self.offset += span.len;
        Some(span)
    }
}

/// A compressed image: one payload per block, raw or codestream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedImage {
    pub chunks: Vec<Vec<u8>>,
}

impl CompressedImage {
    pub fn total_size(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Serialize as a chunk count followed by length-prefixed payloads, all
    /// little-endian u32.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HtError> {
        let mut out = Vec::with_capacity(4 + 4 * self.chunks.len() + self.total_size());
        let count = u32::try_from(self.chunks.len()).map_err(|_| HtError::MalformedChunkList)?;
        out.extend_from_slice(&count.to_le_bytes());
        for chunk in &self.chunks {
            let len = u32::try_from(chunk.len()).map_err(|_| HtError::MalformedChunkList)?;
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(chunk);
        }
        Ok(out)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, HtError> {
        fn take<'d>(data: &mut &'d [u8], n: usize) -> Result<&'d [u8], HtError> {
            if data.len() < n {
                return Err(HtError::MalformedChunkList);
            }
            let (head, tail) = data.split_at(n);
            *data = tail;
            Ok(head)
        }
        fn take_u32(data: &mut &[u8]) -> Result<usize, HtError> {
            let b = take(data, 4)?;
            Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
        }

        let mut rest = data;
        let count = take_u32(&mut rest)?;
        let mut chunks = Vec::new();
        for _ in 0..count {
            let len = take_u32(&mut rest)?;
            chunks.push(take(&mut rest, len)?.to_vec());
        }
        if !rest.is_empty() {
            return Err(HtError::MalformedChunkList);
        }
        Ok(Self { chunks })
    }
}

/// Split `samples` (the whole data window in block layout) into blocks and
/// compress each.
pub fn compress_image(
    compressor: &mut dyn BlockCompressor,
    header: &ImageHeader,
    samples: &[u8],
) -> Result<CompressedImage, HtError> {
    let expected = header.scan_line_size() * header.data_window.height();
    if samples.len() != expected {
        return Err(HtError::BufferSizeMismatch {
            expected,
            actual: samples.len(),
        });
    }

    let mut chunks = Vec::new();
    for span in BlockIter::new(header, compressor.num_scan_lines()) {
        let raw = &samples[span.offset..span.offset + span.len];
        chunks.push(compress_chunk(compressor, raw, span.start_row)?.to_vec());
    }
    Ok(CompressedImage { chunks })
}

/// Decode every block of `image` back into one buffer.
pub fn uncompress_image(
    compressor: &mut dyn BlockCompressor,
    header: &ImageHeader,
    image: &CompressedImage,
) -> Result<Vec<u8>, HtError> {
    let spans: Vec<BlockSpan> = BlockIter::new(header, compressor.num_scan_lines()).collect();
    if spans.len() != image.chunks.len() {
        return Err(HtError::BufferSizeMismatch {
            expected: spans.len(),
            actual: image.chunks.len(),
        });
    }

    let mut samples = Vec::with_capacity(header.scan_line_size() * header.data_window.height());
    for (span, chunk) in spans.iter().zip(&image.chunks) {
        samples.extend_from_slice(uncompress_chunk(compressor, chunk, span.start_row, span.len)?);
    }
    Ok(samples)
}
