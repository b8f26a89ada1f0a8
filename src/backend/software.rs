use super::{block_params, output_capacity};
use crate::buffer_arena::{BufferArena, sample_at};
use crate::channel_map::ChannelPermutation;
use crate::compressor::{BlockCompressor, BlockGeometry, CompressorConfig, SampleFormat, block_layout};
use crate::constants::{CODE_BLOCK_HEIGHT, CODE_BLOCK_WIDTH};
use crate::engine::{CodeBlockSize, LineCompressor, LineDecompressor, ProgressionOrder};
use crate::error::HtError;
use crate::header::ImageHeader;
use crate::sign_magnitude;

/// Backend driving the line-exchange engine.
///
/// Samples are folded to sign-magnitude here, one line at a time, and the
/// codestream declares plain signed 16-bit components.
#[derive(Debug)]
pub struct SoftwareCompressor {
    permutation: ChannelPermutation,
    geometry: BlockGeometry,
    code_block: CodeBlockSize,
    arena: BufferArena,
    config: CompressorConfig,
}

impl SoftwareCompressor {
    pub fn new(
        header: &ImageHeader,
        max_scan_line_size: usize,
        config: CompressorConfig,
    ) -> Result<Self, HtError> {
        let (permutation, geometry) = block_layout(header, &config)?;
        let code_block = CodeBlockSize::new(CODE_BLOCK_WIDTH, CODE_BLOCK_HEIGHT)?;
        let arena = BufferArena::new(
            output_capacity(&geometry, max_scan_line_size),
            geometry.block_size(geometry.block_height()),
        );

        Ok(Self {
            permutation,
            geometry,
            code_block,
            arena,
            config,
        })
    }
}

impl BlockCompressor for SoftwareCompressor {
    fn num_scan_lines(&self) -> usize {
        self.geometry.configured_height()
    }

    fn format(&self) -> SampleFormat {
        SampleFormat::Native
    }

    fn compress(&mut self, input: &[u8], start_row: i32) -> Result<&[u8], HtError> {
        let rows = self.geometry.check_input(input, start_row)?;
        let width = self.geometry.width();
        let components = self.geometry.channel_count();
        let params = block_params(
            &self.geometry,
            &self.permutation,
            rows,
            self.code_block,
            ProgressionOrder::Cprl,
        );
        log::debug!(
            "HT encode: rows {start_row}..{}, {width} wide, {components} components, rgb={}",
            start_row as i64 + rows as i64,
            self.permutation.is_rgb()
        );

        let mut encoder = LineCompressor::create(params, self.config.engine().clone())?;
        let out = self.arena.reset_output();
        encoder.write_headers(out);

        for y in 0..rows {
            for _ in 0..components {
                let (c, line) = encoder.exchange()?;
                let first = self.geometry.line_offset(y, self.permutation.file_channel(c)) / 2;
                for (x, v) in line.iter_mut().enumerate() {
                    *v = sign_magnitude::encode(sample_at(input, first + x));
                }
            }
        }
        encoder.flush(out)?;

        Ok(self.arena.output())
    }

    fn uncompress(&mut self, input: &[u8], start_row: i32) -> Result<&[u8], HtError> {
        let rows = self.geometry.rows(start_row)?;
        let width = self.geometry.width();
        let components = self.geometry.channel_count();

        let mut decoder = LineDecompressor::read_headers(input, self.config.engine().clone())?;
        self.geometry.check_decoded(decoder.siz(), rows)?;
        // Streams carrying the NLT come back already unfolded.
        let unfold = !decoder.params().engine_sign_magnitude();
        decoder.create()?;

        let size = self.geometry.block_size(rows);
        let scratch = self.arena.scratch_mut(size);
        for y in 0..rows {
            for _ in 0..components {
                let (c, line) = decoder.pull()?;
                let offset = self.geometry.line_offset(y, self.permutation.file_channel(c));
                let dst = &mut scratch[offset..offset + 2 * width];
                for (bytes, &v) in dst.chunks_exact_mut(2).zip(line) {
                    let sample = i16::try_from(v).map_err(|_| {
                        self.config
                            .engine()
                            .report(HtError::Codestream("decoded sample out of range"))
                    })?;
                    let sample = if unfold { sign_magnitude::decode(sample as i32) } else { sample };
                    bytes.copy_from_slice(&sample.to_ne_bytes());
                }
            }
        }

        Ok(self.arena.scratch(size))
    }
}
