use super::{block_params, output_capacity};
use crate::buffer_arena::{BufferArena, load_samples, store_samples};
use crate::channel_map::ChannelPermutation;
use crate::compressor::{BlockCompressor, BlockGeometry, CompressorConfig, SampleFormat, block_layout};
use crate::constants::{CODE_BLOCK_HEIGHT, CODE_BLOCK_WIDTH};
use crate::engine::{
    CodeBlockSize, NltType, ProgressionOrder, StripeCompressor, StripeDecompressor, StripeLayout,
};
use crate::error::HtError;
use crate::header::ImageHeader;
use crate::sign_magnitude;

/// Backend driving the stripe engine.
///
/// The whole block goes through as one stripe per component, read in place
/// from the container layout. The codestream carries a sign-magnitude NLT
/// so the engine performs the fold.
#[derive(Debug)]
pub struct ProprietaryCompressor {
    permutation: ChannelPermutation,
    geometry: BlockGeometry,
    code_block: CodeBlockSize,
    /// Offset of each component's first sample inside a block.
    sample_offsets: Vec<usize>,
    row_gaps: Vec<usize>,
    arena: BufferArena,
    config: CompressorConfig,
}

impl ProprietaryCompressor {
    pub fn new(
        header: &ImageHeader,
        max_scan_line_size: usize,
        config: CompressorConfig,
    ) -> Result<Self, HtError> {
        let (permutation, geometry) = block_layout(header, &config)?;

        // Declared as {height, width}.
        let (cb_height, cb_width) = (CODE_BLOCK_HEIGHT, CODE_BLOCK_WIDTH);
        let code_block = CodeBlockSize::new(cb_width, cb_height)?;

        let width = geometry.width();
        let components = geometry.channel_count();
        let sample_offsets = permutation
            .component_to_file()
            .iter()
            .map(|&f| f * width)
            .collect();
        let row_gaps = vec![components * width; components];

        let arena = BufferArena::new(
            output_capacity(&geometry, max_scan_line_size),
            geometry.block_size(geometry.block_height()),
        );

        Ok(Self {
            permutation,
            geometry,
            code_block,
            sample_offsets,
            row_gaps,
            arena,
            config,
        })
    }
}

impl BlockCompressor for ProprietaryCompressor {
    fn num_scan_lines(&self) -> usize {
        self.geometry.configured_height()
    }

    fn format(&self) -> SampleFormat {
        SampleFormat::Native
    }

    fn compress(&mut self, input: &[u8], start_row: i32) -> Result<&[u8], HtError> {
        let rows = self.geometry.check_input(input, start_row)?;
        let components = self.geometry.channel_count();
        let mut params = block_params(
            &self.geometry,
            &self.permutation,
            rows,
            self.code_block,
            ProgressionOrder::Rpcl,
        );
        params.nlt = Some(NltType::SignMagnitude);
        log::debug!(
            "HTK encode: rows {start_row}..{}, {} wide, {components} components, rgb={}",
            start_row as i64 + rows as i64,
            self.geometry.width(),
            self.permutation.is_rgb()
        );

        let mut encoder = StripeCompressor::start(params, self.config.engine().clone())?;
        let samples = self.arena.staging_mut(input.len() / 2);
        load_samples(input, samples);
        let heights = vec![rows; components];
        encoder.push_stripe(
            samples,
            StripeLayout {
                heights: &heights,
                sample_offsets: &self.sample_offsets,
                row_gaps: &self.row_gaps,
            },
        )?;
        encoder.finish(self.arena.reset_output())?;

        Ok(self.arena.output())
    }

    fn uncompress(&mut self, input: &[u8], start_row: i32) -> Result<&[u8], HtError> {
        let rows = self.geometry.rows(start_row)?;
        let components = self.geometry.channel_count();

        let mut decoder = StripeDecompressor::open(input, self.config.engine().clone())?;
        self.geometry.check_decoded(&decoder.params().siz, rows)?;
        // Streams without the NLT hold folded samples.
        let unfold = !decoder.params().engine_sign_magnitude();
        decoder.start()?;

        let size = self.geometry.block_size(rows);
        let samples = self.arena.staging_mut(size / 2);
        let heights = vec![rows; components];
        decoder.pull_stripe(
            samples,
            StripeLayout {
                heights: &heights,
                sample_offsets: &self.sample_offsets,
                row_gaps: &self.row_gaps,
            },
        )?;
        decoder.finish();
        if unfold {
            for s in samples.iter_mut() {
                *s = sign_magnitude::decode(*s as i32);
            }
        }

        let (scratch, samples) = self.arena.scratch_and_staging(size);
        store_samples(samples, scratch);

        Ok(self.arena.scratch(size))
    }
}
