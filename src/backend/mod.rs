//! The two HT codec backends.
//!
//! Both produce codestreams with the same geometry and numeric domain, so a
//! block written by one can be read back by the other:
//!
//! - `software`: drives the line-exchange engine and folds samples itself.
//! - `proprietary`: drives the stripe engine and lets the engine's NLT fold.

mod proprietary;
mod software;

pub use proprietary::ProprietaryCompressor;
pub use software::SoftwareCompressor;

use crate::channel_map::ChannelPermutation;
use crate::compressor::BlockGeometry;
use crate::constants::{DECOMPOSITION_LEVELS, SAMPLE_BIT_DEPTH};
use crate::engine::{CodeBlockSize, CodestreamParams, ProgressionOrder};

/// Parameters common to both backends for a block of `rows` rows.
fn block_params(
    geometry: &BlockGeometry,
    permutation: &ChannelPermutation,
    rows: usize,
    code_block: CodeBlockSize,
    progression_order: ProgressionOrder,
) -> CodestreamParams {
    let components = geometry.channel_count();

    let mut params = CodestreamParams::default();
    params.siz.set_image_extent(geometry.width() as u32, rows as u32);
    params.siz.set_num_components(components);
    for c in 0..components {
        params.siz.set_component(c, SAMPLE_BIT_DEPTH, true);
    }
    params.cod.set_reversible(true);
    params.cod.set_color_transform(permutation.is_rgb());
    params.cod.set_num_decomposition(DECOMPOSITION_LEVELS);
    params.cod.set_code_block(code_block);
    params.cod.set_progression_order(progression_order);
    params
}

/// Output reservation: one block of scanlines, capped at the raw block size.
fn output_capacity(geometry: &BlockGeometry, max_scan_line_size: usize) -> usize {
    max_scan_line_size
        .saturating_mul(geometry.block_height())
        .min(geometry.block_size(geometry.block_height()))
}
