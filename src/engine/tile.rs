//! Tile body coding: point transforms, wavelet and code-block layout.
//!
//! The tile body is a sequence of packets, one per (component, resolution)
//! pair, laid out in the declared progression order. Inside a packet the
//! sub-bands come in HL, LH, HH order and the code-blocks of each sub-band in
//! raster order. Every code-block segment is preceded by its byte length as a
//! big-endian u32.

use super::block_coder::{decode_block, encode_block};
use super::color::{forward_nlt, forward_rct, inverse_nlt, inverse_rct};
use super::dwt::{BandRect, Dwt53, resolution_bands};
use super::params::CodestreamParams;
use super::stream::{ByteReader, ByteWriter};
use crate::error::HtError;

/// Packet visiting order for the declared progression.
fn packet_order(params: &CodestreamParams) -> Vec<(usize, usize)> {
    let components = params.siz.num_components();
    let resolutions = params.cod.decomposition_levels as usize + 1;

    if params.cod.progression_order.is_resolution_major() {
        (0..resolutions)
            .flat_map(|r| (0..components).map(move |c| (c, r)))
            .collect()
    } else {
        (0..components)
            .flat_map(|c| (0..resolutions).map(move |r| (c, r)))
            .collect()
    }
}

/// Code-blocks of one sub-band in raster order.
fn code_blocks(band: BandRect, params: &CodestreamParams) -> impl Iterator<Item = BandRect> {
    let cb_w = params.cod.code_block.width();
    let cb_h = params.cod.code_block.height();
    let cols = band.width.div_ceil(cb_w);
    let rows = band.height.div_ceil(cb_h);

    (0..rows).flat_map(move |by| {
        (0..cols).map(move |bx| BandRect {
            x0: band.x0 + bx * cb_w,
            y0: band.y0 + by * cb_h,
            width: cb_w.min(band.width - bx * cb_w),
            height: cb_h.min(band.height - by * cb_h),
        })
    })
}

/// Transform and code the component planes of one tile.
pub fn encode_tile(params: &CodestreamParams, planes: &mut [Vec<i32>]) -> Result<Vec<u8>, HtError> {
    let width = params.siz.width as usize;
    let height = params.siz.height as usize;
    let levels = params.cod.decomposition_levels;

    if planes.len() != params.siz.num_components()
        || planes.iter().any(|p| p.len() != width * height)
    {
        return Err(HtError::EngineProtocol("component planes do not match SIZ"));
    }

    if params.engine_sign_magnitude() {
        planes.iter_mut().for_each(|p| forward_nlt(p));
    }
    if params.cod.color_transform {
        forward_rct(planes);
    }
    for plane in planes.iter_mut() {
        Dwt53::forward_2d(plane, width, height, levels);
    }

    let mut body = Vec::new();
    let mut writer = ByteWriter::new(&mut body);
    for (c, r) in packet_order(params) {
        for band in resolution_bands(width, height, levels, r) {
            for block in code_blocks(band, params) {
                let segment = encode_block(&planes[c], width, block);
                let len = u32::try_from(segment.len())
                    .map_err(|_| HtError::EngineProtocol("code-block segment too long"))?;
                writer.write_u32(len);
                writer.write_bytes(&segment);
            }
        }
    }

    Ok(body)
}

/// Decode a tile body back into component planes.
pub fn decode_tile(params: &CodestreamParams, body: &[u8]) -> Result<Vec<Vec<i32>>, HtError> {
    let width = params.siz.width as usize;
    let height = params.siz.height as usize;
    let levels = params.cod.decomposition_levels;
    let samples = width
        .checked_mul(height)
        .ok_or(HtError::Codestream("image too large"))?;

    let mut planes = vec![vec![0i32; samples]; params.siz.num_components()];
    let mut reader = ByteReader::new(body);

    for (c, r) in packet_order(params) {
        for band in resolution_bands(width, height, levels, r) {
            for block in code_blocks(band, params) {
                let len = reader.read_u32()? as usize;
                let segment = reader.read_bytes(len)?;
                decode_block(segment, &mut planes[c], width, block)?;
            }
        }
    }
    if !reader.remaining_data().is_empty() {
        return Err(HtError::Codestream("trailing data in tile body"));
    }

    for plane in planes.iter_mut() {
        Dwt53::inverse_2d(plane, width, height, levels);
    }
    if params.cod.color_transform {
        inverse_rct(&mut planes);
    }
    if params.engine_sign_magnitude() {
        for plane in planes.iter_mut() {
            inverse_nlt(plane)?;
        }
    }

    Ok(planes)
}
