//! Main header and tile-part framing.
//!
//! A codestream produced here is `SOC SIZ COD QCD [NLT] SOT SOD <tile> EOC`
//! with exactly one tile covering the image. The tile body uses this crate's
//! own code-block coding, so the streams only round-trip through this engine.

use super::markers::MarkerCode;
use super::message::EngineConfig;
use super::params::{
    CodParams, CodeBlockSize, CodestreamParams, ComponentInfo, NltType, ProgressionOrder,
    SizParams,
};
use super::stream::{ByteReader, ByteWriter};
use crate::constants::SEGMENT_LENGTH_SIZE;
use crate::error::HtError;

/// Baseline capabilities; code-blocks are Rice coded, not HT block coded.
const RSIZ_BASELINE: u16 = 0;
/// No code-block style flags.
const CBLK_STYLE_NONE: u8 = 0;
/// Wavelet kernel id of the reversible 5/3 filter.
const TRANSFORM_5_3: u8 = 1;
const GUARD_BITS: u8 = 1;
/// Applies the NLT segment to every component.
const NLT_ALL_COMPONENTS: u16 = 0xFFFF;
/// SOT marker plus its fixed ten byte segment.
const SOT_SIZE: usize = 12;
const SOD_SIZE: usize = 2;

pub fn write_main_header(params: &CodestreamParams, writer: &mut ByteWriter) {
    writer.write_marker(MarkerCode::StartOfCodestream);
    write_siz(&params.siz, writer);
    write_cod(&params.cod, writer);
    write_qcd(params, writer);
    if let Some(nlt) = params.nlt {
        write_nlt(nlt, params.siz.components[0], writer);
    }
}

fn write_siz(siz: &SizParams, writer: &mut ByteWriter) {
    writer.write_marker(MarkerCode::ImageAndTileSize);

    // Length: 2 (Rsiz) + 4(W) + 4(H) + 4(OX) + 4(OY) + 4(TW) + 4(TH) + 4(TOX) + 4(TOY) + 2(C) + 3*C
    let count = siz.components.len() as u16;
    writer.write_u16(38 + 3 * count);
    writer.write_u16(RSIZ_BASELINE);
    writer.write_u32(siz.width);
    writer.write_u32(siz.height);
    writer.write_u32(0); // OffX
    writer.write_u32(0); // OffY
    writer.write_u32(siz.width); // single tile
    writer.write_u32(siz.height);
    writer.write_u32(0); // TileOffX
    writer.write_u32(0); // TileOffY
    writer.write_u16(count);
    for component in &siz.components {
        writer.write_byte(component.to_ssiz());
        writer.write_byte(1);
        writer.write_byte(1);
    }
}

fn write_cod(cod: &CodParams, writer: &mut ByteWriter) {
    writer.write_marker(MarkerCode::CodingStyleDefault);
    // Scod (1) + SGcod (4) + SPcod (5)
    writer.write_u16(12);
    writer.write_byte(0);

    writer.write_byte(cod.progression_order.into());
    writer.write_u16(1); // layers
    writer.write_byte(cod.color_transform as u8);

    writer.write_byte(cod.decomposition_levels);
    writer.write_byte(cod.code_block.width_exp - 2);
    writer.write_byte(cod.code_block.height_exp - 2);
    writer.write_byte(CBLK_STYLE_NONE);
    writer.write_byte(TRANSFORM_5_3);
}

fn write_qcd(params: &CodestreamParams, writer: &mut ByteWriter) {
    writer.write_marker(MarkerCode::QuantizationDefault);

    let levels = params.cod.decomposition_levels as usize;
    let subbands = 1 + 3 * levels;
    writer.write_u16((SEGMENT_LENGTH_SIZE + 1 + subbands) as u16);
    writer.write_byte(GUARD_BITS << 5);

    // Reversible: exponent only, the nominal range of each sub-band.
    let depth = params.siz.components[0].precision;
    let colour_gain = params.cod.color_transform as u8;
    for i in 0..subbands {
        let gain = match i {
            0 => 0,
            _ if (i - 1) % 3 == 2 => 2,
            _ => 1,
        };
        writer.write_byte((depth + colour_gain + gain) << 3);
    }
}

fn write_nlt(nlt: NltType, component: ComponentInfo, writer: &mut ByteWriter) {
    writer.write_marker(MarkerCode::NonLinearTransform);
    writer.write_u16(6);
    writer.write_u16(NLT_ALL_COMPONENTS);
    writer.write_byte(component.to_ssiz());
    writer.write_byte(nlt.into());
}

/// Append the tile-part carrying `tile_data` and close the codestream.
pub fn write_tile_part(tile_data: &[u8], writer: &mut ByteWriter) -> Result<(), HtError> {
    let psot = SOT_SIZE + SOD_SIZE + tile_data.len();
    let psot = u32::try_from(psot).map_err(|_| HtError::EngineProtocol("tile-part too long"))?;

    writer.write_marker(MarkerCode::StartOfTile);
    writer.write_u16(10);
    writer.write_u16(0); // tile index
    writer.write_u32(psot);
    writer.write_byte(0); // TPsot
    writer.write_byte(1); // TNsot
    writer.write_marker(MarkerCode::StartOfData);
    writer.write_bytes(tile_data);
    writer.write_marker(MarkerCode::EndOfCodestream);
    Ok(())
}

/// Parse the main header and locate the tile data.
pub fn read_codestream<'a>(
    data: &'a [u8],
    config: &EngineConfig,
) -> Result<(CodestreamParams, &'a [u8]), HtError> {
    let mut reader = ByteReader::new(data);
    if reader.read_marker_byte()? != u8::from(MarkerCode::StartOfCodestream) {
        return Err(HtError::Codestream("start of codestream marker not found"));
    }

    let mut siz = None;
    let mut cod = None;
    let mut nlt = None;

    loop {
        let code = reader.read_marker_byte()?;
        match MarkerCode::try_from(code) {
            Ok(MarkerCode::ImageAndTileSize) => siz = Some(read_siz(&mut reader)?),
            Ok(MarkerCode::CodingStyleDefault) => cod = Some(read_cod(&mut reader)?),
            Ok(MarkerCode::NonLinearTransform) => nlt = Some(read_nlt(&mut reader)?),
            Ok(MarkerCode::StartOfTile) => break,
            Ok(marker) if !marker.has_segment() => {
                return Err(HtError::Codestream("unexpected marker in main header"));
            }
            Ok(_) => skip_segment(&mut reader)?,
            Err(_) => {
                config.warn(&format!("skipping unknown marker segment 0xFF{code:02X}"));
                skip_segment(&mut reader)?;
            }
        }
    }

    let siz = siz.ok_or(HtError::Codestream("missing SIZ segment"))?;
    let cod = cod.ok_or(HtError::Codestream("missing COD segment"))?;

    // SOT segment; the marker itself is already consumed.
    let sot_start = reader.position() - 2;
    if reader.read_u16()? != 10 {
        return Err(HtError::Codestream("bad SOT segment length"));
    }
    if reader.read_u16()? != 0 {
        return Err(HtError::Codestream("only tile 0 is supported"));
    }
    let psot = reader.read_u32()? as usize;
    let _tile_part_index = reader.read_u8()?;
    let _tile_parts = reader.read_u8()?;
    if reader.read_marker_byte()? != u8::from(MarkerCode::StartOfData) {
        return Err(HtError::Codestream("start of data marker not found"));
    }

    let tile_len = if psot == 0 {
        // Tile runs up to the EOC marker.
        reader
            .remaining_data()
            .len()
            .checked_sub(2)
            .ok_or(HtError::Codestream("unexpected end of data"))?
    } else {
        psot.checked_sub(reader.position() - sot_start)
            .ok_or(HtError::Codestream("bad tile-part length"))?
    };
    let tile_data = reader.read_bytes(tile_len)?;

    if reader.read_marker_byte()? != u8::from(MarkerCode::EndOfCodestream) {
        return Err(HtError::Codestream("end of codestream marker not found"));
    }
    if !reader.remaining_data().is_empty() {
        config.warn("ignoring data after end of codestream");
    }

    let params = CodestreamParams { siz, cod, nlt };
    params.validate()?;
    Ok((params, tile_data))
}

fn skip_segment(reader: &mut ByteReader) -> Result<(), HtError> {
    let len = reader.read_u16()? as usize;
    if len < SEGMENT_LENGTH_SIZE {
        return Err(HtError::Codestream("invalid marker segment size"));
    }
    reader.skip(len - SEGMENT_LENGTH_SIZE)
}

fn read_siz(reader: &mut ByteReader) -> Result<SizParams, HtError> {
    let len = reader.read_u16()? as usize;
    let _rsiz = reader.read_u16()?;
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;
    let x_origin = reader.read_u32()?;
    let y_origin = reader.read_u32()?;
    let tile_width = reader.read_u32()?;
    let tile_height = reader.read_u32()?;
    let tile_x_origin = reader.read_u32()?;
    let tile_y_origin = reader.read_u32()?;
    let count = reader.read_u16()? as usize;

    if len != 38 + 3 * count {
        return Err(HtError::Codestream("invalid SIZ segment size"));
    }
    if width <= x_origin || height <= y_origin {
        return Err(HtError::Codestream("empty image area"));
    }
    let width = width - x_origin;
    let height = height - y_origin;
    if tile_x_origin != 0 || tile_y_origin != 0 || tile_width < width || tile_height < height {
        return Err(HtError::Codestream("only a single tile is supported"));
    }

    let mut components = Vec::with_capacity(count);
    for _ in 0..count {
        let ssiz = reader.read_u8()?;
        let dx = reader.read_u8()?;
        let dy = reader.read_u8()?;
        if dx != 1 || dy != 1 {
            return Err(HtError::Codestream("subsampled components are not supported"));
        }
        components.push(ComponentInfo::from_ssiz(ssiz));
    }

    Ok(SizParams {
        width,
        height,
        components,
    })
}

fn read_cod(reader: &mut ByteReader) -> Result<CodParams, HtError> {
    let len = reader.read_u16()?;
    if len != 12 {
        return Err(HtError::Codestream("invalid COD segment size"));
    }
    let _scod = reader.read_u8()?;
    let progression_order = ProgressionOrder::try_from(reader.read_u8()?)
        .map_err(|_| HtError::Codestream("unknown progression order"))?;
    if reader.read_u16()? != 1 {
        return Err(HtError::Codestream("only one quality layer is supported"));
    }
    let color_transform = match reader.read_u8()? {
        0 => false,
        1 => true,
        _ => return Err(HtError::Codestream("unknown multiple component transform")),
    };
    let decomposition_levels = reader.read_u8()?;
    let width_exp = reader.read_u8()?.saturating_add(2);
    let height_exp = reader.read_u8()?.saturating_add(2);
    let _style = reader.read_u8()?;
    let reversible = reader.read_u8()? == TRANSFORM_5_3;

    let code_block = CodeBlockSize::new(1u32 << width_exp.min(31), 1u32 << height_exp.min(31))
        .map_err(|_| HtError::Codestream("invalid code-block size"))?;

    Ok(CodParams {
        progression_order,
        color_transform,
        decomposition_levels,
        code_block,
        reversible,
    })
}

fn read_nlt(reader: &mut ByteReader) -> Result<NltType, HtError> {
    if reader.read_u16()? != 6 {
        return Err(HtError::Codestream("invalid NLT segment size"));
    }
    if reader.read_u16()? != NLT_ALL_COMPONENTS {
        return Err(HtError::Codestream("per-component NLT is not supported"));
    }
    let _bit_depth = reader.read_u8()?;
    NltType::try_from(reader.read_u8()?).map_err(|_| HtError::Codestream("unknown NLT type"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> CodestreamParams {
        let mut params = CodestreamParams::default();
        params.siz.set_image_extent(1371, 31);
        params.siz.set_num_components(5);
        for c in 0..5 {
            params.siz.set_component(c, 16, true);
        }
        params.cod.set_color_transform(true);
        params.cod.set_progression_order(ProgressionOrder::Rpcl);
        params.cod.code_block = CodeBlockSize::new(128, 32).unwrap();
        params.nlt = Some(NltType::SignMagnitude);
        params
    }

    #[test]
    fn test_header_roundtrip() {
        let params = sample_params();
        let mut buffer = Vec::new();
        let mut writer = ByteWriter::new(&mut buffer);
        write_main_header(&params, &mut writer);
        write_tile_part(&[1, 2, 3], &mut writer).unwrap();

        assert_eq!(&buffer[..4], &[0xFF, 0x4F, 0xFF, 0x51]);
        assert_eq!(&buffer[buffer.len() - 2..], &[0xFF, 0xD9]);

        let (parsed, tile) = read_codestream(&buffer, &EngineConfig::new()).unwrap();
        assert_eq!(parsed, params);
        assert_eq!(tile, &[1, 2, 3]);
    }

    #[test]
    fn test_unknown_segment_is_skipped() {
        let params = sample_params();
        let mut buffer = Vec::new();
        let mut writer = ByteWriter::new(&mut buffer);
        write_main_header(&params, &mut writer);
        // A capability-like segment the reader does not know.
        writer.write_bytes(&[0xFF, 0x50, 0x00, 0x04, 0xAB, 0xCD]);
        write_tile_part(&[], &mut writer).unwrap();

        let (parsed, tile) = read_codestream(&buffer, &EngineConfig::new()).unwrap();
        assert_eq!(parsed.siz.width, 1371);
        assert!(tile.is_empty());
    }

    #[test]
    fn test_header_declares_no_ht_capabilities() {
        let mut buffer = Vec::new();
        write_main_header(&sample_params(), &mut ByteWriter::new(&mut buffer));
        // Rsiz, then the code-block style byte of COD.
        let cod = 4 + 38 + 3 * 5;
        assert_eq!(&buffer[6..8], &[0, 0]);
        assert_eq!(&buffer[cod..cod + 2], &[0xFF, 0x52]);
        assert_eq!(buffer[cod + 12], 0);
    }

    #[test]
    fn test_segmentless_marker_in_main_header() {
        let mut buffer = Vec::new();
        let mut writer = ByteWriter::new(&mut buffer);
        write_main_header(&sample_params(), &mut writer);
        writer.write_marker(MarkerCode::EndOfCodestream);

        assert_eq!(
            read_codestream(&buffer, &EngineConfig::new()),
            Err(HtError::Codestream("unexpected marker in main header"))
        );
    }

    #[test]
    fn test_truncated_stream_is_rejected() {
        let params = sample_params();
        let mut buffer = Vec::new();
        let mut writer = ByteWriter::new(&mut buffer);
        write_main_header(&params, &mut writer);
        write_tile_part(&[9; 16], &mut writer).unwrap();

        let cut = &buffer[..buffer.len() - 5];
        assert!(matches!(
            read_codestream(cut, &EngineConfig::new()),
            Err(HtError::Codestream(_))
        ));
        assert!(read_codestream(&buffer[2..], &EngineConfig::new()).is_err());
    }
}
