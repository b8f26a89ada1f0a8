//! Line-exchange interface to the codestream engine.
//!
//! Lines travel in row-major order with components interleaved per row: row 0
//! of component 0, row 0 of component 1, ..., row 1 of component 0 and so on.
//! The compressor hands out one mutable line at a time and the caller fills it
//! before asking for the next one. The decompressor mirrors this with `pull`.

use super::header::{read_codestream, write_main_header, write_tile_part};
use super::message::EngineConfig;
use super::params::{CodestreamParams, SizParams};
use super::stream::ByteWriter;
use super::tile::{decode_tile, encode_tile};
use crate::error::HtError;

/// Position of the next line in the exchange order.
#[derive(Debug, Clone, Copy, Default)]
struct LineCursor {
    row: usize,
    component: usize,
}

impl LineCursor {
    fn advance(&mut self, components: usize) {
        self.component += 1;
        if self.component == components {
            self.component = 0;
            self.row += 1;
        }
    }
}

pub struct LineCompressor {
    params: CodestreamParams,
    config: EngineConfig,
    planes: Vec<Vec<i32>>,
    cursor: LineCursor,
}

impl LineCompressor {
    pub fn create(params: CodestreamParams, config: EngineConfig) -> Result<Self, HtError> {
        params.validate().map_err(|e| config.report(e))?;

        let samples = params.siz.width as usize * params.siz.height as usize;
        let planes = vec![vec![0; samples]; params.siz.num_components()];
        Ok(Self {
            params,
            config,
            planes,
            cursor: LineCursor::default(),
        })
    }

    pub fn params(&self) -> &CodestreamParams {
        &self.params
    }

    /// Append the main header to `out`.
    pub fn write_headers(&self, out: &mut Vec<u8>) {
        write_main_header(&self.params, &mut ByteWriter::new(out));
    }

    /// Hand out the next line to fill, along with its component index.
    pub fn exchange(&mut self) -> Result<(usize, &mut [i32]), HtError> {
        let width = self.params.siz.width as usize;
        let LineCursor { row, component } = self.cursor;
        if row >= self.params.siz.height as usize {
            return Err(self
                .config
                .report(HtError::EngineProtocol("more lines exchanged than the image holds")));
        }

        self.cursor.advance(self.params.siz.num_components());
        let line = &mut self.planes[component][row * width..(row + 1) * width];
        Ok((component, line))
    }

    /// Code every line and append the tile-part and EOC to `out`.
    pub fn flush(&mut self, out: &mut Vec<u8>) -> Result<(), HtError> {
        if self.cursor.row != self.params.siz.height as usize || self.cursor.component != 0 {
            return Err(self
                .config
                .report(HtError::EngineProtocol("flush before every line was exchanged")));
        }

        let body = encode_tile(&self.params, &mut self.planes).map_err(|e| self.config.report(e))?;
        write_tile_part(&body, &mut ByteWriter::new(out))
    }
}

pub struct LineDecompressor<'a> {
    params: CodestreamParams,
    config: EngineConfig,
    tile_data: &'a [u8],
    planes: Vec<Vec<i32>>,
    cursor: LineCursor,
}

impl<'a> LineDecompressor<'a> {
    /// Parse the main header of `data` without decoding the tile.
    pub fn read_headers(data: &'a [u8], config: EngineConfig) -> Result<Self, HtError> {
        let (params, tile_data) = read_codestream(data, &config).map_err(|e| config.report(e))?;
        Ok(Self {
            params,
            config,
            tile_data,
            planes: Vec::new(),
            cursor: LineCursor::default(),
        })
    }

    pub fn siz(&self) -> &SizParams {
        &self.params.siz
    }

    pub fn params(&self) -> &CodestreamParams {
        &self.params
    }

    /// Decode the tile so lines can be pulled.
    pub fn create(&mut self) -> Result<(), HtError> {
        self.planes = decode_tile(&self.params, self.tile_data).map_err(|e| self.config.report(e))?;
        self.cursor = LineCursor::default();
        Ok(())
    }

    /// Next decoded line and its component index.
    pub fn pull(&mut self) -> Result<(usize, &[i32]), HtError> {
        let width = self.params.siz.width as usize;
        let LineCursor { row, component } = self.cursor;
        if self.planes.is_empty() || row >= self.params.siz.height as usize {
            return Err(self
                .config
                .report(HtError::EngineProtocol("no decoded line left to pull")));
        }

        self.cursor.advance(self.params.siz.num_components());
        Ok((component, &self.planes[component][row * width..(row + 1) * width]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::params::{CodeBlockSize, ProgressionOrder};

    fn params(width: u32, height: u32, components: usize) -> CodestreamParams {
        let mut params = CodestreamParams::default();
        params.siz.set_image_extent(width, height);
        params.siz.set_num_components(components);
        for c in 0..components {
            params.siz.set_component(c, 16, true);
        }
        params.cod.code_block = CodeBlockSize::new(128, 32).unwrap();
        params.cod.set_progression_order(ProgressionOrder::Cprl);
        params
    }

    #[test]
    fn test_line_roundtrip() {
        let (width, height, components) = (57usize, 9usize, 3usize);
        let value = |row: usize, c: usize, x: usize| ((row * 31 + c * 1000 + x * 7) % 600) as i32 - 300;

        let mut compressor =
            LineCompressor::create(params(width as u32, height as u32, components), EngineConfig::new())
                .unwrap();
        let mut codestream = Vec::new();
        compressor.write_headers(&mut codestream);
        for row in 0..height {
            for c in 0..components {
                let (component, line) = compressor.exchange().unwrap();
                assert_eq!(component, c);
                for (x, v) in line.iter_mut().enumerate() {
                    *v = value(row, c, x);
                }
            }
        }
        assert!(compressor.exchange().is_err());
        compressor.flush(&mut codestream).unwrap();

        let mut decompressor = LineDecompressor::read_headers(&codestream, EngineConfig::new()).unwrap();
        assert_eq!(decompressor.siz().width, width as u32);
        assert!(decompressor.pull().is_err());
        decompressor.create().unwrap();
        for row in 0..height {
            for c in 0..components {
                let (component, line) = decompressor.pull().unwrap();
                assert_eq!(component, c);
                let expected: Vec<i32> = (0..width).map(|x| value(row, c, x)).collect();
                assert_eq!(line, &expected[..]);
            }
        }
        assert!(decompressor.pull().is_err());
    }

    #[test]
    fn test_early_flush_is_rejected() {
        let mut compressor = LineCompressor::create(params(8, 2, 1), EngineConfig::new()).unwrap();
        compressor.exchange().unwrap();
        assert!(matches!(
            compressor.flush(&mut Vec::new()),
            Err(HtError::EngineProtocol(_))
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut bad = params(8, 2, 2);
        bad.cod.set_color_transform(true);
        assert!(LineCompressor::create(bad, EngineConfig::new()).is_err());
    }
}
