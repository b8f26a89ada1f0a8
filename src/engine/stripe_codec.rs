//! Stripe push/pull interface to the codestream engine.
//!
//! A stripe is a run of rows per component taken from one caller buffer.
//! Component `c` contributes `heights[c]` rows; sample `x` of row `y` of that
//! stripe lives at `sample_offsets[c] + y * row_gaps[c] + x`. Components may
//! advance at different paces but each must eventually cover the full image
//! height.

use super::header::{read_codestream, write_main_header, write_tile_part};
use super::message::EngineConfig;
use super::params::CodestreamParams;
use super::stream::ByteWriter;
use super::tile::{decode_tile, encode_tile};
use crate::error::HtError;

/// Layout of one stripe inside a caller buffer.
#[derive(Debug, Clone, Copy)]
pub struct StripeLayout<'s> {
    pub heights: &'s [usize],
    pub sample_offsets: &'s [usize],
    pub row_gaps: &'s [usize],
}

impl StripeLayout<'_> {
    fn check(&self, components: usize) -> Result<(), HtError> {
        if self.heights.len() != components
            || self.sample_offsets.len() != components
            || self.row_gaps.len() != components
        {
            return Err(HtError::EngineProtocol("stripe layout does not match component count"));
        }
        Ok(())
    }

    /// Buffer range of `row` of component `c`.
    fn row_range(&self, c: usize, row: usize, width: usize) -> std::ops::Range<usize> {
        let start = self.sample_offsets[c] + row * self.row_gaps[c];
        start..start + width
    }
}

/// Tracks how many rows of each component have been transferred.
#[derive(Debug)]
struct StripeProgress {
    rows_done: Vec<usize>,
    height: usize,
}

impl StripeProgress {
    fn new(components: usize, height: usize) -> Self {
        Self {
            rows_done: vec![0; components],
            height,
        }
    }

    fn reserve(&self, layout: &StripeLayout) -> Result<(), HtError> {
        for (&done, &rows) in self.rows_done.iter().zip(layout.heights) {
            if done + rows > self.height {
                return Err(HtError::EngineProtocol("stripe runs past the image height"));
            }
        }
        Ok(())
    }

    fn commit(&mut self, layout: &StripeLayout) {
        for (done, &rows) in self.rows_done.iter_mut().zip(layout.heights) {
            *done += rows;
        }
    }

    fn complete(&self) -> bool {
        self.rows_done.iter().all(|&done| done == self.height)
    }
}

pub struct StripeCompressor {
    params: CodestreamParams,
    config: EngineConfig,
    planes: Vec<Vec<i32>>,
    progress: StripeProgress,
}

impl StripeCompressor {
    pub fn start(params: CodestreamParams, config: EngineConfig) -> Result<Self, HtError> {
        params.validate().map_err(|e| config.report(e))?;

        let width = params.siz.width as usize;
        let height = params.siz.height as usize;
        let components = params.siz.num_components();
        Ok(Self {
            planes: vec![vec![0; width * height]; components],
            progress: StripeProgress::new(components, height),
            params,
            config,
        })
    }

    /// Copy one stripe into the engine. Returns `true` while rows remain.
    pub fn push_stripe(&mut self, samples: &[i16], layout: StripeLayout) -> Result<bool, HtError> {
        let width = self.params.siz.width as usize;
        layout
            .check(self.planes.len())
            .and_then(|_| self.progress.reserve(&layout))
            .map_err(|e| self.config.report(e))?;

        for (c, plane) in self.planes.iter_mut().enumerate() {
            let first = self.progress.rows_done[c];
            for y in 0..layout.heights[c] {
                let src = samples
                    .get(layout.row_range(c, y, width))
                    .ok_or(HtError::EngineProtocol("stripe row outside the sample buffer"))
                    .map_err(|e| self.config.report(e))?;
                let dst = &mut plane[(first + y) * width..(first + y + 1) * width];
                for (d, &s) in dst.iter_mut().zip(src) {
                    *d = s as i32;
                }
            }
        }
        self.progress.commit(&layout);

        Ok(!self.progress.complete())
    }

    /// Write the complete codestream to `out`.
    pub fn finish(mut self, out: &mut Vec<u8>) -> Result<(), HtError> {
        if !self.progress.complete() {
            return Err(self
                .config
                .report(HtError::EngineProtocol("finish before every stripe was pushed")));
        }

        let body = encode_tile(&self.params, &mut self.planes).map_err(|e| self.config.report(e))?;
        let mut writer = ByteWriter::new(out);
        write_main_header(&self.params, &mut writer);
        write_tile_part(&body, &mut writer)
    }
}

pub struct StripeDecompressor<'a> {
    params: CodestreamParams,
    config: EngineConfig,
    tile_data: &'a [u8],
    planes: Vec<Vec<i32>>,
    progress: StripeProgress,
}

impl<'a> StripeDecompressor<'a> {
    /// Parse the main header of `data`. Nothing is decoded until [`start`](Self::start).
    pub fn open(data: &'a [u8], config: EngineConfig) -> Result<Self, HtError> {
        let (params, tile_data) = read_codestream(data, &config).map_err(|e| config.report(e))?;
        let progress = StripeProgress::new(params.siz.num_components(), params.siz.height as usize);
        Ok(Self {
            params,
            config,
            tile_data,
            planes: Vec::new(),
            progress,
        })
    }

    /// Decode the tile so stripes can be pulled.
    pub fn start(&mut self) -> Result<(), HtError> {
        self.planes = decode_tile(&self.params, self.tile_data).map_err(|e| self.config.report(e))?;
        self.progress = StripeProgress::new(self.planes.len(), self.params.siz.height as usize);
        Ok(())
    }

    pub fn params(&self) -> &CodestreamParams {
        &self.params
    }

    /// Copy the next stripe out of the engine. Returns `true` while rows remain.
    pub fn pull_stripe(&mut self, samples: &mut [i16], layout: StripeLayout) -> Result<bool, HtError> {
        if self.planes.is_empty() {
            return Err(self
                .config
                .report(HtError::EngineProtocol("stripe pulled before the decompressor started")));
        }
        let width = self.params.siz.width as usize;
        layout
            .check(self.planes.len())
            .and_then(|_| self.progress.reserve(&layout))
            .map_err(|e| self.config.report(e))?;

        for (c, plane) in self.planes.iter().enumerate() {
            let first = self.progress.rows_done[c];
            for y in 0..layout.heights[c] {
                let dst = samples
                    .get_mut(layout.row_range(c, y, width))
                    .ok_or(HtError::EngineProtocol("stripe row outside the sample buffer"))
                    .map_err(|e| self.config.report(e))?;
                let src = &plane[(first + y) * width..(first + y + 1) * width];
                for (d, &s) in dst.iter_mut().zip(src) {
                    *d = i16::try_from(s)
                        .map_err(|_| self.config.report(HtError::Codestream("decoded sample out of range")))?;
                }
            }
        }
        self.progress.commit(&layout);

        Ok(!self.progress.complete())
    }

    pub fn finish(self) {
        if !self.progress.complete() {
            self.config.warn("decompressor closed before every stripe was pulled");
        }
    }
}
