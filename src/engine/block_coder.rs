//! Code-block entropy coding.
//!
//! Coefficients are zig-zag mapped to unsigned values and coded with an
//! adaptive Golomb-Rice code. The Rice parameter follows the running mean of
//! the block through the `A`/`N` accumulators, halved every
//! `RICE_RESET_THRESHOLD` samples. Quotients past `RICE_QUOTIENT_LIMIT`
//! escape to a raw 32-bit value. A block with no non-zero coefficient is coded
//! as an empty segment.

use super::bit_io::{BitReader, BitWriter};
use super::dwt::BandRect;
use crate::constants::{RICE_INITIAL_A, RICE_MAX_K, RICE_QUOTIENT_LIMIT, RICE_RESET_THRESHOLD};
use crate::error::HtError;

#[derive(Debug, Clone, Copy)]
struct RiceContext {
    a: u64,
    n: u64,
}

impl RiceContext {
    fn new() -> Self {
        Self {
            a: RICE_INITIAL_A as u64,
            n: 1,
        }
    }

    fn k(&self) -> u32 {
        let mut k = 0;
        while (self.n << k) < self.a && k < RICE_MAX_K {
            k += 1;
        }
        k
    }

    fn update(&mut self, value: u32) {
        self.a += value as u64;
        if self.n == RICE_RESET_THRESHOLD as u64 {
            self.a >>= 1;
            self.n >>= 1;
        }
        self.n += 1;
    }
}

#[inline]
fn zigzag(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

#[inline]
fn unzigzag(u: u32) -> i32 {
    ((u >> 1) as i32) ^ -((u & 1) as i32)
}

/// Code the coefficients of `rect` inside a plane of row length `stride`.
pub fn encode_block(plane: &[i32], stride: usize, rect: BandRect) -> Vec<u8> {
    let rows = (rect.y0..rect.y0 + rect.height)
        .map(|y| &plane[y * stride + rect.x0..y * stride + rect.x0 + rect.width]);

    if rows.clone().all(|row| row.iter().all(|&v| v == 0)) {
        return Vec::new();
    }

    let mut writer = BitWriter::new();
    let mut context = RiceContext::new();

    for row in rows {
        for &v in row {
            let u = zigzag(v);
            let k = context.k();
            let q = u >> k;
            if q < RICE_QUOTIENT_LIMIT {
                writer.write_unary(q);
                writer.write_bits(u, k);
            } else {
                writer.write_unary(RICE_QUOTIENT_LIMIT);
                writer.write_bits(u, 32);
            }
            context.update(u);
        }
    }

    writer.finish()
}

/// Decode a segment produced by [`encode_block`] into `rect`.
pub fn decode_block(
    data: &[u8],
    plane: &mut [i32],
    stride: usize,
    rect: BandRect,
) -> Result<(), HtError> {
    if data.is_empty() {
        for y in rect.y0..rect.y0 + rect.height {
            plane[y * stride + rect.x0..y * stride + rect.x0 + rect.width].fill(0);
        }
        return Ok(());
    }

    let mut reader = BitReader::new(data);
    let mut context = RiceContext::new();

    for y in rect.y0..rect.y0 + rect.height {
        let row = &mut plane[y * stride + rect.x0..y * stride + rect.x0 + rect.width];
        for v in row {
            let k = context.k();
            let q = reader.read_unary(RICE_QUOTIENT_LIMIT)?;
            let u = if q < RICE_QUOTIENT_LIMIT {
                // q < 24 and k <= 24, so this fits in u64 before the cast.
                let wide = ((q as u64) << k) | reader.read_bits(k)? as u64;
                u32::try_from(wide).map_err(|_| HtError::Codestream("coefficient out of range"))?
            } else {
                reader.read_bits(32)?
            };
            *v = unzigzag(u);
            context.update(u);
        }
    }
    Ok(())
}
