//! Reversible 5/3 discrete wavelet transform.
//!
//! Planes are transformed in place using the Mallat layout: after each level
//! the low-pass quadrant sits in the top-left corner and the next level only
//! touches that quadrant. An axis of length 1 is left as is, so blocks of a
//! single row still go through every level horizontally.

pub struct Dwt53;

impl Dwt53 {
    /// Forward 1D lifting. On return the first `ceil(n/2)` entries hold the
    /// low-pass coefficients and the rest the high-pass ones.
    pub fn forward(x: &mut [i32], scratch: &mut Vec<i32>) {
        let len = x.len();
        if len < 2 {
            return;
        }

        // Prediction: y[2n+1] = x[2n+1] - floor((x[2n] + x[2n+2]) / 2)
        for i in (1..len).step_by(2) {
            let left = x[i - 1];
            let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
            x[i] -= (left + right) >> 1;
        }

        // Update: y[2n] = x[2n] + floor((y[2n-1] + y[2n+1] + 2) / 4)
        for i in (0..len).step_by(2) {
            let left = if i > 0 { x[i - 1] } else { x[i + 1] };
            let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
            x[i] += (left + right + 2) >> 2;
        }

        // De-interleave
        scratch.clear();
        scratch.extend(x.iter().step_by(2));
        scratch.extend(x.iter().skip(1).step_by(2));
        x.copy_from_slice(&scratch[..]);
    }

    /// Inverse of [`Dwt53::forward`].
    pub fn inverse(x: &mut [i32], scratch: &mut Vec<i32>) {
        let len = x.len();
        if len < 2 {
            return;
        }
        let low_len = len.div_ceil(2);

        // Re-interleave
        scratch.clear();
        scratch.resize(len, 0);
        for (i, &v) in x[..low_len].iter().enumerate() {
            scratch[2 * i] = v;
        }
        for (i, &v) in x[low_len..].iter().enumerate() {
            scratch[2 * i + 1] = v;
        }
        x.copy_from_slice(&scratch[..]);

        // Reverse update
        for i in (0..len).step_by(2) {
            let left = if i > 0 { x[i - 1] } else { x[i + 1] };
            let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
            x[i] -= (left + right + 2) >> 2;
        }

        // Reverse prediction
        for i in (1..len).step_by(2) {
            let left = x[i - 1];
            let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
            x[i] += (left + right) >> 1;
        }
    }

    /// Multi-level forward transform of a `width` x `height` plane.
    pub fn forward_2d(plane: &mut [i32], width: usize, height: usize, levels: u8) {
        let dims = level_dims(width, height, levels);
        let mut line = Vec::new();
        let mut scratch = Vec::new();

        for pair in dims.windows(2) {
            let (w, h) = pair[0];

            for y in 0..h {
                let row = &mut plane[y * width..y * width + w];
                Self::forward(row, &mut scratch);
            }

            if h > 1 {
                for x in 0..w {
                    line.clear();
                    line.extend((0..h).map(|y| plane[y * width + x]));
                    Self::forward(&mut line, &mut scratch);
                    for (y, &v) in line.iter().enumerate() {
                        plane[y * width + x] = v;
                    }
                }
            }
        }
    }

    /// Multi-level inverse transform of a `width` x `height` plane.
    pub fn inverse_2d(plane: &mut [i32], width: usize, height: usize, levels: u8) {
        let dims = level_dims(width, height, levels);
        let mut line = Vec::new();
        let mut scratch = Vec::new();

        for pair in dims.windows(2).rev() {
            let (w, h) = pair[0];

            if h > 1 {
                for x in 0..w {
                    line.clear();
                    line.extend((0..h).map(|y| plane[y * width + x]));
                    Self::inverse(&mut line, &mut scratch);
                    for (y, &v) in line.iter().enumerate() {
                        plane[y * width + x] = v;
                    }
                }
            }

            for y in 0..h {
                let row = &mut plane[y * width..y * width + w];
                Self::inverse(row, &mut scratch);
            }
        }
    }
}

/// Size of the low-pass region before the first level and after each level.
pub fn level_dims(width: usize, height: usize, levels: u8) -> Vec<(usize, usize)> {
    let mut dims = Vec::with_capacity(levels as usize + 1);
    dims.push((width, height));
    let (mut w, mut h) = (width, height);
    for _ in 0..levels {
        w = w.div_ceil(2);
        h = h.div_ceil(2);
        dims.push((w, h));
    }
    dims
}

/// Rectangle of coefficients inside a transformed plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRect {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

/// Sub-bands belonging to resolution `r` (0 = lowest), in HL, LH, HH order
/// for r > 0 and just LL for r == 0.
pub fn resolution_bands(width: usize, height: usize, levels: u8, r: usize) -> Vec<BandRect> {
    let dims = level_dims(width, height, levels);
    let levels = levels as usize;

    if r == 0 {
        let (w, h) = dims[levels];
        return vec![BandRect {
            x0: 0,
            y0: 0,
            width: w,
            height: h,
        }];
    }

    // Resolution r is produced by decomposition level d (1-based).
    let d = levels - r + 1;
    let (w, h) = dims[d - 1];
    let (lw, lh) = dims[d];
    vec![
        BandRect {
            x0: lw,
            y0: 0,
            width: w - lw,
            height: lh,
        },
        BandRect {
            x0: 0,
            y0: lh,
            width: lw,
            height: h - lh,
        },
        BandRect {
            x0: lw,
            y0: lh,
            width: w - lw,
            height: h - lh,
        },
    ]
}
