//! Point transforms applied to whole component planes.

use crate::error::HtError;
use crate::sign_magnitude;

/// Reversible colour transform over the first three planes.
pub fn forward_rct(planes: &mut [Vec<i32>]) {
    let [r, g, b, ..] = planes else {
        return;
    };
    for ((r, g), b) in r.iter_mut().zip(g.iter_mut()).zip(b.iter_mut()) {
        // Y = floor((R + 2G + B) / 4), Cb = B - G, Cr = R - G
        let y = (*r + 2 * *g + *b) >> 2;
        let cb = *b - *g;
        let cr = *r - *g;
        *r = y;
        *g = cb;
        *b = cr;
    }
}

pub fn inverse_rct(planes: &mut [Vec<i32>]) {
    let [y, cb, cr, ..] = planes else {
        return;
    };
    for ((y, cb), cr) in y.iter_mut().zip(cb.iter_mut()).zip(cr.iter_mut()) {
        let g = *y - ((*cb + *cr) >> 2);
        let r = *cr + g;
        let b = *cb + g;
        *y = r;
        *cb = g;
        *cr = b;
    }
}

/// Engine-side sign-magnitude NLT. Identical to the fold the software backend
/// applies before handing lines over.
pub fn forward_nlt(plane: &mut [i32]) {
    for v in plane {
        *v = sign_magnitude::encode(*v as i16);
    }
}

pub fn inverse_nlt(plane: &mut [i32]) -> Result<(), HtError> {
    for v in plane {
        let folded = i16::try_from(*v).map_err(|_| HtError::Codestream("decoded sample out of range"))?;
        *v = sign_magnitude::decode(folded as i32) as i32;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rct_roundtrip_extremes() {
        let r = vec![-32768, 32767, 0, 1, -1];
        let g = vec![32767, -32768, 0, -7, 12];
        let b = vec![0, 32767, -32768, 3, -30000];
        let mut planes = vec![r.clone(), g.clone(), b.clone(), vec![4, 4, 4, 4, 4]];

        forward_rct(&mut planes);
        assert_eq!(planes[3], vec![4, 4, 4, 4, 4]);
        inverse_rct(&mut planes);

        assert_eq!(planes[0], r);
        assert_eq!(planes[1], g);
        assert_eq!(planes[2], b);
    }

    #[test]
    fn test_rct_ignores_short_lists() {
        let mut planes = vec![vec![1, 2], vec![3, 4]];
        forward_rct(&mut planes);
        assert_eq!(planes, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_nlt_roundtrip() {
        let original: Vec<i32> = vec![0, -1, -32768, 32767, 15360, -17408];
        let mut plane = original.clone();
        forward_nlt(&mut plane);
        assert_eq!(plane[1], -32768);
        inverse_nlt(&mut plane).unwrap();
        assert_eq!(plane, original);
    }

    #[test]
    fn test_inverse_nlt_rejects_wide_values() {
        let mut plane = vec![5, 40000];
        assert_eq!(
            inverse_nlt(&mut plane),
            Err(HtError::Codestream("decoded sample out of range"))
        );
        let mut plane = vec![-32769];
        assert!(inverse_nlt(&mut plane).is_err());
    }
}
