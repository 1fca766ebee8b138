//! SIMD-accelerated correlation sums using the `wide` crate.
//!
//! The inner loop over interleaved row samples processes 8 values at a time
//! using `f32x8`; each row is reduced into `f64` accumulators so long rows
//! do not lose precision.

use crate::image::FrameView;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f64 {
    v.to_array().iter().map(|&x| f64::from(x)).sum()
}

/// SIMD counterpart of [`crate::similarity::scalar::dot_and_norms`].
pub fn dot_and_norms(a: FrameView<'_>, b: FrameView<'_>) -> (f64, f64, f64) {
    debug_assert!(a.same_shape(&b));
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (row_a, row_b) in a.rows().zip(b.rows()) {
        let len = row_a.len();
        let simd_end = len / LANES * LANES;

        let mut dot_vec = f32x8::ZERO;
        let mut aa_vec = f32x8::ZERO;
        let mut bb_vec = f32x8::ZERO;

        let mut i = 0;
        while i < simd_end {
            let va = load_f32x8(&row_a[i..]);
            let vb = load_f32x8(&row_b[i..]);
            dot_vec += va * vb;
            aa_vec += va * va;
            bb_vec += vb * vb;
            i += LANES;
        }

        dot += hsum(dot_vec);
        norm_a += hsum(aa_vec);
        norm_b += hsum(bb_vec);

        // Scalar remainder
        while i < len {
            let va = f64::from(row_a[i]);
            let vb = f64::from(row_b[i]);
            dot += va * vb;
            norm_a += va * va;
            norm_b += vb * vb;
            i += 1;
        }
    }

    (dot, norm_a, norm_b)
}
