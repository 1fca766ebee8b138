//! Scalar reference kernel for the correlation sums.

use crate::image::FrameView;

/// Accumulated `(sum(a*b), sum(a^2), sum(b^2))` over two equally shaped views.
pub fn dot_and_norms(a: FrameView<'_>, b: FrameView<'_>) -> (f64, f64, f64) {
    debug_assert!(a.same_shape(&b));
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (row_a, row_b) in a.rows().zip(b.rows()) {
        for (&va, &vb) in row_a.iter().zip(row_b) {
            let va = f64::from(va);
            let vb = f64::from(vb);
            dot += va * vb;
            norm_a += va * va;
            norm_b += vb * vb;
        }
    }
    (dot, norm_a, norm_b)
}
