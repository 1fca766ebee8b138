//! Normalized cross-correlation of two views treated as flat vectors.

use crate::image::FrameView;
use crate::util::InspectResult;

#[cfg(not(feature = "simd"))]
use crate::similarity::scalar::dot_and_norms;
#[cfg(feature = "simd")]
use crate::similarity::simd::dot_and_norms;

/// Returns `sum(a*b) / sqrt(sum(a^2) * sum(b^2))`.
///
/// The score is insensitive to uniform scaling of either view. Two all-zero
/// views score `1.0`; an all-zero view against any other scores `0.0`.
pub fn cross_correlation(a: FrameView<'_>, b: FrameView<'_>) -> InspectResult<f32> {
    a.ensure_same_shape(&b)?;
    let (dot, norm_a, norm_b) = dot_and_norms(a, b);
    if norm_a <= 0.0 || norm_b <= 0.0 {
        let both_black = norm_a <= 0.0 && norm_b <= 0.0;
        return Ok(if both_black { 1.0 } else { 0.0 });
    }
    Ok((dot / (norm_a * norm_b).sqrt()) as f32)
}
