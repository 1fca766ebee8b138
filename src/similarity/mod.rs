//! Similarity between a current sub-image and its reference image.
//!
//! The combined score blends two terms computed over equally shaped RGB
//! views:
//!
//! - cross-correlation: the normalized dot product of both views treated as
//!   flat vectors, `sum(a*b) / sqrt(sum(a^2) * sum(b^2))`;
//! - structural: the mean windowed structural similarity (luminance,
//!   contrast and structure comparison) over all channels.
//!
//! The blend is `w1 * cross + w2 * structural`. Weights summing to one keep the
//! result near `[-1, 1]`, with `1.0` meaning identical images.

use crate::image::FrameView;
use crate::util::{InspectError, InspectResult};

mod cross;
pub(crate) mod scalar;
#[cfg(feature = "simd")]
pub(crate) mod simd;
mod structural;

pub use cross::cross_correlation;
pub use structural::{structural_similarity, StructuralConfig};

/// Blend weights for the two similarity terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityWeights {
    /// Weight of the cross-correlation term.
    pub cross_correlation: f32,
    /// Weight of the structural term.
    pub structural: f32,
}

impl SimilarityWeights {
    /// Creates weights from `(cross_correlation, structural)`.
    pub const fn new(cross_correlation: f32, structural: f32) -> Self {
        Self {
            cross_correlation,
            structural,
        }
    }
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Blended similarity metric with fixed weights and structural window settings.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimilarityMetric {
    pub weights: SimilarityWeights,
    pub structural: StructuralConfig,
}

impl SimilarityMetric {
    /// Creates a metric with the default structural configuration.
    pub fn new(weights: SimilarityWeights) -> Self {
        Self {
            weights,
            structural: StructuralConfig::default(),
        }
    }

    /// Overrides the structural configuration.
    pub fn with_structural(mut self, structural: StructuralConfig) -> Self {
        self.structural = structural;
        self
    }

    /// Scores `a` against `b`; both must have the same non-empty shape.
    pub fn score(&self, a: FrameView<'_>, b: FrameView<'_>) -> InspectResult<f32> {
        a.ensure_same_shape(&b)?;
        if a.pixel_count() == 0 {
            let (width, height) = a.shape();
            return Err(InspectError::InvalidDimensions { width, height });
        }
        let cross = cross_correlation(a, b)?;
        let structural = structural_similarity(a, b, &self.structural)?;
        Ok(self.weights.cross_correlation * cross + self.weights.structural * structural)
    }
}

/// Blended similarity with the default structural configuration.
pub fn similarity(
    a: FrameView<'_>,
    b: FrameView<'_>,
    weights: SimilarityWeights,
) -> InspectResult<f32> {
    SimilarityMetric::new(weights).score(a, b)
}
