//! Windowed structural similarity.
//!
//! For every square window that fits entirely inside the views, and for every
//! channel, the local comparison is
//!
//! ```text
//! ((2 mu_a mu_b + C1) (2 cov_ab + C2)) / ((mu_a^2 + mu_b^2 + C1) (var_a + var_b + C2))
//! ```
//!
//! with `C1 = (k1 L)^2` and `C2 = (k2 L)^2` for data range `L`. The score is
//! the mean over all windows and channels. Window sums come from per-channel
//! summed-area tables, so the cost is linear in the pixel count regardless of
//! the window size.

use crate::image::{FrameView, CHANNELS};
use crate::util::{InspectError, InspectResult};

/// Parameters of the structural comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructuralConfig {
    /// Side of the square window. Even values are rounded down to odd, and the
    /// window shrinks to the largest odd side that fits small views.
    pub window: usize,
    /// Luminance stabilizer coefficient.
    pub k1: f32,
    /// Contrast stabilizer coefficient.
    pub k2: f32,
    /// Dynamic range of the samples (`1.0` for normalized frames).
    pub data_range: f32,
    /// Use the unbiased `n / (n - 1)` covariance normalization.
    pub sample_covariance: bool,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            window: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: 1.0,
            sample_covariance: true,
        }
    }
}

impl StructuralConfig {
    fn effective_window(&self, width: usize, height: usize) -> InspectResult<usize> {
        if self.window == 0 {
            return Err(InspectError::InvalidInput("structural window must be positive"));
        }
        let limit = self.window.min(width).min(height);
        Ok(if limit % 2 == 0 { limit - 1 } else { limit })
    }
}

/// Summed-area tables of `a`, `b`, `a^2`, `b^2` and `a*b` for one channel.
struct ChannelSums {
    cols: usize,
    tables: [Vec<f64>; 5],
}

impl ChannelSums {
    fn build(a: FrameView<'_>, b: FrameView<'_>, channel: usize) -> Self {
        let width = a.width();
        let height = a.height();
        let cols = width + 1;
        let len = cols * (height + 1);
        let mut tables: [Vec<f64>; 5] = std::array::from_fn(|_| vec![0.0; len]);

        for (y, (row_a, row_b)) in a.rows().zip(b.rows()).enumerate() {
            let mut run = [0.0f64; 5];
            for x in 0..width {
                let va = f64::from(row_a[x * CHANNELS + channel]);
                let vb = f64::from(row_b[x * CHANNELS + channel]);
                run[0] += va;
                run[1] += vb;
                run[2] += va * va;
                run[3] += vb * vb;
                run[4] += va * vb;
                let idx = (y + 1) * cols + (x + 1);
                let above = y * cols + (x + 1);
                for (table, &r) in tables.iter_mut().zip(run.iter()) {
                    table[idx] = table[above] + r;
                }
            }
        }

        Self { cols, tables }
    }

    fn window_sums(&self, x: usize, y: usize, side: usize) -> [f64; 5] {
        let c = self.cols;
        let tl = y * c + x;
        let tr = y * c + x + side;
        let bl = (y + side) * c + x;
        let br = (y + side) * c + x + side;
        std::array::from_fn(|k| {
            let t = &self.tables[k];
            t[br] - t[tr] - t[bl] + t[tl]
        })
    }
}

/// Mean windowed structural similarity of two equally shaped views.
///
/// Returns `1.0` for identical inputs.
pub fn structural_similarity(
    a: FrameView<'_>,
    b: FrameView<'_>,
    cfg: &StructuralConfig,
) -> InspectResult<f32> {
    a.ensure_same_shape(&b)?;
    let (width, height) = a.shape();
    if width == 0 || height == 0 {
        return Err(InspectError::InvalidDimensions { width, height });
    }
    let side = cfg.effective_window(width, height)?;

    let n = (side * side) as f64;
    let cov_norm = if cfg.sample_covariance && side > 1 {
        n / (n - 1.0)
    } else {
        1.0
    };
    let range = f64::from(cfg.data_range);
    let c1 = (f64::from(cfg.k1) * range).powi(2);
    let c2 = (f64::from(cfg.k2) * range).powi(2);

    let mut total = 0.0f64;
    let mut count = 0usize;
    for channel in 0..CHANNELS {
        let sums = ChannelSums::build(a, b, channel);
        for y in 0..=(height - side) {
            for x in 0..=(width - side) {
                let [sa, sb, saa, sbb, sab] = sums.window_sums(x, y, side);
                let mu_a = sa / n;
                let mu_b = sb / n;
                let var_a = cov_norm * (saa / n - mu_a * mu_a);
                let var_b = cov_norm * (sbb / n - mu_b * mu_b);
                let cov = cov_norm * (sab / n - mu_a * mu_b);

                let num = (2.0 * mu_a * mu_b + c1) * (2.0 * cov + c2);
                let den = (mu_a * mu_a + mu_b * mu_b + c1) * (var_a + var_b + c2);
                total += num / den;
                count += 1;
            }
        }
    }

    Ok((total / count as f64) as f32)
}
