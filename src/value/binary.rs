//! Lamp state from relative brightness.
//!
//! The brightness projection of a sub-image is a fixed weighted sum of its
//! channels. Its spread, `max - min`, is large for a lit lamp (bright core on
//! a darker housing) and small for an unlit one. The model compares the
//! spread of each sub-image with the spread of the reference image.

use crate::image::{FrameView, CHANNELS};
use crate::util::InspectResult;
use crate::value::{Value, ValueKind, ValueModel};

/// Default per-channel weights of the brightness projection.
pub const LUMA_WEIGHTS: [f32; CHANNELS] = [0.33, 0.50, 0.16];

/// Parameters of the lamp model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinaryConfig {
    /// Tolerance on the spread difference that absorbs lighting noise.
    pub max_margin: f32,
    /// Channel weights of the brightness projection.
    pub luma: [f32; CHANNELS],
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self {
            max_margin: 0.2,
            luma: LUMA_WEIGHTS,
        }
    }
}

/// Lamp model calibrated on a reference image whose state is known.
#[derive(Clone, Debug)]
pub struct BinaryModel {
    reference_on: bool,
    reference_spread: f32,
    cfg: BinaryConfig,
}

impl BinaryModel {
    /// Records the brightness spread of `reference`, captured in state `reference_on`.
    pub fn new(reference_on: bool, reference: FrameView<'_>, cfg: BinaryConfig) -> Self {
        Self {
            reference_on,
            reference_spread: relative_brightness(reference, &cfg.luma),
            cfg,
        }
    }

    /// Brightness spread of the reference image.
    pub fn reference_spread(&self) -> f32 {
        self.reference_spread
    }

    /// Returns true when `image` shows a lit lamp.
    pub fn is_on(&self, image: FrameView<'_>) -> bool {
        let margin = self.reference_spread - relative_brightness(image, &self.cfg.luma);
        if self.reference_on {
            margin < self.cfg.max_margin
        } else {
            -margin > self.cfg.max_margin
        }
    }
}

impl ValueModel for BinaryModel {
    fn evaluate(&self, image: FrameView<'_>) -> InspectResult<Value> {
        Ok(Value::Binary(self.is_on(image)))
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Binary
    }
}

/// `max - min` of the weighted channel projection over the view.
pub(crate) fn relative_brightness(image: FrameView<'_>, luma: &[f32; CHANNELS]) -> f32 {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for row in image.rows() {
        for px in row.chunks_exact(CHANNELS) {
            let v = px[0] * luma[0] + px[1] * luma[1] + px[2] * luma[2];
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if hi < lo {
        return 0.0;
    }
    hi - lo
}

#[cfg(test)]
mod tests {
    use super::{relative_brightness, LUMA_WEIGHTS};
    use crate::image::Frame;

    #[test]
    fn uniform_view_has_no_spread() {
        let frame = Frame::filled(5, 5, [0.7, 0.2, 0.9]);
        assert_eq!(relative_brightness(frame.view(), &LUMA_WEIGHTS), 0.0);
    }

    #[test]
    fn spread_uses_channel_weights() {
        let mut frame = Frame::filled(3, 3, [0.0; 3]);
        frame.put_pixel(1, 1, [1.0, 1.0, 1.0]);
        let spread = relative_brightness(frame.view(), &LUMA_WEIGHTS);
        assert!((spread - 0.99).abs() < 1e-6);
    }
}
