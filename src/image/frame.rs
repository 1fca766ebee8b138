//! Owned RGB frame buffer.

use crate::image::{FrameView, CHANNELS};
use crate::util::{InspectError, InspectResult};

/// Owned contiguous RGB frame, row-major with interleaved channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl Frame {
    /// Creates a frame from an interleaved `width * height * 3` buffer.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> InspectResult<Self> {
        if width == 0 || height == 0 {
            return Err(InspectError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(CHANNELS))
            .ok_or(InspectError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(InspectError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(InspectError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a frame with every pixel set to `rgb`.
    ///
    /// Zero-sized frames are allowed here; they cannot be viewed or cropped.
    pub fn filled(width: usize, height: usize, rgb: [f32; CHANNELS]) -> Self {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self::from_parts(data, width, height)
    }

    /// Creates a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> [f32; CHANNELS],
    {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::from_parts(data, width, height)
    }

    pub(crate) fn from_parts(data: Vec<f32>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height * CHANNELS);
        Self {
            data,
            width,
            height,
        }
    }

    /// Returns a borrowed view of the whole frame.
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved sample buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; CHANNELS]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * CHANNELS;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Overwrites the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [f32; CHANNELS]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * CHANNELS;
        self.data[idx..idx + CHANNELS].copy_from_slice(&rgb);
    }

    /// Applies `f` to every pixel in place.
    pub fn map_pixels<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize, [f32; CHANNELS]) -> [f32; CHANNELS],
    {
        for (idx, px) in self.data.chunks_exact_mut(CHANNELS).enumerate() {
            let x = idx % self.width;
            let y = idx / self.width;
            let out = f(x, y, [px[0], px[1], px[2]]);
            px.copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use crate::util::InspectError;

    #[test]
    fn new_rejects_wrong_length() {
        let err = Frame::new(vec![0.0; 11], 2, 2).err().unwrap();
        assert!(matches!(
            err,
            InspectError::BufferTooSmall { needed: 12, got: 11 }
        ));
        assert!(Frame::new(vec![0.0; 13], 2, 2).is_err());
        assert!(Frame::new(vec![0.0; 12], 2, 2).is_ok());
    }

    #[test]
    fn map_pixels_visits_coordinates() {
        let mut frame = Frame::filled(3, 2, [0.0; 3]);
        frame.map_pixels(|x, y, _| [x as f32, y as f32, 1.0]);
        assert_eq!(frame.pixel(2, 1), Some([2.0, 1.0, 1.0]));
    }
}
