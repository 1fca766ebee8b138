//! Frames, frame views and regions.
//!
//! `FrameView` is a borrowed 3-channel view into an interleaved `f32` buffer
//! with an explicit stride. The stride counts pixels between the starts of
//! consecutive rows, so a stride larger than the width represents padded rows
//! (or a region cropped out of a larger frame). Region crops are zero-copy
//! views into the same backing slice and retain the original stride.

use crate::util::{InspectError, InspectResult};

mod frame;
pub mod region;

#[cfg(feature = "image-io")]
pub mod io;

pub use frame::Frame;
pub use region::Region;

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 3;

/// Borrowed RGB view with channel values normalized to `[0, 1]`.
#[derive(Copy, Clone, Debug)]
pub struct FrameView<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> FrameView<'a> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [f32], width: usize, height: usize) -> InspectResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride (in pixels).
    pub fn new(data: &'a [f32], width: usize, height: usize, stride: usize) -> InspectResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(InspectError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the view width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the view height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in pixels between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of pixels covered by the view.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; CHANNELS]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.stride + x) * CHANNELS;
        let px = self.data.get(idx..idx + CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }

    /// Returns the interleaved samples of row `y` (length `width * 3`).
    pub fn row(&self, y: usize) -> Option<&'a [f32]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?.checked_mul(CHANNELS)?;
        let end = start.checked_add(self.width * CHANNELS)?;
        self.data.get(start..end)
    }

    /// Iterates over rows of interleaved samples.
    pub fn rows(&self) -> impl Iterator<Item = &'a [f32]> + '_ {
        (0..self.height).filter_map(move |y| self.row(y))
    }

    /// Returns true when `other` has the same width and height.
    pub fn same_shape(&self, other: &FrameView<'_>) -> bool {
        self.shape() == other.shape()
    }

    /// Fails with [`InspectError::ShapeMismatch`] unless both views share a shape.
    pub fn ensure_same_shape(&self, other: &FrameView<'_>) -> InspectResult<()> {
        if self.same_shape(other) {
            return Ok(());
        }
        Err(InspectError::ShapeMismatch {
            left_width: self.width,
            left_height: self.height,
            right_width: other.width,
            right_height: other.height,
        })
    }

    /// Returns a zero-copy view of `region`.
    pub fn crop(&self, region: Region) -> InspectResult<FrameView<'a>> {
        let (x, y) = region.origin();
        let (width, height) = region.size();
        if width == 0 || height == 0 {
            return Err(InspectError::InvalidDimensions { width, height });
        }
        if !region.fits_within(self.width, self.height) {
            return Err(InspectError::RegionOutOfBounds {
                x,
                y,
                width,
                height,
                img_width: self.width,
                img_height: self.height,
            });
        }

        let start = (y * self.stride + x) * CHANNELS;
        let data = self
            .data
            .get(start..)
            .ok_or(InspectError::BufferTooSmall {
                needed: start.saturating_add(CHANNELS),
                got: self.data.len(),
            })?;
        FrameView::new(data, width, height, self.stride)
    }

    /// Copies the view into a contiguous owned frame.
    pub fn to_frame(&self) -> Frame {
        let mut data = Vec::with_capacity(self.pixel_count() * CHANNELS);
        for row in self.rows() {
            data.extend_from_slice(row);
        }
        Frame::from_parts(data, self.width, self.height)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> InspectResult<usize> {
    if width == 0 || height == 0 {
        return Err(InspectError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(InspectError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(InspectError::InvalidDimensions { width, height })
}

/// Largest absolute per-channel difference between two equally shaped views.
pub fn max_abs_diff(a: FrameView<'_>, b: FrameView<'_>) -> InspectResult<f32> {
    a.ensure_same_shape(&b)?;
    let mut max = 0.0f32;
    for (row_a, row_b) in a.rows().zip(b.rows()) {
        for (&va, &vb) in row_a.iter().zip(row_b) {
            let diff = (va - vb).abs();
            if diff > max {
                max = diff;
            }
        }
    }
    Ok(max)
}
