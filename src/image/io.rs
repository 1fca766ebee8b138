//! Convenience helpers for loading and saving frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Frame, FrameView, CHANNELS};
use crate::monitor::session::{FrameSource, SourceId};
use crate::util::{InspectError, InspectResult};
use std::path::{Path, PathBuf};

/// Creates a normalized frame from an 8-bit RGB image buffer.
pub fn frame_from_rgb_image(img: &image::RgbImage) -> InspectResult<Frame> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();
    Frame::new(data, width, height)
}

/// Creates a normalized frame from a dynamic image (converted to RGB).
pub fn frame_from_dynamic_image(img: &image::DynamicImage) -> InspectResult<Frame> {
    frame_from_rgb_image(&img.to_rgb8())
}

/// Converts a view to an 8-bit RGB image, clamping samples to `[0, 1]`.
pub fn view_to_rgb_image(view: FrameView<'_>) -> InspectResult<image::RgbImage> {
    let mut raw = Vec::with_capacity(view.pixel_count() * CHANNELS);
    for row in view.rows() {
        raw.extend(row.iter().map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8));
    }
    image::RgbImage::from_raw(view.width() as u32, view.height() as u32, raw).ok_or(
        InspectError::BufferTooSmall {
            needed: view.pixel_count() * CHANNELS,
            got: 0,
        },
    )
}

/// Loads an image from disk and converts it to a normalized RGB frame.
pub fn load_frame<P: AsRef<Path>>(path: P) -> InspectResult<Frame> {
    let img = image::open(path).map_err(|err| InspectError::ImageIo {
        reason: err.to_string(),
    })?;
    frame_from_dynamic_image(&img)
}

/// Saves a view to disk; the format follows the file extension.
pub fn save_frame<P: AsRef<Path>>(view: FrameView<'_>, path: P) -> InspectResult<()> {
    let img = view_to_rgb_image(view)?;
    img.save(path).map_err(|err| InspectError::ImageIo {
        reason: err.to_string(),
    })
}

/// Replays a directory of still images as a frame source, in file-name order.
pub struct DirectorySource {
    id: SourceId,
    files: Vec<PathBuf>,
    next: usize,
}

impl DirectorySource {
    /// Lists `png`/`jpg`/`jpeg` files under `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> InspectResult<Self> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();
        Ok(Self {
            id: SourceId::new(dir.display().to_string()),
            files,
            next: 0,
        })
    }

    /// Number of frames left to replay.
    pub fn remaining(&self) -> usize {
        self.files.len() - self.next
    }
}

impl FrameSource for DirectorySource {
    fn id(&self) -> SourceId {
        self.id.clone()
    }

    fn capture(&mut self) -> InspectResult<Frame> {
        let path = self.files.get(self.next).ok_or_else(|| {
            InspectError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "frame directory exhausted",
            ))
        })?;
        self.next += 1;
        load_frame(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{save_frame, DirectorySource};
    use crate::image::Frame;
    use crate::monitor::session::FrameSource;
    use crate::util::ErrorKind;

    #[test]
    fn directory_frames_replay_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let bright = Frame::filled(4, 3, [1.0, 1.0, 1.0]);
        let dark = Frame::filled(4, 3, [0.0, 0.0, 0.0]);
        save_frame(bright.view(), dir.path().join("b.png")).unwrap();
        save_frame(dark.view(), dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = DirectorySource::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.capture().unwrap(), dark);
        assert_eq!(source.capture().unwrap(), bright);
        let err = source.capture().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
