//! Error types for inspectvision.

use thiserror::Error;

/// Result alias for inspectvision operations.
pub type InspectResult<T> = std::result::Result<T, InspectError>;

/// Coarse classification of an [`InspectError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Setup-time problem: duplicate names, source already owned, missing capability.
    Configuration,
    /// A tracked region no longer matches its reference image.
    Drift,
    /// Frame acquisition or sink I/O failed.
    Io,
    /// Malformed images, regions or parameters.
    Input,
}

/// Errors that can occur while tracking regions and extracting values.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The backing buffer is shorter than the described image.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Row stride is shorter than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// A region does not fit inside the frame.
    #[error(
        "region ({x}, {y}, {width}x{height}) out of bounds for {img_width}x{img_height} frame"
    )]
    RegionOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Two images that must share a shape do not.
    #[error("shape mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    ShapeMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },
    /// Two tracked objects share a name.
    #[error("duplicate object name {name:?}")]
    DuplicateName { name: String },
    /// The frame source is already owned by another capture session.
    #[error("frame source {id:?} is already in use")]
    SourceInUse { id: String },
    /// A category needs a capability that was not supplied.
    #[error("missing capability: {0}")]
    MissingCapability(&'static str),
    /// A detector returned a class id with no entry in the symbol table.
    #[error("no symbol for class id {class_id}")]
    UnknownSymbol { class_id: usize },
    /// Similarity fell below the configured minimum.
    #[error("similarity for object {name:?} is too low: {similarity} < {min_similarity}")]
    Drift {
        name: String,
        similarity: f32,
        min_similarity: f32,
    },
    /// Frame acquisition or file I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Image decoding or encoding failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
    /// Configuration could not be parsed or is inconsistent.
    #[error("config: {reason}")]
    Config { reason: String },
}

impl InspectError {
    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InspectError::DuplicateName { .. }
            | InspectError::SourceInUse { .. }
            | InspectError::MissingCapability(_)
            | InspectError::Config { .. } => ErrorKind::Configuration,
            InspectError::Drift { .. } => ErrorKind::Drift,
            InspectError::Io(_) | InspectError::ImageIo { .. } => ErrorKind::Io,
            InspectError::InvalidInput(_)
            | InspectError::InvalidDimensions { .. }
            | InspectError::BufferTooSmall { .. }
            | InspectError::InvalidStride { .. }
            | InspectError::RegionOutOfBounds { .. }
            | InspectError::ShapeMismatch { .. }
            | InspectError::UnknownSymbol { .. } => ErrorKind::Input,
        }
    }
}
