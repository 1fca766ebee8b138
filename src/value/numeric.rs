//! Readings from seven-segment displays via an external glyph detector.
//!
//! The detector is opaque: it returns one detection per recognized glyph in
//! any order. The reading is assembled by sorting detections left to right
//! and concatenating the symbol for each class id.

use crate::image::FrameView;
use crate::trace::trace_warn;
use crate::util::{InspectError, InspectResult};
use crate::value::{Calibration, Value, ValueKind, ValueModel};
use std::sync::Arc;

/// Default class id to symbol mapping: ids `0..=9` are digits, `10` is the decimal point.
pub const DIGIT_SYMBOLS: [&str; 11] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "."];

/// Axis-aligned glyph box in sub-image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One recognized glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: usize,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class_id: usize) -> Self {
        Self { bbox, class_id }
    }
}

/// Glyph recognizer consumed by numeric models.
pub trait Detector: Send + Sync {
    /// Detects glyphs in `image` (RGB, samples in `[0, 1]`).
    fn detect(&self, image: FrameView<'_>) -> InspectResult<Vec<Detection>>;
}

impl<F> Detector for F
where
    F: Fn(FrameView<'_>) -> InspectResult<Vec<Detection>> + Send + Sync,
{
    fn detect(&self, image: FrameView<'_>) -> InspectResult<Vec<Detection>> {
        self(image)
    }
}

/// Mapping from detector class ids to printable symbols.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolTable {
    symbols: Arc<[String]>,
}

impl SymbolTable {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// Symbol for `class_id`, if the table has one.
    pub fn symbol(&self, class_id: usize) -> Option<&str> {
        self.symbols.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(DIGIT_SYMBOLS)
    }
}

/// Sorts detections left to right and concatenates their symbols.
///
/// Ties on the left edge are broken by class id so the result does not
/// depend on detector output order.
pub fn assemble_reading(
    mut detections: Vec<Detection>,
    symbols: &SymbolTable,
) -> InspectResult<String> {
    detections.sort_by(|a, b| {
        a.bbox
            .x
            .total_cmp(&b.bbox.x)
            .then_with(|| a.class_id.cmp(&b.class_id))
    });
    let mut reading = String::with_capacity(detections.len());
    for det in &detections {
        let symbol = symbols
            .symbol(det.class_id)
            .ok_or(InspectError::UnknownSymbol {
                class_id: det.class_id,
            })?;
        reading.push_str(symbol);
    }
    Ok(reading)
}

/// Digit display model backed by a shared detector.
pub struct NumericModel {
    expected: Option<String>,
    detector: Arc<dyn Detector>,
    symbols: SymbolTable,
}

impl NumericModel {
    /// Builds the model and reads `reference` to check the declared value.
    ///
    /// A mismatch does not fail construction; it is returned as
    /// [`Calibration::Mismatch`] and reported as a warning.
    pub fn new(
        expected: Option<String>,
        reference: FrameView<'_>,
        detector: Arc<dyn Detector>,
        symbols: SymbolTable,
    ) -> InspectResult<(Self, Calibration)> {
        let model = Self {
            expected,
            detector,
            symbols,
        };
        let calibration = match &model.expected {
            None => Calibration::Unchecked,
            Some(expected) => {
                let detected = model.read(reference)?;
                if &detected == expected {
                    Calibration::Matched
                } else {
                    trace_warn!(
                        "calibration_mismatch",
                        "reference image does not read as the declared value",
                        expected = expected.as_str(),
                        detected = detected.as_str()
                    );
                    Calibration::Mismatch {
                        expected: expected.clone(),
                        detected,
                    }
                }
            }
        };
        Ok((model, calibration))
    }

    /// Declared reading of the reference image.
    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    /// Runs the detector on `image` and assembles the reading.
    pub fn read(&self, image: FrameView<'_>) -> InspectResult<String> {
        let detections = self.detector.detect(image)?;
        assemble_reading(detections, &self.symbols)
    }
}

impl ValueModel for NumericModel {
    fn evaluate(&self, image: FrameView<'_>) -> InspectResult<Value> {
        self.read(image).map(Value::Numeric)
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Numeric
    }
}
