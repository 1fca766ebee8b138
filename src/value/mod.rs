//! Semantic values extracted from tracked sub-images.
//!
//! A [`Category`] names what kind of device a region shows and maps to a
//! [`ValueModel`] through [`Category::bind_model`]. Models only keep the
//! reference value and whatever they derive from the reference image at
//! construction; evaluating a sub-image never mutates them.

use crate::image::FrameView;
use crate::util::math::format_reading;
use crate::util::{InspectError, InspectResult};
use std::fmt;
use std::sync::Arc;

mod binary;
mod numeric;

pub use binary::{BinaryConfig, BinaryModel, LUMA_WEIGHTS};
pub use numeric::{
    assemble_reading, BoundingBox, Detection, Detector, NumericModel, SymbolTable, DIGIT_SYMBOLS,
};

/// Kind of device a region shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// On/off lamp.
    Binary,
    /// Digit display reporting a reading.
    Numeric,
    /// Digit display whose readings are rendered as a time series.
    Plot,
}

impl Category {
    /// The semantic type of values produced for this category.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Category::Binary => ValueKind::Binary,
            Category::Numeric | Category::Plot => ValueKind::Numeric,
        }
    }

    /// Builds the value model for this category from the reference sub-image.
    pub fn bind_model(
        self,
        reference_value: Option<&ReferenceValue>,
        reference: FrameView<'_>,
        capabilities: &Capabilities,
        binary: &BinaryConfig,
    ) -> InspectResult<BoundModel> {
        match self.value_kind() {
            ValueKind::Binary => {
                let on = reference_value.map(ReferenceValue::is_truthy).unwrap_or(false);
                let model = BinaryModel::new(on, reference, *binary);
                Ok(BoundModel {
                    model: Box::new(model),
                    calibration: Calibration::Unchecked,
                })
            }
            ValueKind::Numeric => {
                let detector = capabilities
                    .detector
                    .clone()
                    .ok_or(InspectError::MissingCapability("numeric objects need a detector"))?;
                let (model, calibration) = NumericModel::new(
                    reference_value.map(ReferenceValue::as_reading),
                    reference,
                    detector,
                    capabilities.symbols.clone(),
                )?;
                Ok(BoundModel {
                    model: Box::new(model),
                    calibration,
                })
            }
        }
    }
}

/// Semantic type of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Binary,
    Numeric,
}

/// Value extracted from a sub-image.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Lamp state, `true` when lit.
    Binary(bool),
    /// Symbols read left to right, e.g. `"15.2"`.
    Numeric(String),
}

impl Value {
    /// Returns the lamp state for binary values.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Binary(on) => Some(*on),
            Value::Numeric(_) => None,
        }
    }

    /// Returns the reading text for numeric values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Numeric(text) => Some(text),
            Value::Binary(_) => None,
        }
    }

    /// Parses a numeric reading, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_str().and_then(|text| text.parse().ok())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Binary(_) => ValueKind::Binary,
            Value::Numeric(_) => ValueKind::Numeric,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Binary(on) => write!(f, "{on}"),
            Value::Numeric(text) => f.write_str(text),
        }
    }
}

/// Value the operator declared for the device when its region was selected.
#[derive(Clone, Debug, PartialEq)]
pub enum ReferenceValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl ReferenceValue {
    /// Truthiness used by the binary model: non-zero numbers and non-empty text are on.
    pub fn is_truthy(&self) -> bool {
        match self {
            ReferenceValue::Flag(on) => *on,
            ReferenceValue::Number(n) => *n != 0.0,
            ReferenceValue::Text(text) => !text.is_empty(),
        }
    }

    /// Text a correct detector is expected to read from the reference image.
    pub fn as_reading(&self) -> String {
        match self {
            ReferenceValue::Flag(on) => String::from(if *on { "1" } else { "0" }),
            ReferenceValue::Number(n) => format_reading(*n),
            ReferenceValue::Text(text) => text.clone(),
        }
    }
}

impl From<bool> for ReferenceValue {
    fn from(value: bool) -> Self {
        ReferenceValue::Flag(value)
    }
}

impl From<f64> for ReferenceValue {
    fn from(value: f64) -> Self {
        ReferenceValue::Number(value)
    }
}

impl From<&str> for ReferenceValue {
    fn from(value: &str) -> Self {
        ReferenceValue::Text(value.to_string())
    }
}

/// Computes a value from a sub-image.
pub trait ValueModel: Send + Sync {
    /// Evaluates `image`, which has the shape of the reference image.
    fn evaluate(&self, image: FrameView<'_>) -> InspectResult<Value>;

    fn kind(&self) -> ValueKind;
}

/// Outcome of checking a model against its own reference image.
#[derive(Clone, Debug, PartialEq)]
pub enum Calibration {
    /// No check applies (binary models, or no declared reference value).
    Unchecked,
    /// The reference image reads as the declared value.
    Matched,
    /// The reference image reads differently; readings carry reduced confidence.
    Mismatch { expected: String, detected: String },
}

impl Calibration {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Calibration::Mismatch { .. })
    }
}

/// A model bound to one tracked object, plus its calibration outcome.
pub struct BoundModel {
    pub model: Box<dyn ValueModel>,
    pub calibration: Calibration,
}

/// External capabilities available to value models.
#[derive(Clone, Default)]
pub struct Capabilities {
    /// Digit detector used by numeric categories.
    pub detector: Option<Arc<dyn Detector>>,
    /// Class id to symbol mapping applied to detections.
    pub symbols: SymbolTable,
}

impl Capabilities {
    /// Capabilities with a detector and the default digit symbols.
    pub fn with_detector(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector: Some(detector),
            symbols: SymbolTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BinaryConfig, Capabilities, Category, ReferenceValue, Value, ValueKind};
    use crate::image::Frame;
    use crate::util::ErrorKind;

    #[test]
    fn categories_map_to_value_kinds() {
        assert_eq!(Category::Binary.value_kind(), ValueKind::Binary);
        assert_eq!(Category::Plot.value_kind(), ValueKind::Numeric);
    }

    #[test]
    fn numeric_without_detector_is_a_configuration_error() {
        let frame = Frame::filled(8, 8, [0.5; 3]);
        let err = Category::Numeric
            .bind_model(
                Some(&ReferenceValue::Number(1.5)),
                frame.view(),
                &Capabilities::default(),
                &BinaryConfig::default(),
            )
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn reference_values_stringify_and_truthiness() {
        assert_eq!(ReferenceValue::from(17.9).as_reading(), "17.9");
        assert_eq!(ReferenceValue::from(18.0).as_reading(), "18.0");
        assert!(!ReferenceValue::from(0.0).is_truthy());
        assert!(ReferenceValue::from("on").is_truthy());
        assert_eq!(Value::Numeric("15.2".into()).as_f64(), Some(15.2));
        assert_eq!(Value::Binary(true).to_string(), "true");
    }
}
