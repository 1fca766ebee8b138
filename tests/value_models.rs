use inspectvision::value::{BinaryConfig, BinaryModel, BoundingBox};
use inspectvision::{
    Calibration, Capabilities, Category, Detection, Detector, Frame, FrameView, InspectResult,
    ObjectSpec, Region, TrackConfig, TrackedObject, Value, ValueModel,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A 20x20 lamp: housing at 0.1 with a 6x6 core of the given brightness.
fn lamp(core: f32) -> Frame {
    Frame::from_fn(20, 20, |x, y| {
        if (7..13).contains(&x) && (7..13).contains(&y) {
            [core; 3]
        } else {
            [0.1; 3]
        }
    })
}

fn det(x: f32, class_id: usize) -> Detection {
    Detection::new(
        BoundingBox {
            x,
            y: 1.0,
            width: 5.0,
            height: 9.0,
        },
        class_id,
    )
}

/// Reads "17.9" from bright displays and "15.2" from dark ones, emitting
/// glyphs out of order.
struct FakeDisplayReader {
    calls: AtomicUsize,
}

impl FakeDisplayReader {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Detector for FakeDisplayReader {
    fn detect(&self, image: FrameView<'_>) -> InspectResult<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bright = image.pixel(0, 0).map(|px| px[0] > 0.5).unwrap_or(false);
        Ok(if bright {
            vec![det(30.0, 9), det(0.0, 1), det(20.0, 10), det(10.0, 7)]
        } else {
            vec![det(20.0, 10), det(30.0, 2), det(10.0, 5), det(0.0, 1)]
        })
    }
}

fn display(level: f32) -> Frame {
    Frame::filled(60, 30, [level; 3])
}

#[test]
fn lit_reference_classifies_both_states() {
    let model = BinaryModel::new(true, lamp(1.0).view(), BinaryConfig::default());
    assert_eq!(model.evaluate(lamp(1.0).view()).unwrap(), Value::Binary(true));
    assert_eq!(model.evaluate(lamp(0.15).view()).unwrap(), Value::Binary(false));
}

#[test]
fn unlit_reference_classifies_both_states() {
    let model = BinaryModel::new(false, lamp(0.15).view(), BinaryConfig::default());
    assert_eq!(model.evaluate(lamp(0.15).view()).unwrap(), Value::Binary(false));
    assert_eq!(model.evaluate(lamp(1.0).view()).unwrap(), Value::Binary(true));
}

#[test]
fn small_brightness_changes_stay_within_margin() {
    let model = BinaryModel::new(true, lamp(1.0).view(), BinaryConfig::default());
    assert_eq!(model.evaluate(lamp(0.9).view()).unwrap(), Value::Binary(true));
}

#[test]
fn numeric_reading_follows_the_display() {
    let reader = Arc::new(FakeDisplayReader::new());
    let capabilities = Capabilities::with_detector(reader.clone());
    let frame = display(0.2);
    let region = Region::new(0, 0, 60, 30);
    let spec = ObjectSpec::new("temp", Category::Numeric, region).with_reference_value(15.2);
    let mut object =
        TrackedObject::new(spec, frame.view(), TrackConfig::default(), &capabilities).unwrap();
    assert_eq!(object.calibration(), &Calibration::Matched);

    let value = object.get_value(frame.view()).unwrap();
    assert_eq!(value, Value::Numeric("15.2".to_string()));
    assert_eq!(value.as_f64(), Some(15.2));

    let value = object.get_value(display(0.9).view()).unwrap();
    assert_eq!(value.as_str(), Some("17.9"));
}

#[test]
fn numeric_objects_read_each_others_displays() {
    let reader = Arc::new(FakeDisplayReader::new());
    let capabilities = Capabilities::with_detector(reader.clone());
    let region = Region::new(0, 0, 60, 30);
    let (dark, bright) = (display(0.2), display(0.9));

    let low = ObjectSpec::new("low", Category::Numeric, region).with_reference_value(15.2);
    let mut low =
        TrackedObject::new(low, dark.view(), TrackConfig::default(), &capabilities).unwrap();
    let high = ObjectSpec::new("high", Category::Numeric, region).with_reference_value(17.9);
    let mut high =
        TrackedObject::new(high, bright.view(), TrackConfig::default(), &capabilities).unwrap();
    assert_eq!(low.calibration(), &Calibration::Matched);
    assert_eq!(high.calibration(), &Calibration::Matched);

    assert_eq!(low.get_value(bright.view()).unwrap().as_str(), Some("17.9"));
    assert_eq!(high.get_value(dark.view()).unwrap().as_str(), Some("15.2"));
    assert_eq!(reader.calls(), 4);
}

#[test]
fn calibration_mismatch_is_reported_not_fatal() {
    let reader = Arc::new(FakeDisplayReader::new());
    let capabilities = Capabilities::with_detector(reader);
    let frame = display(0.9);
    let spec = ObjectSpec::new("temp", Category::Plot, Region::new(0, 0, 60, 30))
        .with_reference_value(15.2);
    let object =
        TrackedObject::new(spec, frame.view(), TrackConfig::default(), &capabilities).unwrap();
    assert_eq!(
        object.calibration(),
        &Calibration::Mismatch {
            expected: "15.2".to_string(),
            detected: "17.9".to_string(),
        }
    );
}

#[test]
fn values_are_only_recomputed_after_visible_change() {
    let reader = Arc::new(FakeDisplayReader::new());
    let capabilities = Capabilities::with_detector(reader.clone());
    let frame = display(0.2);
    let spec = ObjectSpec::new("temp", Category::Numeric, Region::new(0, 0, 60, 30));
    let mut object =
        TrackedObject::new(spec, frame.view(), TrackConfig::default(), &capabilities).unwrap();
    assert_eq!(object.calibration(), &Calibration::Unchecked);
    assert_eq!(reader.calls(), 0);

    object.get_value(frame.view()).unwrap();
    object.get_value(frame.view()).unwrap();
    assert_eq!(object.state().evaluations(), 1);

    object.get_value(display(0.205).view()).unwrap();
    assert_eq!(object.state().evaluations(), 1);

    let mut changed = display(0.2);
    changed.put_pixel(59, 29, [0.25, 0.2, 0.2]);
    object.get_value(changed.view()).unwrap();
    assert_eq!(object.state().evaluations(), 2);
    assert_eq!(reader.calls(), 2);
}

#[test]
fn closures_work_as_detectors() {
    let detector = |_: FrameView<'_>| -> InspectResult<Vec<Detection>> {
        Ok(vec![det(5.0, 0), det(0.0, 4)])
    };
    let capabilities = Capabilities::with_detector(Arc::new(detector));
    let frame = display(0.5);
    let spec = ObjectSpec::new("level", Category::Numeric, Region::new(10, 5, 20, 10))
        .with_reference_value("40");
    let mut object =
        TrackedObject::new(spec, frame.view(), TrackConfig::default(), &capabilities).unwrap();
    assert_eq!(object.calibration(), &Calibration::Matched);
    assert_eq!(object.get_value(frame.view()).unwrap().as_str(), Some("40"));
}
