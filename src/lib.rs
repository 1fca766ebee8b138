//! InspectVision watches the indicator lamps and digit displays of devices
//! through a fixed camera.
//!
//! Each monitored device is a [`TrackedObject`]: a rectangular region of the
//! initial frame, its reference image and a value model chosen by its
//! [`Category`]. Every cycle the [`Monitor`] captures a frame, nudges each
//! region back onto its device by greedy hill climbing over a blended
//! cross-correlation/structural similarity, refuses to report values once a
//! region no longer matches, and hands debounced values plus an annotated
//! display frame to its sinks.
//!
//! Inner loops are scalar by default; the `simd` feature enables a `wide`
//! dot-product kernel and the `rayon` feature tracks objects in parallel.

pub mod image;
pub mod lowlevel;
pub mod monitor;
pub mod similarity;
mod trace;
pub mod tracking;
pub mod util;
pub mod value;

pub use image::{Frame, FrameView, Region};
pub use monitor::sinks::{Dashboard, LogRecord, Notifier, ThreadedSink, Transport, TsvLogger};
pub use monitor::{
    CaptureSession, CycleOutput, CycleSink, FrameSource, Monitor, MonitorConfig, SourceId,
    SourceRegistry, ValueMap,
};
pub use similarity::{similarity, SimilarityMetric, SimilarityWeights, StructuralConfig};
pub use tracking::{ObjectSpec, ObjectStatus, TrackConfig, TrackedObject};
pub use util::{ErrorKind, InspectError, InspectResult};
pub use value::{
    Calibration, Capabilities, Category, Detection, Detector, ReferenceValue, SymbolTable, Value,
    ValueKind, ValueModel,
};
