//! The capture loop tying frames, tracked objects and sinks together.
//!
//! Every cycle acquires one frame, re-localizes and rescores each tracked
//! object, fails the whole cycle when any object drops below its minimum
//! similarity, collects debounced values, composites the display frame and
//! hands the result to the sinks. Cycles never overlap.

use crate::image::{Frame, Region};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::tracking::{converge, ObjectStatus, TrackedObject};
use crate::util::{InspectError, InspectResult};
use crate::value::{Category, Value};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::time::{Duration, Instant};

pub mod annotate;
pub mod session;
pub mod sinks;

pub use annotate::{annotate, AnnotateStyle};
pub use session::{CaptureSession, FrameSource, SourceId, SourceRegistry};
pub use sinks::CycleSink;

/// Loop configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Run drift correction before rescoring each object.
    pub update_positions: bool,
    /// Cap on hill-climbing steps per object and cycle.
    pub max_drift_iterations: usize,
    /// Frames discarded when the monitor starts.
    pub warmup_frames: usize,
    /// Track objects in parallel (requires the `rayon` feature, otherwise ignored).
    pub parallel: bool,
    /// Display overlay settings.
    pub annotate: AnnotateStyle,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            update_positions: true,
            max_drift_iterations: 50,
            warmup_frames: 0,
            parallel: false,
            annotate: AnnotateStyle::default(),
        }
    }
}

/// Values of one cycle, in managed-object order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends or replaces the value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-object tracking outcome of a cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectReport {
    pub name: String,
    pub region: Region,
    pub similarity: f32,
}

/// Everything a cycle produces for the sinks.
#[derive(Clone, Debug)]
pub struct CycleOutput {
    /// Zero-based cycle counter.
    pub index: u64,
    /// Wall-clock capture time.
    pub captured_at: DateTime<Local>,
    /// Time since the monitor was created.
    pub elapsed: Duration,
    pub values: ValueMap,
    pub objects: Vec<ObjectReport>,
    /// Display frame with dimmed background, borders and labels.
    pub annotated: Frame,
}

/// Drives the capture loop over a set of tracked objects.
pub struct Monitor<S: FrameSource> {
    session: CaptureSession<S>,
    objects: Vec<TrackedObject>,
    config: MonitorConfig,
    started: Instant,
    cycles: u64,
    sink_errors: u64,
}

impl<S: FrameSource> Monitor<S> {
    /// Takes ownership of the session and objects; names must be unique.
    pub fn new(
        mut session: CaptureSession<S>,
        objects: Vec<TrackedObject>,
        config: MonitorConfig,
    ) -> InspectResult<Self> {
        let mut seen = HashSet::with_capacity(objects.len());
        for object in &objects {
            if !seen.insert(object.name()) {
                return Err(InspectError::DuplicateName {
                    name: object.name().to_string(),
                });
            }
        }
        session.warm_up(config.warmup_frames)?;
        Ok(Self {
            session,
            objects,
            config,
            started: Instant::now(),
            cycles: 0,
            sink_errors: 0,
        })
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Object names in managed order; the column set of log sinks.
    pub fn names(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.name().to_string()).collect()
    }

    /// `(name, category)` pairs for building display sinks.
    pub fn widgets(&self) -> Vec<(String, Category)> {
        self.objects
            .iter()
            .map(|o| (o.name().to_string(), o.category()))
            .collect()
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Number of sink failures reported by [`run`](Self::run).
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors
    }

    /// Runs one cycle.
    ///
    /// Capture errors are returned unchanged. A similarity below an object's
    /// minimum returns [`InspectError::Drift`] before any value is collected;
    /// the object then stays failed and every later cycle fails the same way.
    pub fn cycle(&mut self) -> InspectResult<CycleOutput> {
        let _span = trace_span!("monitor_cycle", index = self.cycles).entered();
        if let Some(failed) = self
            .objects
            .iter_mut()
            .find(|o| matches!(o.status(), ObjectStatus::Failed { .. }))
        {
            failed.gate()?;
        }

        let frame = self.session.capture()?;
        let captured_at = Local::now();
        self.track_all(&frame)?;
        for object in &mut self.objects {
            object.gate()?;
        }

        let view = frame.view();
        let mut values = ValueMap::new();
        for object in &mut self.objects {
            let value = object.get_value(view)?;
            values.insert(object.name(), value);
        }

        let regions: Vec<Region> = self.objects.iter().map(TrackedObject::region).collect();
        let annotated = annotate(view, &regions, &self.config.annotate);
        let objects = self
            .objects
            .iter()
            .map(|o| ObjectReport {
                name: o.name().to_string(),
                region: o.region(),
                similarity: o.similarity(),
            })
            .collect();

        let output = CycleOutput {
            index: self.cycles,
            captured_at,
            elapsed: self.started.elapsed(),
            values,
            objects,
            annotated,
        };
        self.cycles += 1;
        trace_event!("cycle_done", index = output.index, objects = output.objects.len());
        Ok(output)
    }

    fn track_all(&mut self, frame: &Frame) -> InspectResult<()> {
        let cfg = self.config;
        let view = frame.view();
        let track = move |object: &mut TrackedObject| -> InspectResult<()> {
            if cfg.update_positions {
                converge(object, view, cfg.max_drift_iterations)?;
            }
            object.update_similarity(view)?;
            Ok(())
        };
        for_each_object(&mut self.objects, cfg.parallel, track)
    }

    /// Runs cycles and hands each output to every sink, in order.
    ///
    /// Stops after `max_cycles` cycles when given, or at the first cycle
    /// error (drift or capture). A failing sink is warned about and counted
    /// in [`sink_errors`](Self::sink_errors); the remaining sinks still get
    /// the output and the loop continues.
    /// Returns the number of cycles completed by this call.
    pub fn run(
        &mut self,
        sinks: &mut [&mut dyn CycleSink],
        max_cycles: Option<u64>,
    ) -> InspectResult<u64> {
        let mut done = 0u64;
        while max_cycles.map_or(true, |max| done < max) {
            let output = self.cycle()?;
            for (slot, sink) in sinks.iter_mut().enumerate() {
                if let Err(err) = sink.consume(&output) {
                    self.sink_errors += 1;
                    trace_warn!(
                        "sink_failed",
                        "sink rejected cycle output",
                        sink = slot,
                        index = output.index,
                        error = err.to_string().as_str()
                    );
                }
            }
            done += 1;
        }
        Ok(done)
    }

    /// Releases the session and returns the tracked objects.
    pub fn into_parts(self) -> (CaptureSession<S>, Vec<TrackedObject>) {
        (self.session, self.objects)
    }
}

#[cfg(feature = "rayon")]
fn for_each_object<F>(objects: &mut [TrackedObject], parallel: bool, f: F) -> InspectResult<()>
where
    F: Fn(&mut TrackedObject) -> InspectResult<()> + Send + Sync,
{
    use rayon::prelude::*;
    if parallel {
        objects.par_iter_mut().try_for_each(f)
    } else {
        objects.iter_mut().try_for_each(f)
    }
}

#[cfg(not(feature = "rayon"))]
fn for_each_object<F>(objects: &mut [TrackedObject], _parallel: bool, f: F) -> InspectResult<()>
where
    F: Fn(&mut TrackedObject) -> InspectResult<()>,
{
    objects.iter_mut().try_for_each(f)
}
