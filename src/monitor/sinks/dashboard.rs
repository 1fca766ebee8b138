//! Headless display state.
//!
//! Holds what a front-end would render: one widget per tracked object plus
//! the latest annotated frame. Rendering itself is left to the embedding
//! application.

use crate::image::Frame;
use crate::monitor::sinks::CycleSink;
use crate::monitor::{CycleOutput, ValueMap};
use crate::trace::trace_warn;
use crate::util::InspectResult;
use crate::value::{Category, Value};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of points a plot widget keeps.
pub const DEFAULT_PLOT_CAPACITY: usize = 4096;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// What a widget currently shows.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetState {
    /// No value received yet.
    Empty,
    /// Lamp status.
    Status(bool),
    /// Latest display reading, verbatim.
    Reading(String),
    /// `(elapsed_hours, reading)` points, oldest first.
    Series(VecDeque<(f64, f64)>),
}

/// One labelled widget.
#[derive(Clone, Debug, PartialEq)]
pub struct Widget {
    name: String,
    label: String,
    category: Category,
    state: WidgetState,
}

impl Widget {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label, `"{i}) {name}"` with a 1-based index.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }
}

/// Dashboard model fed by the monitor loop.
#[derive(Clone, Debug)]
pub struct Dashboard {
    widgets: Vec<Widget>,
    plot_capacity: usize,
    unknown_names: u64,
    screen: Option<Frame>,
}

impl Dashboard {
    /// Builds one widget per `(name, category)`, labelled in the given order.
    pub fn new(widgets: &[(String, Category)]) -> Self {
        let widgets = widgets
            .iter()
            .enumerate()
            .map(|(i, (name, category))| Widget {
                name: name.clone(),
                label: format!("{}) {}", i + 1, name),
                category: *category,
                state: match category {
                    Category::Plot => WidgetState::Series(VecDeque::new()),
                    _ => WidgetState::Empty,
                },
            })
            .collect();
        Self {
            widgets,
            plot_capacity: DEFAULT_PLOT_CAPACITY,
            unknown_names: 0,
            screen: None,
        }
    }

    /// Caps the number of points kept per plot (at least one).
    pub fn with_plot_capacity(mut self, capacity: usize) -> Self {
        self.plot_capacity = capacity.max(1);
        self
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    /// Number of updates that named an object without a widget.
    pub fn unknown_names(&self) -> u64 {
        self.unknown_names
    }

    /// Latest annotated frame.
    pub fn screen(&self) -> Option<&Frame> {
        self.screen.as_ref()
    }

    /// Applies one set of values observed `elapsed` after start.
    ///
    /// Names without a widget are skipped and counted.
    pub fn update(&mut self, values: &ValueMap, elapsed: Duration) {
        let hours = elapsed.as_secs_f64() / SECONDS_PER_HOUR;
        for (name, value) in values.iter() {
            let Some(widget) = self.widgets.iter_mut().find(|w| w.name == name) else {
                self.unknown_names += 1;
                trace_warn!("dashboard_unknown_name", "no widget for value", object = name);
                continue;
            };
            apply(widget, value, hours, self.plot_capacity);
        }
    }

    pub fn set_screen(&mut self, frame: Frame) {
        self.screen = Some(frame);
    }
}

fn apply(widget: &mut Widget, value: &Value, hours: f64, capacity: usize) {
    match (&mut widget.state, value) {
        (WidgetState::Series(points), value) => {
            // Readings that are not numbers leave the plot untouched.
            if let Some(reading) = value.as_f64() {
                if points.len() == capacity {
                    points.pop_front();
                }
                points.push_back((hours, reading));
            }
        }
        (state, Value::Binary(on)) => *state = WidgetState::Status(*on),
        (state, Value::Numeric(text)) => *state = WidgetState::Reading(text.clone()),
    }
}

impl CycleSink for Dashboard {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()> {
        self.update(&output.values, output.elapsed);
        self.set_screen(output.annotated.clone());
        Ok(())
    }
}
