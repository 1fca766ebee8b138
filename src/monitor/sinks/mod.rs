//! Consumers of cycle outputs: display state, file log, notifications.
//!
//! Sinks only ever see [`CycleOutput`] snapshots, never the tracked objects
//! themselves, so any of them can be moved to a worker thread with
//! [`ThreadedSink`].

use crate::monitor::CycleOutput;
use crate::util::InspectResult;

mod dashboard;
mod notify;
mod threaded;
mod tsv;

pub use dashboard::{Dashboard, Widget, WidgetState, DEFAULT_PLOT_CAPACITY};
pub use notify::{Condition, Notifier, Transport};
pub use threaded::ThreadedSink;
pub use tsv::{log_file_name, LogRecord, TsvLogger};

/// Receives every successful cycle, in order.
pub trait CycleSink {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()>;
}

impl<K: CycleSink + ?Sized> CycleSink for Box<K> {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()> {
        (**self).consume(output)
    }
}

/// Keeps every output; mostly useful in tests and replays.
impl CycleSink for Vec<CycleOutput> {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()> {
        self.push(output.clone());
        Ok(())
    }
}
