//! Runs a sink on its own worker thread.

use crate::monitor::sinks::CycleSink;
use crate::monitor::CycleOutput;
use crate::util::{InspectError, InspectResult};
use std::sync::mpsc::{self, SyncSender};
use std::thread::{self, JoinHandle};

type Outcome<K> = (K, InspectResult<()>);

/// Forwards cycle outputs to a sink running on a worker thread.
///
/// The channel is bounded; when the worker falls `capacity` outputs behind,
/// [`consume`](CycleSink::consume) blocks. After the wrapped sink fails,
/// the worker stops and the next `consume` returns that error.
pub struct ThreadedSink<K: CycleSink + Send + 'static> {
    tx: Option<SyncSender<CycleOutput>>,
    worker: Option<JoinHandle<Outcome<K>>>,
}

impl<K: CycleSink + Send + 'static> ThreadedSink<K> {
    pub fn spawn(mut sink: K, capacity: usize) -> InspectResult<Self> {
        let (tx, rx) = mpsc::sync_channel::<CycleOutput>(capacity.max(1));
        let worker = thread::Builder::new()
            .name("inspectvision-sink".to_string())
            .spawn(move || {
                for output in rx {
                    if let Err(err) = sink.consume(&output) {
                        return (sink, Err(err));
                    }
                }
                (sink, Ok(()))
            })?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Drains pending outputs and returns the sink, or its first error.
    pub fn finish(mut self) -> InspectResult<K> {
        self.tx = None;
        let (sink, result) = self.join()?;
        result.map(|_| sink)
    }

    fn join(&mut self) -> InspectResult<Outcome<K>> {
        let worker = self.worker.take().ok_or_else(stopped)?;
        worker
            .join()
            .map_err(|_| InspectError::Io(std::io::Error::other("sink worker panicked")))
    }
}

fn stopped() -> InspectError {
    InspectError::Io(std::io::Error::other("sink worker stopped"))
}

impl<K: CycleSink + Send + 'static> CycleSink for ThreadedSink<K> {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()> {
        let tx = self.tx.as_ref().ok_or_else(stopped)?;
        if tx.send(output.clone()).is_ok() {
            return Ok(());
        }
        self.tx = None;
        let (_, result) = self.join()?;
        result.and(Err(stopped()))
    }
}

impl<K: CycleSink + Send + 'static> Drop for ThreadedSink<K> {
    fn drop(&mut self) {
        self.tx = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
