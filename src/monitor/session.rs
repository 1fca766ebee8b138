//! Frame sources and exclusive capture sessions.
//!
//! A [`SourceRegistry`] hands out at most one [`CaptureSession`] per
//! [`SourceId`]. The claim is released when the session is dropped or turned
//! back into its source. Registries are plain values, so independent tests or
//! applications never share one by accident.

use crate::image::Frame;
use crate::util::{InspectError, InspectResult};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Identifier of a physical frame source (camera index, device path, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplier of frames (HxWx3, samples in `[0, 1]`).
pub trait FrameSource {
    /// Identity of the underlying device.
    fn id(&self) -> SourceId;

    /// Blocks until a frame is available. Errors are fatal for the monitor.
    fn capture(&mut self) -> InspectResult<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn id(&self) -> SourceId {
        (**self).id()
    }

    fn capture(&mut self) -> InspectResult<Frame> {
        (**self).capture()
    }
}

type OpenSet = Arc<Mutex<HashSet<SourceId>>>;

/// Tracks which sources currently have an open session.
#[derive(Clone, Debug, Default)]
pub struct SourceRegistry {
    open: OpenSet,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `source` and opens a session on it.
    ///
    /// Fails with [`InspectError::SourceInUse`] while another session for the
    /// same id is alive.
    pub fn open<S: FrameSource>(&self, source: S) -> InspectResult<CaptureSession<S>> {
        let id = source.id();
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if !open.insert(id.clone()) {
            return Err(InspectError::SourceInUse {
                id: id.as_str().to_string(),
            });
        }
        drop(open);
        Ok(CaptureSession {
            source,
            lease: Some(Lease {
                id,
                open: Arc::clone(&self.open),
            }),
        })
    }

    /// Returns true while a session for `id` is alive.
    pub fn is_open(&self, id: &SourceId) -> bool {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

struct Lease {
    id: SourceId,
    open: OpenSet,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Exclusively owned handle on a frame source.
pub struct CaptureSession<S> {
    source: S,
    lease: Option<Lease>,
}

impl<S: FrameSource> CaptureSession<S> {
    /// Wraps a source without registering it; exclusivity comes from ownership alone.
    pub fn unregistered(source: S) -> Self {
        Self {
            source,
            lease: None,
        }
    }

    pub fn id(&self) -> SourceId {
        self.source.id()
    }

    /// True when the session holds a registry claim.
    pub fn is_registered(&self) -> bool {
        self.lease.is_some()
    }

    /// Captures one frame.
    pub fn capture(&mut self) -> InspectResult<Frame> {
        self.source.capture()
    }

    /// Captures and discards `frames` frames while the device settles.
    pub fn warm_up(&mut self, frames: usize) -> InspectResult<()> {
        for _ in 0..frames {
            self.source.capture()?;
        }
        Ok(())
    }

    /// Releases the claim and returns the source.
    pub fn into_source(self) -> S {
        let CaptureSession { source, lease } = self;
        drop(lease);
        source
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameSource, SourceId, SourceRegistry};
    use crate::image::Frame;
    use crate::util::{ErrorKind, InspectResult};

    struct Still(&'static str);

    impl FrameSource for Still {
        fn id(&self) -> SourceId {
            SourceId::new(self.0)
        }

        fn capture(&mut self) -> InspectResult<Frame> {
            Ok(Frame::filled(2, 2, [0.5; 3]))
        }
    }

    #[test]
    fn second_open_fails_until_release() {
        let registry = SourceRegistry::new();
        let session = registry.open(Still("cam0")).unwrap();
        let err = registry.open(Still("cam0")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(registry.open(Still("cam1")).is_ok());

        drop(session);
        assert!(!registry.is_open(&SourceId::new("cam0")));
        let session = registry.open(Still("cam0")).unwrap();
        let _source = session.into_source();
        assert!(!registry.is_open(&SourceId::new("cam0")));
    }

    #[test]
    fn registries_are_independent() {
        let a = SourceRegistry::new();
        let b = SourceRegistry::new();
        let _s1 = a.open(Still("cam0")).unwrap();
        assert!(b.open(Still("cam0")).is_ok());
    }
}
