//! Marker Store
//!
//! The durable memory of an update attempt. Every fact about update progress
//! is one file in a single directory; its presence (and for a few markers, its
//! content) is the only thing that survives power loss or reboot.
//!
//! Operations: exists, create, delete, scalar read/write, stderr capture and
//! an explicit durability barrier. The driver is the only writer; the
//! external executor only ever writes into a capture sink handed to it.

pub mod marker;
pub mod store;

#[cfg(test)]
pub mod mocks;

use std::io::Write;
use std::sync::{Arc, Mutex};

use thiserror::Error;

pub use marker::{Marker, MarkerKind, MarkerSet};
pub use store::{FileMarkerStore, MARKER_LAYOUT_VERSION};

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("I/O error on marker {marker}: {source}")]
    Io {
        marker: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Marker directory layout version {found} is not supported (expected {expected})")]
    LayoutVersion { expected: u32, found: String },
}

impl MarkerError {
    pub(crate) fn io(marker: impl Into<String>, source: std::io::Error) -> Self {
        MarkerError::Io {
            marker: marker.into(),
            source,
        }
    }
}

/// Storage interface for update progress markers.
///
/// `create`, `delete` and `write_scalar` are idempotent. Scalar and capture
/// reads never fail: a missing or malformed scalar reads as `None`. Presence
/// lookups do fail, since an unreadable marker is not an absent one.
pub trait MarkerStore {
    fn try_exists(&self, marker: Marker) -> Result<bool, MarkerError>;

    /// Presence, with lookup errors read as absent. Only for display and
    /// tests; inference goes through `snapshot`.
    fn exists(&self, marker: Marker) -> bool {
        self.try_exists(marker).unwrap_or(false)
    }

    fn create(&self, marker: Marker) -> Result<(), MarkerError>;

    fn delete(&self, marker: Marker) -> Result<(), MarkerError>;

    fn write_scalar(&self, marker: Marker, value: i32) -> Result<(), MarkerError>;

    fn read_scalar(&self, marker: Marker) -> Option<i32>;

    /// Create (or truncate) the marker and return a sink the executor's
    /// stderr is written into. The marker exists from this point on.
    fn capture_stream(&self, marker: Marker) -> Result<CaptureSink, MarkerError>;

    /// Captured text, or `None` when the marker is absent or empty.
    fn read_capture(&self, marker: Marker) -> Option<String>;

    /// Flush everything written so far to stable storage.
    fn sync(&self) -> Result<(), MarkerError>;

    fn snapshot(&self) -> Result<MarkerSet, MarkerError> {
        let mut present = MarkerSet::empty();
        for marker in Marker::ALL {
            if self.try_exists(marker)? {
                present.insert(marker);
            }
        }
        Ok(present)
    }

    fn delete_all(&self, markers: MarkerSet) -> Result<(), MarkerError> {
        for marker in markers.iter() {
            self.delete(marker)?;
        }
        Ok(())
    }
}

/// Destination for a captured stderr stream.
///
/// File-backed stores hand out the marker file itself so the text lands on
/// disk even if the orchestrator dies while the executor runs.
#[derive(Debug)]
pub enum CaptureSink {
    File(std::fs::File),
    Buffer(Arc<Mutex<Vec<u8>>>),
}

impl CaptureSink {
    /// The file to hand to a child process as stderr, if this sink has one.
    pub fn into_file(self) -> Result<std::fs::File, CaptureSink> {
        match self {
            CaptureSink::File(file) => Ok(file),
            other => Err(other),
        }
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            CaptureSink::File(file) => file.write(buf),
            CaptureSink::Buffer(buffer) => {
                let mut guard = buffer
                    .lock()
                    .map_err(|_| std::io::Error::other("capture buffer poisoned"))?;
                guard.extend_from_slice(buf);
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            CaptureSink::File(file) => file.flush(),
            CaptureSink::Buffer(_) => Ok(()),
        }
    }
}
