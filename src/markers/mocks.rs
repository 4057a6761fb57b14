// In-memory marker store for tests - no disk access

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{CaptureSink, Marker, MarkerError, MarkerSet, MarkerStore};

/// Marker store double that keeps markers in memory and records every
/// durability barrier so tests can check ordering.
#[derive(Debug, Default)]
pub struct InMemoryMarkerStore {
    present: RefCell<MarkerSet>,
    scalars: RefCell<HashMap<Marker, String>>,
    captures: RefCell<HashMap<Marker, Arc<Mutex<Vec<u8>>>>>,
    synced: RefCell<Vec<MarkerSet>>,
    failing_writes: RefCell<MarkerSet>,
    failing_lookups: RefCell<MarkerSet>,
}

fn injected(marker: Marker) -> MarkerError {
    MarkerError::io(marker.file_name(), std::io::Error::other("injected failure"))
}

impl InMemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(markers: MarkerSet) -> Self {
        let store = Self::new();
        *store.present.borrow_mut() = markers;
        store
    }

    /// Store raw scalar text, including malformed values.
    pub fn set_raw_scalar(&self, marker: Marker, raw: &str) {
        self.present.borrow_mut().insert(marker);
        self.scalars.borrow_mut().insert(marker, raw.to_string());
    }

    /// Make every create, scalar write and capture of `marker` fail.
    pub fn fail_writes_to(&self, marker: Marker) {
        self.failing_writes.borrow_mut().insert(marker);
    }

    /// Make presence lookups of `marker` fail.
    pub fn fail_lookups_of(&self, marker: Marker) {
        self.failing_lookups.borrow_mut().insert(marker);
    }

    fn check_write(&self, marker: Marker) -> Result<(), MarkerError> {
        if self.failing_writes.borrow().contains(marker) {
            return Err(injected(marker));
        }
        Ok(())
    }

    /// Marker sets observed at each `sync` call.
    pub fn synced_states(&self) -> Vec<MarkerSet> {
        self.synced.borrow().clone()
    }
}

impl MarkerStore for InMemoryMarkerStore {
    fn try_exists(&self, marker: Marker) -> Result<bool, MarkerError> {
        if self.failing_lookups.borrow().contains(marker) {
            return Err(injected(marker));
        }
        Ok(self.present.borrow().contains(marker))
    }

    fn create(&self, marker: Marker) -> Result<(), MarkerError> {
        self.check_write(marker)?;
        self.present.borrow_mut().insert(marker);
        Ok(())
    }

    fn delete(&self, marker: Marker) -> Result<(), MarkerError> {
        self.present.borrow_mut().remove(marker);
        self.scalars.borrow_mut().remove(&marker);
        self.captures.borrow_mut().remove(&marker);
        Ok(())
    }

    fn write_scalar(&self, marker: Marker, value: i32) -> Result<(), MarkerError> {
        self.check_write(marker)?;
        self.set_raw_scalar(marker, &value.to_string());
        Ok(())
    }

    fn read_scalar(&self, marker: Marker) -> Option<i32> {
        if !self.exists(marker) {
            return None;
        }
        self.scalars.borrow().get(&marker)?.trim().parse().ok()
    }

    fn capture_stream(&self, marker: Marker) -> Result<CaptureSink, MarkerError> {
        self.check_write(marker)?;
        let buffer = Arc::new(Mutex::new(Vec::new()));
        self.present.borrow_mut().insert(marker);
        self.captures.borrow_mut().insert(marker, Arc::clone(&buffer));
        Ok(CaptureSink::Buffer(buffer))
    }

    fn read_capture(&self, marker: Marker) -> Option<String> {
        if !self.exists(marker) {
            return None;
        }
        let captures = self.captures.borrow();
        let bytes = captures.get(&marker)?.lock().ok()?.clone();
        if bytes.is_empty() {
            return None;
        }
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn sync(&self) -> Result<(), MarkerError> {
        let snapshot = *self.present.borrow();
        self.synced.borrow_mut().push(snapshot);
        Ok(())
    }
}
