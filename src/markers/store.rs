use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{CaptureSink, Marker, MarkerError, MarkerStore};

/// Version of the on-disk marker layout.
pub const MARKER_LAYOUT_VERSION: u32 = 1;

const LAYOUT_VERSION_FILE: &str = ".layout-version";

/// Marker store backed by one file per marker in a directory.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    dir: PathBuf,
}

impl FileMarkerStore {
    /// Open the store for writing. The directory must already exist; the
    /// layout version file is written on first use and checked afterwards.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, MarkerError> {
        let store = Self::open_read_only(dir)?;
        let version_path = store.dir.join(LAYOUT_VERSION_FILE);
        if !version_path.exists() {
            fs::write(&version_path, format!("{MARKER_LAYOUT_VERSION}\n"))
                .map_err(|e| MarkerError::io(LAYOUT_VERSION_FILE, e))?;
            debug!(dir = %store.dir.display(), "Initialized marker directory layout");
        }
        Ok(store)
    }

    /// Open the store without writing anything, still rejecting unknown
    /// layouts.
    pub fn open_read_only(dir: impl Into<PathBuf>) -> Result<Self, MarkerError> {
        let store = Self { dir: dir.into() };
        store.check_layout_version()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, marker: Marker) -> PathBuf {
        self.dir.join(marker.file_name())
    }

    /// Modification time of a marker, used as "when did this happen".
    pub fn modified_at(&self, marker: Marker) -> Option<DateTime<Utc>> {
        let modified = fs::metadata(self.path(marker)).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    fn check_layout_version(&self) -> Result<(), MarkerError> {
        let raw = match fs::read_to_string(self.dir.join(LAYOUT_VERSION_FILE)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(MarkerError::io(LAYOUT_VERSION_FILE, e)),
        };
        match raw.trim().parse::<u32>() {
            Ok(version) if version == MARKER_LAYOUT_VERSION => Ok(()),
            _ => Err(MarkerError::LayoutVersion {
                expected: MARKER_LAYOUT_VERSION,
                found: raw.trim().to_string(),
            }),
        }
    }

    fn open_truncated(&self, marker: Marker) -> Result<File, MarkerError> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.path(marker))
            .map_err(|e| MarkerError::io(marker.file_name(), e))
    }
}

impl MarkerStore for FileMarkerStore {
    fn try_exists(&self, marker: Marker) -> Result<bool, MarkerError> {
        self.path(marker)
            .try_exists()
            .map_err(|e| MarkerError::io(marker.file_name(), e))
    }

    fn create(&self, marker: Marker) -> Result<(), MarkerError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(marker))
            .map_err(|e| MarkerError::io(marker.file_name(), e))?;
        debug!(marker = %marker, "Created marker");
        Ok(())
    }

    fn delete(&self, marker: Marker) -> Result<(), MarkerError> {
        match fs::remove_file(self.path(marker)) {
            Ok(()) => {
                debug!(marker = %marker, "Deleted marker");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MarkerError::io(marker.file_name(), e)),
        }
    }

    fn write_scalar(&self, marker: Marker, value: i32) -> Result<(), MarkerError> {
        let mut file = self.open_truncated(marker)?;
        writeln!(file, "{value}").map_err(|e| MarkerError::io(marker.file_name(), e))?;
        debug!(marker = %marker, value, "Wrote scalar marker");
        Ok(())
    }

    fn read_scalar(&self, marker: Marker) -> Option<i32> {
        let raw = fs::read_to_string(self.path(marker)).ok()?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(marker = %marker, content = %raw.trim(), "Ignoring malformed scalar marker");
                None
            }
        }
    }

    fn capture_stream(&self, marker: Marker) -> Result<CaptureSink, MarkerError> {
        Ok(CaptureSink::File(self.open_truncated(marker)?))
    }

    fn read_capture(&self, marker: Marker) -> Option<String> {
        let bytes = fs::read(self.path(marker)).ok()?;
        if bytes.is_empty() {
            return None;
        }
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn sync(&self) -> Result<(), MarkerError> {
        for marker in Marker::ALL {
            match File::open(self.path(marker)) {
                Ok(file) => file
                    .sync_all()
                    .map_err(|e| MarkerError::io(marker.file_name(), e))?,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(MarkerError::io(marker.file_name(), e)),
            }
        }
        // Directory entries for created and removed markers.
        File::open(&self.dir)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| MarkerError::io(self.dir.display().to_string(), e))
    }
}
