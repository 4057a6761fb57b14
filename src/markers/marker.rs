use std::fmt;

use serde::{Deserialize, Serialize};

/// What a marker carries besides its presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Presence,
    Scalar,
    Capture,
}

/// One durable fact about update progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    AttemptStarted,
    InstallPhaseDone,
    /// Holds the install run's stderr; present from the moment install starts.
    InstallFailure,
    InstallFailureRepeated,
    InstallExitCode,
    RebootPhaseStarted,
    RebootStderrCapture,
    RebootFailure,
    RebootExitCode,
    UpdateFinished,
}

impl Marker {
    pub const ALL: [Marker; 10] = [
        Marker::AttemptStarted,
        Marker::InstallPhaseDone,
        Marker::InstallFailure,
        Marker::InstallFailureRepeated,
        Marker::InstallExitCode,
        Marker::RebootPhaseStarted,
        Marker::RebootStderrCapture,
        Marker::RebootFailure,
        Marker::RebootExitCode,
        Marker::UpdateFinished,
    ];

    /// Markers describing the reboot phase.
    pub const REBOOT: [Marker; 4] = [
        Marker::RebootPhaseStarted,
        Marker::RebootStderrCapture,
        Marker::RebootFailure,
        Marker::RebootExitCode,
    ];

    /// File name inside the marker directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Marker::AttemptStarted => "attempt-started",
            Marker::InstallPhaseDone => "install-phase-done",
            Marker::InstallFailure => "install-failure",
            Marker::InstallFailureRepeated => "install-failure-repeated",
            Marker::InstallExitCode => "install-exit-code",
            Marker::RebootPhaseStarted => "reboot-phase-started",
            Marker::RebootStderrCapture => "reboot-stderr-capture",
            Marker::RebootFailure => "reboot-failure",
            Marker::RebootExitCode => "reboot-exit-code",
            Marker::UpdateFinished => "update-finished",
        }
    }

    pub fn kind(self) -> MarkerKind {
        match self {
            Marker::InstallExitCode | Marker::RebootExitCode => MarkerKind::Scalar,
            Marker::InstallFailure | Marker::RebootStderrCapture => MarkerKind::Capture,
            _ => MarkerKind::Presence,
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// A set of markers, as observed in the store at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MarkerSet(u16);

impl MarkerSet {
    /// Number of distinct marker sets.
    pub const COMBINATIONS: u16 = 1 << Marker::ALL.len();

    pub const fn empty() -> Self {
        MarkerSet(0)
    }

    /// Build a set from its bit representation; bits beyond the known
    /// markers are dropped.
    pub fn from_bits(bits: u16) -> Self {
        MarkerSet(bits & (Self::COMBINATIONS - 1))
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, marker: Marker) -> bool {
        self.0 & marker.bit() != 0
    }

    pub fn insert(&mut self, marker: Marker) {
        self.0 |= marker.bit();
    }

    pub fn remove(&mut self, marker: Marker) {
        self.0 &= !marker.bit();
    }

    pub fn with(mut self, marker: Marker) -> Self {
        self.insert(marker);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: MarkerSet) -> MarkerSet {
        MarkerSet(self.0 | other.0)
    }

    pub fn intersection(self, other: MarkerSet) -> MarkerSet {
        MarkerSet(self.0 & other.0)
    }

    pub fn difference(self, other: MarkerSet) -> MarkerSet {
        MarkerSet(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Marker> {
        Marker::ALL
            .into_iter()
            .filter(move |marker| self.contains(*marker))
    }

    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(Marker::file_name).collect()
    }
}

impl FromIterator<Marker> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = Marker>>(iter: I) -> Self {
        let mut set = MarkerSet::empty();
        for marker in iter {
            set.insert(marker);
        }
        set
    }
}

impl<const N: usize> From<[Marker; N]> for MarkerSet {
    fn from(markers: [Marker; N]) -> Self {
        markers.into_iter().collect()
    }
}

impl fmt::Display for MarkerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{}");
        }
        write!(f, "{{{}}}", self.names().join(", "))
    }
}
