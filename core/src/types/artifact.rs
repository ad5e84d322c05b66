use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of derived output file produced for a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Montage of original slices (PNG)
    OriginalSlices,
    /// Montage of skull-stripped slices (PNG)
    StrippedSlices,
    /// Intensity density plot (SVG)
    Density,
    /// Intensity statistics record (CSV)
    Stats,
}

/// All artifact kinds, in report slot order
pub const ARTIFACT_KINDS: [ArtifactKind; 4] = [
    ArtifactKind::OriginalSlices,
    ArtifactKind::StrippedSlices,
    ArtifactKind::Density,
    ArtifactKind::Stats,
];

impl ArtifactKind {
    /// Filename suffix appended to a scan's base name
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::OriginalSlices => "_original_slices.png",
            ArtifactKind::StrippedSlices => "_skullstripped_slices.png",
            ArtifactKind::Density => "_density.svg",
            ArtifactKind::Stats => "_stats.csv",
        }
    }

    /// Section title used in reports
    pub fn title(&self) -> &'static str {
        match self {
            ArtifactKind::OriginalSlices => "Original Slices",
            ArtifactKind::StrippedSlices => "Skull-Stripped Slices",
            ArtifactKind::Density => "Density Plot",
            ArtifactKind::Stats => "Stats",
        }
    }

    /// Builds the artifact file name for a scan base name
    pub fn file_name(&self, base: &str) -> String {
        format!("{}{}", base, self.suffix())
    }

    /// Classifies a file name by its suffix
    pub fn from_file_name(name: &str) -> Option<Self> {
        ARTIFACT_KINDS
            .iter()
            .copied()
            .find(|kind| name.ends_with(kind.suffix()))
    }

    fn slot(&self) -> usize {
        match self {
            ArtifactKind::OriginalSlices => 0,
            ArtifactKind::StrippedSlices => 1,
            ArtifactKind::Density => 2,
            ArtifactKind::Stats => 3,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Paths of the artifacts found for one scan key
///
/// Any slot may be empty. Setting a slot twice keeps the last path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    slots: [Option<PathBuf>; 4],
}

impl ArtifactSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path` for `kind`, returning the path it replaced
    pub fn set(&mut self, kind: ArtifactKind, path: PathBuf) -> Option<PathBuf> {
        self.slots[kind.slot()].replace(path)
    }

    /// Returns the path recorded for `kind`
    pub fn get(&self, kind: ArtifactKind) -> Option<&Path> {
        self.slots[kind.slot()].as_deref()
    }

    /// Returns the first recorded artifact in slot order
    pub fn first_available(&self) -> Option<(ArtifactKind, &Path)> {
        ARTIFACT_KINDS
            .iter()
            .find_map(|kind| self.get(*kind).map(|p| (*kind, p)))
    }

    /// Returns whether no slot is filled
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Iterates over filled slots in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &Path)> {
        ARTIFACT_KINDS
            .iter()
            .filter_map(move |kind| self.get(*kind).map(|p| (*kind, p)))
    }
}
