//! Device metadata and image descriptors shared across the pipeline

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A pixel size parsed from a reference table
///
/// `{1, 1}` is the sentinel produced for unparsable text, not a real size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    pub const SENTINEL: Dimension = Dimension { width: 1, height: 1 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::SENTINEL
    }
}

/// Launch-screen sizes for one device row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLaunchSpec {
    pub device: String,
    pub portrait: Dimension,
    pub landscape: Dimension,
}

/// Scale factor for one device row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceScaleSpec {
    pub device: String,
    pub scale_factor: u32,
}

/// Launch-screen sizes joined with the device's scale factor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedLaunchSpec {
    pub device: String,
    pub portrait: Dimension,
    pub landscape: Dimension,
    pub scale_factor: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

/// One image the run must produce
///
/// Identity is structural: two specs are the same entry only when every
/// field matches. `orientation` is `None` for square icons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub scale_factor: u32,
    pub orientation: Option<Orientation>,
}

impl ImageSpec {
    pub fn is_icon(&self) -> bool {
        self.orientation.is_none()
    }
}

/// An image that was captured and written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub scale_factor: u32,
    pub orientation: Option<Orientation>,
    pub path: PathBuf,
}

impl SavedImage {
    pub fn new(spec: ImageSpec, path: PathBuf) -> Self {
        Self {
            name: spec.name,
            width: spec.width,
            height: spec.height,
            scale_factor: spec.scale_factor,
            orientation: spec.orientation,
            path,
        }
    }
}
