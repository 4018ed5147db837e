//! PWA Assets
//!
//! Generates the icon and launch-screen images an installable web app needs
//! from a single visual source (a URL, an HTML file, an image, or a markup
//! string) by rendering it in headless Chrome at every required size.
//!
//! # Pipeline
//!
//! 1. [`metadata::get_splash_screen_meta_data`] loads per-device launch-screen
//!    dimensions and scale factors, scraping the reference tables when asked
//!    and falling back to a built-in dataset on any failure.
//! 2. [`manifest::build_manifest`] turns that metadata and the [`Options`]
//!    into a deduplicated list of [`ImageSpec`]s.
//! 3. [`CaptureOrchestrator`] renders every entry in its own rendering
//!    session and writes `<output>/<name>.<type>`.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "cdp")]
//! # async fn run() -> pwa_assets::Result<()> {
//! use std::sync::Arc;
//! use pwa_assets::{cdp::CdpLauncher, CaptureOrchestrator, Options};
//!
//! let options = Options { favicon: true, ..Default::default() };
//! let orchestrator = CaptureOrchestrator::new(Arc::new(CdpLauncher::new()));
//! let saved = orchestrator
//!     .generate_images("logo.svg", std::path::Path::new("./assets"), &options)
//!     .await?;
//! println!("Generated {} images", saved.len());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod fallback;
pub mod flags;
pub mod manifest;
pub mod meta;
pub mod metadata;
pub mod model;
pub mod parse;
pub mod session;
pub mod source;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use capture::{CaptureOrchestrator, Concurrency};
pub use model::{
    DeviceLaunchSpec, DeviceScaleSpec, Dimension, ImageSpec, Orientation, SavedImage,
    UnifiedLaunchSpec,
};
pub use session::{CaptureOptions, Launcher, Page, RenderingSession, SessionConfig};

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Png,
    Jpeg,
    Webp,
}

impl ImageType {
    /// Format name, also used as the file extension
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpeg",
            ImageType::Webp => "webp",
        }
    }

    /// MIME type for HTML and manifest output
    pub fn mime(&self) -> &'static str {
        match self {
            ImageType::Png => "image/png",
            ImageType::Jpeg => "image/jpeg",
            ImageType::Webp => "image/webp",
        }
    }

    /// Whether `quality` applies to this format
    pub fn is_lossy(&self) -> bool {
        !matches!(self, ImageType::Png)
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageType::Png),
            "jpeg" | "jpg" => Ok(ImageType::Jpeg),
            "webp" => Ok(ImageType::Webp),
            other => Err(format!("unsupported image type '{}' (expected png, jpeg or webp)", other)),
        }
    }
}

/// Configuration for one generation run
///
/// Options are treated as immutable once the run starts. Conflicting `*_only`
/// pairs are resolved beforehand by [`flags::normalize`].
///
/// # Examples
///
/// ```
/// let opts = pwa_assets::Options::default();
/// assert!(opts.scrape);
/// assert_eq!(opts.quality, 70);
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Also generate favicon sizes
    pub favicon: bool,
    /// Name launch screens with the dark-mode suffix
    pub dark_mode: bool,
    /// Generate icons only
    pub icon_only: bool,
    /// Generate launch screens only
    pub splash_only: bool,
    /// Generate portrait launch screens only
    pub portrait_only: bool,
    /// Generate landscape launch screens only
    pub landscape_only: bool,
    /// Scrape the latest device tables instead of using built-in data
    pub scrape: bool,
    /// Keep the page background instead of capturing with transparency
    pub opaque: bool,
    /// Output format
    pub image_type: ImageType,
    /// Quality for lossy formats (0-100), ignored for PNG
    pub quality: u8,
    /// CSS background of the shell page used for image sources
    pub background: String,
    /// CSS padding around the image on the shell page
    pub padding: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            favicon: false,
            dark_mode: false,
            icon_only: false,
            splash_only: false,
            portrait_only: false,
            landscape_only: false,
            scrape: true,
            opaque: true,
            image_type: ImageType::Jpeg,
            quality: 70,
            background: "transparent".to_string(),
            padding: "10%".to_string(),
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert!(options.scrape);
        assert!(options.opaque);
        assert!(!options.icon_only && !options.splash_only);
        assert_eq!(options.image_type, ImageType::Jpeg);
    }

    #[test]
    fn test_image_type_parsing() {
        assert_eq!("png".parse::<ImageType>().unwrap(), ImageType::Png);
        assert_eq!("JPG".parse::<ImageType>().unwrap(), ImageType::Jpeg);
        assert_eq!("webp".parse::<ImageType>().unwrap(), ImageType::Webp);
        assert!("gif".parse::<ImageType>().is_err());
        assert!(!ImageType::Png.is_lossy());
        assert!(ImageType::Webp.is_lossy());
    }
}
