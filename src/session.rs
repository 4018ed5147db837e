//! Rendering-session abstraction
//!
//! A [`Launcher`] acquires [`RenderingSession`]s, each an isolated instance of
//! a page-rendering engine bound to one viewport. Sessions hand out
//! [`Page`]s that can navigate, take injected markup, expose their HTML and
//! capture the rendered frame.
//!
//! The traits are synchronous: backends such as the CDP adapter drive a
//! blocking protocol client, and the pipeline runs each session on a
//! blocking worker thread.

use crate::{ImageType, Result, Viewport};
use log::warn;
use std::path::Path;
use std::time::Duration;

/// Configuration for acquiring one rendering session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Viewport the page is rendered at (engine default when `None`)
    pub viewport: Option<Viewport>,
    /// How long the engine may take to become ready
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            viewport: None,
            timeout,
        }
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Some(Viewport { width, height });
        self
    }
}

/// Options for capturing the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Capture with a transparent default background
    pub omit_background: bool,
    pub format: ImageType,
    /// Only set for lossy formats
    pub quality: Option<u8>,
}

impl CaptureOptions {
    pub fn from_options(options: &crate::Options) -> Self {
        Self {
            omit_background: !options.opaque,
            format: options.image_type,
            quality: options.image_type.is_lossy().then_some(options.quality),
        }
    }
}

/// Acquires rendering sessions
pub trait Launcher: Send + Sync + 'static {
    type Session: RenderingSession;

    /// Start (or attach to) an engine instance.
    ///
    /// Fails with [`crate::Error::AcquireTimeout`] if the engine is not ready
    /// within `config.timeout`.
    fn acquire(&self, config: &SessionConfig) -> Result<Self::Session>;
}

/// One live engine instance
pub trait RenderingSession {
    type Page: Page;

    /// Open a navigation-capable page
    fn new_page(&self) -> Result<Self::Page>;

    /// Tear down the engine instance. Calling it again is a no-op.
    fn release(&mut self) -> Result<()>;
}

/// A page context inside a rendering session
pub trait Page {
    /// Override the user agent for subsequent navigations
    fn set_user_agent(&self, user_agent: &str) -> Result<()>;

    /// Navigate to an address and wait for the load to finish
    fn goto(&self, url: &str) -> Result<()>;

    /// Replace the page content with `html` without navigating to an address
    fn set_content(&self, html: &str) -> Result<()>;

    /// Wait until an element matching `selector` exists
    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Current serialized document
    fn content(&self) -> Result<String>;

    /// Capture the current frame
    fn screenshot(&self, options: &CaptureOptions) -> Result<Vec<u8>>;

    /// Capture the current frame and write it to `path`
    fn screenshot_to(&self, path: &Path, options: &CaptureOptions) -> Result<()> {
        let bytes = self.screenshot(options)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Acquire a session, run `f` with it, and release it on every exit path.
///
/// An error from `f` wins over a release error; release errors are only
/// returned when `f` succeeded.
pub fn with_session<L, T, F>(launcher: &L, config: &SessionConfig, f: F) -> Result<T>
where
    L: Launcher + ?Sized,
    F: FnOnce(&L::Session) -> Result<T>,
{
    let mut session = launcher.acquire(config)?;
    let outcome = f(&session);
    let released = session.release();

    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            warn!("Failed to release rendering session: {}", release_err);
            Err(e)
        }
    }
}

/// Milliseconds in `duration`, saturating.
pub(crate) fn timeout_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
