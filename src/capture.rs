//! Per-image rendering and capture
//!
//! Every manifest entry is rendered in its own session sized to the image.
//! All capture tasks are started up front; results are then awaited one by
//! one in manifest order, so the first failing entry (in manifest order)
//! aborts the batch and nothing is returned for it.

use crate::manifest;
use crate::metadata;
use crate::model::{ImageSpec, SavedImage};
use crate::session::{with_session, CaptureOptions, Launcher, Page, RenderingSession, SessionConfig};
use crate::source::{self, ResolvedSource};
use crate::{Error, Options, Result};
use log::{debug, error, info, warn};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// How long a capture session may take to become ready
pub const BROWSER_SHELL_TIMEOUT: Duration = Duration::from_millis(60000);

/// Upper bound on rendering sessions alive at once during a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// Start every capture immediately
    #[default]
    Unbounded,
    /// At most `n` sessions in flight
    Limited(NonZeroUsize),
}

impl Concurrency {
    /// `None` or `0` means unbounded.
    pub fn from_limit(limit: Option<usize>) -> Self {
        limit
            .and_then(NonZeroUsize::new)
            .map_or(Concurrency::Unbounded, Concurrency::Limited)
    }
}

/// Drives metadata acquisition, manifest construction and capture for a run
pub struct CaptureOrchestrator<L: Launcher> {
    launcher: Arc<L>,
    concurrency: Concurrency,
    session_timeout: Duration,
}

impl<L: Launcher> CaptureOrchestrator<L> {
    pub fn new(launcher: Arc<L>) -> Self {
        Self {
            launcher,
            concurrency: Concurrency::default(),
            session_timeout: BROWSER_SHELL_TIMEOUT,
        }
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Acquire metadata, build the manifest, and render every image into
    /// `output`.
    pub async fn generate_images(
        &self,
        source: &str,
        output: &Path,
        options: &Options,
    ) -> Result<Vec<SavedImage>> {
        let launcher = self.launcher.clone();
        let scrape_options = options.clone();
        let specs = tokio::task::spawn_blocking(move || {
            metadata::get_splash_screen_meta_data(launcher.as_ref(), &scrape_options)
        })
        .await
        .map_err(|e| Error::Other(format!("Metadata task failed: {}", e)))?;

        let images = manifest::build_manifest(&specs, options);
        ensure_output_dir(output).await?;
        self.save_images(images, source, output, options).await
    }

    /// Render `images` in manifest order.
    ///
    /// The source is resolved once and shared by every session.
    pub async fn save_images(
        &self,
        images: Vec<ImageSpec>,
        source: &str,
        output: &Path,
        options: &Options,
    ) -> Result<Vec<SavedImage>> {
        info!("Rendering {} images", images.len());
        let resolved = Arc::new(source::resolve(source, options)?);
        let capture = CaptureOptions::from_options(options);
        let limiter = match self.concurrency {
            Concurrency::Unbounded => None,
            Concurrency::Limited(n) => Some(Arc::new(Semaphore::new(n.get()))),
        };

        let tasks: Vec<(String, JoinHandle<Result<SavedImage>>)> = images
            .into_iter()
            .map(|spec| {
                let name = spec.name.clone();
                let path = source::image_save_path(&spec.name, output, options.image_type);
                let handle = tokio::spawn(run_capture(
                    self.launcher.clone(),
                    resolved.clone(),
                    limiter.clone(),
                    spec,
                    path,
                    capture,
                    self.session_timeout,
                ));
                (name, handle)
            })
            .collect();

        let mut saved = Vec::with_capacity(tasks.len());
        let mut pending = tasks.into_iter();
        while let Some((name, handle)) = pending.next() {
            let outcome = handle.await.unwrap_or_else(|e| {
                Err(Error::CaptureFailed {
                    name,
                    source: Box::new(Error::Other(format!("Capture task failed: {}", e))),
                })
            });
            match outcome {
                Ok(image) => saved.push(image),
                Err(e) => {
                    // Captures still waiting for a session never start; ones
                    // already rendering finish and release their session.
                    for (_, queued) in pending {
                        queued.abort();
                    }
                    return Err(e);
                }
            }
        }
        Ok(saved)
    }
}

async fn run_capture<L: Launcher>(
    launcher: Arc<L>,
    resolved: Arc<ResolvedSource>,
    limiter: Option<Arc<Semaphore>>,
    spec: ImageSpec,
    path: PathBuf,
    capture: CaptureOptions,
    timeout: Duration,
) -> Result<SavedImage> {
    let _permit = match limiter {
        Some(semaphore) => Some(
            semaphore
                .acquire_owned()
                .await
                .map_err(|e| Error::Other(format!("Session pool closed: {}", e)))?,
        ),
        None => None,
    };

    tokio::task::spawn_blocking(move || {
        capture_image(launcher.as_ref(), &resolved, spec, path, &capture, timeout)
    })
    .await
    .map_err(|e| Error::Other(format!("Capture task failed: {}", e)))?
}

/// Render one image in a dedicated session and write it to `path`.
pub fn capture_image<L: Launcher + ?Sized>(
    launcher: &L,
    resolved: &ResolvedSource,
    spec: ImageSpec,
    path: PathBuf,
    capture: &CaptureOptions,
    timeout: Duration,
) -> Result<SavedImage> {
    let config = SessionConfig::new(timeout).with_viewport(spec.width, spec.height);
    debug!("Capturing {} at {}x{}", spec.name, spec.width, spec.height);

    let outcome = with_session(launcher, &config, |session| {
        let page = session.new_page()?;
        match resolved {
            ResolvedSource::Address(address) => page.goto(address)?,
            ResolvedSource::Markup(html) => page.set_content(html)?,
        }
        page.screenshot_to(&path, capture)
    });

    match outcome {
        Ok(()) => {
            info!("Saved image {}", spec.name);
            Ok(SavedImage::new(spec, path))
        }
        Err(e) => {
            error!("Failed to save image {}: {}", spec.name, e);
            Err(Error::CaptureFailed {
                name: spec.name,
                source: Box::new(e),
            })
        }
    }
}

/// Create `output` if it does not exist yet.
pub async fn ensure_output_dir(output: &Path) -> Result<()> {
    let exists = tokio::fs::metadata(output)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if exists {
        return Ok(());
    }

    warn!("Looks like folder {} doesn't exist. Created one for you", output.display());
    tokio::fs::create_dir_all(output)
        .await
        .map_err(|source| Error::DirectoryCreateFailed {
            path: output.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_from_limit() {
        assert_eq!(Concurrency::from_limit(None), Concurrency::Unbounded);
        assert_eq!(Concurrency::from_limit(Some(0)), Concurrency::Unbounded);
        assert_eq!(
            Concurrency::from_limit(Some(3)),
            Concurrency::Limited(NonZeroUsize::new(3).unwrap())
        );
    }

    #[tokio::test]
    async fn output_dir_is_created_once() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested");
        ensure_output_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        ensure_output_dir(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn output_dir_over_a_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = ensure_output_dir(file.path()).await.unwrap_err();
        assert!(matches!(err, Error::DirectoryCreateFailed { .. }));
    }
}
