//! Chrome DevTools Protocol rendering sessions (uses the `headless_chrome` crate)
//!
//! Two session variants share one handle type:
//! - *owned*: `headless_chrome` launches Chrome and owns the process; dropping
//!   the `Browser` closes it.
//! - *attached*: Chrome is spawned from a configured executable and reached
//!   over its DevTools websocket; teardown disconnects and then kills the
//!   process.
//!
//! The variant is picked by [`CdpLauncher`] at acquisition time and is never
//! visible to callers.

use crate::session::{timeout_ms, CaptureOptions, Launcher, Page, RenderingSession, SessionConfig};
use crate::{Error, ImageType, Result, Viewport};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page as CdpPage;
use headless_chrome::protocol::cdp::{Emulation, DOM};
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const CHROME_ARGS: &[&str] = &["--hide-scrollbars", "--force-device-scale-factor=1", "--mute-audio"];
const DEVTOOLS_POLL_INTERVAL: Duration = Duration::from_millis(100);
const READY_STATE_POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Written by Chrome into its profile once the DevTools server listens
const DEVTOOLS_ACTIVE_PORT: &str = "DevToolsActivePort";

static PROFILE_SEQ: AtomicUsize = AtomicUsize::new(0);

fn profile_prefix() -> String {
    format!("pwa-assets-chrome-{}-", std::process::id())
}

/// Launches headless Chrome sessions
#[derive(Debug, Clone, Default)]
pub struct CdpLauncher {
    chrome_path: Option<PathBuf>,
    no_sandbox: bool,
}

impl CdpLauncher {
    /// Owned sessions; `headless_chrome` locates Chrome on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attached sessions spawned from the given Chrome executable.
    pub fn with_chrome_path(path: impl Into<PathBuf>) -> Self {
        Self {
            chrome_path: Some(path.into()),
            no_sandbox: false,
        }
    }

    /// Disable the Chrome sandbox (needed in some containers).
    pub fn no_sandbox(mut self, no_sandbox: bool) -> Self {
        self.no_sandbox = no_sandbox;
        self
    }

    fn launch_owned(&self, config: &SessionConfig) -> Result<CdpSession> {
        let mut builder = LaunchOptions::default_builder();
        builder
            .headless(true)
            .sandbox(!self.no_sandbox)
            .args(CHROME_ARGS.iter().map(OsStr::new).collect());
        if let Some(viewport) = config.viewport {
            builder.window_size(Some((viewport.width, viewport.height)));
        }
        let options = builder
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        // Browser::new blocks until Chrome answers; bound it by the session timeout.
        // A late result is dropped by the launch thread, which closes the browser.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(Browser::new(options));
        });

        match rx.recv_timeout(config.timeout) {
            Ok(Ok(browser)) => Ok(CdpSession::new(browser, Teardown::Owned, config)),
            Ok(Err(e)) => Err(Error::InitializationError(format!("Failed to launch browser: {}", e))),
            Err(RecvTimeoutError::Timeout) => Err(Error::AcquireTimeout(timeout_ms(config.timeout))),
            Err(RecvTimeoutError::Disconnected) => Err(Error::InitializationError(
                "Browser launch thread exited without a result".into(),
            )),
        }
    }

    fn launch_attached(&self, chrome_path: &Path, config: &SessionConfig) -> Result<CdpSession> {
        let profile_dir = std::env::temp_dir().join(format!(
            "{}{}",
            profile_prefix(),
            PROFILE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        // Chrome picks its own port and reports it in the profile.
        let _ = std::fs::remove_dir_all(&profile_dir);
        std::fs::create_dir_all(&profile_dir)?;

        let mut command = Command::new(chrome_path);
        command
            .arg("--headless=new")
            .arg("--remote-debugging-port=0")
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .args(["--no-first-run", "--no-default-browser-check"])
            .args(CHROME_ARGS);
        if let Some(viewport) = config.viewport {
            command.arg(format!("--window-size={},{}", viewport.width, viewport.height));
        }
        if self.no_sandbox {
            command.arg("--no-sandbox");
        }
        let spawned = command
            .arg("about:blank")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut chrome = match spawned {
            Ok(chrome) => chrome,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&profile_dir);
                return Err(Error::InitializationError(format!(
                    "Failed to start {}: {}",
                    chrome_path.display(),
                    e
                )));
            }
        };
        debug!("Started Chrome (pid {}) with profile {}", chrome.id(), profile_dir.display());

        let connected = wait_for_debugger_url(&profile_dir, config.timeout).and_then(|ws_url| {
            Browser::connect(ws_url)
                .map_err(|e| Error::InitializationError(format!("Failed to attach to browser: {}", e)))
        });

        match connected {
            Ok(browser) => Ok(CdpSession::new(
                browser,
                Teardown::Attached { chrome, profile_dir },
                config,
            )),
            Err(e) => {
                if let Err(kill_err) = terminate(&mut chrome, &profile_dir) {
                    warn!("Failed to stop Chrome after a failed attach: {}", kill_err);
                }
                Err(e)
            }
        }
    }
}

impl Launcher for CdpLauncher {
    type Session = CdpSession;

    fn acquire(&self, config: &SessionConfig) -> Result<CdpSession> {
        match &self.chrome_path {
            Some(path) => self.launch_attached(path, config),
            None => self.launch_owned(config),
        }
    }
}

/// First line of `DevToolsActivePort`, once Chrome has written it.
fn read_active_port(path: &Path) -> Option<u16> {
    std::fs::read_to_string(path)
        .ok()?
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
        .filter(|port| *port != 0)
}

#[derive(Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Wait for Chrome to report its DevTools port, then poll `/json/version`
/// until it publishes the websocket URL.
fn wait_for_debugger_url(profile_dir: &Path, timeout: Duration) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(DEVTOOLS_POLL_INTERVAL * 5)
        .build()
        .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;
    let port_file = profile_dir.join(DEVTOOLS_ACTIVE_PORT);
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        let Some(port) = read_active_port(&port_file) else {
            thread::sleep(DEVTOOLS_POLL_INTERVAL);
            continue;
        };
        let body = client
            .get(format!("http://127.0.0.1:{}/json/version", port))
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text());
        match body {
            Ok(body) => match serde_json::from_str::<VersionInfo>(&body) {
                Ok(info) => return Ok(info.web_socket_debugger_url),
                Err(e) => debug!("Unexpected DevTools version payload: {}", e),
            },
            Err(e) => debug!("DevTools endpoint not ready: {}", e),
        }
        thread::sleep(DEVTOOLS_POLL_INTERVAL);
    }
    Err(Error::AcquireTimeout(timeout_ms(timeout)))
}

fn terminate(chrome: &mut Child, profile_dir: &Path) -> Result<()> {
    if let Err(e) = chrome.kill() {
        debug!("Chrome already exited: {}", e);
    }
    chrome.wait()?;
    if let Err(e) = std::fs::remove_dir_all(profile_dir) {
        debug!("Could not remove Chrome profile {}: {}", profile_dir.display(), e);
    }
    Ok(())
}

enum Teardown {
    Owned,
    Attached { chrome: Child, profile_dir: PathBuf },
}

/// One Chrome instance bound to a viewport
pub struct CdpSession {
    browser: Option<Browser>,
    teardown: Teardown,
    viewport: Option<Viewport>,
    timeout: Duration,
}

impl CdpSession {
    fn new(browser: Browser, teardown: Teardown, config: &SessionConfig) -> Self {
        Self {
            browser: Some(browser),
            teardown,
            viewport: config.viewport,
            timeout: config.timeout,
        }
    }
}

impl RenderingSession for CdpSession {
    type Page = CdpPageHandle;

    fn new_page(&self) -> Result<CdpPageHandle> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| Error::Other("Session already released".into()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(self.timeout);
        if let Some(viewport) = self.viewport {
            tab.call_method(Emulation::SetDeviceMetricsOverride {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: 1.0,
                mobile: false,
                scale: None,
                screen_width: None,
                screen_height: None,
                position_x: None,
                position_y: None,
                dont_set_visible_size: None,
                screen_orientation: None,
                viewport: None,
                display_feature: None,
                device_posture: None,
            })
            .map_err(|e| Error::InitializationError(format!("Failed to set viewport: {}", e)))?;
        }
        Ok(CdpPageHandle {
            tab,
            viewport: self.viewport,
            timeout: self.timeout,
        })
    }

    fn release(&mut self) -> Result<()> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        // Dropping the last handle closes an owned browser and disconnects an attached one.
        drop(browser);
        match &mut self.teardown {
            Teardown::Owned => Ok(()),
            Teardown::Attached { chrome, profile_dir } => terminate(chrome, profile_dir),
        }
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to release Chrome session: {}", e);
        }
    }
}

/// A tab inside a [`CdpSession`]
pub struct CdpPageHandle {
    tab: Arc<Tab>,
    viewport: Option<Viewport>,
    timeout: Duration,
}

impl CdpPageHandle {
    /// Block until the document and its subresources have loaded.
    fn wait_for_load(&self) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let state = self
                .tab
                .evaluate("document.readyState", false)
                .map_err(|e| Error::LoadError(format!("Failed to read document state: {}", e)))?;
            if state.value.as_ref().and_then(|v| v.as_str()) == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::LoadError(format!(
                    "Document did not finish loading within {}ms",
                    timeout_ms(self.timeout)
                )));
            }
            thread::sleep(READY_STATE_POLL_INTERVAL);
        }
    }
}

fn screenshot_format(format: ImageType) -> CdpPage::CaptureScreenshotFormatOption {
    match format {
        ImageType::Png => CdpPage::CaptureScreenshotFormatOption::Png,
        ImageType::Jpeg => CdpPage::CaptureScreenshotFormatOption::Jpeg,
        ImageType::Webp => CdpPage::CaptureScreenshotFormatOption::Webp,
    }
}

impl Page for CdpPageHandle {
    fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.tab
            .set_user_agent(user_agent, None, None)
            .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))
    }

    fn goto(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;
        Ok(())
    }

    fn set_content(&self, html: &str) -> Result<()> {
        let frames = self
            .tab
            .call_method(CdpPage::GetFrameTree(None))
            .map_err(|e| Error::LoadError(format!("Failed to read frame tree: {}", e)))?;
        self.tab
            .call_method(CdpPage::SetDocumentContent {
                frame_id: frames.frame_tree.frame.id,
                html: html.to_string(),
            })
            .map_err(|e| Error::LoadError(format!("Failed to set page content: {}", e)))?;
        self.wait_for_load()
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|e| Error::LoadError(format!("Selector '{}' not found: {}", selector, e)))
    }

    fn content(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| Error::RenderError(format!("Failed to read page content: {}", e)))
    }

    fn screenshot(&self, options: &CaptureOptions) -> Result<Vec<u8>> {
        if options.omit_background {
            self.tab
                .call_method(Emulation::SetDefaultBackgroundColorOverride {
                    color: Some(DOM::RGBA {
                        r: 0,
                        g: 0,
                        b: 0,
                        a: Some(0.0),
                    }),
                })
                .map_err(|e| Error::RenderError(format!("Failed to clear background: {}", e)))?;
        }

        let clip = self.viewport.map(|viewport| CdpPage::Viewport {
            x: 0.0,
            y: 0.0,
            width: f64::from(viewport.width),
            height: f64::from(viewport.height),
            scale: 1.0,
        });

        self.tab
            .capture_screenshot(
                screenshot_format(options.format),
                options.quality.map(u32::from),
                clip,
                true,
            )
            .map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdp_session_capture() {
        // This test requires Chrome to be installed, so we skip it in CI
        if std::env::var("CI").is_ok() {
            return;
        }
        let launcher = CdpLauncher::new();
        let config = SessionConfig::new(Duration::from_secs(30)).with_viewport(64, 48);
        let mut session = match launcher.acquire(&config) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Skipping CDP session test because Chrome is not available or failed to launch: {}", e);
                return;
            }
        };

        let page = session.new_page().expect("page");
        page.set_content("<body style=\"background:red\"></body>").expect("content");
        let png = page
            .screenshot(&CaptureOptions {
                omit_background: false,
                format: ImageType::Png,
                quality: None,
            })
            .expect("screenshot");
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");

        session.release().expect("release");
        session.release().expect("second release is a no-op");
    }

    #[test]
    fn active_port_is_read_from_the_profile() {
        let profile = tempfile::tempdir().unwrap();
        let port_file = profile.path().join(DEVTOOLS_ACTIVE_PORT);
        assert_eq!(read_active_port(&port_file), None);

        std::fs::write(&port_file, "").unwrap();
        assert_eq!(read_active_port(&port_file), None);

        std::fs::write(&port_file, "41233\n/devtools/browser/5f1c\n").unwrap();
        assert_eq!(read_active_port(&port_file), Some(41233));
    }

    fn attached_profiles() -> Vec<PathBuf> {
        let prefix = profile_prefix();
        std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect()
    }

    #[cfg(unix)]
    #[test]
    fn attached_launch_times_out_and_cleans_up() {
        // `sleep` never serves DevTools, so the launcher has to give up on it.
        let launcher = CdpLauncher::with_chrome_path("/bin/sleep");
        let config = SessionConfig::new(Duration::from_millis(300)).with_viewport(64, 64);

        match launcher.acquire(&config) {
            Err(Error::AcquireTimeout(ms)) => assert_eq!(ms, 300),
            Err(other) => panic!("expected an acquire timeout, got {}", other),
            Ok(_) => panic!("sleep does not speak DevTools"),
        }
        assert!(attached_profiles().is_empty(), "profile left behind");
    }

    #[cfg(unix)]
    #[test]
    fn terminate_reaps_the_process_and_removes_the_profile() {
        let temp = tempfile::tempdir().unwrap();
        let profile = temp.path().join("profile");
        std::fs::create_dir(&profile).unwrap();
        std::fs::write(profile.join(DEVTOOLS_ACTIVE_PORT), "9222\n").unwrap();
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();

        terminate(&mut child, &profile).unwrap();

        assert!(child.try_wait().unwrap().is_some(), "child was not reaped");
        assert!(!profile.exists());
    }
}
