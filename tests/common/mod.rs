//! In-memory rendering backend for pipeline tests

#![allow(dead_code)]

use pwa_assets::{CaptureOptions, Error, Launcher, Page, RenderingSession, Result, SessionConfig, Viewport};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a page was asked to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Load {
    Goto(String),
    Content(String),
}

#[derive(Default)]
pub struct State {
    pub pages: HashMap<String, String>,
    pub fail_width: Option<u32>,
    pub fail_acquire: bool,
    pub acquire_delay: Duration,
    pub acquisitions: AtomicUsize,
    pub releases: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub loads: Mutex<Vec<Load>>,
    pub viewports: Mutex<Vec<Option<Viewport>>>,
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub state: Arc<State>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut State {
        Arc::get_mut(&mut self.state).expect("configure the fake before sharing it")
    }

    /// Serve `html` when a page navigates to `url`.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.state_mut().pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Fail screenshots taken in a viewport of this width.
    pub fn failing_width(mut self, width: u32) -> Self {
        self.state_mut().fail_width = Some(width);
        self
    }

    /// Fail every acquisition with a timeout.
    pub fn failing_acquire(mut self) -> Self {
        self.state_mut().fail_acquire = true;
        self
    }

    /// Hold each session open for `delay` after acquiring it.
    pub fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.state_mut().acquire_delay = delay;
        self
    }

    pub fn acquisitions(&self) -> usize {
        self.state.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> Vec<Load> {
        self.state.loads.lock().unwrap().clone()
    }
}

impl Launcher for FakeLauncher {
    type Session = FakeSession;

    fn acquire(&self, config: &SessionConfig) -> Result<FakeSession> {
        if self.state.fail_acquire {
            return Err(Error::AcquireTimeout(config.timeout.as_millis() as u64));
        }
        self.state.acquisitions.fetch_add(1, Ordering::SeqCst);
        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.state.viewports.lock().unwrap().push(config.viewport);

        if !self.state.acquire_delay.is_zero() {
            std::thread::sleep(self.state.acquire_delay);
        }

        Ok(FakeSession {
            state: self.state.clone(),
            viewport: config.viewport,
            released: false,
        })
    }
}

pub struct FakeSession {
    state: Arc<State>,
    viewport: Option<Viewport>,
    released: bool,
}

impl RenderingSession for FakeSession {
    type Page = FakePage;

    fn new_page(&self) -> Result<FakePage> {
        Ok(FakePage {
            state: self.state.clone(),
            viewport: self.viewport,
            html: RefCell::new(String::new()),
        })
    }

    fn release(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.state.releases.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub struct FakePage {
    state: Arc<State>,
    viewport: Option<Viewport>,
    html: RefCell<String>,
}

impl Page for FakePage {
    fn set_user_agent(&self, _user_agent: &str) -> Result<()> {
        Ok(())
    }

    fn goto(&self, url: &str) -> Result<()> {
        self.state.loads.lock().unwrap().push(Load::Goto(url.to_string()));
        *self.html.borrow_mut() = self.state.pages.get(url).cloned().unwrap_or_default();
        Ok(())
    }

    fn set_content(&self, html: &str) -> Result<()> {
        self.state.loads.lock().unwrap().push(Load::Content(html.to_string()));
        *self.html.borrow_mut() = html.to_string();
        Ok(())
    }

    fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<()> {
        if self.html.borrow().contains(&format!("<{}", selector)) {
            Ok(())
        } else {
            Err(Error::LoadError(format!("no element matches {}", selector)))
        }
    }

    fn content(&self) -> Result<String> {
        Ok(self.html.borrow().clone())
    }

    fn screenshot(&self, options: &CaptureOptions) -> Result<Vec<u8>> {
        let viewport = self.viewport.unwrap_or_default();
        if self.state.fail_width == Some(viewport.width) {
            return Err(Error::RenderError(format!("capture of {}px failed", viewport.width)));
        }
        Ok(format!("{}x{}.{}", viewport.width, viewport.height, options.format).into_bytes())
    }
}
