//! Launch-screen metadata acquisition
//!
//! Scraping the reference tables is best-effort enrichment over the built-in
//! dataset: any failure while scraping is logged and the static data is
//! returned instead, so callers always get a usable set.

use crate::fallback;
use crate::model::{DeviceLaunchSpec, DeviceScaleSpec, UnifiedLaunchSpec};
use crate::parse::{parse_dimension, parse_scale_factor, table_rows};
use crate::session::{timeout_ms, with_session, Launcher, Page, RenderingSession, SessionConfig};
use crate::{Error, Options, Result};
use log::{debug, error, info, warn};
use std::time::Duration;

/// Device launch-screen table
pub const SPLASH_SCREEN_SPECS_URL: &str =
    "https://developer.apple.com/design/human-interface-guidelines/ios/visual-design/adaptivity-and-layout/";
/// Device scale-factor table
pub const SCALE_FACTOR_SPECS_URL: &str =
    "https://developer.apple.com/design/human-interface-guidelines/ios/icons-and-images/image-size-and-resolution/";
pub const TABLE_ROW_SELECTOR: &str = "table tbody tr";
pub const TABLE_SELECTOR: &str = "table";
pub const EMULATED_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/81.0.4044.129 Safari/537.36";
pub const WAIT_FOR_SELECTOR_TIMEOUT: Duration = Duration::from_millis(1000);
pub const SCRAPE_SESSION_TIMEOUT: Duration = Duration::from_millis(5000);

/// Load one reference page in its own session and return its table rows.
fn scrape_table<L: Launcher + ?Sized>(launcher: &L, url: &str) -> Result<Vec<Vec<String>>> {
    let config = SessionConfig::new(SCRAPE_SESSION_TIMEOUT);
    with_session(launcher, &config, |session| {
        let page = session.new_page()?;
        page.set_user_agent(EMULATED_USER_AGENT)?;
        info!("Navigating to {}", url);
        page.goto(url)?;

        debug!("Waiting for the data table to be loaded");
        page.wait_for_selector(TABLE_SELECTOR, WAIT_FOR_SELECTOR_TIMEOUT)
            .map_err(|e| {
                debug!("Selector wait on {} failed: {}", url, e);
                Error::ScrapeTimeout {
                    url: url.to_string(),
                    timeout_ms: timeout_ms(WAIT_FOR_SELECTOR_TIMEOUT),
                }
            })?;

        let rows = table_rows(&page.content()?, TABLE_ROW_SELECTOR)?;
        if rows.is_empty() {
            return Err(Error::EmptyScrapeResult(url.to_string()));
        }
        Ok(rows)
    })
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Map `device | portrait | landscape` rows.
pub fn launch_specs_from_rows(rows: &[Vec<String>]) -> Vec<DeviceLaunchSpec> {
    rows.iter()
        .map(|row| DeviceLaunchSpec {
            device: cell(row, 0).to_string(),
            portrait: parse_dimension(cell(row, 1)),
            landscape: parse_dimension(cell(row, 2)),
        })
        .collect()
}

/// Map `device | scale factor` rows.
pub fn scale_specs_from_rows(rows: &[Vec<String>]) -> Vec<DeviceScaleSpec> {
    rows.iter()
        .map(|row| DeviceScaleSpec {
            device: cell(row, 0).to_string(),
            scale_factor: parse_scale_factor(cell(row, 1)),
        })
        .collect()
}

/// Inner join on device name, in launch-table order.
///
/// Devices without a scale entry are dropped; the first scale entry wins
/// when a device appears twice.
pub fn unify(launch: &[DeviceLaunchSpec], scales: &[DeviceScaleSpec]) -> Vec<UnifiedLaunchSpec> {
    launch
        .iter()
        .filter_map(|spec| {
            scales
                .iter()
                .find(|scale| scale.device == spec.device)
                .map(|scale| UnifiedLaunchSpec {
                    device: spec.device.clone(),
                    portrait: spec.portrait,
                    landscape: spec.landscape,
                    scale_factor: scale.scale_factor,
                })
        })
        .collect()
}

/// Scrape both tables, strictly one after the other, and join them.
pub fn scrape_splash_screen_meta_data<L: Launcher + ?Sized>(
    launcher: &L,
) -> Result<Vec<UnifiedLaunchSpec>> {
    let launch = launch_specs_from_rows(&scrape_table(launcher, SPLASH_SCREEN_SPECS_URL)?);
    info!("Retrieved splash screen data");
    let scales = scale_specs_from_rows(&scrape_table(launcher, SCALE_FACTOR_SPECS_URL)?);
    info!("Retrieved scale factor data");
    Ok(unify(&launch, &scales))
}

/// Launch-screen metadata for the run.
///
/// Returns the static dataset without touching the launcher when
/// `options.scrape` is off. Otherwise scrapes, degrading to the static
/// dataset on any failure. Never fails.
pub fn get_splash_screen_meta_data<L: Launcher + ?Sized>(
    launcher: &L,
    options: &Options,
) -> Vec<UnifiedLaunchSpec> {
    if !options.scrape {
        info!("Skipped scraping - using static data");
        return fallback::splash_screen_specs();
    }

    info!("Loading latest splash screen metadata");
    match scrape_splash_screen_meta_data(launcher) {
        Ok(specs) if !specs.is_empty() => {
            info!("Loaded metadata for {} devices", specs.len());
            specs
        }
        Ok(_) => {
            warn!("Scraped tables share no devices - using static fallback data");
            fallback::splash_screen_specs()
        }
        Err(e) => {
            error!("{}", e);
            warn!("Failed to fetch latest device specs - using static fallback data");
            fallback::splash_screen_specs()
        }
    }
}
