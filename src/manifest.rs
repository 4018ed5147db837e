//! Builds the list of images a run must produce

use crate::model::{ImageSpec, Orientation, UnifiedLaunchSpec};
use crate::Options;
use std::collections::HashSet;

pub const APPLE_ICON_SIZES: &[u32] = &[180, 167, 152, 120];
pub const MANIFEST_ICON_SIZES: &[u32] = &[192, 512];
pub const FAVICON_SIZES: &[u32] = &[196];

pub const APPLE_ICON_PREFIX: &str = "apple-icon";
pub const MANIFEST_ICON_PREFIX: &str = "manifest-icon";
pub const FAVICON_PREFIX: &str = "favicon";
pub const APPLE_SPLASH_PREFIX: &str = "apple-splash";
pub const DARK_MODE_SUFFIX: &str = "-dark";

fn square(prefix: &str, size: u32) -> ImageSpec {
    ImageSpec {
        name: format!("{}-{}", prefix, size),
        width: size,
        height: size,
        scale_factor: 1,
        orientation: None,
    }
}

fn launch_screen(
    prefix: &str,
    width: u32,
    height: u32,
    scale_factor: u32,
    orientation: Orientation,
) -> ImageSpec {
    ImageSpec {
        name: format!("{}-{}-{}", prefix, width, height),
        width,
        height,
        scale_factor,
        orientation: Some(orientation),
    }
}

/// Drop structurally equal repeats, keeping the first occurrence.
pub fn dedup(images: Vec<ImageSpec>) -> Vec<ImageSpec> {
    let mut seen = HashSet::with_capacity(images.len());
    images
        .into_iter()
        .filter(|image| seen.insert(image.clone()))
        .collect()
}

/// Square icons for each `(prefix, sizes)` set, in order, deduplicated.
pub fn square_icons(sets: &[(&str, &[u32])]) -> Vec<ImageSpec> {
    dedup(
        sets.iter()
            .flat_map(|&(prefix, sizes)| sizes.iter().map(move |&size| square(prefix, size)))
            .collect(),
    )
}

/// Apple and manifest icons, plus favicons when `options.favicon` is set.
pub fn get_icon_images(options: &Options) -> Vec<ImageSpec> {
    let mut sets: Vec<(&str, &[u32])> = vec![
        (APPLE_ICON_PREFIX, APPLE_ICON_SIZES),
        (MANIFEST_ICON_PREFIX, MANIFEST_ICON_SIZES),
    ];
    if options.favicon {
        sets.push((FAVICON_PREFIX, FAVICON_SIZES));
    }
    square_icons(&sets)
}

/// Portrait and landscape launch screens for every device.
pub fn get_splash_screen_images(specs: &[UnifiedLaunchSpec], options: &Options) -> Vec<ImageSpec> {
    let prefix = if options.dark_mode {
        format!("{}{}", APPLE_SPLASH_PREFIX, DARK_MODE_SUFFIX)
    } else {
        APPLE_SPLASH_PREFIX.to_string()
    };

    let mut images = Vec::with_capacity(specs.len() * 2);
    for spec in specs {
        if !options.landscape_only {
            images.push(launch_screen(
                &prefix,
                spec.portrait.width,
                spec.portrait.height,
                spec.scale_factor,
                Orientation::Portrait,
            ));
        }
        if !options.portrait_only {
            images.push(launch_screen(
                &prefix,
                spec.landscape.width,
                spec.landscape.height,
                spec.scale_factor,
                Orientation::Landscape,
            ));
        }
    }
    dedup(images)
}

/// Launch screens unless `icon_only`, followed by icons unless `splash_only`.
pub fn build_manifest(specs: &[UnifiedLaunchSpec], options: &Options) -> Vec<ImageSpec> {
    let mut manifest = Vec::new();
    if !options.icon_only {
        manifest.extend(get_splash_screen_images(specs, options));
    }
    if !options.splash_only {
        manifest.extend(get_icon_images(options));
    }
    manifest
}
