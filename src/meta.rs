//! HTML tags and web-manifest entries for generated images

use crate::manifest::{APPLE_ICON_PREFIX, APPLE_SPLASH_PREFIX, FAVICON_PREFIX, MANIFEST_ICON_PREFIX};
use crate::model::{Orientation, SavedImage};
use crate::Options;
use serde::Serialize;

/// One entry of a web app manifest `icons` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime: String,
    pub purpose: String,
}

fn href(image: &SavedImage) -> String {
    image.path.to_string_lossy().replace('\\', "/")
}

fn is_kind(image: &SavedImage, prefix: &str) -> bool {
    image
        .name
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('-'))
}

/// Manifest entries for every generated manifest icon.
pub fn manifest_icons(saved: &[SavedImage], options: &Options) -> Vec<ManifestIcon> {
    saved
        .iter()
        .filter(|image| is_kind(image, MANIFEST_ICON_PREFIX))
        .map(|image| ManifestIcon {
            src: href(image),
            sizes: format!("{}x{}", image.width, image.height),
            mime: options.image_type.mime().to_string(),
            purpose: "any maskable".to_string(),
        })
        .collect()
}

/// Media query matching the device a launch screen was made for.
pub fn startup_image_media(image: &SavedImage, dark_mode: bool) -> String {
    let scale = image.scale_factor.max(1);
    let (device_width, device_height) = match image.orientation {
        Some(Orientation::Landscape) => (image.height / scale, image.width / scale),
        _ => (image.width / scale, image.height / scale),
    };
    let orientation = image.orientation.unwrap_or(Orientation::Portrait);

    let mut media = format!(
        "(device-width: {}px) and (device-height: {}px) and (-webkit-device-pixel-ratio: {}) and (orientation: {})",
        device_width, device_height, scale, orientation
    );
    if dark_mode {
        media.push_str(" and (prefers-color-scheme: dark)");
    }
    media
}

/// `<head>` tags for favicons, touch icons and launch screens, in `saved` order.
pub fn html_tags(saved: &[SavedImage], options: &Options) -> Vec<String> {
    let mut tags = Vec::new();
    let mime = options.image_type.mime();

    for image in saved {
        if is_kind(image, FAVICON_PREFIX) {
            tags.push(format!(
                r#"<link rel="icon" type="{}" sizes="{}x{}" href="{}">"#,
                mime,
                image.width,
                image.height,
                href(image)
            ));
        } else if is_kind(image, APPLE_ICON_PREFIX) {
            tags.push(format!(r#"<link rel="apple-touch-icon" href="{}">"#, href(image)));
        }
    }

    let splash: Vec<&SavedImage> = saved
        .iter()
        .filter(|image| image.name.starts_with(APPLE_SPLASH_PREFIX) && image.orientation.is_some())
        .collect();
    if !splash.is_empty() {
        tags.push(r#"<meta name="apple-mobile-web-app-capable" content="yes">"#.to_string());
    }
    for image in splash {
        tags.push(format!(
            r#"<link rel="apple-touch-startup-image" href="{}" media="{}">"#,
            href(image),
            startup_image_media(image, options.dark_mode)
        ));
    }

    tags
}
