//! Built-in launch-screen metadata used when scraping is skipped or fails

use crate::model::{Dimension, UnifiedLaunchSpec};

// (device, portrait width, portrait height, scale factor); landscape is the transpose.
const DEVICES: &[(&str, u32, u32, u32)] = &[
    ("12.9\" iPad Pro", 2048, 2732, 2),
    ("11\" iPad Pro", 1668, 2388, 2),
    ("10.9\" iPad Air", 1640, 2360, 2),
    ("10.5\" iPad Air", 1668, 2224, 2),
    ("10.2\" iPad", 1620, 2160, 2),
    ("9.7\" iPad", 1536, 2048, 2),
    ("8.3\" iPad mini", 1488, 2266, 2),
    ("7.9\" iPad mini", 1536, 2048, 2),
    ("iPhone 14 Pro Max", 1290, 2796, 3),
    ("iPhone 14 Pro", 1179, 2556, 3),
    ("iPhone 14 Plus", 1284, 2778, 3),
    ("iPhone 14", 1170, 2532, 3),
    ("iPhone 13 mini", 1080, 2340, 3),
    ("iPhone 11 Pro Max", 1242, 2688, 3),
    ("iPhone 11 Pro", 1125, 2436, 3),
    ("iPhone 11", 828, 1792, 2),
    ("iPhone XS Max", 1242, 2688, 3),
    ("iPhone XS", 1125, 2436, 3),
    ("iPhone XR", 828, 1792, 2),
    ("iPhone X", 1125, 2436, 3),
    ("iPhone 8 Plus", 1242, 2208, 3),
    ("iPhone 8", 750, 1334, 2),
    ("iPhone SE (2nd generation)", 750, 1334, 2),
    ("iPhone SE (1st generation)", 640, 1136, 2),
];

/// The static device dataset, in reference-table order.
pub fn splash_screen_specs() -> Vec<UnifiedLaunchSpec> {
    DEVICES
        .iter()
        .map(|&(device, width, height, scale_factor)| UnifiedLaunchSpec {
            device: device.to_string(),
            portrait: Dimension::new(width, height),
            landscape: Dimension::new(height, width),
            scale_factor,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_well_formed() {
        let specs = splash_screen_specs();
        assert_eq!(specs.len(), DEVICES.len());
        for spec in &specs {
            assert!(spec.portrait.width < spec.portrait.height, "{}", spec.device);
            assert_eq!(spec.portrait.width, spec.landscape.height);
            assert!(spec.scale_factor >= 1);
        }
    }
}
