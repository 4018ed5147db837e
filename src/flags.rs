//! Normalization of user-supplied options before a run

use crate::Options;
use log::warn;
use std::path::PathBuf;

fn normalize_only_pair(first: &mut bool, second: &mut bool, first_name: &str, second_name: &str) {
    if *first && *second {
        warn!(
            "Both --{}-only and --{}-only are set; ignoring them as generating both is the default behavior",
            first_name, second_name
        );
        *first = false;
        *second = false;
    }
}

/// Clear conflicting `*_only` pairs, since asking for both means "everything".
pub fn normalize_only_flag_pairs(options: &mut Options) {
    normalize_only_pair(&mut options.icon_only, &mut options.splash_only, "icon", "splash");
    normalize_only_pair(
        &mut options.portrait_only,
        &mut options.landscape_only,
        "portrait",
        "landscape",
    );
}

/// Output directory, defaulting to the current one.
pub fn normalize_output(output: Option<PathBuf>) -> PathBuf {
    output
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Options ready to hand to the pipeline.
pub fn normalize(mut options: Options) -> Options {
    normalize_only_flag_pairs(&mut options);
    options
}
