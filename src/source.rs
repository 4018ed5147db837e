//! Classification and resolution of the visual source
//!
//! A source is either *navigable* (a page URL or a local HTML file, loaded by
//! address) or rendered from markup that is injected into the page: a shell
//! page wrapping an image, or the source string itself.

use crate::{Error, ImageType, Options, Result};
use base64::Engine as Base64Engine;
use std::path::{Path, PathBuf};
use url::Url;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico"];
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// What every rendering session for the run loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// Navigate to this address
    Address(String),
    /// Inject this markup without navigating
    Markup(String),
}

fn extension(source: &str) -> Option<String> {
    let path = match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "file") => url.path().to_string(),
        _ => source.to_string(),
    };
    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn has_extension(source: &str, allowed: &[&str]) -> bool {
    extension(source).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

pub fn is_url(source: &str) -> bool {
    Url::parse(source).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

pub fn is_image_file(source: &str) -> bool {
    has_extension(source, IMAGE_EXTENSIONS)
}

pub fn is_html_file(source: &str) -> bool {
    has_extension(source, HTML_EXTENSIONS)
}

/// Whether a session can load `source` by address.
pub fn can_navigate_to(source: &str) -> bool {
    (is_url(source) && !is_image_file(source)) || is_html_file(source)
}

fn image_mime(source: &str) -> &'static str {
    match extension(source).as_deref() {
        Some("svg") => "image/svg+xml",
        Some("jpg") | Some("jpeg") => ImageType::Jpeg.mime(),
        Some("webp") => ImageType::Webp.mime(),
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        _ => ImageType::Png.mime(),
    }
}

/// Address for a navigable source: URLs as-is, HTML files as `file://` URLs.
pub fn get_address(source: &str) -> Result<String> {
    if is_url(source) {
        return Ok(source.to_string());
    }
    let path = std::fs::canonicalize(source)
        .map_err(|e| Error::SourceError(format!("Cannot read {}: {}", source, e)))?;
    Url::from_file_path(&path)
        .map(String::from)
        .map_err(|_| Error::SourceError(format!("Cannot build a file URL for {}", path.display())))
}

/// Shell page that centers `image_url` over the configured background.
pub fn shell_html(image_url: &str, options: &Options) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8"/>
    <style>
      html, body {{ margin: 0; width: 100%; height: 100%; }}
      body {{ background: {background}; padding: {padding}; box-sizing: border-box; }}
      .logo {{ width: 100%; height: 100%; background: url("{image}") no-repeat center / contain; }}
    </style>
  </head>
  <body>
    <div class="logo"></div>
  </body>
</html>"#,
        background = options.background,
        padding = options.padding,
        image = image_url.replace('"', "%22"),
    )
}

/// Markup for a source that cannot be navigated to.
///
/// Image URLs are referenced from the shell page, local images are embedded
/// into it as data URIs, and anything else is returned as inline markup.
pub fn get_shell_html(source: &str, options: &Options) -> Result<String> {
    if !is_image_file(source) {
        return Ok(source.to_string());
    }
    if is_url(source) {
        return Ok(shell_html(source, options));
    }

    let bytes = std::fs::read(PathBuf::from(source))
        .map_err(|e| Error::SourceError(format!("Cannot read image {}: {}", source, e)))?;
    let data_uri = format!(
        "data:{};base64,{}",
        image_mime(source),
        base64::engine::general_purpose::STANDARD.encode(bytes)
    );
    Ok(shell_html(&data_uri, options))
}

/// Resolve `source` once for the whole run.
pub fn resolve(source: &str, options: &Options) -> Result<ResolvedSource> {
    if can_navigate_to(source) {
        get_address(source).map(ResolvedSource::Address)
    } else {
        get_shell_html(source, options).map(ResolvedSource::Markup)
    }
}

/// `output/<name>.<type>`
pub fn image_save_path(name: &str, output: &Path, image_type: ImageType) -> PathBuf {
    output.join(format!("{}.{}", name, image_type.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sources() {
        assert!(can_navigate_to("https://example.com/"));
        assert!(can_navigate_to("https://example.com/app/index.html?x=1"));
        assert!(!can_navigate_to("https://example.com/logo.PNG"));
        assert!(can_navigate_to("./public/splash.html"));
        assert!(!can_navigate_to("./logo.svg"));
        assert!(!can_navigate_to("<div>hello</div>"));
        assert!(!is_url("logo.svg"));
        assert!(is_image_file("https://cdn.example.com/a/logo.svg?v=2"));
    }

    #[test]
    fn url_addresses_pass_through() {
        assert_eq!(get_address("https://example.com/").unwrap(), "https://example.com/");
    }

    #[test]
    fn html_file_becomes_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "<h1>hi</h1>").unwrap();

        let resolved = resolve(file.to_str().unwrap(), &Options::default()).unwrap();
        match resolved {
            ResolvedSource::Address(addr) => {
                assert!(addr.starts_with("file://"));
                assert!(addr.ends_with("index.html"));
            }
            other => panic!("expected an address, got {:?}", other),
        }

        assert!(matches!(
            get_address(dir.path().join("missing.html").to_str().unwrap()),
            Err(Error::SourceError(_))
        ));
    }

    #[test]
    fn local_image_is_embedded_in_shell() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("logo.svg");
        std::fs::write(&file, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        let options = Options {
            background: "#123456".to_string(),
            padding: "5%".to_string(),
            ..Default::default()
        };
        let html = get_shell_html(file.to_str().unwrap(), &options).unwrap();
        assert!(html.contains("data:image/svg+xml;base64,"));
        assert!(html.contains("background: #123456"));
        assert!(html.contains("padding: 5%"));
    }

    #[test]
    fn image_url_and_inline_markup_are_injected() {
        let options = Options::default();
        match resolve("https://example.com/logo.png", &options).unwrap() {
            ResolvedSource::Markup(html) => assert!(html.contains("url(\"https://example.com/logo.png\")")),
            other => panic!("expected markup, got {:?}", other),
        }
        assert_eq!(
            resolve("<h1>Inline</h1>", &options).unwrap(),
            ResolvedSource::Markup("<h1>Inline</h1>".to_string())
        );
    }

    #[test]
    fn save_path_uses_format_extension() {
        let path = image_save_path("apple-icon-180", Path::new("out"), ImageType::Webp);
        assert_eq!(path, Path::new("out").join("apple-icon-180.webp"));
    }
}
