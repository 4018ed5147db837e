use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use log::{error, info};

use pwa_assets::cdp::CdpLauncher;
use pwa_assets::{flags, meta, CaptureOrchestrator, Concurrency, ImageType, Options};

/// Generate PWA icons and iOS launch screens from a single source.
#[derive(Parser, Debug)]
#[command(name = "pwa-assets", version, about)]
struct Cli {
    /// Page URL, HTML file, image file/URL, or inline HTML markup
    source: String,

    /// Output directory (defaults to the current directory)
    output: Option<PathBuf>,

    /// CSS background of the page wrapping an image source
    #[arg(short, long, default_value = "transparent")]
    background: String,

    /// CSS padding around an image source
    #[arg(short, long, default_value = "10%")]
    padding: String,

    /// Output image format (png, jpeg, webp)
    #[arg(short = 't', long = "type", default_value_t = ImageType::Jpeg)]
    image_type: ImageType,

    /// Quality for jpeg/webp output (0-100)
    #[arg(short, long, default_value_t = 70, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Keep the page background instead of capturing with transparency
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    opaque: bool,

    /// Scrape the latest device tables instead of using built-in data
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    scrape: bool,

    /// Only generate icons
    #[arg(long)]
    icon_only: bool,

    /// Only generate launch screens
    #[arg(long)]
    splash_only: bool,

    /// Only generate portrait launch screens
    #[arg(long)]
    portrait_only: bool,

    /// Only generate landscape launch screens
    #[arg(long)]
    landscape_only: bool,

    /// Also generate favicons
    #[arg(long)]
    favicon: bool,

    /// Name launch screens for dark mode
    #[arg(long)]
    dark_mode: bool,

    /// Chrome executable to spawn and attach to (otherwise located automatically)
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Disable the Chrome sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Maximum rendering sessions alive at once (unbounded by default)
    #[arg(long)]
    max_sessions: Option<usize>,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            favicon: self.favicon,
            dark_mode: self.dark_mode,
            icon_only: self.icon_only,
            splash_only: self.splash_only,
            portrait_only: self.portrait_only,
            landscape_only: self.landscape_only,
            scrape: self.scrape,
            opaque: self.opaque,
            image_type: self.image_type,
            quality: self.quality,
            background: self.background.clone(),
            padding: self.padding.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let options = flags::normalize(cli.options());
    let output = flags::normalize_output(cli.output.clone());

    let launcher = match &cli.chrome_path {
        Some(path) => CdpLauncher::with_chrome_path(path),
        None => CdpLauncher::new(),
    }
    .no_sandbox(cli.no_sandbox);

    let orchestrator = CaptureOrchestrator::new(Arc::new(launcher))
        .with_concurrency(Concurrency::from_limit(cli.max_sessions));

    let saved = match orchestrator.generate_images(&cli.source, &output, &options).await {
        Ok(saved) => saved,
        Err(e) => {
            error!("{}", e);
            return Err(e).context("asset generation failed");
        }
    };
    info!("Generated {} images in {}", saved.len(), output.display());

    let tags = meta::html_tags(&saved, &options);
    if !tags.is_empty() {
        println!("{}", tags.join("\n"));
    }

    let icons = meta::manifest_icons(&saved, &options);
    if !icons.is_empty() {
        let json = serde_json::to_string_pretty(&icons).context("serializing manifest icons")?;
        println!("{}", json);
    }

    Ok(())
}
