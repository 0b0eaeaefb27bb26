use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use yt_embed_sync::config::{SyncConfig, TierBasis};
use yt_embed_sync::detect::DetectionResult;
use yt_embed_sync::dom::parser::parse_document;
use yt_embed_sync::dom::serialize::to_html;
use yt_embed_sync::engine::{StaticLayout, Synchronizer};
use yt_embed_sync::net::fetch::ProxyFetcher;

/// Rewrite the YouTube embeds of a rendered page to the player size and
/// playback options their containers ask for.
#[derive(Debug, Parser)]
#[command(name = "embed-sync", version, about)]
struct Cli {
    /// Rendered page (HTML) to process.
    page: PathBuf,

    /// TOML config file; flags below override it.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// oEmbed proxy endpoint.
    #[arg(long, env = "EMBED_SYNC_PROXY")]
    proxy: Option<String>,

    /// Request nonce, sent as `_wpnonce`.
    #[arg(long, env = "EMBED_SYNC_NONCE")]
    nonce: Option<String>,

    /// Viewport width in CSS px used to lay out containers.
    #[arg(long, default_value_t = 1280.0)]
    viewport: f32,

    /// Width that drives tier selection.
    #[arg(long, value_enum)]
    basis: Option<TierBasis>,
}

impl Cli {
    fn sync_config(&self) -> Result<SyncConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::load(path)?,
            None => SyncConfig::default(),
        };
        if let Some(proxy) = &self.proxy {
            config.proxy_url = proxy.clone();
        }
        if let Some(nonce) = &self.nonce {
            config.nonce = Some(nonce.clone());
        }
        if let Some(basis) = self.basis {
            config.tier_basis = basis;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.sync_config()?;
    let html = std::fs::read_to_string(&cli.page)
        .map_err(|e| format!("cannot read {}: {}", cli.page.display(), e))?;

    let mut detection = DetectionResult::from_post_content(&html);
    detection.merge_rendered(&html);
    if !detection.should_load_engine() {
        log::info!("{}: no adaptive YouTube embeds, leaving page untouched", cli.page.display());
        print!("{}", html);
        return Ok(());
    }

    let fetcher = ProxyFetcher::new(&config)?;
    log::info!("oEmbed proxy: {}", fetcher.base());

    let doc = parse_document(&html);
    let layout = StaticLayout::new(cli.viewport);
    let mut sync = Synchronizer::new(doc, layout, fetcher, &config)?;

    let start = Instant::now();
    sync.load(start);
    sync.run_until_idle(start);

    let stats = sync.stats();
    log::info!(
        "attached {} container(s), rewrote {} in place, {} fetch(es), {} swap(s), {} failure(s)",
        stats.attached,
        stats.rewritten_in_place,
        stats.fetches,
        stats.swaps,
        stats.failures
    );

    print!("{}", to_html(&sync.into_document()));
    Ok(())
}
