//! Engine configuration.
//!
//! Supplied by the embedding page at startup and read-only afterwards.
//! Every field has a default, so an empty TOML document is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::embed::tier::{TierTable, DEFAULT_OVERFLOW_TIER, DEFAULT_TIERS};
use crate::error::ConfigError;

/// Which width drives tier selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TierBasis {
    /// Each container's own rendered width.
    #[default]
    Container,
    /// The device viewport width, shared by every container.
    Viewport,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// oEmbed proxy endpoint, e.g. `https://site.test/wp-json/oembed/1.0/proxy`.
    pub proxy_url: String,
    /// Sent as `_wpnonce` when present.
    pub nonce: Option<String>,
    pub tiers: Vec<u32>,
    pub overflow_tier: u32,
    pub tier_basis: TierBasis,
    /// Width signals are coalesced over this window.
    pub debounce_ms: u64,
    /// Second scan after load, for content that settles late.
    pub settle_delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            proxy_url: "http://localhost/wp-json/oembed/1.0/proxy".into(),
            nonce: None,
            tiers: DEFAULT_TIERS.to_vec(),
            overflow_tier: DEFAULT_OVERFLOW_TIER,
            tier_basis: TierBasis::Container,
            debounce_ms: 150,
            settle_delay_ms: 500,
            timeout_secs: 15,
            user_agent: concat!("yt-embed-sync/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: SyncConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check the tier table and proxy URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tier_table()?;
        self.proxy_base()?;
        Ok(())
    }

    pub fn tier_table(&self) -> Result<TierTable, ConfigError> {
        TierTable::new(self.tiers.clone(), self.overflow_tier)
    }

    pub fn proxy_base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.proxy_url).map_err(|source| ConfigError::ProxyUrl {
            url: self.proxy_url.clone(),
            source,
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
