use thiserror::Error;

/// Runtime failures of a single container's fetch/swap cycle.
///
/// None of these are fatal: the engine logs them and leaves the container on
/// its previous tier and content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    /// No YouTube video id in the iframe source. Not user-visible.
    #[error("no YouTube video id in `{0}`")]
    ParseFailure(String),

    /// Non-2xx status, malformed JSON, or transport failure.
    #[error("oEmbed proxy request failed: {0}")]
    NetworkFailure(String),

    /// The fetched fragment had no iframe to swap in.
    #[error("oEmbed fragment contains no iframe")]
    FragmentFailure,
}

/// Startup configuration problems; the only errors surfaced to the host.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid proxy url `{url}`: {source}")]
    ProxyUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("tier table must be non-empty and strictly increasing (got {0:?})")]
    Tiers(Vec<u32>),

    #[error("overflow tier {overflow} must exceed the largest tier {largest}")]
    Overflow { overflow: u32, largest: u32 },
}
