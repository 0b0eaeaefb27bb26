use serde::Deserialize;
use url::Url;

use crate::config::SyncConfig;
use crate::embed::tier::{Tier, ASPECT_RATIO_16_9};
use crate::error::{ConfigError, EmbedError};

/// One proxy request: which video, at which size hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRequest {
    pub watch_url: String,
    pub tier: Tier,
    pub nonce: Option<String>,
}

impl FragmentRequest {
    pub fn new(watch_url: impl Into<String>, tier: Tier, nonce: Option<String>) -> Self {
        Self {
            watch_url: watch_url.into(),
            tier,
            nonce,
        }
    }

    pub fn max_width(&self) -> u32 {
        self.tier.width()
    }

    pub fn max_height(&self) -> u32 {
        self.tier.height_at(ASPECT_RATIO_16_9)
    }

    /// `<base>?url=..&maxwidth=..&maxheight=..[&_wpnonce=..]`
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("url", &self.watch_url)
                .append_pair("maxwidth", &self.max_width().to_string())
                .append_pair("maxheight", &self.max_height().to_string());
            if let Some(ref nonce) = self.nonce {
                q.append_pair("_wpnonce", nonce);
            }
        }
        url
    }
}

/// Outcome of a proxy fetch. Errors never escape the fetch boundary; they
/// are folded into `NetworkError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success(String),
    /// 2xx response whose body carried no `html`.
    Empty,
    NetworkError(EmbedError),
}

/// Anything that can answer a [`FragmentRequest`]: the real proxy client,
/// or a recording double in tests.
pub trait FragmentSource {
    fn fetch(&self, request: &FragmentRequest) -> FetchResult;
}

impl<T: FragmentSource + ?Sized> FragmentSource for &T {
    fn fetch(&self, request: &FragmentRequest) -> FetchResult {
        (**self).fetch(request)
    }
}

#[derive(Deserialize)]
struct ProxyBody {
    #[serde(default)]
    html: Option<String>,
}

/// Map an HTTP status and body to a [`FetchResult`].
pub fn interpret_response(status: u16, body: &str) -> FetchResult {
    if !(200..300).contains(&status) {
        return network_error(format!("HTTP {}", status));
    }
    match serde_json::from_str::<ProxyBody>(body) {
        Ok(ProxyBody { html: Some(html) }) if !html.trim().is_empty() => FetchResult::Success(html),
        Ok(_) => FetchResult::Empty,
        Err(e) => network_error(format!("malformed JSON: {}", e)),
    }
}

fn network_error(reason: String) -> FetchResult {
    log::warn!("oEmbed fetch failed: {}", reason);
    FetchResult::NetworkError(EmbedError::NetworkFailure(reason))
}

/// Blocking client for the oEmbed proxy endpoint.
pub struct ProxyFetcher {
    client: reqwest::blocking::Client,
    base: Url,
}

impl ProxyFetcher {
    pub fn new(config: &SyncConfig) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            base: config.proxy_base()?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl FragmentSource for ProxyFetcher {
    fn fetch(&self, request: &FragmentRequest) -> FetchResult {
        let url = request.to_url(&self.base);
        log::debug!("oEmbed GET {}", url);

        let response = match self
            .client
            .get(url.as_str())
            .header("Accept", "application/json")
            .send()
        {
            Ok(r) => r,
            Err(e) => return network_error(format!("request failed: {}", e)),
        };

        let status = response.status().as_u16();
        match response.text() {
            Ok(body) => interpret_response(status, &body),
            Err(e) => network_error(format!("failed to read body: {}", e)),
        }
    }
}
