pub mod config;
pub mod detect;
pub mod dom;
pub mod embed;
pub mod engine;
pub mod error;
pub mod net;

pub use config::{SyncConfig, TierBasis};
pub use detect::DetectionResult;
pub use engine::{StaticLayout, Synchronizer};
pub use error::{ConfigError, EmbedError};
pub use net::fetch::{FetchResult, FragmentSource, ProxyFetcher};
