//! YouTube-specific pieces: feature registry, id extraction, URL parameters
//! and width tiers. Everything here is pure; DOM work lives in `engine`.

pub mod feature;
pub mod params;
pub mod tier;
pub mod video_id;

pub use feature::{FeatureFlag, FeatureSet};
pub use tier::{Tier, TierTable};
