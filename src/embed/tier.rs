//! Width → fetch tier mapping.
//!
//! Refetching only on tier boundary crossings keeps a drag-resize from
//! turning into one proxy request per pixel.

use crate::error::ConfigError;

pub const DEFAULT_TIERS: [u32; 3] = [640, 1024, 1920];
pub const DEFAULT_OVERFLOW_TIER: u32 = 2560;

/// Height / width of a 16:9 player.
pub const ASPECT_RATIO_16_9: f64 = 0.5625;

/// A fetch tier: the `maxwidth` hint sent to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tier(pub u32);

impl Tier {
    pub fn width(self) -> u32 {
        self.0
    }

    /// Height at the given aspect ratio (height / width), rounded up.
    pub fn height_at(self, ratio: f64) -> u32 {
        (self.0 as f64 * ratio).ceil() as u32
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px", self.0)
    }
}

/// Validated, strictly increasing tier thresholds plus the overflow tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<u32>,
    overflow: u32,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS.to_vec(),
            overflow: DEFAULT_OVERFLOW_TIER,
        }
    }
}

impl TierTable {
    pub fn new(tiers: Vec<u32>, overflow: u32) -> Result<Self, ConfigError> {
        if tiers.is_empty() || tiers.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Tiers(tiers));
        }
        let largest = tiers[tiers.len() - 1];
        if overflow <= largest {
            return Err(ConfigError::Overflow { overflow, largest });
        }
        Ok(Self { tiers, overflow })
    }

    /// Smallest tier ≥ `width`, or the overflow tier. Negative and NaN
    /// widths resolve as 0.
    pub fn resolve(&self, width: f32) -> Tier {
        let width = if width.is_nan() { 0.0 } else { width.max(0.0) };
        self.tiers
            .iter()
            .copied()
            .find(|&t| width <= t as f32)
            .map(Tier)
            .unwrap_or(Tier(self.overflow))
    }

    pub fn smallest(&self) -> Tier {
        Tier(self.tiers[0])
    }

    pub fn overflow(&self) -> Tier {
        Tier(self.overflow)
    }
}
