//! Admission-control settings.
//!
//! Pure domain type for the two knobs governing how many and how fast
//! tasks the engine runs. Validation lives here; pushing values to the
//! engine is the settings controller's job.

use serde::{Deserialize, Serialize};

/// Default number of simultaneously running transfers.
pub const DEFAULT_MAX_CONCURRENT: u32 = 3;

/// Admission-control knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Global speed cap in bytes per second; 0 means unlimited.
    pub speed_limit_bps: u64,

    /// Maximum simultaneously running transfers; clamped to at least 1.
    pub max_concurrent: u32,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            speed_limit_bps: 0,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl TransferSettings {
    /// Create settings with both knobs, clamped into their valid ranges.
    #[must_use]
    pub const fn new(speed_limit_bps: u64, max_concurrent: u32) -> Self {
        Self {
            speed_limit_bps,
            max_concurrent,
        }
        .clamped()
    }

    /// Clamp both knobs into their valid ranges.
    #[must_use]
    pub const fn clamped(mut self) -> Self {
        if self.max_concurrent < 1 {
            self.max_concurrent = 1;
        }
        self
    }

    /// Whether no speed cap applies.
    #[must_use]
    pub const fn is_speed_unlimited(&self) -> bool {
        self.speed_limit_bps == 0
    }
}
