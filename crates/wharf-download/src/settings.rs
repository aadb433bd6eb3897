//! Settings controller.
//!
//! Holds the two admission-control knobs and keeps the engine and the
//! local copy in agreement: values are validated here, pushed to the
//! engine, and cached only once the engine acknowledges them.

use std::sync::Arc;

use tokio::sync::RwLock;

use wharf_core::TransferSettings;
use wharf_core::download::EngineResult;
use wharf_core::ports::TransferEnginePort;

/// Owns the speed-limit and max-concurrency knobs.
pub struct SettingsController {
    engine: Arc<dyn TransferEnginePort>,
    current: RwLock<TransferSettings>,
}

impl SettingsController {
    /// Create a controller with default settings until `load` is called.
    pub fn new(engine: Arc<dyn TransferEnginePort>) -> Self {
        Self {
            engine,
            current: RwLock::new(TransferSettings::default()),
        }
    }

    /// Read both knobs from the engine and cache them.
    pub async fn load(&self) -> EngineResult<TransferSettings> {
        let speed_limit_bps = self.engine.get_speed_limit().await?;
        let max_concurrent = self.engine.get_max_concurrent().await?;
        let settings = TransferSettings::new(speed_limit_bps, max_concurrent);
        *self.current.write().await = settings;
        Ok(settings)
    }

    /// The last settings the engine acknowledged (or defaults).
    pub async fn current(&self) -> TransferSettings {
        *self.current.read().await
    }

    /// Set the global speed cap in bytes per second; 0 lifts the cap.
    pub async fn set_speed_limit(&self, bytes_per_sec: u64) -> EngineResult<()> {
        self.engine.set_speed_limit(bytes_per_sec).await?;
        self.current.write().await.speed_limit_bps = bytes_per_sec;
        tracing::info!(bytes_per_sec, "Updated speed limit");
        Ok(())
    }

    /// Set the maximum number of simultaneously running transfers.
    ///
    /// Values below 1 are clamped before the engine sees them.
    pub async fn set_max_concurrent(&self, max: u32) -> EngineResult<()> {
        let clamped = max.max(1);
        if clamped != max {
            tracing::warn!(requested = max, clamped, "Clamped max concurrency");
        }
        self.engine.set_max_concurrent(clamped).await?;
        self.current.write().await.max_concurrent = clamped;
        tracing::info!(max = clamped, "Updated max concurrency");
        Ok(())
    }

    /// Push both knobs at once.
    pub async fn apply(&self, settings: TransferSettings) -> EngineResult<()> {
        self.set_speed_limit(settings.speed_limit_bps).await?;
        self.set_max_concurrent(settings.max_concurrent).await
    }
}
