//! Transfer queue wiring.
//!
//! Bundles the shared state, dispatcher, and settings controller around
//! one engine, and hands back the reconciler for the host to spawn.
//!
//! # Usage
//!
//! ```ignore
//! let (event_tx, event_rx) = event_channel();
//! let engine: Arc<dyn TransferEnginePort> = /* ... */;
//!
//! let (queue, reconciler) = build_transfer_queue(TransferQueueDeps {
//!     engine,
//!     events: event_rx,
//! });
//! tokio::spawn(reconciler.run());
//!
//! let id = queue.dispatcher.add(request).await?;
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;

use wharf_core::download::EngineEvent;
use wharf_core::ports::TransferEnginePort;

use crate::dispatcher::CommandDispatcher;
use crate::reconciler::EventReconciler;
use crate::settings::SettingsController;
use crate::state::QueueState;

/// Bound on buffered engine events before the sender feels backpressure.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Create the engine→reconciler event channel with the default bound.
#[must_use]
pub fn event_channel() -> (mpsc::Sender<EngineEvent>, mpsc::Receiver<EngineEvent>) {
    mpsc::channel(DEFAULT_EVENT_CAPACITY)
}

/// Dependencies for building a transfer queue.
pub struct TransferQueueDeps {
    /// The external transfer engine.
    pub engine: Arc<dyn TransferEnginePort>,
    /// Receiving half of the engine's event feed.
    pub events: mpsc::Receiver<EngineEvent>,
}

/// The assembled queue-manager subsystem.
///
/// UI surfaces read `state` (or subscribe to its revision channel) and
/// issue commands through `dispatcher` and `settings`.
pub struct TransferQueue {
    /// Shared queue state; the only place task/history data lives.
    pub state: Arc<QueueState>,
    /// Command side of the subsystem.
    pub dispatcher: CommandDispatcher,
    /// Admission-control knobs.
    pub settings: SettingsController,
}

/// Build a transfer queue and its reconciler from dependencies.
///
/// The reconciler is returned separately so the host decides where its
/// drain loop runs (`tokio::spawn(reconciler.run())`).
#[must_use]
pub fn build_transfer_queue(deps: TransferQueueDeps) -> (TransferQueue, EventReconciler) {
    let state = Arc::new(QueueState::new());
    let dispatcher = CommandDispatcher::new(Arc::clone(&deps.engine), Arc::clone(&state));
    let settings = SettingsController::new(Arc::clone(&deps.engine));
    let reconciler = EventReconciler::new(Arc::clone(&state), deps.engine, deps.events);

    (
        TransferQueue {
            state,
            dispatcher,
            settings,
        },
        reconciler,
    )
}
