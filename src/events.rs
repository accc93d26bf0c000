//! Ordered panel event queue.
//!
//! Every producer publishes onto one bounded MPMC channel; the orchestrator
//! drains it strictly in FIFO order with no coalescing.
//!
//! ```text
//! ┌──────────────────┐
//! │ Trap feed thread │──┐
//! └──────────────────┘  │   ┌──────────────┐     ┌──────────────────┐
//! ┌──────────────────┐  ├──▶│ PANEL_EVENTS │────▶│ PanelOrchestrator│
//! │ Status poll loop │──┤   │  (bounded)   │     │   (consumer)     │
//! └──────────────────┘  │   └──────────────┘     └──────────────────┘
//! ┌──────────────────┐  │
//! │ Button sampler   │──┘
//! └──────────────────┘
//! ```
//!
//! Producers on the executor thread use `send().await`, which parks them
//! while the queue is full.  The trap feed thread blocks on the same call.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

pub use crate::app::events::PanelEvent;

/// Queue depth.  Notifications arrive in bursts when a source drops.
pub const QUEUE_DEPTH: usize = 32;

/// The queue type; tests build local instances of it.
pub type PanelQueue = Channel<CriticalSectionRawMutex, PanelEvent, QUEUE_DEPTH>;

/// Process-wide queue used by the binary.
pub static PANEL_EVENTS: PanelQueue = Channel::new();
