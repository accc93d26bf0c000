//! Inbound panel events.
//!
//! Producers (notification listener, status poller, button sampler) wrap
//! their output in a [`PanelEvent`] and push it onto the ordered queue in
//! [`crate::events`].  The [`PanelOrchestrator`](super::service::PanelOrchestrator)
//! is the only consumer.

use std::time::Instant;

use crate::alarms::AlarmEvent;

/// Everything the orchestrator reacts to, in enqueue order.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    /// A classified device notification.
    Alarm(AlarmEvent),
    /// One status poll result (or its timeout).
    Status(StatusSample),
    /// A debounced button transition.
    Button(ButtonEvent),
    /// Stop consuming; sent when the notification feed closes.
    Shutdown,
}

// ── Status samples ────────────────────────────────────────────

/// Health of one input source as reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceStatus {
    Ok,
    Fail,
    #[default]
    Unknown,
}

impl SourceStatus {
    /// Decode the device's status code (`1` = fail, `2` = ok).
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Fail,
            2 => Self::Ok,
            _ => Self::Unknown,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

/// Which source currently feeds the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputSource {
    A,
    B,
    #[default]
    Unknown,
}

impl OutputSource {
    /// Decode the device's output-source code.  Codes 1 and 3 mean
    /// source A (direct or bypass), 2 and 4 mean source B.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 | 3 => Self::A,
            2 | 4 => Self::B,
            _ => Self::Unknown,
        }
    }
}

/// Result of one status poll.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusSample {
    pub source_a: SourceStatus,
    pub source_b: SourceStatus,
    pub output_source: OutputSource,
    /// Output load in percent, already normalized.
    pub output_load_percent: Option<f32>,
    /// The query did not complete in time (or failed outright).
    pub timed_out: bool,
}

impl StatusSample {
    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Self::default()
        }
    }

    /// Both sources explicitly failed.
    pub fn total_failure(&self) -> bool {
        self.source_a == SourceStatus::Fail && self.source_b == SourceStatus::Fail
    }
}

// ── Buttons ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Mute,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// A debounced transition of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub edge: ButtonEdge,
    pub at: Instant,
}

impl ButtonEvent {
    pub fn pressed(button: ButtonId, at: Instant) -> Self {
        Self {
            button,
            edge: ButtonEdge::Pressed,
            at,
        }
    }
}
