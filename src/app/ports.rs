//! Port traits: the hexagonal boundary between the panel engine and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PanelOrchestrator / ActuatorRegistry
//! ```
//!
//! Driven adapters (GPIO, status query client, flag store, notification
//! sink) implement these traits.  The engine consumes them via generics,
//! so the domain core never touches hardware, files or sockets directly.
//!
//! ## Notes
//!
//! - **GpioPort** calls are synchronous and short; blocking I/O belongs in
//!   the adapter, never in the engine.
//! - **FlagStore** writes are edge-triggered: `set_on_change` must be a
//!   no-op when the stored value already matches.
//! - All port errors are typed: callers must handle every variant explicitly.

use core::fmt;

use embedded_hal::digital::ErrorKind as DigitalErrorKind;
use embedded_hal::pwm::ErrorKind as PwmErrorKind;
use serde::{Deserialize, Serialize};

use crate::alarms::AlarmEvent;
use crate::config::UpsIdentity;
use crate::poller::{DeviceFamily, StatusReport};

// ───────────────────────────────────────────────────────────────
// GPIO / PWM port (driven adapter: engine → pins)
// ───────────────────────────────────────────────────────────────

/// Pin-level driver consumed by the actuator registry and button sampler.
///
/// `high = true` is the electrical HIGH level; LED polarity is resolved by
/// the registry, not by the driver.
pub trait GpioPort {
    /// Configure `pin` as a push-pull output driven to `initial_high`.
    fn setup_output(&mut self, pin: u8, initial_high: bool) -> Result<(), GpioError>;

    /// Configure `pin` as an input, optionally with the internal pull-up.
    fn setup_input(&mut self, pin: u8, pull_up: bool) -> Result<(), GpioError>;

    /// Drive an output pin HIGH or LOW.
    fn set_pin_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError>;

    /// Start a square wave on `pin`; `duty_percent` is 0–100.
    fn start_pwm(&mut self, pin: u8, frequency_hz: u32, duty_percent: u8) -> Result<(), GpioError>;

    /// Stop the square wave on `pin`.  The pin level afterwards is undefined
    /// until the caller drives it explicitly.
    fn stop_pwm(&mut self, pin: u8) -> Result<(), GpioError>;

    /// Sample an input pin (`true` = HIGH).
    fn read_pin(&mut self, pin: u8) -> Result<bool, GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Status query port (driven adapter: engine ↔ device management agent)
// ───────────────────────────────────────────────────────────────

/// Queries the monitored device for its live status.
///
/// Implementations may block the calling future for as long as the network
/// takes; the [`StatusPoller`](crate::poller::StatusPoller) bounds every
/// call with its own timeout.
#[allow(async_fn_in_trait)]
pub trait StatusQueryPort {
    /// Query the device assuming it belongs to `family`.
    ///
    /// Returns [`QueryError::Unsupported`] when the device does not answer
    /// the family's objects, which triggers auto-detection fallback.
    async fn query_status(&mut self, family: DeviceFamily) -> Result<StatusReport, QueryError>;
}

// ───────────────────────────────────────────────────────────────
// Persisted flags port (driven adapter: engine ↔ key-value store)
// ───────────────────────────────────────────────────────────────

/// Keys of the two persisted panel flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKey {
    /// Mirrors LED 10 (ALARM): `true` while the alarm LED is lit.
    AlarmStatus,
    /// Operator mute of the buzzer.
    BuzzerMuted,
}

impl FlagKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlarmStatus => "alarm_status",
            Self::BuzzerMuted => "buzzer_muted",
        }
    }
}

/// Snapshot of every persisted flag, as stored on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedFlags {
    pub alarm_status: bool,
    pub buzzer_muted: bool,
}

/// Key-value store for [`PersistedFlags`] with edge-triggered writes.
pub trait FlagStore {
    /// Read a flag.  `Ok(None)` means the key was never written.
    fn get(&self, key: FlagKey) -> Result<Option<bool>, FlagError>;

    /// Persist `value` only if it differs from the stored value.
    /// Returns `Ok(true)` when a write actually happened.
    fn set_on_change(&mut self, key: FlagKey, value: bool) -> Result<bool, FlagError>;
}

// ───────────────────────────────────────────────────────────────
// Notification sink port (driven adapter: engine → email / SMS / log)
// ───────────────────────────────────────────────────────────────

/// Receives classified alarm events for out-of-band notification.
///
/// The sink owns its own cooldown, deduplication and scheduling; the
/// engine calls it once per classified event and never waits on delivery.
pub trait NotificationSink {
    fn notify(&mut self, event: &AlarmEvent, ups: &UpsIdentity);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`GpioPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The driver has no line for this pin number.
    UnknownPin(u8),
    /// A digital read or write failed.
    Digital { pin: u8, kind: DigitalErrorKind },
    /// A PWM start, stop or duty update failed.
    Pwm { pin: u8, kind: PwmErrorKind },
}

impl GpioError {
    pub const fn pin(&self) -> u8 {
        match self {
            Self::UnknownPin(pin) | Self::Digital { pin, .. } | Self::Pwm { pin, .. } => *pin,
        }
    }
}

/// Errors from [`StatusQueryPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The device does not implement the queried family's objects.
    Unsupported,
    /// The device did not answer.
    NoResponse,
    /// The answer could not be decoded.
    Malformed(String),
}

/// Errors from [`FlagStore`] operations.
#[derive(Debug)]
pub enum FlagError {
    /// The backing file could not be read or written.
    Io(std::io::Error),
    /// The stored document failed to deserialise.
    Corrupted(String),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPin(pin) => write!(f, "GPIO{} not managed by driver", pin),
            Self::Digital { pin, kind } => write!(f, "GPIO{} digital I/O failed: {}", pin, kind),
            Self::Pwm { pin, kind } => write!(f, "GPIO{} PWM failed: {}", pin, kind),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "device family not supported"),
            Self::NoResponse => write!(f, "no response"),
            Self::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

impl fmt::Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "flag store I/O error: {}", e),
            Self::Corrupted(msg) => write!(f, "flag store corrupted: {}", msg),
        }
    }
}

impl std::error::Error for GpioError {}
impl std::error::Error for QueryError {}
impl std::error::Error for FlagError {}

impl From<std::io::Error> for FlagError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
