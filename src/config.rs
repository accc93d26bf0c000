//! Panel configuration parameters
//!
//! All tunable parameters for the indicator panel.
//! Loaded once at startup from a JSON document; every field has a default so
//! a partial (or missing) file still yields a working panel.

use core::time::Duration;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::Path;

use log::info;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins::{LED_LOAD_LOWER, LED_LOAD_MID, LED_LOAD_OVERLOAD, LED_LOAD_VERY_LOWER};
use crate::poller::DeviceFamily;

/// Core panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    // --- LEDs ---
    /// Half-period of a red LED blink (milliseconds)
    pub blink_interval_ms: u64,
    /// LEDs light on a HIGH pin level (false = wired active-low)
    pub led_active_high: bool,

    // --- Buzzer ---
    /// Tone frequency (Hz)
    pub buzzer_frequency_hz: u32,
    /// Volume as PWM duty cycle (0-100%)
    pub buzzer_volume: u8,
    /// Length of one beep in the beep pattern (milliseconds)
    pub beep_duration_ms: u64,
    /// Silence between beeps (milliseconds)
    pub beep_pause_ms: u64,

    // --- Load indication ---
    pub load_bands: LoadBands,

    // --- Polling ---
    /// Status poll period (milliseconds)
    pub poll_interval_ms: u64,
    /// Upper bound on one status query (milliseconds)
    pub poll_timeout_ms: u64,
    /// Device family to query first; `None` auto-detects
    pub device_family: Option<DeviceFamily>,

    // --- Buttons ---
    /// Button sampling period (milliseconds)
    pub button_sample_ms: u64,
    /// Minimum time between accepted transitions per button (milliseconds)
    pub debounce_ms: u64,
    /// Buttons pull the input LOW when pressed
    pub button_active_low: bool,
    /// Duration of the reset-button lamp test (milliseconds)
    pub self_test_ms: u64,

    // --- Persistence ---
    /// JSON file holding `alarm_status` / `buzzer_muted`
    pub flags_path: String,

    // --- Monitored devices ---
    pub ups: UpsDirectory,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            // LEDs
            blink_interval_ms: 500,
            led_active_high: true,

            // Buzzer
            buzzer_frequency_hz: 1000,
            buzzer_volume: 25,
            beep_duration_ms: 300,
            beep_pause_ms: 100,

            load_bands: LoadBands::default(),

            // Polling
            poll_interval_ms: 10_000,
            poll_timeout_ms: 10_000,
            device_family: None,

            // Buttons
            button_sample_ms: 2,
            debounce_ms: 10,
            button_active_low: true,
            self_test_ms: 5_000,

            flags_path: "panel_flags.json".into(),
            ups: UpsDirectory::default(),
        }
    }
}

impl PanelConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `path`.  A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_json(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("CONFIG | {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Unreadable(e.to_string()).into()),
        }
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blink_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("blink_interval_ms must be > 0"));
        }
        if self.beep_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed("beep_duration_ms must be > 0"));
        }
        if self.poll_interval_ms == 0 || self.poll_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms and poll_timeout_ms must be > 0",
            ));
        }
        if self.button_sample_ms == 0 {
            return Err(ConfigError::ValidationFailed("button_sample_ms must be > 0"));
        }
        if self.buzzer_frequency_hz == 0 {
            return Err(ConfigError::ValidationFailed("buzzer_frequency_hz must be > 0"));
        }
        self.load_bands.validate()
    }

    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn self_test_duration(&self) -> Duration {
        Duration::from_millis(self.self_test_ms)
    }
}

// ---------------------------------------------------------------------------
// Load bands
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` percentage range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadRange {
    pub min: f32,
    pub max: f32,
}

impl LoadRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, load: f32) -> bool {
        load >= self.min && load <= self.max
    }
}

/// Which load band an output load falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBand {
    L1,
    L2,
    L3,
    L4,
}

impl LoadBand {
    /// Load LEDs lit for this band; the bar graph fills from LED 14 upwards.
    pub const fn leds_on(self) -> &'static [u8] {
        match self {
            Self::L1 => &[LED_LOAD_VERY_LOWER],
            Self::L2 => &[LED_LOAD_LOWER, LED_LOAD_VERY_LOWER],
            Self::L3 => &[LED_LOAD_MID, LED_LOAD_LOWER, LED_LOAD_VERY_LOWER],
            Self::L4 => &[LED_LOAD_OVERLOAD, LED_LOAD_MID, LED_LOAD_LOWER, LED_LOAD_VERY_LOWER],
        }
    }
}

/// All load LEDs, in bar-graph order.
pub const LOAD_LEDS: [u8; 4] = [LED_LOAD_OVERLOAD, LED_LOAD_MID, LED_LOAD_LOWER, LED_LOAD_VERY_LOWER];

/// Four ascending load thresholds.  L1..L3 are closed ranges, L4 is
/// open-ended (`load >= l4_min`).  Gaps between bands are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadBands {
    pub l1: LoadRange,
    pub l2: LoadRange,
    pub l3: LoadRange,
    pub l4_min: f32,
}

impl Default for LoadBands {
    fn default() -> Self {
        Self {
            l1: LoadRange::new(0.0, 5.0),
            l2: LoadRange::new(6.0, 20.0),
            l3: LoadRange::new(21.0, 28.0),
            l4_min: 29.0,
        }
    }
}

impl LoadBands {
    /// Band containing `load`, checked in ascending order.
    /// `None` when the value sits in a gap or is not a number.
    pub fn select(&self, load: f32) -> Option<LoadBand> {
        if self.l1.contains(load) {
            Some(LoadBand::L1)
        } else if self.l2.contains(load) {
            Some(LoadBand::L2)
        } else if self.l3.contains(load) {
            Some(LoadBand::L3)
        } else if load >= self.l4_min {
            Some(LoadBand::L4)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let all = [self.l1.min, self.l1.max, self.l2.min, self.l2.max, self.l3.min, self.l3.max, self.l4_min];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::ValidationFailed("load band limits must be finite and >= 0"));
        }
        if self.l1.min > self.l1.max || self.l2.min > self.l2.max || self.l3.min > self.l3.max {
            return Err(ConfigError::ValidationFailed("load band min must not exceed max"));
        }
        if self.l1.max >= self.l2.min || self.l2.max >= self.l3.min || self.l3.max >= self.l4_min {
            return Err(ConfigError::ValidationFailed("load bands must be ascending and non-overlapping"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Monitored device directory
// ---------------------------------------------------------------------------

/// Human-facing identity of the device that raised an alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsIdentity {
    pub name: String,
    pub location: String,
}

/// One known device, keyed by its management address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsDevice {
    pub address: IpAddr,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsDirectory {
    /// Identity used when the source address is not listed.
    pub default_name: String,
    pub default_location: String,
    pub devices: Vec<UpsDevice>,
    /// Notification sources accepted by the classifier; empty accepts all.
    pub allowed_sources: Vec<IpAddr>,
}

impl Default for UpsDirectory {
    fn default() -> Self {
        Self {
            default_name: "ATS".into(),
            default_location: "Unknown".into(),
            devices: Vec::new(),
            allowed_sources: Vec::new(),
        }
    }
}

impl UpsDirectory {
    /// Name and location for `source`, falling back to the defaults.
    pub fn identity(&self, source: Option<IpAddr>) -> UpsIdentity {
        source
            .and_then(|addr| self.devices.iter().find(|d| d.address == addr))
            .map_or_else(
                || UpsIdentity {
                    name: self.default_name.clone(),
                    location: self.default_location.clone(),
                },
                |d| UpsIdentity {
                    name: d.name.clone(),
                    location: d.location.clone(),
                },
            )
    }
}
