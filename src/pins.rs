//! GPIO pin assignments and LED wiring for the ATS indicator panel.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers. LED numbers follow the silkscreen on the panel
//! front (1..=14), GPIO numbers are BCM numbering on the controller board.

use serde::{Deserialize, Serialize};

/// Physical lens colour of a panel LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedColour {
    Green,
    Red,
}

/// One row of the LED wiring table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedSpec {
    /// Panel LED number (1..=14).
    pub id: u8,
    /// Output GPIO driving the LED.
    pub gpio: u8,
    pub colour: LedColour,
    /// Legend printed next to the LED.
    pub name: &'static str,
}

impl LedSpec {
    pub const fn is_red(&self) -> bool {
        matches!(self.colour, LedColour::Red)
    }
}

/// Number of LEDs on the panel.
pub const LED_COUNT: usize = 14;

// ---------------------------------------------------------------------------
// LED wiring
// ---------------------------------------------------------------------------

pub const PANEL_LEDS: [LedSpec; LED_COUNT] = [
    LedSpec { id: 1, gpio: 4, colour: LedColour::Red, name: "MBP1 Fault" },
    LedSpec { id: 2, gpio: 5, colour: LedColour::Green, name: "MBP1 Normal" },
    LedSpec { id: 3, gpio: 22, colour: LedColour::Green, name: "SYNC 1" },
    LedSpec { id: 4, gpio: 23, colour: LedColour::Green, name: "MBP2 Normal" },
    LedSpec { id: 5, gpio: 6, colour: LedColour::Red, name: "MBP2 Fault" },
    LedSpec { id: 6, gpio: 24, colour: LedColour::Green, name: "Source 1 active" },
    LedSpec { id: 7, gpio: 25, colour: LedColour::Green, name: "Source 2 active" },
    LedSpec { id: 8, gpio: 16, colour: LedColour::Green, name: "SYSTEM OK" },
    LedSpec { id: 9, gpio: 20, colour: LedColour::Green, name: "OUTPUT" },
    LedSpec { id: 10, gpio: 12, colour: LedColour::Red, name: "ALARM" },
    LedSpec { id: 11, gpio: 26, colour: LedColour::Red, name: "LOAD Overload" },
    LedSpec { id: 12, gpio: 27, colour: LedColour::Green, name: "LOAD mid" },
    LedSpec { id: 13, gpio: 11, colour: LedColour::Green, name: "LOAD lower" },
    LedSpec { id: 14, gpio: 15, colour: LedColour::Green, name: "LOAD very lower" },
];

/// Look up the wiring row for a panel LED number.
pub fn led(id: u8) -> Option<&'static LedSpec> {
    PANEL_LEDS.iter().find(|l| l.id == id)
}

// ---------------------------------------------------------------------------
// Well-known LED numbers used by the panel rules
// ---------------------------------------------------------------------------

pub const LED_SOURCE_A_OK: u8 = 2;
pub const LED_SYNC: u8 = 3;
pub const LED_SOURCE_B_OK: u8 = 4;
pub const LED_ACTIVE_SOURCE_A: u8 = 6;
pub const LED_ACTIVE_SOURCE_B: u8 = 7;
pub const LED_SYSTEM_OK: u8 = 8;
pub const LED_OUTPUT: u8 = 9;
pub const LED_ALARM: u8 = 10;
pub const LED_LOAD_OVERLOAD: u8 = 11;
pub const LED_LOAD_MID: u8 = 12;
pub const LED_LOAD_LOWER: u8 = 13;
pub const LED_LOAD_VERY_LOWER: u8 = 14;

// ---------------------------------------------------------------------------
// Buzzer and buttons
// ---------------------------------------------------------------------------

/// PWM output driving the piezo speaker. Idle level is HIGH.
pub const BUZZER_GPIO: u8 = 18;
/// Mute push-button input, pulled up (pressed = LOW).
pub const MUTE_BUTTON_GPIO: u8 = 19;
/// Reset push-button input, pulled up (pressed = LOW).
pub const RESET_BUTTON_GPIO: u8 = 21;
