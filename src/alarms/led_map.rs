//! Static alarm → LED mapping.
//!
//! | Alarm group                          | Disable        | Enable    |
//! |--------------------------------------|----------------|-----------|
//! | Source A voltage / frequency abnormal| 2, 6, 8, 3     | 10        |
//! | Source B voltage / frequency abnormal| 4, 7, 8, 3     | 10        |
//! | Overload alarms                      | –              | 11        |
//! | Any other trigger                    | –              | 10        |
//! | Source A normal                      | 10             | 2         |
//! | Source B normal                      | 10             | 4         |
//! | Overload normal                      | 11             | 12        |
//! | ATS alarm normal                     | 10             | 2, 6, 8   |
//! | Any other resumption                 | 10             | –         |
//!
//! State events drive the active-source pair (6 / 7).

use crate::pins::{
    LED_ACTIVE_SOURCE_A, LED_ACTIVE_SOURCE_B, LED_ALARM, LED_LOAD_MID, LED_LOAD_OVERLOAD, LED_SOURCE_A_OK,
    LED_SOURCE_B_OK, LED_SYNC, LED_SYSTEM_OK,
};

/// LEDs switched off, then LEDs switched on, for one alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedAction {
    pub disable: &'static [u8],
    pub enable: &'static [u8],
}

impl LedAction {
    const fn enable(leds: &'static [u8]) -> Self {
        Self { disable: &[], enable: leds }
    }

    /// Every LED this action writes.
    pub fn touched(&self) -> impl Iterator<Item = u8> + '_ {
        self.disable.iter().chain(self.enable.iter()).copied()
    }
}

const SOURCE_A_FAULT: LedAction = LedAction {
    disable: &[LED_SOURCE_A_OK, LED_ACTIVE_SOURCE_A, LED_SYSTEM_OK, LED_SYNC],
    enable: &[LED_ALARM],
};

const SOURCE_B_FAULT: LedAction = LedAction {
    disable: &[LED_SOURCE_B_OK, LED_ACTIVE_SOURCE_B, LED_SYSTEM_OK, LED_SYNC],
    enable: &[LED_ALARM],
};

const OVERLOAD: LedAction = LedAction::enable(&[LED_LOAD_OVERLOAD]);
const GENERAL_ALARM: LedAction = LedAction::enable(&[LED_ALARM]);

/// Explicit LED action for a trigger alarm, if one is mapped.
pub fn trigger_action(name: &str) -> Option<LedAction> {
    let action = match name {
        "atsSourceAvoltageAbnormal" | "atsSourceAfrequencyAbnormal" => SOURCE_A_FAULT,
        "atsSourceBvoltageAbnormal" | "atsSourceBfrequencyAbnormal" => SOURCE_B_FAULT,
        "atsOutputOverLoad" | "atsUserSetOverLoad" | "atsOutputExceedsOverloadTime" => OVERLOAD,
        "atsAtsAlarm"
        | "atsWorkPowerAabnormal"
        | "atsWorkPowerBabnormal"
        | "atsDcOffsetAbnormal"
        | "atsEepromAbnormal"
        | "atsLcdNotConnect"
        | "atsInputPhaseDifference"
        | "atsCommunicationAbnormal"
        | "atsCommunicationLost"
        | "atsOverTemperature"
        | "atsEpoAlarm"
        | "atsLoadOff"
        | "emdmTemperatureTooHighWarn"
        | "emdmTemperatureTooLowWarn"
        | "emdmTemperatureTooHighCrit"
        | "emdmTemperatureTooLowCrit"
        | "emdmHumidityTooHighWarn"
        | "emdmHumidityTooLowWarn"
        | "emdmHumidityTooHighCrit"
        | "emdmHumidityTooLowCrit"
        | "emdmAlarm1Active"
        | "emdmAlarm2Active"
        | "emdmCommunicationLose"
        | "emdmUpdateFail" => GENERAL_ALARM,
        _ => return None,
    };
    Some(action)
}

/// Explicit LED action for a resumption, if one is mapped.
pub fn resumption_action(name: &str) -> Option<LedAction> {
    let action = match name {
        "atsSourceAvoltageAbnormalToNormal" | "atsSourceAfrequencyAbnormalToNormal" => LedAction {
            disable: &[LED_ALARM],
            enable: &[LED_SOURCE_A_OK],
        },
        "atsSourceBvoltageAbnormalToNormal" | "atsSourceBfrequencyAbnormalToNormal" => LedAction {
            disable: &[LED_ALARM],
            enable: &[LED_SOURCE_B_OK],
        },
        "atsOutputOverLoadToNormal" | "atsUserSetOverLoadToNormal" | "atsOutputExceedsOverloadTimeToNormal" => {
            LedAction {
                disable: &[LED_LOAD_OVERLOAD],
                enable: &[LED_LOAD_MID],
            }
        }
        "atsAtsAlarmToNormal" => LedAction {
            disable: &[LED_ALARM],
            enable: &[LED_SOURCE_A_OK, LED_ACTIVE_SOURCE_A, LED_SYSTEM_OK],
        },
        "atsWorkPowerAabnormalToNormal"
        | "atsWorkPowerBabnormalToNormal"
        | "atsDcOffsetAbnormalToNormal"
        | "atsEepromAbnormalToNormal"
        | "atsLcdNotConnectToNormal"
        | "atsInputPhaseDifferenceToNormal"
        | "atsCommunicationToNormal"
        | "atsCommunicationEstablished"
        | "atsOverTemperatureToNormal"
        | "atsEpoToNormal"
        | "emdmTemperatureNotHighWarn"
        | "emdmTemperatureNotLowWarn"
        | "emdmTemperatureNotHighCrit"
        | "emdmTemperatureNotLowCrit"
        | "emdmHumidityNotHighWarn"
        | "emdmHumidityNotLowWarn"
        | "emdmHumidityNotHighCrit"
        | "emdmHumidityNotLowCrit"
        | "emdmAlarm1Normal"
        | "emdmAlarm2Normal"
        | "emdmCommunicationSuccess" => LedAction {
            disable: &[LED_ALARM],
            enable: &[],
        },
        _ => return None,
    };
    Some(action)
}

/// Generic clear used by resumptions with neither a mapping nor a `resumes` list.
pub const GENERIC_CLEAR: LedAction = LedAction {
    disable: &[LED_ALARM],
    enable: &[],
};

/// Mutually exclusive pair `(on, off)` driven by a state event.
pub fn state_pair(name: &str) -> Option<(u8, u8)> {
    match name {
        "atsLoadOnSourceA" | "atsLoadOnBypassA" => Some((LED_ACTIVE_SOURCE_A, LED_ACTIVE_SOURCE_B)),
        "atsLoadOnSourceB" | "atsLoadOnBypassB" => Some((LED_ACTIVE_SOURCE_B, LED_ACTIVE_SOURCE_A)),
        _ => None,
    }
}
