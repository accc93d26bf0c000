//! Static alarm table for the ATS trap group (`atsTrapGroup`).
//!
//! Every trap is identified by the last arc under
//! `1.3.6.1.4.1.37662.1.2.3.1.2`.  Devices send either `<base>.N` or
//! `<base>.0.N`; both forms resolve to the same row.
//!
//! | Range  | Kind                                   |
//! |--------|----------------------------------------|
//! | 1–17   | ATS faults (warning / critical)        |
//! | 18–36  | ATS recoveries and comms lost/restored |
//! | 37–58  | EMD sensor warnings and recoveries     |
//! | 59–70  | Informational state changes            |

use super::{AlarmDefinition, EventType, Severity};

/// Canonical (atsAgent(3)) trap-group prefix, with trailing dot.
pub const CANONICAL_TRAP_PREFIX: &str = "1.3.6.1.4.1.37662.1.2.3.1.2.";

const fn trigger(index: u16, name: &'static str, severity: Severity, description: &'static str) -> AlarmDefinition {
    AlarmDefinition {
        index,
        name,
        severity,
        event_type: EventType::Trigger,
        resumes: &[],
        description,
    }
}

const fn resumption(
    index: u16,
    name: &'static str,
    resumes: &'static [&'static str],
    description: &'static str,
) -> AlarmDefinition {
    AlarmDefinition {
        index,
        name,
        severity: Severity::Info,
        event_type: EventType::Resumption,
        resumes,
        description,
    }
}

const fn state(index: u16, name: &'static str, description: &'static str) -> AlarmDefinition {
    AlarmDefinition {
        index,
        name,
        severity: Severity::Info,
        event_type: EventType::State,
        resumes: &[],
        description,
    }
}

use Severity::{Critical, Warning};

pub static ALARMS: [AlarmDefinition; 70] = [
    // ── ATS faults ──────────────────────────────────────────
    trigger(1, "atsAtsAlarm", Warning, "WARNING: ATS Alarm."),
    trigger(2, "atsSourceAvoltageAbnormal", Warning, "WARNING: Source A Voltage Abnormal."),
    trigger(3, "atsSourceBvoltageAbnormal", Warning, "WARNING: Source B Voltage Abnormal."),
    trigger(4, "atsSourceAfrequencyAbnormal", Warning, "WARNING: Source A Frequency Abnormal."),
    trigger(5, "atsSourceBfrequencyAbnormal", Warning, "WARNING: Source B Frequency Abnormal."),
    trigger(6, "atsOutputOverLoad", Critical, "SEVERE: Output Over Load."),
    trigger(7, "atsWorkPowerAabnormal", Critical, "SEVERE: Unit fault (Working power A abnormal)."),
    trigger(8, "atsWorkPowerBabnormal", Critical, "SEVERE: Unit fault (Working power B abnormal)."),
    trigger(9, "atsOverTemperature", Warning, "WARNING: Cabinet over temperature."),
    trigger(10, "atsDcOffsetAbnormal", Critical, "SEVERE: Unit fault (Sensor circuit abnormal)."),
    trigger(11, "atsEepromAbnormal", Critical, "SEVERE: Unit fault (EEPROM data abnormal)."),
    trigger(12, "atsLcdNotConnect", Critical, "SEVERE: LCD panel connection abnormal."),
    trigger(
        13,
        "atsOutputExceedsOverloadTime",
        Critical,
        "SEVERE: Overload time out, Output off, Reset needed.",
    ),
    trigger(
        14,
        "atsInputPhaseDifference",
        Critical,
        "SEVERE: Phase difference between resources exceed user defined value, Output off, Reset needed.",
    ),
    trigger(15, "atsUserSetOverLoad", Warning, "WARNING: User defined load pre-alarm."),
    trigger(16, "atsCommunicationAbnormal", Critical, "SEVERE: Communication connection abnormal."),
    trigger(17, "atsEpoAlarm", Warning, "WARNING: EPO Alarm."),
    // ── ATS recoveries ──────────────────────────────────────
    resumption(18, "atsAtsAlarmToNormal", &["atsAtsAlarm"], "INFORMATION: ATS Alarm Normal."),
    resumption(
        19,
        "atsSourceAvoltageAbnormalToNormal",
        &["atsSourceAvoltageAbnormal"],
        "INFORMATION: Source A Voltage Normal.",
    ),
    resumption(
        20,
        "atsSourceBvoltageAbnormalToNormal",
        &["atsSourceBvoltageAbnormal"],
        "INFORMATION: Source B Voltage Normal.",
    ),
    resumption(
        21,
        "atsSourceAfrequencyAbnormalToNormal",
        &["atsSourceAfrequencyAbnormal"],
        "INFORMATION: Source A Frequency Normal.",
    ),
    resumption(
        22,
        "atsSourceBfrequencyAbnormalToNormal",
        &["atsSourceBfrequencyAbnormal"],
        "INFORMATION: Source B Frequency Normal.",
    ),
    resumption(23, "atsOutputOverLoadToNormal", &["atsOutputOverLoad"], "INFORMATION: Output Load Normal."),
    resumption(
        24,
        "atsWorkPowerAabnormalToNormal",
        &["atsWorkPowerAabnormal"],
        "INFORMATION: Unit Normal (Working power A normal).",
    ),
    resumption(
        25,
        "atsWorkPowerBabnormalToNormal",
        &["atsWorkPowerBabnormal"],
        "INFORMATION: Unit Normal (Working power B normal).",
    ),
    resumption(
        26,
        "atsOverTemperatureToNormal",
        &["atsOverTemperature"],
        "INFORMATION: Cabinet temperature Normal.",
    ),
    resumption(
        27,
        "atsDcOffsetAbnormalToNormal",
        &["atsDcOffsetAbnormal"],
        "INFORMATION: Unit Normal (Sensor circuit normal).",
    ),
    resumption(
        28,
        "atsEepromAbnormalToNormal",
        &["atsEepromAbnormal"],
        "INFORMATION: Unit Normal (EEPROM data normal).",
    ),
    resumption(
        29,
        "atsLcdNotConnectToNormal",
        &["atsLcdNotConnect"],
        "INFORMATION: LCD panel connection normal.",
    ),
    resumption(
        30,
        "atsOutputExceedsOverloadTimeToNormal",
        &["atsOutputExceedsOverloadTime"],
        "INFORMATION: Overload time out Normal.",
    ),
    resumption(
        31,
        "atsInputPhaseDifferenceToNormal",
        &["atsInputPhaseDifference"],
        "INFORMATION: Input sources return to normal phase.",
    ),
    resumption(
        32,
        "atsUserSetOverLoadToNormal",
        &["atsUserSetOverLoad"],
        "INFORMATION: User defined load return to Normal.",
    ),
    resumption(
        33,
        "atsCommunicationToNormal",
        &["atsCommunicationAbnormal"],
        "INFORMATION: Communication connection normal.",
    ),
    resumption(34, "atsEpoToNormal", &["atsEpoAlarm"], "INFORMATION: EPO Alarm Normal."),
    trigger(35, "atsCommunicationLost", Critical, "SEVERE: Communication to the ATS has been lost."),
    resumption(
        36,
        "atsCommunicationEstablished",
        &["atsCommunicationLost"],
        "INFORMATION: Communication with the ATS has been established.",
    ),
    // ── EMD sensor module ───────────────────────────────────
    resumption(
        37,
        "emdmTemperatureNotHighWarn",
        &["emdmTemperatureTooHighWarn"],
        "INFORMATION: EMD Temperature not over high set warning point.",
    ),
    trigger(
        38,
        "emdmTemperatureTooHighWarn",
        Warning,
        "WARNING: EMD Temperature over high set warning point.",
    ),
    resumption(
        39,
        "emdmTemperatureNotLowWarn",
        &["emdmTemperatureTooLowWarn"],
        "INFORMATION: EMD Temperature not under low set warning point.",
    ),
    trigger(
        40,
        "emdmTemperatureTooLowWarn",
        Warning,
        "WARNING: EMD Temperature under low set warning point.",
    ),
    resumption(
        41,
        "emdmTemperatureNotHighCrit",
        &["emdmTemperatureTooHighCrit"],
        "INFORMATION: EMD Temperature not over high set critical point.",
    ),
    trigger(
        42,
        "emdmTemperatureTooHighCrit",
        Warning,
        "WARNING: EMD Temperature over high set critical point.",
    ),
    resumption(
        43,
        "emdmTemperatureNotLowCrit",
        &["emdmTemperatureTooLowCrit"],
        "INFORMATION: EMD Temperature not under low set critical point.",
    ),
    trigger(
        44,
        "emdmTemperatureTooLowCrit",
        Warning,
        "WARNING: EMD Temperature under low set critical point.",
    ),
    resumption(
        45,
        "emdmHumidityNotHighWarn",
        &["emdmHumidityTooHighWarn"],
        "INFORMATION: EMD Humidity not over high set warning point.",
    ),
    trigger(46, "emdmHumidityTooHighWarn", Warning, "WARNING: EMD Humidity over high set warning point."),
    resumption(
        47,
        "emdmHumidityNotLowWarn",
        &["emdmHumidityTooLowWarn"],
        "INFORMATION: EMD Humidity not under low set warning point.",
    ),
    trigger(48, "emdmHumidityTooLowWarn", Warning, "WARNING: EMD Humidity under low set warning point."),
    resumption(
        49,
        "emdmHumidityNotHighCrit",
        &["emdmHumidityTooHighCrit"],
        "INFORMATION: EMD Humidity not over high set critical point.",
    ),
    trigger(50, "emdmHumidityTooHighCrit", Warning, "WARNING: EMD Humidity over high set critical point."),
    resumption(
        51,
        "emdmHumidityNotLowCrit",
        &["emdmHumidityTooLowCrit"],
        "INFORMATION: EMD Humidity not under low set critical point.",
    ),
    trigger(52, "emdmHumidityTooLowCrit", Warning, "WARNING: EMD Humidity under low set critical point."),
    resumption(53, "emdmAlarm1Normal", &["emdmAlarm1Active"], "INFORMATION: EMD Alarm-1 not active."),
    trigger(54, "emdmAlarm1Active", Warning, "WARNING: EMD Alarm-1 activated."),
    resumption(55, "emdmAlarm2Normal", &["emdmAlarm2Active"], "INFORMATION: EMD Alarm-2 not active."),
    trigger(56, "emdmAlarm2Active", Warning, "WARNING: EMD Alarm-2 activated."),
    resumption(
        57,
        "emdmCommunicationSuccess",
        &["emdmCommunicationLose"],
        "INFORMATION: EMD communication succeeded.",
    ),
    trigger(58, "emdmCommunicationLose", Warning, "WARNING: EMD communication lost."),
    // ── Informational ───────────────────────────────────────
    state(59, "emdLogClear", "INFORMATION: EMD history log cleared."),
    state(60, "emdmUpdateSuccess", "INFORMATION: EMD Firmware update success."),
    trigger(61, "emdmUpdateFail", Warning, "WARNING: EMD Firmware update fail."),
    state(62, "atsLoadOnSourceA", "INFORMATION: The Load is supplied by Source A."),
    state(63, "atsLoadOnSourceB", "INFORMATION: The Load is supplied by Source B."),
    state(64, "atsSourceAPreferred", "INFORMATION: Source A set as preferred source."),
    state(65, "atsSourceBPreferred", "INFORMATION: Source B set as preferred source."),
    state(66, "atsLoadOnBypassA", "INFORMATION: The Load is supplied by Bypass A."),
    state(67, "atsLoadOnBypassB", "INFORMATION: The Load is supplied by Bypass B."),
    trigger(68, "atsLoadOff", Warning, "WARNING: The Load disconnected."),
    state(69, "atsSendTestTrapEvent", "INFORMATION: Send test trap."),
    state(70, "atsSendTestMailEvent", "INFORMATION: Send test mail."),
];

/// Resolve an OID to its table row.
///
/// Accepts `<base>.N` and `<base>.0.N` under the canonical prefix only;
/// callers normalize vendor variants first.
pub fn lookup(oid: &str) -> Option<&'static AlarmDefinition> {
    let tail = oid.strip_prefix(CANONICAL_TRAP_PREFIX)?;
    let tail = tail.strip_prefix("0.").unwrap_or(tail);
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u16 = tail.parse().ok()?;
    ALARMS.iter().find(|a| a.index == index)
}

/// Resolve an alarm by name.
pub fn by_name(name: &str) -> Option<&'static AlarmDefinition> {
    ALARMS.iter().find(|a| a.name == name)
}
