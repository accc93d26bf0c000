//! Alarm model: static definitions, LED mapping, and notification classification.
//!
//! ```text
//!  (oid, bindings, source) ──▶ Classifier ──▶ AlarmEvent ──▶ event queue
//!                                  │
//!                         table::lookup / battery heuristic
//! ```
//!
//! Everything in this module is pure: no actuator side effects, no I/O.

pub mod classifier;
pub mod led_map;
pub mod table;

use std::net::IpAddr;
use std::time::SystemTime;

pub use classifier::{Classifier, normalize_oid};
pub use table::lookup;

/// How urgent an alarm is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// What an alarm does to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Raises a condition.
    Trigger,
    /// Clears one or more previously raised conditions.
    Resumption,
    /// Reports a state change that is neither fault nor recovery.
    State,
}

/// One row of the static alarm table.
#[derive(Debug, PartialEq, Eq)]
pub struct AlarmDefinition {
    /// Last arc of the trap OID under the canonical trap group.
    pub index: u16,
    pub name: &'static str,
    pub severity: Severity,
    pub event_type: EventType,
    /// Trigger names this resumption clears (empty for triggers and states).
    pub resumes: &'static [&'static str],
    pub description: &'static str,
}

impl AlarmDefinition {
    /// Canonical OID of this alarm.
    pub fn oid(&self) -> String {
        format!("{}{}", table::CANONICAL_TRAP_PREFIX, self.index)
    }

    /// Names mentioning battery or power are flagged for the notification path.
    pub fn mentions_power(&self) -> bool {
        self.name.to_ascii_lowercase().contains("battery") || self.name.contains("Power")
    }
}

/// Outcome of classifying a notification OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Matched a row of the alarm table.
    Known(&'static AlarmDefinition),
    /// Unknown OID under a battery / UPS vendor prefix; treated as a warning.
    BatteryRelated,
    /// Unknown OID with no heuristic match; logged, never drives the panel.
    Unclassified,
}

/// One decoded variable binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: String,
    pub value: String,
}

impl VarBind {
    pub fn new(oid: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            value: value.into(),
        }
    }
}

/// A classified notification, ready for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEvent {
    /// OID the classification was made from (normalized when known).
    pub oid: String,
    pub classification: Classification,
    pub battery_related: bool,
    pub source: Option<IpAddr>,
    pub timestamp: SystemTime,
    pub bindings: Vec<VarBind>,
}

impl AlarmEvent {
    pub fn definition(&self) -> Option<&'static AlarmDefinition> {
        match self.classification {
            Classification::Known(def) => Some(def),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.classification {
            Classification::Known(def) => def.name,
            Classification::BatteryRelated => "BatteryRelated",
            Classification::Unclassified => "Unclassified",
        }
    }

    /// `None` for unclassified events, which never drive the panel.
    pub fn severity(&self) -> Option<Severity> {
        match self.classification {
            Classification::Known(def) => Some(def.severity),
            Classification::BatteryRelated => Some(Severity::Warning),
            Classification::Unclassified => None,
        }
    }

    pub fn event_type(&self) -> Option<EventType> {
        match self.classification {
            Classification::Known(def) => Some(def.event_type),
            Classification::BatteryRelated => Some(EventType::Trigger),
            Classification::Unclassified => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self.classification {
            Classification::Known(def) => def.description,
            Classification::BatteryRelated => "WARNING: Unrecognised battery/power notification.",
            Classification::Unclassified => "INFORMATION: Unrecognised notification.",
        }
    }
}
