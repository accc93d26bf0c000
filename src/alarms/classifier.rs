//! Notification classifier.
//!
//! Turns `(oid, bindings, source)` from the notification listener into an
//! [`AlarmEvent`].  Resolution order:
//!
//! 1. Rewrite the legacy atsAgent(2) prefix to the canonical atsAgent(3)
//!    prefix (the device firmware emits one agent index, the MIB defines
//!    the other).
//! 2. Look up the normalized OID, then the raw OID.
//! 3. Otherwise flag the event as battery-related when any candidate OID
//!    sits under a UPS / vendor prefix; if not, it is unclassified.
//!
//! The delivered OID is the first candidate.  When it is empty or
//! malformed, the `snmpTrapOID.0` binding and then the remaining binding
//! OIDs are tried.

use std::borrow::Cow;
use std::net::IpAddr;
use std::time::SystemTime;

use log::{debug, info, warn};

use super::table::{self, CANONICAL_TRAP_PREFIX};
use super::{AlarmDefinition, AlarmEvent, Classification, VarBind};

/// Trap-group prefix emitted by atsAgent(2) firmware.
pub const LEGACY_TRAP_PREFIX: &str = "1.3.6.1.4.1.37662.1.2.2.1.2.";

/// `snmpTrapOID.0`: its value names the trap.
pub const SNMP_TRAP_OID: &str = "1.3.6.1.6.3.1.1.4.1.0";

/// Battery / UPS MIB subtrees (RFC 1628 battery group, APC, Eaton, PowerNet, ATS trap group).
const BATTERY_OID_PATTERNS: [&str; 5] = [
    "1.3.6.1.2.1.33.1.2",
    "1.3.6.1.4.1.318.1.1.1.2",
    "1.3.6.1.4.1.534.1",
    "1.3.6.1.4.1.935.1.1.1.2",
    "1.3.6.1.4.1.37662.1.2.3.1.2",
];

/// Vendor roots treated as power-related when nothing else matched.
const VENDOR_ROOTS: [&str; 2] = ["1.3.6.1.4.1.37662", "1.3.6.1.4.1.935"];

/// Rewrite a legacy-agent trap OID to the canonical prefix.
pub fn normalize_oid(oid: &str) -> Cow<'_, str> {
    match oid.strip_prefix(LEGACY_TRAP_PREFIX) {
        Some(rest) => Cow::Owned(format!("{CANONICAL_TRAP_PREFIX}{rest}")),
        None => Cow::Borrowed(oid),
    }
}

/// Dotted-decimal with at least two arcs and no empty arcs.
pub fn is_well_formed(oid: &str) -> bool {
    let mut arcs = 0usize;
    for arc in oid.split('.') {
        if arc.is_empty() || !arc.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        arcs += 1;
    }
    arcs >= 2
}

/// `oid` equals `prefix` or continues it at an arc boundary.
fn under(oid: &str, prefix: &str) -> bool {
    oid.strip_prefix(prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// Heuristic match against battery / vendor subtrees.
pub fn is_battery_related_oid(oid: &str) -> bool {
    BATTERY_OID_PATTERNS.iter().chain(VENDOR_ROOTS.iter()).any(|p| under(oid, p))
}

/// Normalized lookup first, raw lookup second.
pub fn classify_oid(oid: &str) -> Option<&'static AlarmDefinition> {
    table::lookup(&normalize_oid(oid)).or_else(|| table::lookup(oid))
}

/// Stateless apart from the source allow-list.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    allowed_sources: Vec<IpAddr>,
}

impl Classifier {
    /// `allowed_sources` empty accepts every source.
    pub fn new(allowed_sources: Vec<IpAddr>) -> Self {
        Self { allowed_sources }
    }

    /// Classify one notification.
    ///
    /// Returns `None` only when the notification is dropped (source not
    /// allowed, or no usable OID at all).  Unknown OIDs still produce an
    /// event so the notification path sees them.
    pub fn classify(&self, oid: &str, bindings: Vec<VarBind>, source: Option<IpAddr>) -> Option<AlarmEvent> {
        if !self.allowed_sources.is_empty() && !source.is_some_and(|s| self.allowed_sources.contains(&s)) {
            warn!("TRAP | dropping notification from non-allowed source {:?}", source);
            return None;
        }

        let bindings: Vec<VarBind> = bindings
            .into_iter()
            .filter(|b| {
                let ok = is_well_formed(&b.oid);
                if !ok {
                    warn!("TRAP | skipping malformed binding {:?}", b.oid);
                }
                ok
            })
            .collect();

        let mut candidates: Vec<&str> = Vec::with_capacity(bindings.len() + 1);
        if is_well_formed(oid) {
            candidates.push(oid);
        } else if !oid.is_empty() {
            warn!("TRAP | malformed trap OID {:?}, falling back to bindings", oid);
        }
        if let Some(b) = bindings.iter().find(|b| b.oid == SNMP_TRAP_OID) {
            let value = b.value.trim();
            if is_well_formed(value) {
                candidates.push(value);
            }
        }
        candidates.extend(bindings.iter().filter(|b| b.oid != SNMP_TRAP_OID).map(|b| b.oid.as_str()));

        let Some(&first) = candidates.first() else {
            warn!("TRAP | notification from {:?} carries no usable OID", source);
            return None;
        };

        let (event_oid, classification, battery_related) =
            if let Some((cand, def)) = candidates.iter().find_map(|c| classify_oid(c).map(|d| (*c, d))) {
                debug!("TRAP | {} -> {}", cand, def.name);
                (def.oid(), Classification::Known(def), def.mentions_power())
            } else if let Some(cand) = candidates.iter().find(|c| is_battery_related_oid(c)) {
                ((*cand).to_owned(), Classification::BatteryRelated, true)
            } else {
                (first.to_owned(), Classification::Unclassified, false)
            };

        let event = AlarmEvent {
            oid: event_oid,
            classification,
            battery_related,
            source,
            timestamp: SystemTime::now(),
            bindings,
        };

        match event.classification {
            Classification::Known(def) => {
                info!("TRAP | {} ({:?}/{:?}) from {:?}", def.name, def.severity, def.event_type, source);
            }
            Classification::BatteryRelated => {
                warn!("TRAP | unrecognised battery/power OID {} from {:?}", event.oid, source);
            }
            Classification::Unclassified => {
                warn!("TRAP | unclassified OID {} from {:?}", event.oid, source);
            }
        }
        Some(event)
    }
}
