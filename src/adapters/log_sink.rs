//! Log-based notification sink adapter.
//!
//! Implements [`NotificationSink`] by writing one structured line per
//! classified alarm to the logger.  An e-mail or SMS adapter would
//! implement the same trait and own its own cooldown and scheduling.

use log::{info, warn};

use crate::alarms::{AlarmEvent, Severity};
use crate::app::ports::NotificationSink;
use crate::config::UpsIdentity;

/// Adapter that logs every notified [`AlarmEvent`].
#[derive(Debug, Default)]
pub struct LogNotificationSink {
    delivered: usize,
}

impl LogNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events notified so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl NotificationSink for LogNotificationSink {
    fn notify(&mut self, event: &AlarmEvent, ups: &UpsIdentity) {
        self.delivered += 1;
        let source = event.source.map_or_else(|| "-".to_owned(), |s| s.to_string());
        let power = if event.battery_related { " [power]" } else { "" };
        match event.severity() {
            Some(Severity::Critical) | Some(Severity::Warning) => warn!(
                "NOTIFY | {} @ {} ({}) | {}{} | {}",
                ups.name,
                ups.location,
                source,
                event.name(),
                power,
                event.description()
            ),
            _ => info!(
                "NOTIFY | {} @ {} ({}) | {}{} | {}",
                ups.name,
                ups.location,
                source,
                event.name(),
                power,
                event.description()
            ),
        }
    }
}
