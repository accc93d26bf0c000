//! Newline-delimited JSON notification feed.
//!
//! Stands in for the network notification listener on a host.  Each line
//! is one already-decoded notification:
//!
//! ```json
//! {"oid": "1.3.6.1.4.1.37662.1.2.2.1.2.2", "bindings": [["1.3.6.1.2.1.1.3.0", "4711"]], "source": "192.168.111.173"}
//! ```
//!
//! Lines are classified and published onto the panel queue from the feed's
//! own thread.  End of input publishes [`PanelEvent::Shutdown`].

use std::io::BufRead;
use std::net::IpAddr;

use futures_lite::future;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::alarms::{Classifier, VarBind};
use crate::events::{PanelEvent, PanelQueue};

/// One decoded notification line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrapLine {
    pub oid: String,
    pub bindings: Vec<(String, String)>,
    pub source: Option<IpAddr>,
}

impl TrapLine {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub fn var_binds(&self) -> Vec<VarBind> {
        self.bindings.iter().map(|(oid, value)| VarBind::new(oid.as_str(), value.as_str())).collect()
    }
}

/// Read `reader` to the end, publishing every classified notification.
/// Returns the number of events published (excluding the final shutdown).
pub fn run_trap_feed<R: BufRead>(reader: R, classifier: &Classifier, queue: &PanelQueue) -> usize {
    let mut published = 0;
    for (lineno, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("TRAP | feed read failed: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let trap = match TrapLine::parse(line) {
            Ok(trap) => trap,
            Err(e) => {
                warn!("TRAP | line {} skipped: {}", lineno + 1, e);
                continue;
            }
        };
        debug!("TRAP | line {}: {:?}", lineno + 1, trap);
        if let Some(event) = classifier.classify(&trap.oid, trap.var_binds(), trap.source) {
            future::block_on(queue.send(PanelEvent::Alarm(event)));
            published += 1;
        }
    }
    info!("TRAP | feed closed after {} notifications", published);
    future::block_on(queue.send(PanelEvent::Shutdown));
    published
}
