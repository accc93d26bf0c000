//! Status poller.
//!
//! Once per poll cycle the poller asks the device for its live status
//! through a [`StatusQueryPort`], bounded by a timeout, and publishes a
//! [`StatusSample`] onto the panel queue.
//!
//! ## Device family detection
//!
//! The device may be an ATS or a UPS.  Unless a family is configured the
//! poller tries ATS first, falls back to UPS when the client reports
//! [`QueryError::Unsupported`], and remembers whichever answered.
//!
//! ## Load normalization
//!
//! | Condition                                        | Load used      |
//! |--------------------------------------------------|----------------|
//! | `|raw - formatted| <= 0.1` (formatted parsed)    | `raw`          |
//! | otherwise, `raw < 100`                           | `raw`          |
//! | otherwise                                        | `raw / 10`     |

use core::time::Duration;

use async_io_mini::Timer;
use futures_lite::future;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::events::{OutputSource, PanelEvent, SourceStatus, StatusSample};
use crate::app::ports::{QueryError, StatusQueryPort};
use crate::events::PanelQueue;

/// Tolerance when comparing the raw load against its formatted string.
const LOAD_MATCH_TOLERANCE: f64 = 0.1;

/// Which object set the status query client should read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFamily {
    Ats,
    Ups,
}

impl DeviceFamily {
    pub const fn other(self) -> Self {
        match self {
            Self::Ats => Self::Ups,
            Self::Ups => Self::Ats,
        }
    }
}

/// Decoded answer from the status query client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    pub source_a: SourceStatus,
    pub source_b: SourceStatus,
    pub output_source: OutputSource,
    /// Load as returned by the device (percent or tenths of a percent).
    pub load_raw: Option<f64>,
    /// The device's own pre-formatted load string, e.g. `"12.5%"`.
    pub load_formatted: Option<String>,
}

impl StatusReport {
    /// Convert into a panel sample, normalizing the load.
    pub fn into_sample(self) -> StatusSample {
        StatusSample {
            source_a: self.source_a,
            source_b: self.source_b,
            output_source: self.output_source,
            output_load_percent: self.load_raw.map(|raw| normalize_load(raw, self.load_formatted.as_deref())),
            timed_out: false,
        }
    }
}

/// Bring a raw load reading into percent.
pub fn normalize_load(raw: f64, formatted: Option<&str>) -> f32 {
    let parsed = formatted.and_then(|s| s.trim().trim_end_matches('%').trim().parse::<f64>().ok());
    let percent = match parsed {
        Some(p) if (raw - p).abs() <= LOAD_MATCH_TOLERANCE => raw,
        _ if raw < 100.0 => raw,
        _ => raw / 10.0,
    };
    percent as f32
}

/// Polls one device through a [`StatusQueryPort`].
pub struct StatusPoller<Q> {
    client: Q,
    family: Option<DeviceFamily>,
    timeout: Duration,
}

impl<Q: StatusQueryPort> StatusPoller<Q> {
    /// `family = None` enables auto-detection.
    pub fn new(client: Q, family: Option<DeviceFamily>, timeout: Duration) -> Self {
        Self {
            client,
            family,
            timeout,
        }
    }

    /// Family that last answered (or the configured one).
    pub fn family(&self) -> Option<DeviceFamily> {
        self.family
    }

    pub fn client(&self) -> &Q {
        &self.client
    }

    /// Run one bounded query.  A timeout or a query failure both yield a
    /// timed-out sample.
    pub async fn poll_once(&mut self) -> StatusSample {
        let timeout = self.timeout;
        let result = future::or(async { Some(self.query().await) }, async {
            Timer::after(timeout).await;
            None
        })
        .await;

        match result {
            Some(Ok(report)) => {
                let sample = report.into_sample();
                debug!("POLL | {:?}", sample);
                sample
            }
            Some(Err(e)) => {
                warn!("POLL | status query failed: {}", e);
                StatusSample::timed_out()
            }
            None => {
                warn!("POLL | status query timed out after {:?}", timeout);
                StatusSample::timed_out()
            }
        }
    }

    async fn query(&mut self) -> Result<StatusReport, QueryError> {
        let first = self.family.unwrap_or(DeviceFamily::Ats);
        for family in [first, first.other()] {
            match self.client.query_status(family).await {
                Ok(report) => {
                    if self.family != Some(family) {
                        info!("POLL | device answers as {:?}", family);
                        self.family = Some(family);
                    }
                    return Ok(report);
                }
                Err(QueryError::Unsupported) => {
                    debug!("POLL | {:?} objects not supported", family);
                }
                Err(e) => return Err(e),
            }
        }
        Err(QueryError::Unsupported)
    }
}

/// Poll forever, publishing every sample onto `queue`.
pub async fn run_poll_loop<Q: StatusQueryPort>(mut poller: StatusPoller<Q>, queue: &PanelQueue, interval: Duration) {
    info!("POLL | every {:?}, timeout {:?}", interval, poller.timeout);
    loop {
        let sample = poller.poll_once().await;
        queue.send(PanelEvent::Status(sample)).await;
        Timer::after(interval).await;
    }
}
