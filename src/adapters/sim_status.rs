//! Simulated status query client.
//!
//! Answers [`StatusQueryPort`] from a fixed [`StatusReport`] so the poller
//! has something to talk to on a host.  The simulated device belongs to one
//! [`DeviceFamily`] and reports [`QueryError::Unsupported`] for the other,
//! which exercises family auto-detection.

use core::time::Duration;

use async_io_mini::Timer;

use crate::app::events::{OutputSource, SourceStatus};
use crate::app::ports::{QueryError, StatusQueryPort};
use crate::poller::{DeviceFamily, StatusReport};

#[derive(Debug, Clone)]
pub struct SimStatusClient {
    family: DeviceFamily,
    report: StatusReport,
    latency: Duration,
    queries: usize,
}

impl SimStatusClient {
    /// A healthy ATS: both sources ok, load on A at 12.5 %.
    pub fn healthy_ats() -> Self {
        Self::new(
            DeviceFamily::Ats,
            StatusReport {
                source_a: SourceStatus::Ok,
                source_b: SourceStatus::Ok,
                output_source: OutputSource::A,
                load_raw: Some(125.0),
                load_formatted: Some("12.5%".into()),
            },
        )
    }

    pub fn new(family: DeviceFamily, report: StatusReport) -> Self {
        Self {
            family,
            report,
            latency: Duration::ZERO,
            queries: 0,
        }
    }

    /// Delay every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_report(&mut self, report: StatusReport) {
        self.report = report;
    }

    /// Queries answered or rejected so far.
    pub fn queries(&self) -> usize {
        self.queries
    }
}

impl StatusQueryPort for SimStatusClient {
    async fn query_status(&mut self, family: DeviceFamily) -> Result<StatusReport, QueryError> {
        self.queries += 1;
        if family != self.family {
            return Err(QueryError::Unsupported);
        }
        if !self.latency.is_zero() {
            Timer::after(self.latency).await;
        }
        Ok(self.report.clone())
    }
}
