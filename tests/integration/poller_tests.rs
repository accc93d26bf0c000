//! Status poller tests: family auto-detection, timeouts, failures and the
//! publishing loop.

use std::time::Duration;

use futures_lite::future;

use ats_panel::app::events::{OutputSource, PanelEvent, SourceStatus};
use ats_panel::app::ports::QueryError;
use ats_panel::events::PanelQueue;
use ats_panel::poller::{DeviceFamily, StatusPoller, run_poll_loop};

use crate::mock_hw::{ScriptedStatus, run_local};

const TIMEOUT: Duration = Duration::from_millis(50);

#[test]
fn auto_detects_family_and_remembers_it() {
    run_local(|_| async move {
        let mut poller = StatusPoller::new(ScriptedStatus::new(DeviceFamily::Ups), None, TIMEOUT);
        let sample = poller.poll_once().await;
        assert!(!sample.timed_out);
        assert_eq!(poller.family(), Some(DeviceFamily::Ups));
        assert_eq!(poller.client().asked, [DeviceFamily::Ats, DeviceFamily::Ups]);

        poller.poll_once().await;
        assert_eq!(
            poller.client().asked,
            [DeviceFamily::Ats, DeviceFamily::Ups, DeviceFamily::Ups]
        );
    });
}

#[test]
fn configured_family_falls_back_to_the_other() {
    run_local(|_| async move {
        let mut poller = StatusPoller::new(ScriptedStatus::new(DeviceFamily::Ats), Some(DeviceFamily::Ups), TIMEOUT);
        let sample = poller.poll_once().await;
        assert!(!sample.timed_out);
        assert_eq!(poller.family(), Some(DeviceFamily::Ats));
    });
}

#[test]
fn healthy_report_becomes_sample() {
    run_local(|_| async move {
        let mut poller = StatusPoller::new(ScriptedStatus::new(DeviceFamily::Ats), Some(DeviceFamily::Ats), TIMEOUT);
        let sample = poller.poll_once().await;
        assert_eq!(sample.source_a, SourceStatus::Ok);
        assert_eq!(sample.source_b, SourceStatus::Ok);
        assert_eq!(sample.output_source, OutputSource::B);
        assert_eq!(sample.output_load_percent, Some(23.5));
    });
}

#[test]
fn slow_device_times_out() {
    run_local(|_| async move {
        let client = ScriptedStatus::new(DeviceFamily::Ats).with_latency(Duration::from_millis(500));
        let mut poller = StatusPoller::new(client, Some(DeviceFamily::Ats), Duration::from_millis(20));
        let sample = poller.poll_once().await;
        assert!(sample.timed_out);
        assert_eq!(sample.output_load_percent, None);
    });
}

#[test]
fn query_failure_counts_as_timeout() {
    run_local(|_| async move {
        let client = ScriptedStatus::new(DeviceFamily::Ats)
            .then(Err(QueryError::NoResponse))
            .then(Err(QueryError::Malformed("truncated".into())));
        let mut poller = StatusPoller::new(client, Some(DeviceFamily::Ats), TIMEOUT);
        assert!(poller.poll_once().await.timed_out);
        assert!(poller.poll_once().await.timed_out);
        assert!(!poller.poll_once().await.timed_out);
    });
}

#[test]
fn unsupported_by_both_families_times_out() {
    run_local(|_| async move {
        // Rejects the ATS objects once; the UPS objects are never supported.
        let client = ScriptedStatus::new(DeviceFamily::Ats).then(Err(QueryError::Unsupported));
        let mut poller = StatusPoller::new(client, Some(DeviceFamily::Ats), TIMEOUT);
        assert!(poller.poll_once().await.timed_out);
        assert_eq!(poller.client().asked, [DeviceFamily::Ats, DeviceFamily::Ups]);
        assert!(!poller.poll_once().await.timed_out);
    });
}

#[test]
fn poll_loop_publishes_samples() {
    run_local(|_| async move {
        let queue = PanelQueue::new();
        let poller = StatusPoller::new(ScriptedStatus::new(DeviceFamily::Ats), None, TIMEOUT);
        future::or(run_poll_loop(poller, &queue, Duration::from_millis(5)), async {
            for _ in 0..3 {
                match queue.receive().await {
                    PanelEvent::Status(sample) => assert!(!sample.timed_out),
                    other => panic!("unexpected event {:?}", other),
                }
            }
        })
        .await;
    });
}
