//! Panel rule tests: drive [`PanelOrchestrator`] with events and assert on
//! LED modes, buzzer mode, persisted flags and notifications.

use std::rc::Rc;
use std::time::{Duration, Instant};

use async_io_mini::Timer;

use ats_panel::alarms::{Classifier, VarBind};
use ats_panel::app::events::{ButtonEdge, ButtonEvent, ButtonId, OutputSource, PanelEvent, SourceStatus, StatusSample};
use ats_panel::app::ports::FlagKey;
use ats_panel::app::service::{FAILSAFE_OFF, PanelOrchestrator};
use ats_panel::config::PanelConfig;
use ats_panel::drivers::actuators::{ActuatorRegistry, BuzzerMode, LedMode, PanelExecutor};
use ats_panel::events::PanelQueue;
use ats_panel::pins::{
    self, BUZZER_GPIO, LED_ACTIVE_SOURCE_A, LED_ACTIVE_SOURCE_B, LED_ALARM, LED_LOAD_LOWER, LED_LOAD_MID,
    LED_LOAD_OVERLOAD, LED_LOAD_VERY_LOWER, LED_OUTPUT, LED_SOURCE_A_OK, LED_SOURCE_B_OK, LED_SYNC, LED_SYSTEM_OK,
    PANEL_LEDS,
};

use crate::mock_hw::{MemoryFlagStore, MockGpio, RecordingSink, fast_config, healthy_sample, run_local};

type Panel = PanelOrchestrator<'static, MockGpio, MemoryFlagStore, RecordingSink>;

const TRAP_BASE: &str = "1.3.6.1.4.1.37662.1.2.3.1.2";

fn panel(executor: Rc<PanelExecutor<'static>>, flags: MemoryFlagStore, config: PanelConfig) -> Panel {
    let registry = ActuatorRegistry::new(executor, MockGpio::new(), &config).unwrap();
    PanelOrchestrator::new(registry, flags, RecordingSink::new(), config)
}

fn trap(index: u16) -> PanelEvent {
    let event = Classifier::default()
        .classify(&format!("{}.{}", TRAP_BASE, index), Vec::new(), None)
        .unwrap();
    PanelEvent::Alarm(event)
}

fn press(button: ButtonId) -> PanelEvent {
    PanelEvent::Button(ButtonEvent::pressed(button, Instant::now()))
}

/// Handle one non-shutdown event.
async fn feed(p: &mut Panel, event: PanelEvent) {
    assert!(p.handle(event).await.is_continue());
}

fn mode(p: &Panel, id: u8) -> LedMode {
    p.registry().led_state(id).unwrap()
}

fn lit(p: &Panel) -> Vec<u8> {
    PANEL_LEDS.iter().map(|s| s.id).filter(|&id| p.registry().is_lit(id)).collect()
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_restores_alarm_led() {
    run_local(|ex| async move {
        let flags = MemoryFlagStore::new().with(FlagKey::AlarmStatus, true);
        let mut p = panel(ex, flags, fast_config());
        p.start().await;
        assert_eq!(mode(&p, LED_ALARM), LedMode::Blinking);
        assert!(p.alarm_status());
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);
        assert!(p.flags().writes.is_empty(), "restoring must not rewrite flags");
    });
}

#[test]
fn start_restores_mute() {
    run_local(|ex| async move {
        let flags = MemoryFlagStore::new()
            .with(FlagKey::AlarmStatus, true)
            .with(FlagKey::BuzzerMuted, true);
        let mut p = panel(ex, flags, fast_config());
        p.start().await;
        assert!(p.buzzer_muted());
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);
    });
}

#[test]
fn clean_start_is_dark_and_silent() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        assert!(lit(&p).is_empty());
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);
    });
}

// ── Status samples ────────────────────────────────────────────

#[test]
fn healthy_sample_lights_status_leds() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(12.5))).await;

        for id in [LED_SOURCE_A_OK, LED_SOURCE_B_OK, LED_SYNC, LED_SYSTEM_OK, LED_OUTPUT, LED_ACTIVE_SOURCE_A] {
            assert_eq!(mode(&p, id), LedMode::On, "LED{}", id);
        }
        assert_eq!(mode(&p, LED_ACTIVE_SOURCE_B), LedMode::Off);
        assert_eq!(mode(&p, LED_ALARM), LedMode::Off);
        assert_eq!(mode(&p, LED_LOAD_LOWER), LedMode::On);
        assert_eq!(mode(&p, LED_LOAD_VERY_LOWER), LedMode::On);
        assert_eq!(mode(&p, LED_LOAD_MID), LedMode::Off);
        assert_eq!(mode(&p, LED_LOAD_OVERLOAD), LedMode::Off);
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);
    });
}

#[test]
fn timeout_enters_failsafe_display() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(24.0))).await;
        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;

        for id in FAILSAFE_OFF {
            assert_eq!(mode(&p, id), LedMode::Off, "LED{}", id);
        }
        assert_eq!(mode(&p, LED_ALARM), LedMode::Blinking);
        assert_eq!(p.flags().value(FlagKey::AlarmStatus), Some(true));
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);
    });
}

#[test]
fn both_sources_failed_matches_timeout() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(12.5))).await;
        let failed = StatusSample {
            source_a: SourceStatus::Fail,
            source_b: SourceStatus::Fail,
            output_source: OutputSource::Unknown,
            output_load_percent: Some(0.0),
            timed_out: false,
        };
        feed(&mut p, PanelEvent::Status(failed)).await;
        assert_eq!(lit(&p), vec![LED_ALARM]);
    });
}

#[test]
fn one_failed_source_keeps_alarm_state() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        let sample = StatusSample {
            source_b: SourceStatus::Fail,
            output_source: OutputSource::A,
            ..healthy_sample(3.0)
        };
        feed(&mut p, PanelEvent::Status(sample)).await;
        assert_eq!(mode(&p, LED_SOURCE_A_OK), LedMode::On);
        assert_eq!(mode(&p, LED_SOURCE_B_OK), LedMode::Off);
        assert_eq!(mode(&p, LED_SYNC), LedMode::Off);
        assert_eq!(mode(&p, LED_SYSTEM_OK), LedMode::Off);
        assert_eq!(mode(&p, LED_ALARM), LedMode::Off);
    });
}

#[test]
fn output_source_b_drives_pair() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        let sample = StatusSample {
            output_source: OutputSource::B,
            ..healthy_sample(10.0)
        };
        feed(&mut p, PanelEvent::Status(sample)).await;
        assert_eq!(mode(&p, LED_ACTIVE_SOURCE_A), LedMode::Off);
        assert_eq!(mode(&p, LED_ACTIVE_SOURCE_B), LedMode::On);
    });
}

#[test]
fn load_bands_fill_the_bar_graph() {
    let cases: [(f32, &[u8]); 5] = [
        (4.0, &[LED_LOAD_VERY_LOWER]),
        (15.0, &[LED_LOAD_LOWER, LED_LOAD_VERY_LOWER]),
        (24.0, &[LED_LOAD_MID, LED_LOAD_LOWER, LED_LOAD_VERY_LOWER]),
        (30.0, &[LED_LOAD_OVERLOAD, LED_LOAD_MID, LED_LOAD_LOWER, LED_LOAD_VERY_LOWER]),
        (5.5, &[]),
    ];
    run_local(move |ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        for (load, expected) in cases {
            feed(&mut p, PanelEvent::Status(healthy_sample(load))).await;
            for id in [LED_LOAD_OVERLOAD, LED_LOAD_MID, LED_LOAD_LOWER, LED_LOAD_VERY_LOWER] {
                assert_eq!(p.registry().is_lit(id), expected.contains(&id), "load {} LED{}", load, id);
            }
        }
    });
}

#[test]
fn load_in_band_gap_clears_bar_graph() {
    let mut config = fast_config();
    config.load_bands.l2 = ats_panel::config::LoadRange::new(10.0, 20.0);
    config.validate().unwrap();
    run_local(move |ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), config);
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(15.0))).await;
        assert!(p.registry().is_lit(LED_LOAD_LOWER));
        feed(&mut p, PanelEvent::Status(healthy_sample(7.0))).await;
        for id in [LED_LOAD_OVERLOAD, LED_LOAD_MID, LED_LOAD_LOWER, LED_LOAD_VERY_LOWER] {
            assert!(!p.registry().is_lit(id), "LED{} still lit", id);
        }
    });
}

#[test]
fn overload_band_sounds_buzzer() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(35.0))).await;
        assert_eq!(mode(&p, LED_LOAD_OVERLOAD), LedMode::Blinking);
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);
        assert!(!p.alarm_status(), "overload alone does not set the alarm flag");

        feed(&mut p, PanelEvent::Status(healthy_sample(10.0))).await;
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);
    });
}

// ── Buttons ───────────────────────────────────────────────────

#[test]
fn mute_silences_until_alarm_clears() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);

        feed(&mut p, press(ButtonId::Mute)).await;
        assert!(p.buzzer_muted());
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);
        assert_eq!(p.flags().value(FlagKey::BuzzerMuted), Some(true));

        // Still in alarm: stays muted.
        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);

        // Alarm clears: mute resets.
        feed(&mut p, PanelEvent::Status(healthy_sample(12.5))).await;
        assert!(!p.alarm_status());
        assert!(!p.buzzer_muted());
        assert_eq!(p.flags().value(FlagKey::BuzzerMuted), Some(false));

        // Next alarm is audible again.
        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);
    });
}

#[test]
fn mute_toggles_and_ignores_release() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;
        feed(&mut p, press(ButtonId::Mute)).await;
        let release = ButtonEvent {
            button: ButtonId::Mute,
            edge: ButtonEdge::Released,
            at: Instant::now(),
        };
        feed(&mut p, PanelEvent::Button(release)).await;
        assert!(p.buzzer_muted());
        feed(&mut p, press(ButtonId::Mute)).await;
        assert!(!p.buzzer_muted());
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);
    });
}

#[test]
fn reset_runs_lamp_test_and_keeps_alarm() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(12.5))).await;
        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;

        let before_test = Instant::now();
        let green_pin = pins::led(LED_SOURCE_A_OK).unwrap().gpio;
        let writes_before = p.registry().gpio().borrow().writes_to(green_pin);

        feed(&mut p, PanelEvent::Button(ButtonEvent::pressed(ButtonId::Reset, before_test))).await;
        let writes_after = p.registry().gpio().borrow().writes_to(green_pin);
        assert!(writes_after >= writes_before + 2, "green LED blinked during the test");
        assert_eq!(lit(&p), vec![LED_ALARM]);
        assert_eq!(p.registry().active_blink_tasks(), 1);
        assert!(p.alarm_status());

        // A press taken while the test was running is stale.
        feed(&mut p, PanelEvent::Button(ButtonEvent::pressed(ButtonId::Reset, before_test))).await;
        assert_eq!(p.registry().gpio().borrow().writes_to(green_pin), writes_after);
    });
}

// ── Alarms ────────────────────────────────────────────────────

#[test]
fn source_a_trigger_then_resumption_restores_panel() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(12.5))).await;

        // atsSourceAvoltageAbnormal
        feed(&mut p, trap(2)).await;
        for id in [LED_SOURCE_A_OK, LED_ACTIVE_SOURCE_A, LED_SYSTEM_OK, LED_SYNC] {
            assert_eq!(mode(&p, id), LedMode::Off, "LED{}", id);
        }
        assert_eq!(mode(&p, LED_ALARM), LedMode::Blinking);
        assert_eq!(p.active_alarms().collect::<Vec<_>>(), ["atsSourceAvoltageAbnormal"]);
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);

        // atsSourceAvoltageAbnormalToNormal
        feed(&mut p, trap(19)).await;
        for id in [LED_SOURCE_A_OK, LED_ACTIVE_SOURCE_A, LED_SYSTEM_OK, LED_SYNC] {
            assert_eq!(mode(&p, id), LedMode::On, "LED{}", id);
        }
        assert_eq!(mode(&p, LED_ALARM), LedMode::Off);
        assert_eq!(p.active_alarms().count(), 0);
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);
        assert_eq!(p.sink().names(), ["atsSourceAvoltageAbnormal", "atsSourceAvoltageAbnormalToNormal"]);
    });
}

#[test]
fn repeated_trigger_keeps_first_snapshot() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(12.5))).await;
        feed(&mut p, trap(2)).await;
        feed(&mut p, trap(2)).await;
        assert_eq!(p.active_alarms().count(), 1);
        feed(&mut p, trap(19)).await;
        assert_eq!(mode(&p, LED_SYNC), LedMode::On);
    });
}

#[test]
fn overload_trigger_and_resumption() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        // atsOutputOverLoad
        feed(&mut p, trap(6)).await;
        assert_eq!(mode(&p, LED_LOAD_OVERLOAD), LedMode::Blinking);
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);
        // atsOutputOverLoadToNormal
        feed(&mut p, trap(23)).await;
        assert_eq!(mode(&p, LED_LOAD_OVERLOAD), LedMode::Off);
        assert_eq!(mode(&p, LED_LOAD_MID), LedMode::On);
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);
    });
}

#[test]
fn state_event_switches_active_source() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(healthy_sample(12.5))).await;
        // atsLoadOnSourceB
        feed(&mut p, trap(63)).await;
        assert_eq!(mode(&p, LED_ACTIVE_SOURCE_A), LedMode::Off);
        assert_eq!(mode(&p, LED_ACTIVE_SOURCE_B), LedMode::On);
        // atsLoadOnSourceA
        feed(&mut p, trap(62)).await;
        assert_eq!(mode(&p, LED_ACTIVE_SOURCE_A), LedMode::On);
        assert_eq!(mode(&p, LED_ACTIVE_SOURCE_B), LedMode::Off);
    });
}

#[test]
fn unclassified_notification_is_ignored() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        let event = Classifier::default()
            .classify("1.3.6.1.4.1.9999.1.2", vec![VarBind::new("1.3.6.1.2.1.1.3.0", "42")], None)
            .unwrap();
        feed(&mut p, PanelEvent::Alarm(event)).await;
        assert!(p.sink().events.is_empty());
        assert!(lit(&p).is_empty());
    });
}

#[test]
fn notification_names_configured_device() {
    let mut config = fast_config();
    config.ups.devices.push(ats_panel::config::UpsDevice {
        address: "192.168.111.173".parse().unwrap(),
        name: "ATS-Hall-B".into(),
        location: "Hall B".into(),
    });
    run_local(move |ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), config);
        p.start().await;
        let event = Classifier::default()
            .classify(&format!("{}.1", TRAP_BASE), Vec::new(), Some("192.168.111.173".parse().unwrap()))
            .unwrap();
        feed(&mut p, PanelEvent::Alarm(event)).await;
        assert_eq!(p.sink().events, [("atsAtsAlarm", "ATS-Hall-B".to_owned())]);
    });
}

// ── Degraded I/O ──────────────────────────────────────────────

#[test]
fn dead_blink_and_beep_loops_are_restarted() {
    run_local(|ex| async move {
        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;
        assert_eq!(mode(&p, LED_ALARM), LedMode::Blinking);

        let alarm_pin = pins::led(LED_ALARM).unwrap().gpio;
        {
            let gpio = p.registry().gpio();
            let mut g = gpio.borrow_mut();
            g.fail_next_writes(alarm_pin, 2);
            g.fail_next_writes(BUZZER_GPIO, 2);
        }
        Timer::after(Duration::from_millis(40)).await;
        assert_eq!(mode(&p, LED_ALARM), LedMode::Off, "blink loop died");
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off, "beep loop died");

        // Active-source state event: touches neither LED 10 nor the buzzer.
        feed(&mut p, trap(63)).await;
        assert_eq!(mode(&p, LED_ALARM), LedMode::Blinking);
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);
        assert_eq!(p.registry().active_blink_tasks(), 1);
        assert_eq!(p.registry().active_tone_tasks(), 1);
        assert!(p.alarm_status());
        assert_eq!(p.flags().writes, [(FlagKey::AlarmStatus, true)], "no spurious clear edge");
    });
}

#[test]
fn failed_flag_write_keeps_memory_authoritative() {
    run_local(|ex| async move {
        let flags = MemoryFlagStore::new().failing_writes(1);
        let mut p = panel(ex, flags, fast_config());
        p.start().await;

        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;
        assert!(p.alarm_status());
        assert_eq!(p.flags().value(FlagKey::AlarmStatus), None, "write failed");
        assert!(p.flags().writes.is_empty());
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::BeepPattern);

        feed(&mut p, PanelEvent::Status(healthy_sample(12.5))).await;
        assert!(!p.alarm_status());
        feed(&mut p, PanelEvent::Status(StatusSample::timed_out())).await;
        assert_eq!(
            p.flags().writes,
            [
                (FlagKey::AlarmStatus, false),
                (FlagKey::BuzzerMuted, false),
                (FlagKey::AlarmStatus, true),
            ]
        );
        assert_eq!(p.flags().value(FlagKey::AlarmStatus), Some(true));
    });
}

// ── Queue consumer ────────────────────────────────────────────

#[test]
fn run_consumes_until_shutdown_and_parks() {
    run_local(|ex| async move {
        let queue = PanelQueue::new();
        queue.try_send(PanelEvent::Status(StatusSample::timed_out())).unwrap();
        queue.try_send(press(ButtonId::Mute)).unwrap();
        queue.try_send(PanelEvent::Shutdown).unwrap();
        queue.try_send(PanelEvent::Status(healthy_sample(12.5))).unwrap();

        let mut p = panel(ex, MemoryFlagStore::new(), fast_config());
        p.start().await;
        p.run(&queue).await;

        assert!(p.buzzer_muted());
        assert!(lit(&p).is_empty());
        assert_eq!(p.registry().buzzer_mode(), BuzzerMode::Off);
        assert_eq!(p.registry().active_blink_tasks(), 0);
        assert_eq!(p.registry().active_tone_tasks(), 0);
        assert!(queue.try_receive().is_ok(), "events after shutdown stay queued");
    });
}
