//! Mock adapters for integration tests.
//!
//! Records every pin call so tests can assert on the full command history
//! without real GPIO, and lets tests inject write failures per pin.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use ats_panel::alarms::AlarmEvent;
use ats_panel::app::events::{OutputSource, SourceStatus, StatusSample};
use ats_panel::app::ports::{
    FlagError, FlagKey, FlagStore, GpioError, GpioPort, NotificationSink, QueryError, StatusQueryPort,
};
use ats_panel::config::{PanelConfig, UpsIdentity};
use ats_panel::drivers::actuators::PanelExecutor;
use ats_panel::poller::{DeviceFamily, StatusReport};
use async_io_mini::Timer;
use embedded_hal::digital::ErrorKind;

// ── Test harness ──────────────────────────────────────────────

/// Defaults with every period shortened so task-driven tests finish fast.
pub fn fast_config() -> PanelConfig {
    PanelConfig {
        blink_interval_ms: 10,
        beep_duration_ms: 5,
        beep_pause_ms: 5,
        self_test_ms: 40,
        poll_timeout_ms: 50,
        button_sample_ms: 1,
        debounce_ms: 0,
        ..PanelConfig::default()
    }
}

/// Drive `body` to completion on a fresh panel executor.
pub fn run_local<Fut>(body: impl FnOnce(Rc<PanelExecutor<'static>>) -> Fut)
where
    Fut: Future<Output = ()> + 'static,
{
    let executor = Rc::new(PanelExecutor::new());
    let fut = body(executor.clone());
    futures_lite::future::block_on(executor.run(fut));
}

pub fn healthy_sample(load: f32) -> StatusSample {
    StatusSample {
        source_a: SourceStatus::Ok,
        source_b: SourceStatus::Ok,
        output_source: OutputSource::A,
        output_load_percent: Some(load),
        timed_out: false,
    }
}

// ── MockGpio ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PinCall {
    SetupOutput { pin: u8, high: bool },
    SetupInput { pin: u8, pull_up: bool },
    Level { pin: u8, high: bool },
    StartPwm { pin: u8, frequency_hz: u32, duty: u8 },
    StopPwm { pin: u8 },
}

#[derive(Debug, Default)]
pub struct MockGpio {
    pub calls: Vec<PinCall>,
    levels: HashMap<u8, bool>,
    pwm: HashMap<u8, bool>,
    inputs: HashMap<u8, bool>,
    fail_writes: HashMap<u8, usize>,
    pub failures: usize,
}

#[allow(dead_code)]
impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` level/PWM writes to `pin` fail.
    pub fn fail_next_writes(&mut self, pin: u8, n: usize) {
        self.fail_writes.insert(pin, n);
    }

    pub fn level(&self, pin: u8) -> Option<bool> {
        self.levels.get(&pin).copied()
    }

    pub fn pwm_active(&self, pin: u8) -> bool {
        self.pwm.get(&pin).copied().unwrap_or(false)
    }

    pub fn set_input(&mut self, pin: u8, high: bool) {
        self.inputs.insert(pin, high);
    }

    /// Successful level writes to `pin`.
    pub fn writes_to(&self, pin: u8) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PinCall::Level { pin: p, .. } if *p == pin))
            .count()
    }

    pub fn setups_of(&self, pin: u8) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PinCall::SetupOutput { pin: p, .. } if *p == pin))
            .count()
    }

    pub fn pwm_starts(&self, pin: u8) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PinCall::StartPwm { pin: p, .. } if *p == pin))
            .count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn inject(&mut self, pin: u8) -> Result<(), GpioError> {
        match self.fail_writes.get_mut(&pin) {
            Some(n) if *n > 0 => {
                *n -= 1;
                self.failures += 1;
                Err(GpioError::Digital {
                    pin,
                    kind: ErrorKind::Other,
                })
            }
            _ => Ok(()),
        }
    }
}

impl GpioPort for MockGpio {
    fn setup_output(&mut self, pin: u8, initial_high: bool) -> Result<(), GpioError> {
        self.calls.push(PinCall::SetupOutput {
            pin,
            high: initial_high,
        });
        self.levels.insert(pin, initial_high);
        Ok(())
    }

    fn setup_input(&mut self, pin: u8, pull_up: bool) -> Result<(), GpioError> {
        self.calls.push(PinCall::SetupInput { pin, pull_up });
        self.inputs.entry(pin).or_insert(pull_up);
        Ok(())
    }

    fn set_pin_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        self.inject(pin)?;
        self.calls.push(PinCall::Level { pin, high });
        self.levels.insert(pin, high);
        Ok(())
    }

    fn start_pwm(&mut self, pin: u8, frequency_hz: u32, duty_percent: u8) -> Result<(), GpioError> {
        self.inject(pin)?;
        self.calls.push(PinCall::StartPwm {
            pin,
            frequency_hz,
            duty: duty_percent,
        });
        self.pwm.insert(pin, true);
        Ok(())
    }

    fn stop_pwm(&mut self, pin: u8) -> Result<(), GpioError> {
        self.calls.push(PinCall::StopPwm { pin });
        self.pwm.insert(pin, false);
        Ok(())
    }

    fn read_pin(&mut self, pin: u8) -> Result<bool, GpioError> {
        self.inputs.get(&pin).copied().ok_or(GpioError::UnknownPin(pin))
    }
}

// ── ScriptedStatus ────────────────────────────────────────────

/// Status client that answers as one device family, replaying scripted
/// replies and then a healthy default.
pub struct ScriptedStatus {
    family: DeviceFamily,
    replies: VecDeque<Result<StatusReport, QueryError>>,
    latency: Duration,
    pub asked: Vec<DeviceFamily>,
}

#[allow(dead_code)]
impl ScriptedStatus {
    pub fn new(family: DeviceFamily) -> Self {
        Self {
            family,
            replies: VecDeque::new(),
            latency: Duration::ZERO,
            asked: Vec::new(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn then(mut self, reply: Result<StatusReport, QueryError>) -> Self {
        self.replies.push_back(reply);
        self
    }

    pub fn healthy_report() -> StatusReport {
        StatusReport {
            source_a: SourceStatus::Ok,
            source_b: SourceStatus::Ok,
            output_source: OutputSource::B,
            load_raw: Some(235.0),
            load_formatted: Some("23.5%".into()),
        }
    }
}

impl StatusQueryPort for ScriptedStatus {
    async fn query_status(&mut self, family: DeviceFamily) -> Result<StatusReport, QueryError> {
        self.asked.push(family);
        if family != self.family {
            return Err(QueryError::Unsupported);
        }
        if !self.latency.is_zero() {
            Timer::after(self.latency).await;
        }
        self.replies.pop_front().unwrap_or_else(|| Ok(Self::healthy_report()))
    }
}

// ── MemoryFlagStore ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    values: HashMap<FlagKey, bool>,
    fail_writes: usize,
    pub writes: Vec<(FlagKey, bool)>,
}

#[allow(dead_code)]
impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: FlagKey, value: bool) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Make the next `n` changing writes fail with an I/O error.
    pub fn failing_writes(mut self, n: usize) -> Self {
        self.fail_writes = n;
        self
    }

    pub fn value(&self, key: FlagKey) -> Option<bool> {
        self.values.get(&key).copied()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: FlagKey) -> Result<Option<bool>, FlagError> {
        Ok(self.values.get(&key).copied())
    }

    fn set_on_change(&mut self, key: FlagKey, value: bool) -> Result<bool, FlagError> {
        if self.values.get(&key) == Some(&value) {
            return Ok(false);
        }
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(FlagError::Io(std::io::Error::other("injected write failure")));
        }
        self.values.insert(key, value);
        self.writes.push((key, value));
        Ok(true)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    /// `(alarm name, device name)` per notification.
    pub events: Vec<(&'static str, String)>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(|(name, _)| *name).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, event: &AlarmEvent, ups: &UpsIdentity) {
        self.events.push((event.name(), ups.name.clone()));
    }
}
