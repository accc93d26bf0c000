//! Panel orchestrator: the hexagonal core.
//!
//! [`PanelOrchestrator`] is the single consumer of the panel event queue
//! and the only caller of the [`ActuatorRegistry`].  It keeps two global
//! flags (`alarm_status`, `buzzer_muted`) and evaluates a fixed rule set on
//! every event:
//!
//! | # | Rule                 | Effect                                                 |
//! |---|----------------------|--------------------------------------------------------|
//! | 1 | Timeout / both fail  | Status LEDs off, LED 10 on                             |
//! | 2 | Trigger              | Mapped LEDs (unmapped critical -> LED 10)              |
//! | 3 | Resumption           | Clear mapped LEDs, restore what the trigger changed    |
//! | 4 | State                | Exclusive LED pair 6 / 7                               |
//! | 5 | Status sample        | Source, output, sync and load LEDs                     |
//! | 6 | Buzzer               | Beep iff LED 10 or LED 11 lit and not muted            |
//! | 7 | Buttons              | Mute toggle, reset lamp test                           |
//!
//! ```text
//!  PanelQueue ──▶ ┌────────────────────────┐ ──▶ NotificationSink
//!                 │   PanelOrchestrator    │
//!   FlagStore ◀──▶│  rules · flags · test  │──▶ ActuatorRegistry
//!                 └────────────────────────┘
//! ```

use core::ops::ControlFlow;
use std::time::Instant;

use async_io_mini::Timer;
use log::{error, info, warn};

use crate::alarms::led_map::{self, GENERIC_CLEAR, LedAction};
use crate::alarms::{AlarmDefinition, AlarmEvent, Classification, EventType, Severity};
use crate::config::{LOAD_LEDS, PanelConfig};
use crate::drivers::actuators::{ActuatorRegistry, BuzzerMode, LedMode};
use crate::events::PanelQueue;
use crate::pins::{
    LED_ACTIVE_SOURCE_A, LED_ACTIVE_SOURCE_B, LED_ALARM, LED_LOAD_LOWER, LED_LOAD_MID, LED_LOAD_OVERLOAD,
    LED_LOAD_VERY_LOWER, LED_OUTPUT, LED_SOURCE_A_OK, LED_SOURCE_B_OK, LED_SYNC, LED_SYSTEM_OK,
};

use super::events::{ButtonEdge, ButtonEvent, ButtonId, OutputSource, PanelEvent, StatusSample};
use super::ports::{FlagKey, FlagStore, GpioPort, NotificationSink};

/// LEDs switched off when the device is unreachable or both sources failed.
pub const FAILSAFE_OFF: [u8; 11] = [
    LED_SOURCE_A_OK,
    LED_SYNC,
    LED_SOURCE_B_OK,
    LED_ACTIVE_SOURCE_A,
    LED_ACTIVE_SOURCE_B,
    LED_SYSTEM_OK,
    LED_OUTPUT,
    LED_LOAD_OVERLOAD,
    LED_LOAD_MID,
    LED_LOAD_LOWER,
    LED_LOAD_VERY_LOWER,
];

/// A raised trigger and the LED modes it overwrote.
#[derive(Debug, Clone)]
struct ActiveAlarm {
    name: &'static str,
    action: LedAction,
    snapshot: Vec<(u8, LedMode)>,
}

// ───────────────────────────────────────────────────────────────
// PanelOrchestrator
// ───────────────────────────────────────────────────────────────

pub struct PanelOrchestrator<'a, G: GpioPort + 'a, F, N> {
    registry: ActuatorRegistry<'a, G>,
    flags: F,
    sink: N,
    config: PanelConfig,
    alarm_status: bool,
    buzzer_muted: bool,
    active: Vec<ActiveAlarm>,
    self_test_until: Option<Instant>,
}

impl<'a, G, F, N> PanelOrchestrator<'a, G, F, N>
where
    G: GpioPort + 'a,
    F: FlagStore,
    N: NotificationSink,
{
    /// Does **not** touch the panel; call [`start`](Self::start) next.
    pub fn new(registry: ActuatorRegistry<'a, G>, flags: F, sink: N, config: PanelConfig) -> Self {
        Self {
            registry,
            flags,
            sink,
            config,
            alarm_status: false,
            buzzer_muted: false,
            active: Vec::new(),
            self_test_until: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore LED 10 and the mute flag from the flag store.
    pub async fn start(&mut self) {
        self.alarm_status = self.read_flag(FlagKey::AlarmStatus);
        self.buzzer_muted = self.read_flag(FlagKey::BuzzerMuted);
        info!(
            "PANEL | started (alarm_status={}, buzzer_muted={})",
            self.alarm_status, self.buzzer_muted
        );
        if self.alarm_status {
            self.led(LED_ALARM, LedMode::On).await;
        }
        self.settle().await;
    }

    /// Consume `queue` until [`PanelEvent::Shutdown`], then park every actuator.
    pub async fn run(&mut self, queue: &PanelQueue) {
        loop {
            let event = queue.receive().await;
            if self.handle(event).await.is_break() {
                break;
            }
        }
        info!("PANEL | shutting down");
        if let Err(e) = self.registry.shutdown().await {
            error!("PANEL | shutdown left an actuator active: {}", e);
        }
    }

    /// Apply one event and every rule it triggers.
    pub async fn handle(&mut self, event: PanelEvent) -> ControlFlow<()> {
        match event {
            PanelEvent::Alarm(ev) => self.on_alarm(&ev).await,
            PanelEvent::Status(sample) => self.on_status(&sample).await,
            PanelEvent::Button(ev) => self.on_button(ev).await,
            PanelEvent::Shutdown => return ControlFlow::Break(()),
        }
        self.settle().await;
        ControlFlow::Continue(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn registry(&self) -> &ActuatorRegistry<'a, G> {
        &self.registry
    }

    pub fn flags(&self) -> &F {
        &self.flags
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn alarm_status(&self) -> bool {
        self.alarm_status
    }

    pub fn buzzer_muted(&self) -> bool {
        self.buzzer_muted
    }

    /// Names of triggers raised and not yet resumed.
    pub fn active_alarms(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.active.iter().map(|a| a.name)
    }

    // ── Rules 2-4: alarms ─────────────────────────────────────

    async fn on_alarm(&mut self, ev: &AlarmEvent) {
        if ev.classification == Classification::Unclassified {
            info!("PANEL | ignoring unclassified notification {}", ev.oid);
            return;
        }
        let ups = self.config.ups.identity(ev.source);
        self.sink.notify(ev, &ups);

        match ev.classification {
            Classification::Known(def) => match def.event_type {
                EventType::Trigger => self.on_trigger(def).await,
                EventType::Resumption => self.on_resumption(def).await,
                EventType::State => self.on_state(def).await,
            },
            Classification::BatteryRelated => {
                warn!("PANEL | battery-related warning {} (no LED mapping)", ev.oid);
            }
            Classification::Unclassified => {}
        }
    }

    async fn on_trigger(&mut self, def: &'static AlarmDefinition) {
        let action = match led_map::trigger_action(def.name) {
            Some(action) => action,
            None if def.severity == Severity::Critical => LedAction {
                disable: &[],
                enable: &[LED_ALARM],
            },
            None => {
                info!("PANEL | {} has no LED mapping", def.name);
                return;
            }
        };
        info!("PANEL | trigger {} ({:?})", def.name, def.severity);

        if !self.active.iter().any(|a| a.name == def.name) {
            let snapshot = action
                .touched()
                .map(|id| (id, self.registry.led_state(id).unwrap_or_default()))
                .collect();
            self.active.push(ActiveAlarm {
                name: def.name,
                action,
                snapshot,
            });
        }
        self.apply_action(action.disable, action.enable).await;
    }

    async fn on_resumption(&mut self, def: &'static AlarmDefinition) {
        info!("PANEL | resumption {}", def.name);
        if let Some(action) = led_map::resumption_action(def.name) {
            self.apply_action(action.disable, action.enable).await;
        } else if !def.resumes.is_empty() {
            let derived: Vec<u8> = def
                .resumes
                .iter()
                .filter_map(|name| led_map::trigger_action(name))
                .flat_map(|a| a.enable.iter().copied())
                .collect();
            self.apply_action(&derived, &[]).await;
        } else {
            self.apply_action(GENERIC_CLEAR.disable, GENERIC_CLEAR.enable).await;
        }

        for name in def.resumes {
            let Some(pos) = self.active.iter().position(|a| a.name == *name) else {
                continue;
            };
            let cleared = self.active.remove(pos);
            for (id, mode) in cleared.snapshot {
                let claimed = self.active.iter().any(|a| a.action.touched().any(|t| t == id));
                if !claimed {
                    self.led(id, mode).await;
                }
            }
        }
    }

    async fn on_state(&mut self, def: &'static AlarmDefinition) {
        match led_map::state_pair(def.name) {
            Some((on, off)) => {
                info!("PANEL | state {}", def.name);
                self.led(off, LedMode::Off).await;
                self.led(on, LedMode::On).await;
            }
            None => info!("PANEL | state {} (informational)", def.name),
        }
    }

    async fn apply_action(&mut self, disable: &[u8], enable: &[u8]) {
        for &id in disable {
            self.led(id, LedMode::Off).await;
        }
        for &id in enable {
            self.led(id, LedMode::On).await;
        }
    }

    // ── Rules 1 and 5: status samples ─────────────────────────

    async fn on_status(&mut self, sample: &StatusSample) {
        if sample.timed_out || sample.total_failure() {
            if sample.timed_out {
                warn!("PANEL | device unreachable, entering fail-safe display");
            } else {
                warn!("PANEL | both sources failed");
            }
            self.apply_action(&FAILSAFE_OFF, &[LED_ALARM]).await;
            return;
        }

        let a_ok = sample.source_a.is_ok();
        let b_ok = sample.source_b.is_ok();
        self.set_lit(LED_SOURCE_A_OK, a_ok).await;
        self.set_lit(LED_SOURCE_B_OK, b_ok).await;
        self.set_lit(LED_OUTPUT, sample.output_source != OutputSource::Unknown).await;
        self.set_lit(LED_SYNC, a_ok && b_ok).await;
        self.set_lit(LED_SYSTEM_OK, a_ok && b_ok).await;
        if a_ok && b_ok {
            self.led(LED_ALARM, LedMode::Off).await;
        }

        match sample.output_source {
            OutputSource::A => {
                self.led(LED_ACTIVE_SOURCE_B, LedMode::Off).await;
                self.led(LED_ACTIVE_SOURCE_A, LedMode::On).await;
            }
            OutputSource::B => {
                self.led(LED_ACTIVE_SOURCE_A, LedMode::Off).await;
                self.led(LED_ACTIVE_SOURCE_B, LedMode::On).await;
            }
            OutputSource::Unknown => {
                self.led(LED_ACTIVE_SOURCE_A, LedMode::Off).await;
                self.led(LED_ACTIVE_SOURCE_B, LedMode::Off).await;
            }
        }

        let band = sample.output_load_percent.and_then(|load| self.config.load_bands.select(load));
        let lit: &[u8] = match band {
            Some(b) => b.leds_on(),
            None => &[],
        };
        for id in LOAD_LEDS {
            self.set_lit(id, lit.contains(&id)).await;
        }
    }

    // ── Rule 7: buttons ───────────────────────────────────────

    async fn on_button(&mut self, ev: ButtonEvent) {
        if ev.edge != ButtonEdge::Pressed {
            return;
        }
        match ev.button {
            ButtonId::Mute => {
                self.buzzer_muted = !self.buzzer_muted;
                info!("PANEL | buzzer {}", if self.buzzer_muted { "muted" } else { "unmuted" });
                self.persist(FlagKey::BuzzerMuted, self.buzzer_muted);
            }
            ButtonId::Reset => {
                if self.self_test_until.is_some_and(|until| ev.at < until) {
                    info!("PANEL | reset ignored, lamp test in progress");
                    return;
                }
                self.self_test().await;
            }
        }
    }

    /// Blink every LED for the configured duration, then clear the panel
    /// leaving LED 10 as it was.
    async fn self_test(&mut self) {
        let duration = self.config.self_test_duration();
        let alarm_was_lit = self.registry.is_lit(LED_ALARM);
        info!("PANEL | lamp test for {:?}", duration);

        self.self_test_until = Some(Instant::now() + duration);
        if let Err(e) = self.registry.blink_all().await {
            error!("PANEL | lamp test: {}", e);
        }
        Timer::after(duration).await;
        self.self_test_until = Some(Instant::now());

        if let Err(e) = self.registry.all_off().await {
            error!("PANEL | lamp test cleanup: {}", e);
        }
        if alarm_was_lit {
            self.led(LED_ALARM, LedMode::On).await;
        }
        info!("PANEL | lamp test done");
    }

    // ── Rule 6 and flag edges ─────────────────────────────────

    /// Restart loops that died on an I/O error, persist LED 10 edges, then
    /// derive the buzzer.
    async fn settle(&mut self) {
        for id in self.registry.reap_stopped() {
            warn!("PANEL | LED{} lost its blink loop, requesting it again", id);
            self.led(id, LedMode::On).await;
        }

        let alarm_lit = self.registry.is_lit(LED_ALARM);
        if alarm_lit != self.alarm_status {
            self.alarm_status = alarm_lit;
            self.persist(FlagKey::AlarmStatus, alarm_lit);
            if !alarm_lit {
                self.buzzer_muted = false;
                self.persist(FlagKey::BuzzerMuted, false);
            }
        }

        let sounding = (alarm_lit || self.registry.is_lit(LED_LOAD_OVERLOAD)) && !self.buzzer_muted;
        let mode = if sounding {
            BuzzerMode::BeepPattern
        } else {
            BuzzerMode::Off
        };
        if let Err(e) = self.registry.set_buzzer(mode).await {
            error!("PANEL | buzzer -> {:?} failed: {}", mode, e);
        }
    }

    // ── Helpers ───────────────────────────────────────────────

    async fn led(&mut self, id: u8, mode: LedMode) {
        if let Err(e) = self.registry.set_led(id, mode).await {
            error!("PANEL | LED{} -> {:?} failed: {}", id, mode, e);
        }
    }

    async fn set_lit(&mut self, id: u8, lit: bool) {
        self.led(id, if lit { LedMode::On } else { LedMode::Off }).await;
    }

    fn read_flag(&self, key: FlagKey) -> bool {
        match self.flags.get(key) {
            Ok(value) => value.unwrap_or(false),
            Err(e) => {
                warn!("PANEL | reading {} failed: {}", key.as_str(), e);
                false
            }
        }
    }

    fn persist(&mut self, key: FlagKey, value: bool) {
        match self.flags.set_on_change(key, value) {
            Ok(true) => info!("PANEL | persisted {}={}", key.as_str(), value),
            Ok(false) => {}
            Err(e) => warn!("PANEL | persisting {}={} failed: {}", key.as_str(), value, e),
        }
    }
}
