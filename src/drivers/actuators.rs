//! Actuator registry: the sole owner of LED and buzzer state.
//!
//! Every LED and the buzzer have exactly one slot.  A slot holds the
//! current mode and, when the mode needs a timed waveform, the handle of
//! the task generating it.  Changing a slot's mode always cancels and
//! awaits the previous task before the new one starts, so at most one task
//! ever drives a given pin.
//!
//! ```text
//!  PanelOrchestrator ──▶ ActuatorRegistry ──▶ GpioPort
//!                            │    ▲
//!                  spawn ────┘    └──── stop + await
//!                            ▼
//!               blink loops / buzzer loop (LocalExecutor)
//! ```
//!
//! ## Modes
//!
//! | Request           | Red LED    | Green LED |
//! |-------------------|------------|-----------|
//! | `On` / `Blinking` | `Blinking` | `On`      |
//! | `Off`             | `Off`      | `Off`     |
//!
//! The lamp test ([`ActuatorRegistry::blink_all`]) is the one place a green
//! LED blinks.
//!
//! ## Failure handling
//!
//! A failed pin write re-runs the pin setup and retries once.  A second
//! failure is logged and reported.  Loops that hit an I/O error stop and
//! leave their pin at the safe idle level (LED off, buzzer HIGH).  A slot
//! whose loop has ended on its own reads as `Off`, so the next request for
//! a lit mode starts a fresh loop instead of being swallowed as a no-op.

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::Rc;

use async_io_mini::Timer;
use edge_executor::{LocalExecutor, Task};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, error, info, warn};

use crate::app::ports::{GpioError, GpioPort};
use crate::config::PanelConfig;
use crate::error::ActuatorError;
use crate::pins::{self, BUZZER_GPIO, LED_COUNT, LedSpec, PANEL_LEDS};

/// Single-threaded executor that runs the orchestrator and every actuator task.
pub type PanelExecutor<'a> = LocalExecutor<'a, 64>;

/// Volume used when the configured one is out of range.
pub const FALLBACK_VOLUME: u8 = 50;

/// Buzzer pin level while silent.
const BUZZER_IDLE_HIGH: bool = true;

// ───────────────────────────────────────────────────────────────
// Modes and parameters
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LedMode {
    #[default]
    Off,
    On,
    Blinking,
}

impl LedMode {
    pub const fn is_lit(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Mode actually applied to `spec` for this request.
    pub fn effective_for(self, spec: &LedSpec) -> Self {
        match self {
            Self::Off => Self::Off,
            Self::On | Self::Blinking if spec.is_red() => Self::Blinking,
            Self::On | Self::Blinking => Self::On,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuzzerMode {
    #[default]
    Off,
    ContinuousTone,
    BeepPattern,
}

/// Tone and cadence of the buzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerParams {
    pub frequency_hz: u32,
    /// PWM duty cycle, 0-100.
    pub volume: u8,
    pub beep_duration: Duration,
    pub beep_pause: Duration,
}

impl BuzzerParams {
    pub fn from_config(cfg: &PanelConfig) -> Self {
        let volume = if cfg.buzzer_volume > 100 {
            warn!(
                "BUZZER | volume {} out of range, using {}",
                cfg.buzzer_volume, FALLBACK_VOLUME
            );
            FALLBACK_VOLUME
        } else {
            cfg.buzzer_volume
        };
        Self {
            frequency_hz: cfg.buzzer_frequency_hz,
            volume,
            beep_duration: Duration::from_millis(cfg.beep_duration_ms),
            beep_pause: Duration::from_millis(cfg.beep_pause_ms),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Task plumbing
// ───────────────────────────────────────────────────────────────

type StopSignal = Signal<NoopRawMutex, ()>;

/// Stop request plus the task it controls.
struct TaskHandle {
    stop: Rc<StopSignal>,
    task: Task<()>,
}

impl TaskHandle {
    /// The loop ended by itself, which only happens after an I/O error.
    fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the loop to stop and wait until it has parked its pin.
    async fn cancel(self) {
        self.stop.signal(());
        self.task.await;
    }
}

/// Counts live tasks of one kind; decremented when the task future drops.
struct Alive(Rc<Cell<usize>>);

impl Alive {
    fn new(counter: &Rc<Cell<usize>>) -> Self {
        counter.set(counter.get() + 1);
        Self(counter.clone())
    }
}

impl Drop for Alive {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Run `op`; on failure re-run the pin setup and try once more.
fn with_retry<G: GpioPort>(
    gpio: &RefCell<G>,
    pin: u8,
    setup_level: bool,
    op: impl Fn(&mut G) -> Result<(), GpioError>,
) -> Result<(), GpioError> {
    let mut g = gpio.borrow_mut();
    if let Err(first) = op(&mut *g) {
        warn!("GPIO{} | {}; re-running setup and retrying", pin, first);
        let retried = g.setup_output(pin, setup_level).and_then(|()| op(&mut *g));
        if let Err(e) = retried {
            error!("GPIO{} | retry failed: {}", pin, e);
            return Err(e);
        }
    }
    Ok(())
}

fn write_level<G: GpioPort>(gpio: &RefCell<G>, pin: u8, high: bool) -> Result<(), GpioError> {
    debug!("GPIO{} <- {}", pin, if high { "HIGH" } else { "LOW" });
    with_retry(gpio, pin, high, |g| g.set_pin_level(pin, high))
}

/// `true` when `stop` fired before `period` elapsed.
async fn stop_requested(stop: &StopSignal, period: Duration) -> bool {
    future::or(
        async {
            stop.wait().await;
            true
        },
        async {
            Timer::after(period).await;
            false
        },
    )
    .await
}

async fn blink_loop<G: GpioPort>(
    gpio: Rc<RefCell<G>>,
    pin: u8,
    active_high: bool,
    interval: Duration,
    stop: Rc<StopSignal>,
    _alive: Alive,
) {
    let mut lit = true;
    loop {
        if let Err(e) = write_level(&gpio, pin, lit == active_high) {
            error!("LED | blink on GPIO{} aborted: {}", pin, e);
            break;
        }
        if stop_requested(&stop, interval).await {
            break;
        }
        lit = !lit;
    }
    if write_level(&gpio, pin, !active_high).is_err() {
        error!("LED | GPIO{} could not be parked off", pin);
    }
}

fn silence<G: GpioPort>(gpio: &RefCell<G>, pin: u8) {
    if let Err(e) = gpio.borrow_mut().stop_pwm(pin) {
        warn!("BUZZER | stop_pwm on GPIO{} failed: {}", pin, e);
    }
    if write_level(gpio, pin, BUZZER_IDLE_HIGH).is_err() {
        error!("BUZZER | GPIO{} could not be parked idle", pin);
    }
}

fn start_tone<G: GpioPort>(gpio: &RefCell<G>, pin: u8, params: &BuzzerParams) -> Result<(), GpioError> {
    with_retry(gpio, pin, BUZZER_IDLE_HIGH, |g| {
        g.start_pwm(pin, params.frequency_hz, params.volume)
    })
}

async fn beep_loop<G: GpioPort>(
    gpio: Rc<RefCell<G>>,
    pin: u8,
    params: BuzzerParams,
    stop: Rc<StopSignal>,
    _alive: Alive,
) {
    loop {
        if let Err(e) = start_tone(&gpio, pin, &params) {
            error!("BUZZER | beep pattern aborted: {}", e);
            break;
        }
        if stop_requested(&stop, params.beep_duration).await {
            break;
        }
        if let Err(e) = gpio.borrow_mut().stop_pwm(pin) {
            error!("BUZZER | beep pattern aborted: {}", e);
            break;
        }
        if stop_requested(&stop, params.beep_pause).await {
            break;
        }
    }
    silence(&gpio, pin);
}

async fn tone_loop<G: GpioPort>(
    gpio: Rc<RefCell<G>>,
    pin: u8,
    params: BuzzerParams,
    stop: Rc<StopSignal>,
    _alive: Alive,
) {
    match start_tone(&gpio, pin, &params) {
        Ok(()) => stop.wait().await,
        Err(e) => error!("BUZZER | continuous tone aborted: {}", e),
    }
    silence(&gpio, pin);
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

struct LedSlot {
    spec: &'static LedSpec,
    mode: LedMode,
    task: Option<TaskHandle>,
}

impl LedSlot {
    fn has_stopped(&self) -> bool {
        self.task.as_ref().is_some_and(TaskHandle::is_stopped)
    }

    /// Mode the pin is really in.
    fn mode(&self) -> LedMode {
        if self.has_stopped() {
            LedMode::Off
        } else {
            self.mode
        }
    }

    /// Drop a loop that ended on its own; `true` if there was one.
    fn reap(&mut self) -> bool {
        if !self.has_stopped() {
            return false;
        }
        warn!("LED{} | blink loop stopped after an I/O error", self.spec.id);
        self.task = None;
        self.mode = LedMode::Off;
        true
    }
}

/// Owns every actuator and the tasks that drive them.
///
/// The registry shares ownership of the executor that runs its tasks, so
/// it can live inside the future that executor drives.
pub struct ActuatorRegistry<'a, G: GpioPort + 'a> {
    executor: Rc<PanelExecutor<'a>>,
    gpio: Rc<RefCell<G>>,
    leds: [LedSlot; LED_COUNT],
    buzzer_mode: BuzzerMode,
    buzzer_task: Option<TaskHandle>,
    buzzer: BuzzerParams,
    blink_interval: Duration,
    active_high: bool,
    blink_tasks: Rc<Cell<usize>>,
    tone_tasks: Rc<Cell<usize>>,
}

impl<'a, G: GpioPort + 'a> ActuatorRegistry<'a, G> {
    /// Configure every LED pin (off) and the buzzer pin (idle HIGH).
    pub fn new(executor: Rc<PanelExecutor<'a>>, gpio: G, config: &PanelConfig) -> Result<Self, ActuatorError> {
        let gpio = Rc::new(RefCell::new(gpio));
        let active_high = config.led_active_high;
        {
            let mut g = gpio.borrow_mut();
            for spec in &PANEL_LEDS {
                g.setup_output(spec.gpio, !active_high).map_err(ActuatorError::WriteFailed)?;
            }
            g.setup_output(BUZZER_GPIO, BUZZER_IDLE_HIGH).map_err(ActuatorError::WriteFailed)?;
        }
        info!(
            "ACT | {} LEDs (active-{}), buzzer on GPIO{}",
            LED_COUNT,
            if active_high { "high" } else { "low" },
            BUZZER_GPIO
        );

        Ok(Self {
            executor,
            gpio,
            leds: core::array::from_fn(|i| LedSlot {
                spec: &PANEL_LEDS[i],
                mode: LedMode::Off,
                task: None,
            }),
            buzzer_mode: BuzzerMode::Off,
            buzzer_task: None,
            buzzer: BuzzerParams::from_config(config),
            blink_interval: config.blink_interval(),
            active_high,
            blink_tasks: Rc::new(Cell::new(0)),
            tone_tasks: Rc::new(Cell::new(0)),
        })
    }

    /// Shared handle to the GPIO driver, for input sampling.
    pub fn gpio(&self) -> Rc<RefCell<G>> {
        self.gpio.clone()
    }

    fn slot_index(id: u8) -> Result<usize, ActuatorError> {
        match pins::led(id) {
            Some(_) => Ok(usize::from(id - 1)),
            None => Err(ActuatorError::UnknownLed(id)),
        }
    }

    // ── LEDs ──────────────────────────────────────────────────

    /// Set LED `id` to `mode` (resolved per colour).  No-op when the LED is
    /// already in the resolved mode.
    pub async fn set_led(&mut self, id: u8, mode: LedMode) -> Result<(), ActuatorError> {
        let idx = Self::slot_index(id)?;
        let target = mode.effective_for(self.leds[idx].spec);
        self.apply(idx, target).await
    }

    async fn apply(&mut self, idx: usize, target: LedMode) -> Result<(), ActuatorError> {
        let slot = &mut self.leds[idx];
        slot.reap();
        if slot.mode == target {
            return Ok(());
        }
        let pin = slot.spec.gpio;
        let had_task = slot.task.take();
        slot.mode = LedMode::Off;
        let parked = had_task.is_some();
        if let Some(handle) = had_task {
            handle.cancel().await;
        }

        match target {
            LedMode::Off if parked => {}
            LedMode::Off => {
                write_level(&self.gpio, pin, !self.active_high).map_err(ActuatorError::WriteFailed)?;
            }
            LedMode::On => {
                write_level(&self.gpio, pin, self.active_high).map_err(ActuatorError::WriteFailed)?;
            }
            LedMode::Blinking => {
                let stop = Rc::new(StopSignal::new());
                let task = self.executor.spawn(blink_loop(
                    self.gpio.clone(),
                    pin,
                    self.active_high,
                    self.blink_interval,
                    stop.clone(),
                    Alive::new(&self.blink_tasks),
                ));
                self.leds[idx].task = Some(TaskHandle { stop, task });
            }
        }
        self.leds[idx].mode = target;
        debug!("LED{} -> {:?}", idx + 1, target);
        Ok(())
    }

    pub fn led_state(&self, id: u8) -> Option<LedMode> {
        Self::slot_index(id).ok().map(|idx| self.leds[idx].mode())
    }

    pub fn is_lit(&self, id: u8) -> bool {
        self.led_state(id).is_some_and(LedMode::is_lit)
    }

    /// Lamp test: every LED blinks, green ones included.
    pub async fn blink_all(&mut self) -> Result<(), ActuatorError> {
        for idx in 0..LED_COUNT {
            self.apply(idx, LedMode::Blinking).await?;
        }
        Ok(())
    }

    /// Switch every LED off, stopping all blink loops.
    pub async fn all_off(&mut self) -> Result<(), ActuatorError> {
        let mut first_err = None;
        for idx in 0..LED_COUNT {
            if let Err(e) = self.apply(idx, LedMode::Off).await {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Blink loops currently alive.
    pub fn active_blink_tasks(&self) -> usize {
        self.blink_tasks.get()
    }

    /// Forget every loop that ended on its own and return the LEDs it
    /// drove, now `Off`.  A stopped buzzer loop is reset to `Off` too.
    pub fn reap_stopped(&mut self) -> Vec<u8> {
        let dead = self.leds.iter_mut().filter_map(|slot| slot.reap().then_some(slot.spec.id)).collect();
        self.reap_buzzer();
        dead
    }

    fn reap_buzzer(&mut self) {
        if self.buzzer_task.as_ref().is_some_and(TaskHandle::is_stopped) {
            warn!("BUZZER | {:?} stopped after an I/O error", self.buzzer_mode);
            self.buzzer_task = None;
            self.buzzer_mode = BuzzerMode::Off;
        }
    }

    // ── Buzzer ────────────────────────────────────────────────

    /// Switch the buzzer mode.  The previous tone task is stopped and
    /// parked before the next one starts.
    pub async fn set_buzzer(&mut self, mode: BuzzerMode) -> Result<(), ActuatorError> {
        self.reap_buzzer();
        if self.buzzer_mode == mode {
            return Ok(());
        }
        if let Some(handle) = self.buzzer_task.take() {
            handle.cancel().await;
        }
        self.buzzer_mode = BuzzerMode::Off;

        let stop = Rc::new(StopSignal::new());
        let gpio = self.gpio.clone();
        let params = self.buzzer;
        let task = match mode {
            BuzzerMode::Off => None,
            BuzzerMode::ContinuousTone => Some(self.executor.spawn(tone_loop(
                gpio,
                BUZZER_GPIO,
                params,
                stop.clone(),
                Alive::new(&self.tone_tasks),
            ))),
            BuzzerMode::BeepPattern => Some(self.executor.spawn(beep_loop(
                gpio,
                BUZZER_GPIO,
                params,
                stop.clone(),
                Alive::new(&self.tone_tasks),
            ))),
        };
        self.buzzer_task = task.map(|task| TaskHandle { stop, task });
        self.buzzer_mode = mode;
        info!("BUZZER | {:?}", mode);
        Ok(())
    }

    pub fn buzzer_mode(&self) -> BuzzerMode {
        match &self.buzzer_task {
            Some(handle) if handle.is_stopped() => BuzzerMode::Off,
            _ => self.buzzer_mode,
        }
    }

    pub fn buzzer_params(&self) -> BuzzerParams {
        self.buzzer
    }

    /// Tone tasks currently alive (0 or 1).
    pub fn active_tone_tasks(&self) -> usize {
        self.tone_tasks.get()
    }

    /// Stop every task and park every pin.
    pub async fn shutdown(&mut self) -> Result<(), ActuatorError> {
        self.set_buzzer(BuzzerMode::Off).await?;
        self.all_off().await
    }
}
