//! Debounced mute and reset buttons.
//!
//! ## Hardware
//!
//! Momentary switches on [`MUTE_BUTTON_GPIO`] and [`RESET_BUTTON_GPIO`],
//! active-low with the internal pull-up by default.  The sampler polls both
//! pins every `button_sample_ms` (2 ms by default).
//!
//! ## Debounce
//!
//! | Step            | Rule                                                   |
//! |-----------------|--------------------------------------------------------|
//! | Vote            | Majority of the last 3 samples                         |
//! | Accept          | Vote differs from the stable state                     |
//! | Rate limit      | At least `debounce_ms` since the last accepted change  |
//! | Emit            | Only accepted transitions (`Pressed` / `Released`)     |
//!
//! Each button has its own [`Debouncer`]; they share nothing.

use core::cell::RefCell;
use core::time::Duration;
use std::rc::Rc;
use std::time::Instant;

use async_io_mini::Timer;
use log::{debug, info, warn};

use crate::app::events::{ButtonEdge, ButtonEvent, ButtonId, PanelEvent};
use crate::app::ports::GpioPort;
use crate::config::PanelConfig;
use crate::events::PanelQueue;
use crate::pins::{MUTE_BUTTON_GPIO, RESET_BUTTON_GPIO};

/// Samples in the majority vote.
pub const VOTE_WINDOW: usize = 3;

/// Per-button majority-vote debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: [bool; VOTE_WINDOW],
    next: usize,
    pressed: bool,
    last_accept_ms: Option<u64>,
    min_gap_ms: u64,
}

impl Debouncer {
    pub fn new(min_gap_ms: u64) -> Self {
        Self {
            window: [false; VOTE_WINDOW],
            next: 0,
            pressed: false,
            last_accept_ms: None,
            min_gap_ms,
        }
    }

    /// Debounced state.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed one raw sample (`true` = pressed) taken at `now_ms`.
    /// Returns the edge when the debounced state changes.
    pub fn sample(&mut self, raw_pressed: bool, now_ms: u64) -> Option<ButtonEdge> {
        self.window[self.next] = raw_pressed;
        self.next = (self.next + 1) % VOTE_WINDOW;

        let votes = self.window.iter().filter(|&&s| s).count();
        let majority = votes * 2 > VOTE_WINDOW;
        if majority == self.pressed {
            return None;
        }
        if let Some(last) = self.last_accept_ms {
            if now_ms.saturating_sub(last) < self.min_gap_ms {
                return None;
            }
        }

        self.pressed = majority;
        self.last_accept_ms = Some(now_ms);
        Some(if majority {
            ButtonEdge::Pressed
        } else {
            ButtonEdge::Released
        })
    }
}

struct Button {
    id: ButtonId,
    pin: u8,
    debouncer: Debouncer,
    read_failed: bool,
}

/// Sample both buttons forever, publishing every accepted edge.
pub async fn run_button_loop<G: GpioPort>(gpio: Rc<RefCell<G>>, queue: &PanelQueue, config: &PanelConfig) {
    let active_low = config.button_active_low;
    let mut buttons = [
        Button {
            id: ButtonId::Mute,
            pin: MUTE_BUTTON_GPIO,
            debouncer: Debouncer::new(config.debounce_ms),
            read_failed: false,
        },
        Button {
            id: ButtonId::Reset,
            pin: RESET_BUTTON_GPIO,
            debouncer: Debouncer::new(config.debounce_ms),
            read_failed: false,
        },
    ];

    for b in &buttons {
        if let Err(e) = gpio.borrow_mut().setup_input(b.pin, active_low) {
            warn!("BTN | {:?} input setup failed: {}", b.id, e);
        }
    }
    info!(
        "BTN | sampling every {} ms, debounce {} ms",
        config.button_sample_ms, config.debounce_ms
    );

    let period = Duration::from_millis(config.button_sample_ms);
    let epoch = Instant::now();
    loop {
        let now = Instant::now();
        let now_ms = u64::try_from(now.duration_since(epoch).as_millis()).unwrap_or(u64::MAX);
        for b in &mut buttons {
            let level = gpio.borrow_mut().read_pin(b.pin);
            let high = match level {
                Ok(high) => {
                    b.read_failed = false;
                    high
                }
                Err(e) => {
                    if !b.read_failed {
                        warn!("BTN | {:?} read failed: {}", b.id, e);
                        b.read_failed = true;
                    }
                    continue;
                }
            };
            let pressed = high != active_low;
            if let Some(edge) = b.debouncer.sample(pressed, now_ms) {
                debug!("BTN | {:?} {:?}", b.id, edge);
                queue
                    .send(PanelEvent::Button(ButtonEvent {
                        button: b.id,
                        edge,
                        at: now,
                    }))
                    .await;
            }
        }
        Timer::after(period).await;
    }
}
