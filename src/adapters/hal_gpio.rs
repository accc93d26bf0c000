//! `embedded-hal` GPIO adapter.
//!
//! Implements [`GpioPort`] over any board support crate that exposes
//! `embedded-hal` 1.0 pins.  Pins are registered once with their panel pin
//! number; the HAL has already configured their direction, so
//! `setup_output` only re-drives the level and `setup_input` only checks
//! the pin is known.
//!
//! PWM pins carry a [`SetDutyCycle`] channel.  The carrier frequency is set
//! when the HAL timer is built; `start_pwm` only applies the duty cycle.
//! A plain level on a PWM pin is a fully on / fully off duty cycle.

use embedded_hal::digital::{Error as _, InputPin, OutputPin, PinState};
use embedded_hal::pwm::{Error as _, SetDutyCycle};
use heapless::Vec;
use log::debug;

use crate::app::ports::{GpioError, GpioPort};

/// 14 LEDs plus spares.
pub const MAX_OUTPUTS: usize = 16;
pub const MAX_INPUTS: usize = 4;
pub const MAX_PWM: usize = 2;

pub struct HalGpio<O, I, P> {
    outputs: Vec<(u8, O), MAX_OUTPUTS>,
    inputs: Vec<(u8, I), MAX_INPUTS>,
    pwm: Vec<(u8, P), MAX_PWM>,
}

impl<O, I, P> Default for HalGpio<O, I, P> {
    fn default() -> Self {
        Self {
            outputs: Vec::new(),
            inputs: Vec::new(),
            pwm: Vec::new(),
        }
    }
}

impl<O, I, P> HalGpio<O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: SetDutyCycle,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an output.  Gives the pin back when the table is full.
    pub fn add_output(&mut self, pin: u8, line: O) -> Result<(), O> {
        self.outputs.push((pin, line)).map_err(|(_, line)| line)
    }

    pub fn add_input(&mut self, pin: u8, line: I) -> Result<(), I> {
        self.inputs.push((pin, line)).map_err(|(_, line)| line)
    }

    pub fn add_pwm(&mut self, pin: u8, channel: P) -> Result<(), P> {
        self.pwm.push((pin, channel)).map_err(|(_, channel)| channel)
    }

    fn find<T>(table: &mut [(u8, T)], pin: u8) -> Option<&mut T> {
        table.iter_mut().find(|(p, _)| *p == pin).map(|(_, line)| line)
    }

    fn drive(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        if let Some(line) = Self::find(&mut self.outputs, pin) {
            return line
                .set_state(PinState::from(high))
                .map_err(|e| GpioError::Digital { pin, kind: e.kind() });
        }
        if let Some(ch) = Self::find(&mut self.pwm, pin) {
            let r = if high {
                ch.set_duty_cycle_fully_on()
            } else {
                ch.set_duty_cycle_fully_off()
            };
            return r.map_err(|e| GpioError::Pwm { pin, kind: e.kind() });
        }
        Err(GpioError::UnknownPin(pin))
    }
}

impl<O, I, P> GpioPort for HalGpio<O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: SetDutyCycle,
{
    fn setup_output(&mut self, pin: u8, initial_high: bool) -> Result<(), GpioError> {
        self.drive(pin, initial_high)
    }

    fn setup_input(&mut self, pin: u8, _pull_up: bool) -> Result<(), GpioError> {
        if Self::find(&mut self.inputs, pin).is_some() {
            Ok(())
        } else {
            Err(GpioError::UnknownPin(pin))
        }
    }

    fn set_pin_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        self.drive(pin, high)
    }

    fn start_pwm(&mut self, pin: u8, frequency_hz: u32, duty_percent: u8) -> Result<(), GpioError> {
        let ch = Self::find(&mut self.pwm, pin).ok_or(GpioError::UnknownPin(pin))?;
        debug!("GPIO{} PWM {}% (carrier {} Hz fixed by timer)", pin, duty_percent, frequency_hz);
        ch.set_duty_cycle_percent(duty_percent.min(100))
            .map_err(|e| GpioError::Pwm { pin, kind: e.kind() })
    }

    fn stop_pwm(&mut self, pin: u8) -> Result<(), GpioError> {
        let ch = Self::find(&mut self.pwm, pin).ok_or(GpioError::UnknownPin(pin))?;
        ch.set_duty_cycle_fully_off()
            .map_err(|e| GpioError::Pwm { pin, kind: e.kind() })
    }

    fn read_pin(&mut self, pin: u8) -> Result<bool, GpioError> {
        let line = Self::find(&mut self.inputs, pin).ok_or(GpioError::UnknownPin(pin))?;
        line.is_high().map_err(|e| GpioError::Digital { pin, kind: e.kind() })
    }
}
