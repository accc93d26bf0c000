//! Simulated GPIO adapter.
//!
//! Implements [`GpioPort`] over an in-memory pin table so the panel runs on
//! a host without hardware.  Output and PWM changes are logged at `debug`;
//! input levels are set from outside with [`SimGpio::set_input`].

use std::collections::HashMap;

use log::{debug, info};

use crate::app::ports::{GpioError, GpioPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPinMode {
    Output,
    Input { pull_up: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPin {
    pub mode: SimPinMode,
    pub high: bool,
    /// `(frequency_hz, duty_percent)` while a square wave is running.
    pub pwm: Option<(u32, u8)>,
}

#[derive(Debug, Default)]
pub struct SimGpio {
    pins: HashMap<u8, SimPin>,
}

impl SimGpio {
    pub fn new() -> Self {
        info!("SimGpio: simulation backend");
        Self::default()
    }

    pub fn pin(&self, pin: u8) -> Option<SimPin> {
        self.pins.get(&pin).copied()
    }

    /// Electrical level of an output pin, `None` when not configured.
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.pins.get(&pin).map(|p| p.high)
    }

    /// Drive a simulated input (e.g. a button press).
    pub fn set_input(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        match self.pins.get_mut(&pin) {
            Some(p) if matches!(p.mode, SimPinMode::Input { .. }) => {
                p.high = high;
                Ok(())
            }
            _ => Err(GpioError::UnknownPin(pin)),
        }
    }

    fn output(&mut self, pin: u8) -> Result<&mut SimPin, GpioError> {
        match self.pins.get_mut(&pin) {
            Some(p) if p.mode == SimPinMode::Output => Ok(p),
            _ => Err(GpioError::UnknownPin(pin)),
        }
    }
}

impl GpioPort for SimGpio {
    fn setup_output(&mut self, pin: u8, initial_high: bool) -> Result<(), GpioError> {
        self.pins.insert(
            pin,
            SimPin {
                mode: SimPinMode::Output,
                high: initial_high,
                pwm: None,
            },
        );
        Ok(())
    }

    fn setup_input(&mut self, pin: u8, pull_up: bool) -> Result<(), GpioError> {
        self.pins.insert(
            pin,
            SimPin {
                mode: SimPinMode::Input { pull_up },
                high: pull_up,
                pwm: None,
            },
        );
        Ok(())
    }

    fn set_pin_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        let p = self.output(pin)?;
        p.high = high;
        debug!("SIM GPIO{} = {}", pin, u8::from(high));
        Ok(())
    }

    fn start_pwm(&mut self, pin: u8, frequency_hz: u32, duty_percent: u8) -> Result<(), GpioError> {
        let p = self.output(pin)?;
        p.pwm = Some((frequency_hz, duty_percent.min(100)));
        debug!("SIM GPIO{} PWM {} Hz @ {}%", pin, frequency_hz, duty_percent);
        Ok(())
    }

    fn stop_pwm(&mut self, pin: u8) -> Result<(), GpioError> {
        self.output(pin)?.pwm = None;
        debug!("SIM GPIO{} PWM stopped", pin);
        Ok(())
    }

    fn read_pin(&mut self, pin: u8) -> Result<bool, GpioError> {
        self.pins.get(&pin).map(|p| p.high).ok_or(GpioError::UnknownPin(pin))
    }
}
