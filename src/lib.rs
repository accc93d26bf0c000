//! ATS indicator panel library.
//!
//! Drives a 14-LED + buzzer annunciator panel from device notifications,
//! periodic status polls and two front-panel buttons.  The binary wires
//! the simulation adapters; integration tests wire mocks.

#![deny(unused_must_use)]

pub mod adapters;
pub mod alarms;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod pins;
pub mod poller;

pub use error::{Error, Result};
