//! Application core: panel rules, zero I/O.
//!
//! This module contains the business rules for the indicator panel:
//! alarm precedence, status display, buzzer derivation, persisted flag
//! edges and the reset lamp test.  All interaction with hardware, files
//! and the network happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
