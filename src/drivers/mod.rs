//! Actuator ownership and button sampling.

pub mod actuators;
pub mod button;
