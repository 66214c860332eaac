//! # Continuous Servo Library
//!
//! Gamepad-driven position servo for a rotating mechanism whose feedback
//! sensor wraps around once per revolution.
//!
//! The operator either drives the actuator open-loop with a stick, or picks
//! an angular position and commits it as a hold target. Targets are always
//! approached along the shortest direction, even across the sensor's wrap
//! point.

pub mod actuator;
pub mod config;
pub mod control;
pub mod error;
pub mod input;
pub mod servo;
