//! # Actuator Module
//!
//! The motor-driver collaborator interface and an in-process simulation.
//!
//! The control loop only ever talks to the [`Actuator`] trait, so a real
//! motor controller driver can replace [`sim::SimActuator`] without touching
//! the servo logic.

pub mod sim;

pub use sim::SimActuator;

use crate::config::GainsConfig;
use crate::error::Result;
use crate::servo::Angle;

/// A position-controlled motor driver with a wrapping feedback sensor.
///
/// Outputs stay enabled only while [`Actuator::refresh_safety`] keeps being
/// called; a driver that stops hearing from the control loop cuts its
/// outputs on its own.
#[cfg_attr(test, mockall::automock)]
pub trait Actuator {
    /// Absolute sensor position, accumulated across revolutions.
    ///
    /// # Errors
    ///
    /// Returns an actuator error if the feedback cannot be read.
    fn position(&mut self) -> Result<Angle>;

    /// Closed-loop hold at an absolute target. Must be re-sent every cycle.
    ///
    /// # Errors
    ///
    /// Returns an actuator error if the command is rejected.
    fn set_position(&mut self, target: Angle) -> Result<()>;

    /// Open-loop percent output in `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an actuator error if the command is rejected.
    fn set_open_loop(&mut self, percent: f32) -> Result<()>;

    /// Load closed-loop gains.
    ///
    /// # Errors
    ///
    /// Returns an actuator error if the gains are rejected.
    fn set_closed_loop_gains(&mut self, gains: &GainsConfig) -> Result<()>;

    /// Keep outputs enabled for another safety period.
    fn refresh_safety(&mut self);
}
