//! Simulated actuator for running the controller without hardware.
//!
//! [`SimActuator`] models a motor whose speed is proportional to its output,
//! an on-board PIDF position loop running on the absolute sensor value, and
//! a safety watchdog that disables outputs when it is not refreshed.
//!
//! # Example
//!
//! ```rust
//! use continuous_servo::actuator::{Actuator, SimActuator};
//! use std::time::Duration;
//!
//! let mut motor = SimActuator::new(1.0);
//! motor.set_open_loop(0.5)?;
//! motor.refresh_safety();
//! motor.advance(Duration::from_millis(10));
//! assert!(motor.position()? > 0.0);
//! # Ok::<(), continuous_servo::error::ServoError>(())
//! ```

use std::time::Duration;
use tracing::warn;

use super::Actuator;
use crate::config::GainsConfig;
use crate::error::{Result, ServoError};
use crate::servo::Angle;

/// Outputs are cut when safety has not been refreshed for this long.
pub const SAFETY_TIMEOUT: Duration = Duration::from_millis(100);

/// Full-output speed, in revolutions per second.
const FULL_OUTPUT_REVS_PER_SEC: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ControlMode {
    OpenLoop(f32),
    Position(Angle),
}

/// A simulated position-servo motor driver.
#[derive(Debug, Clone)]
pub struct SimActuator {
    position: Angle,
    /// Sensor units per second at full output.
    max_speed: f64,
    mode: ControlMode,
    gains: GainsConfig,
    integral: f64,
    last_error: Option<f64>,
    since_refresh: Duration,
    output: f32,
}

impl SimActuator {
    /// Create a stationary actuator at position zero.
    ///
    /// `sensor_range` scales the motor speed so that full output turns
    /// two revolutions per second in any sensor unit.
    pub fn new(sensor_range: f64) -> Self {
        Self {
            position: 0.0,
            max_speed: sensor_range * FULL_OUTPUT_REVS_PER_SEC,
            mode: ControlMode::OpenLoop(0.0),
            gains: GainsConfig {
                p: 0.0,
                i: 0.0,
                d: 0.0,
                f: 0.0,
            },
            integral: 0.0,
            last_error: None,
            // Disabled until the first refresh
            since_refresh: SAFETY_TIMEOUT,
            output: 0.0,
        }
    }

    /// Start at `position` instead of zero.
    #[must_use]
    pub fn with_position(mut self, position: Angle) -> Self {
        self.position = position;
        self
    }

    /// Whether the safety watchdog currently allows output.
    #[must_use]
    pub fn outputs_enabled(&self) -> bool {
        self.since_refresh < SAFETY_TIMEOUT
    }

    /// Output applied during the last [`SimActuator::advance`].
    #[must_use]
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Integrate the plant over `dt`.
    pub fn advance(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f64();
        if seconds <= 0.0 {
            return;
        }

        if !self.outputs_enabled() {
            self.output = 0.0;
            self.integral = 0.0;
            self.last_error = None;
            self.since_refresh = self.since_refresh.saturating_add(dt);
            return;
        }

        self.output = match self.mode {
            ControlMode::OpenLoop(percent) => percent,
            ControlMode::Position(target) => self.closed_loop_output(target, seconds),
        };
        self.position += f64::from(self.output) * self.max_speed * seconds;
        self.since_refresh = self.since_refresh.saturating_add(dt);
    }

    fn closed_loop_output(&mut self, target: Angle, dt: f64) -> f32 {
        let error = target - self.position;

        self.integral += error * dt;
        let derivative = match self.last_error {
            Some(prev) => (error - prev) / dt,
            None => 0.0,
        };
        self.last_error = Some(error);

        let output = self.gains.p * error
            + self.gains.i * self.integral
            + self.gains.d * derivative
            + self.gains.f * target;
        output.clamp(-1.0, 1.0) as f32
    }
}

impl Actuator for SimActuator {
    fn position(&mut self) -> Result<Angle> {
        Ok(self.position)
    }

    fn set_position(&mut self, target: Angle) -> Result<()> {
        if !target.is_finite() {
            return Err(ServoError::Actuator(format!("invalid position target {}", target)));
        }
        if !matches!(self.mode, ControlMode::Position(_)) {
            self.integral = 0.0;
            self.last_error = None;
        }
        self.mode = ControlMode::Position(target);
        Ok(())
    }

    fn set_open_loop(&mut self, percent: f32) -> Result<()> {
        if !percent.is_finite() {
            return Err(ServoError::Actuator(format!("invalid open-loop output {}", percent)));
        }
        let clamped = percent.clamp(-1.0, 1.0);
        if clamped != percent {
            warn!("Open-loop output {} clamped to {}", percent, clamped);
        }
        self.mode = ControlMode::OpenLoop(clamped);
        Ok(())
    }

    fn set_closed_loop_gains(&mut self, gains: &GainsConfig) -> Result<()> {
        self.gains = *gains;
        Ok(())
    }

    fn refresh_safety(&mut self) {
        self.since_refresh = Duration::ZERO;
    }
}
