//! # Control Loop Module
//!
//! Wires the input conditioner and servo arbiter to the actuator.
//!
//! One call to [`ControlLoop::run_cycle`] is one control cycle:
//! read input, read feedback, condition, arbitrate, command, feed safety.
//! Nothing in a cycle blocks or returns an error. Missing input degrades to
//! neutral input, missing feedback falls back to
//! [`ServoArbiter::step_without_feedback`], and rejected commands are logged.

use tracing::{debug, info, warn};

use crate::actuator::Actuator;
use crate::config::Config;
use crate::error::Result;
use crate::input::{InputConditioner, InputDevice, RawInput};
use crate::servo::{Angle, Mode, SensorRange, ServoArbiter, ServoCommand};

/// Outcome of a single control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    pub mode: Mode,
    /// Command sent to the actuator.
    pub command: ServoCommand,
    pub measured: Option<Angle>,
    pub input_connected: bool,
    pub safety_refreshed: bool,
}

/// Owns the collaborators and the servo state for the process lifetime.
pub struct ControlLoop<A: Actuator, I: InputDevice> {
    actuator: A,
    input: I,
    conditioner: InputConditioner,
    arbiter: ServoArbiter,
    safety_requires_enable: bool,
    status_interval: u64,
    cycle: u64,
    feedback_ok: bool,
}

impl<A: Actuator, I: InputDevice> ControlLoop<A, I> {
    /// Prepare the actuator and start holding its current position.
    ///
    /// Loads the closed-loop gains, reads the current position, and commands
    /// a hold there so the mechanism does not move at startup.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, or if the actuator
    /// rejects the gains, cannot report its position, or rejects the
    /// initial hold.
    pub fn new(config: &Config, mut actuator: A, input: I) -> Result<Self> {
        config.validate()?;
        let range = SensorRange::new(config.servo.sensor_range)?;

        actuator.set_closed_loop_gains(&config.servo.gains)?;
        let initial = actuator.position()?;
        actuator.set_position(initial)?;

        info!(
            "Servo ready: holding {:.4} (sensor range {}, manual scale {})",
            initial,
            range.get(),
            config.servo.manual_scale
        );

        Ok(Self {
            actuator,
            input,
            conditioner: InputConditioner::new(&config.input),
            arbiter: ServoArbiter::new(initial, range, config.servo.manual_scale),
            safety_requires_enable: config.control.safety_requires_enable,
            status_interval: config.control.status_interval_cycles.max(1),
            cycle: 0,
            feedback_ok: true,
        })
    }

    /// Run exactly one control cycle.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;

        let raw = match RawInput::capture(&mut self.input) {
            Ok(raw) => Some(raw),
            Err(e) => {
                debug!("Input read failed: {}", e);
                None
            }
        };
        let input = self.conditioner.condition(raw.as_ref());

        let measured = match self.actuator.position() {
            Ok(position) => {
                if !self.feedback_ok {
                    info!("Actuator feedback restored");
                    self.feedback_ok = true;
                }
                Some(position)
            }
            Err(e) => {
                if self.feedback_ok {
                    warn!("Actuator feedback unavailable, commits disabled: {}", e);
                    self.feedback_ok = false;
                }
                None
            }
        };

        let command = match measured {
            Some(position) => self.arbiter.step(&input, position),
            None => self.arbiter.step_without_feedback(&input),
        };
        let sent = match command {
            ServoCommand::OpenLoop(percent) => self.actuator.set_open_loop(percent),
            ServoCommand::Position(target) => self.actuator.set_position(target),
        };
        if let Err(e) = sent {
            warn!("Actuator rejected {:?}: {}", command, e);
        }

        let safety_refreshed = !self.safety_requires_enable || input.enable_held;
        if safety_refreshed {
            self.actuator.refresh_safety();
        }

        let report = CycleReport {
            cycle: self.cycle,
            mode: self.arbiter.mode(),
            command,
            measured,
            input_connected: raw.is_some(),
            safety_refreshed,
        };

        if self.cycle % self.status_interval == 0 {
            self.log_status(&report);
        }

        report
    }

    fn log_status(&self, report: &CycleReport) {
        let state = self.arbiter.state();
        match report.measured {
            Some(position) => info!(
                "Cycle {}: {} at {:.4} (phase {:.4}), target {:.4}, input {}, enabled {}",
                report.cycle,
                state.mode,
                position,
                self.arbiter.sensor_range().phase(position),
                state.target_position,
                if report.input_connected { "ok" } else { "lost" },
                report.safety_refreshed
            ),
            None => info!(
                "Cycle {}: {} with no feedback, input {}",
                report.cycle,
                state.mode,
                if report.input_connected { "ok" } else { "lost" }
            ),
        }
    }

    /// Servo arbiter state
    pub fn arbiter(&self) -> &ServoArbiter {
        &self.arbiter
    }

    /// Number of cycles run so far
    pub fn cycle_count(&self) -> u64 {
        self.cycle
    }

    /// Actuator being driven
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Mutable actuator access, used to advance a simulated one
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}
