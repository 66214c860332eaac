//! # Servo Arbiter
//!
//! Per-cycle mode state machine. Each call to [`ServoArbiter::step`] applies
//! these rules in order:
//!
//! 1. Manual axis outside the deadband: `Manual`, open-loop output of
//!    `manual_axis * manual_scale`. The hold target is left untouched.
//! 2. Manual axis released after a `Manual` cycle: `Holding` at the measured
//!    position, wherever the mechanism happens to be.
//! 3. Commit pressed while enable is held: `Holding` at a new target solved
//!    with [`shortest_path_target`] from the target-select axis.
//! 4. Otherwise the mode is unchanged.
//!
//! Every `Holding` cycle returns the target as a fresh position command.

use std::fmt;
use tracing::{debug, info};

use super::solver::{shortest_path_target, SensorRange};
use super::Angle;
use crate::input::ConditionedInput;

/// Operation mode of the servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Open-loop output driven by the manual axis.
    Manual,
    /// Closed-loop position hold at the target.
    Holding,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Manual => write!(f, "manual"),
            Mode::Holding => write!(f, "holding"),
        }
    }
}

/// Mode and hold target. `target_position` is stale while `Manual`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoState {
    pub mode: Mode,
    pub target_position: Angle,
}

/// Command for the actuator, issued once per cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServoCommand {
    /// Open-loop percent output in `[-1, 1]`.
    OpenLoop(f32),
    /// Closed-loop absolute position target.
    Position(Angle),
}

/// Maps a target-select axis in `[-1, 1]` to a phase in `[0, range)`.
///
/// Full left selects phase 0, center selects half a revolution, and full
/// right wraps back around to phase 0.
///
/// ```
/// use continuous_servo::servo::{select_phase, SensorRange};
///
/// let range = SensorRange::new(1.0)?;
/// assert_eq!(select_phase(-1.0, range), 0.0);
/// assert_eq!(select_phase(0.0, range), 0.5);
/// assert_eq!(select_phase(0.5, range), 0.75);
/// assert_eq!(select_phase(1.0, range), 0.0);
/// # Ok::<(), continuous_servo::error::ServoError>(())
/// ```
#[must_use]
pub fn select_phase(axis: f32, range: SensorRange) -> Angle {
    let half = range.get() / 2.0;
    let axis = f64::from(axis.clamp(-1.0, 1.0));
    range.phase(half * axis + half)
}

/// Owns the servo state and decides each cycle's command.
#[derive(Debug, Clone)]
pub struct ServoArbiter {
    state: ServoState,
    range: SensorRange,
    manual_scale: f32,
}

impl ServoArbiter {
    /// Starts holding at `initial_position` so nothing moves at power-up.
    #[must_use]
    pub fn new(initial_position: Angle, range: SensorRange, manual_scale: f32) -> Self {
        Self {
            state: ServoState {
                mode: Mode::Holding,
                target_position: initial_position,
            },
            range,
            manual_scale,
        }
    }

    #[must_use]
    pub fn state(&self) -> ServoState {
        self.state
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    #[must_use]
    pub fn sensor_range(&self) -> SensorRange {
        self.range
    }

    /// Run one cycle of mode arbitration.
    ///
    /// `measured` is the actuator position read this cycle.
    pub fn step(&mut self, input: &ConditionedInput, measured: Angle) -> ServoCommand {
        if input.manual_axis != 0.0 {
            if self.state.mode != Mode::Manual {
                info!("Manual control engaged");
                self.state.mode = Mode::Manual;
            }
            return ServoCommand::OpenLoop(input.manual_axis * self.manual_scale);
        }

        if self.state.mode == Mode::Manual {
            self.state = ServoState {
                mode: Mode::Holding,
                target_position: measured,
            };
            info!("Manual control released, holding at {:.4}", measured);
        } else if input.commit_pressed {
            if input.enable_held {
                let phase = select_phase(input.target_select_axis, self.range);
                let target = shortest_path_target(phase, measured, self.range);
                self.state = ServoState {
                    mode: Mode::Holding,
                    target_position: target,
                };
                info!(
                    "New target: phase {:.4}, absolute {:.4} (from {:.4})",
                    phase, target, measured
                );
            } else {
                debug!("Commit ignored, enable button not held");
            }
        }

        ServoCommand::Position(self.state.target_position)
    }

    /// Run one cycle of mode arbitration when the position is unreadable.
    ///
    /// Manual drive is open-loop and still follows the axis. With the axis
    /// released, a `Manual` servo stays `Manual` and is commanded to zero
    /// output, so the release hold happens at the first measured position.
    /// A `Holding` servo re-asserts its target. Commits are ignored because
    /// there is no position to solve from.
    pub fn step_without_feedback(&mut self, input: &ConditionedInput) -> ServoCommand {
        if input.manual_axis != 0.0 {
            if self.state.mode != Mode::Manual {
                info!("Manual control engaged");
                self.state.mode = Mode::Manual;
            }
            return ServoCommand::OpenLoop(input.manual_axis * self.manual_scale);
        }

        if input.commit_pressed {
            debug!("Commit ignored, no position feedback");
        }

        match self.state.mode {
            Mode::Manual => ServoCommand::OpenLoop(0.0),
            Mode::Holding => ServoCommand::Position(self.state.target_position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn arbiter(initial: Angle) -> ServoArbiter {
        ServoArbiter::new(initial, SensorRange::new(1.0).unwrap(), 0.3)
    }

    fn manual(axis: f32) -> ConditionedInput {
        ConditionedInput {
            manual_axis: axis,
            ..ConditionedInput::neutral()
        }
    }

    fn commit(select: f32, enable: bool) -> ConditionedInput {
        ConditionedInput {
            target_select_axis: select,
            commit_pressed: true,
            enable_held: enable,
            ..ConditionedInput::neutral()
        }
    }

    #[test]
    fn test_starts_holding_initial_position() {
        let mut arb = arbiter(0.42);
        assert_eq!(arb.mode(), Mode::Holding);
        assert_eq!(arb.step(&ConditionedInput::neutral(), 0.42), ServoCommand::Position(0.42));
    }

    #[test]
    fn test_manual_axis_drives_open_loop() {
        let mut arb = arbiter(0.0);
        let command = arb.step(&manual(0.5), 0.0);
        assert_eq!(arb.mode(), Mode::Manual);
        match command {
            ServoCommand::OpenLoop(percent) => assert!((percent - 0.15).abs() < 1e-6),
            other => panic!("expected open-loop, got {:?}", other),
        }
    }

    #[test]
    fn test_manual_does_not_update_target() {
        let mut arb = arbiter(0.2);
        arb.step(&manual(-0.8), 0.2);
        arb.step(&manual(-0.8), 0.1);
        assert_eq!(arb.state().target_position, 0.2);
    }

    #[test]
    fn test_release_holds_where_it_is() {
        let mut arb = arbiter(0.0);
        let positions = [0.10, 0.20, 0.27];
        let axes = [0.5, 0.5, 0.0];
        let mut modes = Vec::new();
        let mut last = None;
        for (&axis, &pos) in axes.iter().zip(positions.iter()) {
            last = Some(arb.step(&manual(axis), pos));
            modes.push(arb.mode());
        }

        assert_eq!(modes, vec![Mode::Manual, Mode::Manual, Mode::Holding]);
        assert_eq!(arb.state().target_position, 0.27);
        assert_eq!(last, Some(ServoCommand::Position(0.27)));
    }

    #[test]
    fn test_holding_reasserts_every_cycle() {
        let mut arb = arbiter(3.5);
        for pos in [3.5, 3.49, 3.52, 3.5] {
            assert_eq!(arb.step(&ConditionedInput::neutral(), pos), ServoCommand::Position(3.5));
        }
    }

    #[test]
    fn test_commit_with_enable_sets_shortest_path_target() {
        // Full-left select is phase 0; from 0.9 that is 0.1 forward
        let mut arb = arbiter(0.9);
        let command = arb.step(&commit(-1.0, true), 0.9);
        match command {
            ServoCommand::Position(target) => assert!((target - 1.0).abs() < EPS),
            other => panic!("expected position, got {:?}", other),
        }
        assert_eq!(arb.mode(), Mode::Holding);
    }

    #[test]
    fn test_commit_uses_measured_not_old_target() {
        let mut arb = arbiter(0.0);
        // Select 0.75 from measured 5.1 (phase 0.1): 0.35 backward
        let command = arb.step(&commit(0.5, true), 5.1);
        match command {
            ServoCommand::Position(target) => assert!((target - 4.75).abs() < EPS),
            other => panic!("expected position, got {:?}", other),
        }
    }

    #[test]
    fn test_commit_without_enable_is_ignored() {
        let mut arb = arbiter(0.3);
        assert_eq!(arb.step(&commit(-1.0, false), 0.3), ServoCommand::Position(0.3));
        assert_eq!(arb.state().target_position, 0.3);
    }

    #[test]
    fn test_manual_takes_precedence_over_commit() {
        let mut arb = arbiter(0.0);
        let input = ConditionedInput {
            manual_axis: 0.6,
            ..commit(-1.0, true)
        };
        assert!(matches!(arb.step(&input, 0.4), ServoCommand::OpenLoop(_)));
        assert_eq!(arb.mode(), Mode::Manual);
        assert_eq!(arb.state().target_position, 0.0);
    }

    #[test]
    fn test_release_takes_precedence_over_commit() {
        let mut arb = arbiter(0.0);
        arb.step(&manual(0.5), 0.0);
        // Release and commit on the same cycle: hold at measured position
        assert_eq!(arb.step(&commit(-1.0, true), 0.62), ServoCommand::Position(0.62));

        // The next commit press is honored
        let command = arb.step(&commit(-1.0, true), 0.62);
        match command {
            ServoCommand::Position(target) => assert!((target - 1.0).abs() < EPS),
            other => panic!("expected position, got {:?}", other),
        }
    }

    #[test]
    fn test_no_feedback_release_stops_open_loop() {
        let mut arb = arbiter(0.0);
        arb.step(&manual(1.0), 0.0);

        assert_eq!(arb.step_without_feedback(&manual(0.0)), ServoCommand::OpenLoop(0.0));
        assert_eq!(arb.mode(), Mode::Manual);

        // Feedback returns: release hold at the measured position
        assert_eq!(arb.step(&manual(0.0), 0.31), ServoCommand::Position(0.31));
        assert_eq!(arb.mode(), Mode::Holding);
    }

    #[test]
    fn test_no_feedback_still_drives_manual() {
        let mut arb = arbiter(0.0);
        match arb.step_without_feedback(&manual(-0.5)) {
            ServoCommand::OpenLoop(percent) => assert!((percent + 0.15).abs() < 1e-6),
            other => panic!("expected open-loop, got {:?}", other),
        }
        assert_eq!(arb.mode(), Mode::Manual);
    }

    #[test]
    fn test_no_feedback_holding_ignores_commit() {
        let mut arb = arbiter(0.4);
        assert_eq!(arb.step_without_feedback(&commit(-1.0, true)), ServoCommand::Position(0.4));
        assert_eq!(arb.state().target_position, 0.4);
    }

    #[test]
    fn test_select_phase_mapping() {
        let range = SensorRange::new(1.0).unwrap();
        assert_eq!(select_phase(-1.0, range), 0.0);
        assert_eq!(select_phase(0.0, range), 0.5);
        assert_eq!(select_phase(-0.5, range), 0.25);
        assert_eq!(select_phase(1.0, range), 0.0);

        let range = SensorRange::new(360.0).unwrap();
        assert_eq!(select_phase(0.5, range), 270.0);
    }

    #[test]
    fn test_select_phase_clamps_axis() {
        let range = SensorRange::new(1.0).unwrap();
        assert_eq!(select_phase(-2.0, range), 0.0);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Manual.to_string(), "manual");
        assert_eq!(Mode::Holding.to_string(), "holding");
    }
}
