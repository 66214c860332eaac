//! # Shortest-Path Target Solver
//!
//! Given a desired phase within one revolution and the actuator's absolute
//! (multi-revolution) position, picks the absolute target that reaches that
//! phase with the least travel, crossing the sensor's wrap point if needed.
//!
//! The returned target is always absolute, never a wrapped phase, so the
//! closed-loop setpoint stays continuous as the mechanism passes zero.
//!
//! ## Tie-break
//!
//! A target exactly half a revolution away is reached by moving forward
//! (increasing sensor value).
//!
//! ```
//! use continuous_servo::servo::solver::{shortest_path_target, SensorRange};
//!
//! let range = SensorRange::new(1.0)?;
//! // From 0.9 to phase 0.05: forward through the wrap point
//! assert!((shortest_path_target(0.05, 0.9, range) - 1.05).abs() < 1e-9);
//! // From 0.05 to phase 0.9: backward through the wrap point
//! assert!((shortest_path_target(0.9, 0.05, range) - (-0.10)).abs() < 1e-9);
//! # Ok::<(), continuous_servo::error::ServoError>(())
//! ```

use tracing::debug;

use super::Angle;
use crate::error::{Result, ServoError};

/// Sensor units spanned by exactly one revolution. Always finite and `> 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRange(f64);

impl SensorRange {
    /// Validates a sensor range given in sensor units per revolution.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `range` is not finite or not positive.
    pub fn new(range: f64) -> Result<Self> {
        if range.is_finite() && range > 0.0 {
            Ok(Self(range))
        } else {
            Err(ServoError::InvalidConfig(format!(
                "sensor range must be a finite value greater than 0 (got {})",
                range
            )))
        }
    }

    /// Sensor units per revolution.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }

    /// Reduce an absolute angle to its phase in `[0, range)`.
    ///
    /// Negative angles wrap with a floored modulo, so `-0.25` on a range of
    /// `1.0` is phase `0.75`.
    #[must_use]
    pub fn phase(self, angle: Angle) -> Angle {
        let phase = angle.rem_euclid(self.0);
        // rem_euclid rounds to exactly `range` for tiny negative inputs
        if phase >= self.0 {
            0.0
        } else {
            phase
        }
    }
}

/// Breakdown of one solver evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortestPath {
    pub selected_phase: Angle,
    pub current_absolute: Angle,
    pub current_phase: Angle,
    /// Forward distance, in `[0, range)`.
    pub up_distance: f64,
    /// Backward distance, in `(-range, 0]`.
    pub down_distance: f64,
    pub chosen_distance: f64,
    pub target: Angle,
}

impl ShortestPath {
    /// Evaluate the shortest path from `current_absolute` to `selected_phase`.
    ///
    /// `selected_phase` is reduced into `[0, range)` first, so a phase equal
    /// to the full range means phase zero.
    #[must_use]
    pub fn solve(selected_phase: Angle, current_absolute: Angle, range: SensorRange) -> Self {
        let span = range.get();
        let selected_phase = range.phase(selected_phase);
        let current_phase = range.phase(current_absolute);

        let mut up_distance = selected_phase - current_phase;
        if selected_phase < current_phase {
            up_distance += span;
        }
        let down_distance = up_distance - span;

        let chosen_distance = if up_distance.abs() <= down_distance.abs() {
            up_distance
        } else {
            down_distance
        };

        Self {
            selected_phase,
            current_absolute,
            current_phase,
            up_distance,
            down_distance,
            chosen_distance,
            target: current_absolute + chosen_distance,
        }
    }
}

/// Absolute target reaching `selected_phase` with the least travel.
#[must_use]
pub fn shortest_path_target(selected_phase: Angle, current_absolute: Angle, range: SensorRange) -> Angle {
    let path = ShortestPath::solve(selected_phase, current_absolute, range);
    debug!(
        selected_phase = path.selected_phase,
        current_absolute = path.current_absolute,
        current_phase = path.current_phase,
        up_distance = path.up_distance,
        down_distance = path.down_distance,
        target = path.target,
        "Solved shortest-path target"
    );
    path.target
}
