//! # Servo Module
//!
//! Position servo targeting and mode arbitration.
//!
//! This module handles:
//! - Reducing absolute positions to a phase within one sensor revolution
//! - Solving the shortest-path absolute target across the wrap point
//! - Choosing between manual open-loop drive and closed-loop position hold

pub mod arbiter;
pub mod solver;

pub use arbiter::{select_phase, Mode, ServoArbiter, ServoCommand, ServoState};
pub use solver::{shortest_path_target, SensorRange, ShortestPath};

/// Actuator position in sensor units.
///
/// Absolute positions accumulate across revolutions; phases lie in
/// `[0, sensor_range)`.
pub type Angle = f64;
