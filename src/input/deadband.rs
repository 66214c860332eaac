//! # Deadband
//!
//! Analog sticks rarely rest exactly at center. Clearing small readings is
//! what lets the servo arbiter notice that the operator released the manual
//! stick at all.
//!
//! Unlike a rescaling deadzone, values outside the band pass through
//! unchanged.
//!
//! ```
//! use continuous_servo::input::deadband;
//!
//! assert_eq!(deadband(0.08, 0.10), 0.0);
//! assert_eq!(deadband(-0.10, 0.10), 0.0);
//! assert_eq!(deadband(0.35, 0.10), 0.35);
//! ```

/// Default deadband threshold (10% of full deflection).
pub const DEFAULT_DEADBAND: f32 = 0.10;

/// Returns `0.0` if `-threshold <= value <= threshold`, otherwise `value`.
#[must_use]
#[inline]
pub fn deadband(value: f32, threshold: f32) -> f32 {
    if (-threshold..=threshold).contains(&value) {
        0.0
    } else {
        value
    }
}
