//! # Button Edge Detection
//!
//! Turns held-button snapshots into one-cycle press events. A press is
//! reported only on the cycle where a button goes from released to held.
//!
//! The previous snapshot must be the one from the immediately preceding
//! cycle. [`EdgeDetector`] enforces this by replacing it on every call.

use super::BUTTON_COUNT;

/// Held state of every button for one cycle, indexed by button id.
pub type ButtonSnapshot = [bool; BUTTON_COUNT];

/// `pressed[i] = current[i] && !previous[i]` for every button.
///
/// # Examples
///
/// ```
/// use continuous_servo::input::{press_edges, BUTTON_COUNT};
///
/// let mut previous = [false; BUTTON_COUNT];
/// let mut current = [false; BUTTON_COUNT];
/// previous[1] = true;
/// current[1] = true;
/// current[2] = true;
///
/// let pressed = press_edges(&current, &previous);
/// assert!(!pressed[1]); // held, not a new press
/// assert!(pressed[2]);
/// ```
#[must_use]
pub fn press_edges(current: &ButtonSnapshot, previous: &ButtonSnapshot) -> ButtonSnapshot {
    let mut pressed = [false; BUTTON_COUNT];
    for (edge, (&now, &before)) in pressed.iter_mut().zip(current.iter().zip(previous.iter())) {
        *edge = now && !before;
    }
    pressed
}

/// Keeps the last cycle's snapshot and reports press edges against it.
///
/// Starts with every button released, so a button already held on the
/// first cycle reports a press.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    previous: ButtonSnapshot,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeDetector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            previous: [false; BUTTON_COUNT],
        }
    }

    /// Compare `current` with the previous cycle, then retain `current`.
    pub fn update(&mut self, current: &ButtonSnapshot) -> ButtonSnapshot {
        let pressed = press_edges(current, &self.previous);
        self.previous = *current;
        pressed
    }

    /// The snapshot the next call will compare against.
    #[must_use]
    pub fn previous(&self) -> &ButtonSnapshot {
        &self.previous
    }
}
