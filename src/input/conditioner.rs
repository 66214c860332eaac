//! # Input Conditioner
//!
//! Reduces a raw input snapshot to the four signals the servo arbiter reads:
//! the deadbanded manual and target-select axes, the commit press edge, and
//! whether the enable button is held.

use tracing::{debug, warn};

use super::deadband::deadband;
use super::edge::EdgeDetector;
use super::RawInput;
use crate::config::InputConfig;

/// Per-cycle operator intent after conditioning.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConditionedInput {
    /// Manual drive axis in `[-1, 1]`, zero inside the deadband.
    pub manual_axis: f32,
    /// Target selection axis in `[-1, 1]`, zero inside the deadband.
    pub target_select_axis: f32,
    /// True only on the cycle the commit button goes down.
    pub commit_pressed: bool,
    /// Enable button held this cycle.
    pub enable_held: bool,
}

impl ConditionedInput {
    /// No manual drive, no commit, enable released.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Deadbands axes and detects commit presses across cycles.
#[derive(Debug, Clone)]
pub struct InputConditioner {
    threshold: f32,
    manual_axis: usize,
    target_select_axis: usize,
    commit_button: usize,
    enable_button: usize,
    edges: EdgeDetector,
    connected: bool,
}

impl InputConditioner {
    /// Creates a conditioner from validated input configuration.
    #[must_use]
    pub fn new(config: &InputConfig) -> Self {
        Self {
            threshold: config.deadband,
            manual_axis: config.manual_axis,
            target_select_axis: config.target_select_axis,
            commit_button: config.commit_button,
            enable_button: config.enable_button,
            edges: EdgeDetector::new(),
            connected: true,
        }
    }

    /// Condition one cycle of input.
    ///
    /// `None` means the device could not be read this cycle. That cycle is
    /// treated as neutral input, and the last readable snapshot stays the
    /// previous one for edge detection, so a button held through a dropout
    /// does not register a second press.
    pub fn condition(&mut self, raw: Option<&RawInput>) -> ConditionedInput {
        let Some(raw) = raw else {
            if self.connected {
                warn!("Input unavailable, holding current target");
                self.connected = false;
            }
            return ConditionedInput::neutral();
        };

        if !self.connected {
            debug!("Input available again");
            self.connected = true;
        }

        let pressed = self.edges.update(&raw.buttons);

        ConditionedInput {
            manual_axis: deadband(raw.axes[self.manual_axis], self.threshold),
            target_select_axis: deadband(raw.axes[self.target_select_axis], self.threshold),
            commit_pressed: pressed[self.commit_button],
            enable_held: raw.buttons[self.enable_button],
        }
    }

    /// Whether the last conditioned cycle had readable input.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}
