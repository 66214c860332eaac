//! # Input Module
//!
//! Operator input handling.
//!
//! This module handles:
//! - The `InputDevice` collaborator interface (`axis`/`button` polling)
//! - Capturing one raw snapshot per control cycle
//! - Deadband filtering of analog axes
//! - Press-edge detection between consecutive button snapshots
//! - Linux evdev gamepad adapter

pub mod conditioner;
pub mod deadband;
pub mod edge;
pub mod gamepad;

pub use conditioner::{ConditionedInput, InputConditioner};
pub use deadband::{deadband, DEFAULT_DEADBAND};
pub use edge::{press_edges, ButtonSnapshot, EdgeDetector};

use crate::error::Result;

/// Number of analog axes captured per cycle.
pub const AXIS_COUNT: usize = 8;

/// Number of buttons captured per cycle, indexed by button id.
pub const BUTTON_COUNT: usize = 16;

/// Human-input collaborator, polled once per control cycle.
///
/// `poll` latches the device's current state; `axis` and `button` then read
/// from that latched state without touching the device again.
#[cfg_attr(test, mockall::automock)]
pub trait InputDevice {
    /// Latch the current device state.
    ///
    /// # Errors
    ///
    /// Returns an input error when the device is disconnected or unreadable.
    fn poll(&mut self) -> Result<()>;

    /// Axis value in `[-1, 1]`.
    fn axis(&self, index: usize) -> f32;

    /// Whether the button is held.
    fn button(&self, index: usize) -> bool;
}

impl<T: InputDevice + ?Sized> InputDevice for Box<T> {
    fn poll(&mut self) -> Result<()> {
        (**self).poll()
    }

    fn axis(&self, index: usize) -> f32 {
        (**self).axis(index)
    }

    fn button(&self, index: usize) -> bool {
        (**self).button(index)
    }
}

/// One cycle's raw operator input, before deadbanding and edge detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInput {
    pub axes: [f32; AXIS_COUNT],
    pub buttons: ButtonSnapshot,
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            axes: [0.0; AXIS_COUNT],
            buttons: [false; BUTTON_COUNT],
        }
    }
}

impl RawInput {
    /// Poll the device and copy every axis and button into a snapshot.
    ///
    /// Axes are clamped to `[-1, 1]`; non-finite readings become `0.0`.
    ///
    /// # Errors
    ///
    /// Propagates the device's `poll` error.
    pub fn capture<D: InputDevice + ?Sized>(device: &mut D) -> Result<Self> {
        device.poll()?;

        let mut raw = RawInput::default();
        for (index, axis) in raw.axes.iter_mut().enumerate() {
            let value = device.axis(index);
            *axis = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
        }
        for (index, button) in raw.buttons.iter_mut().enumerate() {
            *button = device.button(index);
        }
        Ok(raw)
    }
}

/// Input device that is never connected.
///
/// Stands in when no gamepad is present so the control loop keeps running
/// with neutral input and holds its current target.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectedInput;

impl InputDevice for DisconnectedInput {
    fn poll(&mut self) -> Result<()> {
        Err(crate::error::ServoError::Input("no input device connected".to_string()))
    }

    fn axis(&self, _index: usize) -> f32 {
        0.0
    }

    fn button(&self, _index: usize) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServoError;

    #[test]
    fn test_capture_copies_axes_and_buttons() {
        let mut device = MockInputDevice::new();
        device.expect_poll().times(1).returning(|| Ok(()));
        device
            .expect_axis()
            .returning(|index| if index == 2 { 0.75 } else { 0.0 });
        device.expect_button().returning(|index| index == 7);

        let raw = RawInput::capture(&mut device).unwrap();
        assert_eq!(raw.axes[2], 0.75);
        assert_eq!(raw.axes[0], 0.0);
        assert!(raw.buttons[7]);
        assert!(!raw.buttons[2]);
    }

    #[test]
    fn test_capture_clamps_out_of_range_axes() {
        let mut device = MockInputDevice::new();
        device.expect_poll().returning(|| Ok(()));
        device.expect_axis().returning(|index| match index {
            0 => 1.5,
            1 => -3.0,
            2 => f32::NAN,
            _ => 0.0,
        });
        device.expect_button().returning(|_| false);

        let raw = RawInput::capture(&mut device).unwrap();
        assert_eq!(raw.axes[0], 1.0);
        assert_eq!(raw.axes[1], -1.0);
        assert_eq!(raw.axes[2], 0.0);
    }

    #[test]
    fn test_capture_propagates_poll_error() {
        let mut device = MockInputDevice::new();
        device
            .expect_poll()
            .returning(|| Err(ServoError::Input("unplugged".to_string())));
        device.expect_axis().never();
        device.expect_button().never();

        assert!(RawInput::capture(&mut device).is_err());
    }

    #[test]
    fn test_boxed_device_delegates() {
        let mut device: Box<dyn InputDevice> = Box::new(DisconnectedInput);
        assert!(RawInput::capture(&mut device).is_err());
    }

    #[test]
    fn test_disconnected_input_always_fails_poll() {
        let mut device = DisconnectedInput;
        assert!(RawInput::capture(&mut device).is_err());
        assert_eq!(device.axis(0), 0.0);
        assert!(!device.button(0));
    }
}
