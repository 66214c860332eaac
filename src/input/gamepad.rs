//! # Gamepad Input Module
//!
//! Linux evdev gamepad adapter implementing [`InputDevice`].
//!
//! Events are read on a dedicated thread into a mutex-protected state. The
//! control loop only ever copies that state out with `try_lock`, so a slow or
//! stalled device can never hold up a control cycle.
//!
//! ## Axis Indices
//!
//! | Index | evdev Code | Typical Control |
//! |-------|------------|-----------------|
//! | 0 | ABS_X | Left stick X (target select) |
//! | 1 | ABS_Y | Left stick Y |
//! | 2 | ABS_Z | Right stick X (manual drive) |
//! | 3 | ABS_RZ | Right stick Y |
//! | 4 | ABS_RX | Left trigger |
//! | 5 | ABS_RY | Right trigger |
//! | 6 | ABS_HAT0X | D-Pad X |
//! | 7 | ABS_HAT0Y | D-Pad Y |
//!
//! ## Button Ids
//!
//! | Id | evdev Code | Logitech F310 |
//! |----|------------|---------------|
//! | 1 | BTN_WEST | X |
//! | 2 | BTN_SOUTH | A (commit target) |
//! | 3 | BTN_EAST | B |
//! | 4 | BTN_NORTH | Y |
//! | 5 | BTN_TL | LB |
//! | 6 | BTN_TR | RB |
//! | 7 | BTN_TL2 | LT (enable) |
//! | 8 | BTN_TR2 | RT |
//! | 9 | BTN_SELECT | Back |
//! | 10 | BTN_START | Start |
//! | 11 | BTN_THUMBL | Left stick click |
//! | 12 | BTN_THUMBR | Right stick click |
//! | 13 | BTN_MODE | Mode |

use evdev::{AbsoluteAxisType, Device, InputEvent, Key};
use std::path::Path;
use std::sync::{Arc, Mutex, TryLockError};
use std::thread;
use tracing::{debug, info, warn};

use super::{InputDevice, AXIS_COUNT, BUTTON_COUNT};
use crate::error::{Result, ServoError};

/// Raw stick range reported by common USB gamepads.
pub const AXIS_MIN: i32 = 0;
/// Raw stick range reported by common USB gamepads.
pub const AXIS_MAX: i32 = 255;
/// Raw stick center value.
pub const AXIS_CENTER: i32 = 128;

/// Converts raw axis value (0-255) to normalized value (-1.0 to 1.0).
///
/// ```
/// use continuous_servo::input::gamepad::normalize_axis;
///
/// assert!((normalize_axis(0) - (-1.0)).abs() < 0.01);
/// assert!((normalize_axis(128) - 0.0).abs() < 0.01);
/// assert!((normalize_axis(255) - 1.0).abs() < 0.01);
/// ```
#[must_use]
pub fn normalize_axis(raw: i32) -> f32 {
    let clamped = raw.clamp(AXIS_MIN, AXIS_MAX);
    (((clamped - AXIS_CENTER) as f32) / 127.0).clamp(-1.0, 1.0)
}

fn axis_index(axis: AbsoluteAxisType) -> Option<usize> {
    match axis {
        AbsoluteAxisType::ABS_X => Some(0),
        AbsoluteAxisType::ABS_Y => Some(1),
        AbsoluteAxisType::ABS_Z => Some(2),
        AbsoluteAxisType::ABS_RZ => Some(3),
        AbsoluteAxisType::ABS_RX => Some(4),
        AbsoluteAxisType::ABS_RY => Some(5),
        AbsoluteAxisType::ABS_HAT0X => Some(6),
        AbsoluteAxisType::ABS_HAT0Y => Some(7),
        _ => None,
    }
}

fn button_id(key: Key) -> Option<usize> {
    match key {
        Key::BTN_WEST => Some(1),
        Key::BTN_SOUTH => Some(2),
        Key::BTN_EAST => Some(3),
        Key::BTN_NORTH => Some(4),
        Key::BTN_TL => Some(5),
        Key::BTN_TR => Some(6),
        Key::BTN_TL2 => Some(7),
        Key::BTN_TR2 => Some(8),
        Key::BTN_SELECT => Some(9),
        Key::BTN_START => Some(10),
        Key::BTN_THUMBL => Some(11),
        Key::BTN_THUMBR => Some(12),
        Key::BTN_MODE => Some(13),
        _ => None,
    }
}

/// Latest known gamepad state, normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamepadState {
    pub axes: [f32; AXIS_COUNT],
    pub buttons: [bool; BUTTON_COUNT],
    pub connected: bool,
}

impl Default for GamepadState {
    /// Sticks centered, buttons released, connected.
    fn default() -> Self {
        Self {
            axes: [0.0; AXIS_COUNT],
            buttons: [false; BUTTON_COUNT],
            connected: true,
        }
    }
}

impl GamepadState {
    /// Applies a single evdev event. Sync and unmapped events are ignored.
    pub fn apply_event(&mut self, event: &InputEvent) {
        match event.kind() {
            evdev::InputEventKind::AbsAxis(axis) => {
                if let Some(index) = axis_index(axis) {
                    self.axes[index] = match axis {
                        // D-Pad already reports -1/0/1
                        AbsoluteAxisType::ABS_HAT0X | AbsoluteAxisType::ABS_HAT0Y => {
                            event.value().clamp(-1, 1) as f32
                        }
                        _ => normalize_axis(event.value()),
                    };
                }
            }
            evdev::InputEventKind::Key(key) => {
                if let Some(id) = button_id(key) {
                    self.buttons[id] = event.value() != 0;
                }
            }
            _ => {}
        }
    }
}

/// An open evdev gamepad with a background reader thread.
pub struct Gamepad {
    shared: Arc<Mutex<GamepadState>>,
    latched: GamepadState,
    device_path: String,
    name: Option<String>,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Open a gamepad.
    ///
    /// With a `device_path`, that device is opened directly. Otherwise all
    /// `/dev/input/event*` devices are scanned in sorted order and the first
    /// one exposing both a south face button and an X axis is used.
    ///
    /// # Errors
    ///
    /// - `InputNotFound`: no gamepad found on the system
    /// - `Input`: the requested device could not be opened or read
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use continuous_servo::input::gamepad::Gamepad;
    ///
    /// let gamepad = Gamepad::open(None)?;
    /// println!("Connected to gamepad at: {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(device_path: Option<&str>) -> Result<Self> {
        let (device, path) = match device_path {
            Some(path) => {
                let device = Device::open(path)
                    .map_err(|e| ServoError::Input(format!("Failed to open {}: {}", path, e)))?;
                (device, path.to_string())
            }
            None => Self::detect()?,
        };

        let name = device.name().map(str::to_string);
        info!(
            "Using gamepad {} at {}",
            name.as_deref().unwrap_or("<unnamed>"),
            path
        );

        let shared = Arc::new(Mutex::new(GamepadState::default()));
        Self::spawn_reader(device, path.clone(), Arc::clone(&shared))?;

        Ok(Self {
            shared,
            latched: GamepadState::default(),
            device_path: path,
            name,
        })
    }

    fn detect() -> Result<(Device, String)> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(ServoError::Input("/dev/input directory not found".to_string()));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Deterministic selection when several gamepads are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let has_buttons = device
                        .supported_keys()
                        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
                    let has_axes = device
                        .supported_absolute_axes()
                        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));

                    debug!(
                        "Found input device: {} (buttons: {}, axes: {})",
                        path.display(),
                        has_buttons,
                        has_axes
                    );

                    if has_buttons && has_axes {
                        return Ok((device, path.to_string_lossy().to_string()));
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(ServoError::InputNotFound)
    }

    fn spawn_reader(
        mut device: Device,
        path: String,
        shared: Arc<Mutex<GamepadState>>,
    ) -> Result<()> {
        thread::Builder::new()
            .name("gamepad-reader".to_string())
            .spawn(move || loop {
                // Blocks until the device has events; the lock is not held here
                let events: Vec<InputEvent> = match device.fetch_events() {
                    Ok(events) => events.collect(),
                    Err(e) => {
                        warn!("Gamepad {} read failed: {}", path, e);
                        let mut state = shared.lock().unwrap_or_else(|p| p.into_inner());
                        state.connected = false;
                        return;
                    }
                };

                let mut state = shared.lock().unwrap_or_else(|p| p.into_inner());
                for event in &events {
                    state.apply_event(event);
                }
            })?;
        Ok(())
    }

    /// Get the device path of this gamepad
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name, if the driver reports one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl InputDevice for Gamepad {
    fn poll(&mut self) -> Result<()> {
        match self.shared.try_lock() {
            Ok(state) => self.latched = *state,
            Err(TryLockError::Poisoned(poisoned)) => self.latched = *poisoned.into_inner(),
            // Reader is mid-update; last cycle's state is still the freshest complete one
            Err(TryLockError::WouldBlock) => {}
        }

        if self.latched.connected {
            Ok(())
        } else {
            Err(ServoError::Input(format!("gamepad {} disconnected", self.device_path)))
        }
    }

    fn axis(&self, index: usize) -> f32 {
        self.latched.axes.get(index).copied().unwrap_or(0.0)
    }

    fn button(&self, index: usize) -> bool {
        self.latched.buttons.get(index).copied().unwrap_or(false)
    }
}
