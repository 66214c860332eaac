//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or a missing section) yields
//! a working configuration for a normalized rotary encoder on a Logitech-style
//! gamepad.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, ServoError};
use crate::input::{AXIS_COUNT, BUTTON_COUNT};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub servo: ServoConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Servo and sensor configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServoConfig {
    /// Sensor units covered by exactly one revolution
    #[serde(default = "default_sensor_range")]
    pub sensor_range: f64,

    /// Scale applied to the manual axis before it becomes open-loop output
    #[serde(default = "default_manual_scale")]
    pub manual_scale: f32,

    #[serde(default)]
    pub gains: GainsConfig,
}

/// Closed-loop gains loaded once into the actuator at startup
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GainsConfig {
    #[serde(default = "default_gain_p")]
    pub p: f64,

    #[serde(default)]
    pub i: f64,

    #[serde(default)]
    pub d: f64,

    /// Feed-forward; rarely used for a position servo
    #[serde(default)]
    pub f: f64,
}

/// Operator input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// evdev path; empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_deadband")]
    pub deadband: f32,

    #[serde(default = "default_manual_axis")]
    pub manual_axis: usize,

    #[serde(default = "default_target_select_axis")]
    pub target_select_axis: usize,

    #[serde(default = "default_commit_button")]
    pub commit_button: usize,

    #[serde(default = "default_enable_button")]
    pub enable_button: usize,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_cycle_period_ms")]
    pub cycle_period_ms: u64,

    /// Number of cycles between status log lines
    #[serde(default = "default_status_interval_cycles")]
    pub status_interval_cycles: u64,

    /// Only feed the actuator safety while the enable button is held
    #[serde(default = "default_safety_requires_enable")]
    pub safety_requires_enable: bool,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub file_enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Default value functions
fn default_sensor_range() -> f64 { 1.0 }
fn default_manual_scale() -> f32 { 0.3 }
fn default_gain_p() -> f64 { 0.5 }

fn default_deadband() -> f32 { 0.10 }
fn default_manual_axis() -> usize { 2 }
fn default_target_select_axis() -> usize { 0 }
fn default_commit_button() -> usize { 2 }
fn default_enable_button() -> usize { 7 }

fn default_cycle_period_ms() -> u64 { 10 }
fn default_status_interval_cycles() -> u64 { 500 }
fn default_safety_requires_enable() -> bool { true }

fn default_log_dir() -> String { "./logs".to_string() }

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            sensor_range: default_sensor_range(),
            manual_scale: default_manual_scale(),
            gains: GainsConfig::default(),
        }
    }
}

impl Default for GainsConfig {
    fn default() -> Self {
        Self {
            p: default_gain_p(),
            i: 0.0,
            d: 0.0,
            f: 0.0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            deadband: default_deadband(),
            manual_axis: default_manual_axis(),
            target_select_axis: default_target_select_axis(),
            commit_button: default_commit_button(),
            enable_button: default_enable_button(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cycle_period_ms: default_cycle_period_ms(),
            status_interval_cycles: default_status_interval_cycles(),
            safety_requires_enable: default_safety_requires_enable(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: false,
            log_dir: default_log_dir(),
        }
    }
}

fn invalid(message: impl Into<String>) -> ServoError {
    ServoError::InvalidConfig(message.into())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use continuous_servo::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// A non-positive sensor range is rejected here so it can never reach
    /// the shortest-path solver at runtime.
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        let servo = &self.servo;
        if !servo.sensor_range.is_finite() || servo.sensor_range <= 0.0 {
            return Err(invalid(format!(
                "sensor_range must be a finite value greater than 0 (got {})",
                servo.sensor_range
            )));
        }

        if !(servo.manual_scale > 0.0 && servo.manual_scale <= 1.0) {
            return Err(invalid("manual_scale must be greater than 0.0 and at most 1.0"));
        }

        for (name, value) in [
            ("p", servo.gains.p),
            ("i", servo.gains.i),
            ("d", servo.gains.d),
            ("f", servo.gains.f),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("gain {} must be finite and non-negative", name)));
            }
        }

        let input = &self.input;
        if !(0.0..0.5).contains(&input.deadband) {
            return Err(invalid("deadband must be between 0.0 (inclusive) and 0.5 (exclusive)"));
        }

        for (name, index) in [
            ("manual_axis", input.manual_axis),
            ("target_select_axis", input.target_select_axis),
        ] {
            if index >= AXIS_COUNT {
                return Err(invalid(format!(
                    "{} index {} is out of bounds (must be 0-{})",
                    name,
                    index,
                    AXIS_COUNT - 1
                )));
            }
        }

        for (name, id) in [
            ("commit_button", input.commit_button),
            ("enable_button", input.enable_button),
        ] {
            if id >= BUTTON_COUNT {
                return Err(invalid(format!(
                    "{} id {} is out of bounds (must be 0-{})",
                    name,
                    id,
                    BUTTON_COUNT - 1
                )));
            }
        }

        if input.commit_button == input.enable_button {
            return Err(invalid("commit_button and enable_button must be different buttons"));
        }

        if self.control.cycle_period_ms == 0 || self.control.cycle_period_ms > 1000 {
            return Err(invalid("cycle_period_ms must be between 1 and 1000"));
        }

        if self.control.status_interval_cycles == 0 {
            return Err(invalid("status_interval_cycles must be greater than 0"));
        }

        if self.logging.file_enabled && self.logging.log_dir.is_empty() {
            return Err(invalid("logging log_dir cannot be empty when file logging is enabled"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_sensor_range(), 1.0);
        assert_eq!(default_manual_scale(), 0.3);
        assert_eq!(default_gain_p(), 0.5);
        assert_eq!(default_deadband(), 0.10);
        assert_eq!(default_manual_axis(), 2);
        assert_eq!(default_target_select_axis(), 0);
        assert_eq!(default_commit_button(), 2);
        assert_eq!(default_enable_button(), 7);
        assert_eq!(default_cycle_period_ms(), 10);
        assert_eq!(default_status_interval_cycles(), 500);
        assert!(default_safety_requires_enable());
        assert_eq!(default_log_dir(), "./logs");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.servo.sensor_range, 1.0);
        assert_eq!(config.input.enable_button, 7);
        assert_eq!(config.servo.gains, GainsConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[servo]
sensor_range = 4096.0
manual_scale = 0.5

[servo.gains]
p = 0.8
d = 0.1

[input]
commit_button = 1

[control]
cycle_period_ms = 20
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.servo.sensor_range, 4096.0);
        assert_eq!(config.servo.manual_scale, 0.5);
        assert_eq!(config.servo.gains.p, 0.8);
        assert_eq!(config.servo.gains.i, 0.0);
        assert_eq!(config.servo.gains.d, 0.1);
        assert_eq!(config.input.commit_button, 1);
        assert_eq!(config.control.cycle_period_ms, 20);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/servo.toml");
        assert!(matches!(result, Err(ServoError::Io(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = Config::from_toml("[servo\nsensor_range = ");
        assert!(matches!(result, Err(ServoError::Config(_))));
    }

    #[test]
    fn test_sensor_range_zero_rejected() {
        let mut config = Config::default();
        config.servo.sensor_range = 0.0;
        assert!(matches!(config.validate(), Err(ServoError::InvalidConfig(_))));
    }

    #[test]
    fn test_sensor_range_negative_rejected() {
        let result = Config::from_toml("[servo]\nsensor_range = -1.0\n");
        assert!(matches!(result, Err(ServoError::InvalidConfig(_))));
    }

    #[test]
    fn test_sensor_range_not_finite_rejected() {
        let mut config = Config::default();
        config.servo.sensor_range = f64::INFINITY;
        assert!(config.validate().is_err());
        config.servo.sensor_range = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_manual_scale_bounds() {
        let mut config = Config::default();
        config.servo.manual_scale = 0.0;
        assert!(config.validate().is_err());
        config.servo.manual_scale = 1.1;
        assert!(config.validate().is_err());
        config.servo.manual_scale = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_gain_rejected() {
        let mut config = Config::default();
        config.servo.gains.d = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadband_bounds() {
        let mut config = Config::default();
        config.input.deadband = -0.01;
        assert!(config.validate().is_err());
        config.input.deadband = 0.5;
        assert!(config.validate().is_err());
        config.input.deadband = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_axis_index_out_of_bounds() {
        let mut config = Config::default();
        config.input.manual_axis = AXIS_COUNT;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_button_id_out_of_bounds() {
        let mut config = Config::default();
        config.input.enable_button = BUTTON_COUNT;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_commit_and_enable_must_differ() {
        let mut config = Config::default();
        config.input.commit_button = config.input.enable_button;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cycle_period_bounds() {
        let mut config = Config::default();
        config.control.cycle_period_ms = 0;
        assert!(config.validate().is_err());
        config.control.cycle_period_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_interval_zero() {
        let mut config = Config::default();
        config.control.status_interval_cycles = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_file_logging_enabled() {
        let mut config = Config::default();
        config.logging.file_enabled = true;
        config.logging.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_file_logging_disabled() {
        let mut config = Config::default();
        config.logging.file_enabled = false;
        config.logging.log_dir = String::new();
        assert!(config.validate().is_ok());
    }
}
