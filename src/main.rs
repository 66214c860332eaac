//! # Continuous Servo
//!
//! Gamepad-driven position servo with shortest-path targeting across the
//! sensor wrap point.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first CLI argument, or `config/default.toml`)
//!    - Set up logging with tracing subscriber (optionally to rolling files)
//!    - Open the gamepad, or run with no input if none is found
//!    - Create the simulated actuator and hold its current position
//!
//! 2. **Main Loop**
//!    - One control cycle per tick (10 ms by default)
//!    - Log status every `status_interval_cycles` cycles
//!    - Handle Ctrl+C for graceful shutdown
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- config/default.toml
//! ```
//!
//! Expected output:
//! ```text
//! INFO continuous_servo: Continuous Servo v0.1.0 starting...
//! INFO continuous_servo::input::gamepad: Using gamepad Logitech Gamepad F310 at /dev/input/event5
//! INFO continuous_servo::control: Servo ready: holding 0.0000 (sensor range 1, manual scale 0.3)
//! INFO continuous_servo: Starting control loop at 100Hz
//! ```

use anyhow::{Context, Result};
use std::path::Path;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use continuous_servo::actuator::SimActuator;
use continuous_servo::config::{Config, LoggingConfig};
use continuous_servo::control::ControlLoop;
use continuous_servo::input::gamepad::Gamepad;
use continuous_servo::input::{DisconnectedInput, InputDevice};

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "continuous-servo.log";

/// Load the configuration named on the command line.
///
/// Without an argument, `config/default.toml` is used if present and the
/// built-in defaults otherwise. An explicitly named file must exist.
fn load_config(arg: Option<String>) -> Result<Config> {
    match arg {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("loading {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Install the tracing subscriber.
///
/// The returned guard must be kept alive so buffered file logs are flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let stdout = tracing_subscriber::fmt::layer();

    if config.file_enabled {
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout)
            .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry().with(filter).with(stdout).init();
        None
    }
}

fn open_input(config: &Config) -> Box<dyn InputDevice> {
    let path = Some(config.input.device_path.as_str()).filter(|p| !p.is_empty());
    match Gamepad::open(path) {
        Ok(gamepad) => Box::new(gamepad),
        Err(e) => {
            warn!("{}; running without operator input, holding position", e);
            Box::new(DisconnectedInput)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config(std::env::args().nth(1))?;
    let _log_guard = init_logging(&config.logging);

    info!("Continuous Servo v{} starting...", env!("CARGO_PKG_VERSION"));

    let input = open_input(&config);
    let actuator = SimActuator::new(config.servo.sensor_range);
    let mut control = ControlLoop::new(&config, actuator, input)?;

    let period = Duration::from_millis(config.control.cycle_period_ms);
    let mut cycle_interval = interval(period);
    // A late cycle runs once; missed cycles are not replayed in a burst
    cycle_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Starting control loop at {}Hz",
        1000 / config.control.cycle_period_ms
    );
    info!("Hold the enable button to energize the actuator. Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = cycle_interval.tick() => {
                control.run_cycle();
                control.actuator_mut().advance(period);
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total cycles run: {}", control.cycle_count());
                break;
            }
        }
    }

    Ok(())
}
