// Timeouts, topics, drive configuration
use std::time::Duration;

use clap::Parser;

use crate::motor::LayoutKind;

// Watchdog/health loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_INPUT: &str = "blueshift/input"; // twist commands
pub const TOPIC_MOTOR_SPEEDS: &str = "blueshift/motor_speeds"; // motor output
pub const TOPIC_HEALTH: &str = "blueshift/state/health"; // health status
pub const TOPIC_SPEED_LIMIT: &str = "blueshift/param/holonomic_speed_limiter"; // parameter updates

// Holonomic speed limiter: divisor of full-scale motor speed
pub const DEFAULT_SPEED_LIMIT: i64 = 1;

/// Command line options for the control node
#[derive(Debug, Clone, Parser)]
#[command(name = "blueshift-control", about = "Twist to motor speed control node")]
pub struct Args {
    /// Drive base geometry
    #[arg(long, value_enum, default_value_t = LayoutKind::XDrive)]
    pub layout: LayoutKind,

    /// Initial holonomic speed limiter (1 = full speed, 2 = half, ...)
    #[arg(long, default_value_t = DEFAULT_SPEED_LIMIT, allow_negative_numbers = true)]
    pub speed_limit: i64,

    /// Watchdog timeout in milliseconds
    #[arg(long, default_value_t = CMD_TIMEOUT.as_millis() as u64)]
    pub cmd_timeout_ms: u64,

    #[arg(long, default_value = TOPIC_INPUT)]
    pub input_topic: String,

    #[arg(long, default_value = TOPIC_MOTOR_SPEEDS)]
    pub output_topic: String,

    #[arg(long, default_value = TOPIC_HEALTH)]
    pub health_topic: String,

    #[arg(long, default_value = TOPIC_SPEED_LIMIT)]
    pub speed_limit_topic: String,
}

impl Args {
    pub fn cmd_timeout(&self) -> Duration {
        Duration::from_millis(self.cmd_timeout_ms)
    }
}
