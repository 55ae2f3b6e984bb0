// Define message types for the control node
// Shapes follow geometry_msgs/Twist so any ROS-style teleop can drive the base.

use serde::{Deserialize, Serialize};

use crate::motor::VelocityCommand;

pub use crate::motor::MotorSpeeds;

/// This represents a vector in free space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// Command from teleop/scripts -> control node
// Linear in m/s, angular in rad/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

// Defines how to create a VelocityCommand from a borrowed Twist
impl From<&Twist> for VelocityCommand {
    fn from(twist: &Twist) -> Self {
        Self::new(
            [twist.linear.x, twist.linear.y, twist.linear.z],
            [twist.angular.x, twist.angular.y, twist.angular.z],
        )
    }
}

/// Runtime update of the holonomic speed limiter parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedLimitUpdate {
    pub value: i64,
}

/// Health status published by the control node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeHealth {
    Ok,
    CmdStale,
    InvalidCommand,
}
