// Motor control module for the Blueshift holonomic base
//
// Provides:
// - Holonomic inverse kinematics (body twist -> normalized motor speeds)
// - Drive base geometry (wheel count, rolling directions, offsets)

pub mod kinematics;
pub mod layout;

pub use kinematics::{
    body_to_motor_speeds, compute, speed_bound, KinematicsError, MotorSpeeds, VelocityCommand,
};
pub use layout::{DriveLayout, LayoutKind, WheelMount};
