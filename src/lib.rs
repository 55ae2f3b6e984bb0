// Blueshift holonomic base control node
//
// Twist commands come in over zenoh, motor speeds go out.

pub mod config;
pub mod messages;
pub mod motor;
pub mod runtime;
