// Holonomic inverse kinematics for the Blueshift drive base
// Converts a body-frame twist (3 linear + 3 angular components) into normalized motor speeds.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::layout::DriveLayout;

/// Layout used by the scalar `compute` entry point
static DEFAULT_LAYOUT: LazyLock<DriveLayout> = LazyLock::new(DriveLayout::x_drive);

/// Error types for the kinematics converter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error("Invalid speed limit {limit}: must be greater than zero")]
    InvalidLimit { limit: i64 },

    #[error("Invalid velocity: {component} is {value}")]
    InvalidVelocity { component: &'static str, value: f64 },

    #[error("Invalid drive layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, KinematicsError>;

/// Body-frame velocity command
///
/// Linear components are in m/s, angular components in rad/s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityCommand {
    pub linear_x: f64,
    pub linear_y: f64,
    pub linear_z: f64,
    pub angular_x: f64,
    pub angular_y: f64,
    pub angular_z: f64,
}

impl VelocityCommand {
    pub fn new(linear: [f64; 3], angular: [f64; 3]) -> Self {
        Self {
            linear_x: linear[0],
            linear_y: linear[1],
            linear_z: linear[2],
            angular_x: angular[0],
            angular_y: angular[1],
            angular_z: angular[2],
        }
    }

    /// Planar command: forward, lateral and yaw rate
    pub fn planar(x: f64, y: f64, yaw: f64) -> Self {
        Self::new([x, y, 0.0], [0.0, 0.0, yaw])
    }

    /// Returns components as array [linear_x, linear_y, linear_z, angular_x, angular_y, angular_z]
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.linear_x,
            self.linear_y,
            self.linear_z,
            self.angular_x,
            self.angular_y,
            self.angular_z,
        ]
    }

    /// Every component multiplied by `k`
    pub fn scaled(&self, k: f64) -> Self {
        let [lx, ly, lz, ax, ay, az] = self.as_array().map(|v| v * k);
        Self::new([lx, ly, lz], [ax, ay, az])
    }

    /// Reject NaN and infinite components, reporting the first offender
    pub fn validate(&self) -> Result<()> {
        const NAMES: [&str; 6] = [
            "linear.x",
            "linear.y",
            "linear.z",
            "angular.x",
            "angular.y",
            "angular.z",
        ];

        match NAMES
            .iter()
            .zip(self.as_array())
            .find(|(_, value)| !value.is_finite())
        {
            Some((&component, value)) => Err(KinematicsError::InvalidVelocity { component, value }),
            None => Ok(()),
        }
    }

    fn max_abs(&self) -> f64 {
        self.as_array().iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }
}

/// Normalized motor speeds, one per wheel in the layout's motor order
///
/// Each value is a fraction of the layout's full-scale wheel speed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorSpeeds {
    speeds: Vec<f64>,
}

impl MotorSpeeds {
    pub fn new(speeds: Vec<f64>) -> Self {
        Self { speeds }
    }

    /// All motors stopped
    pub fn zero(motor_count: usize) -> Self {
        Self::new(vec![0.0; motor_count])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.speeds
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    /// Largest magnitude across all motors
    pub fn peak(&self) -> f64 {
        peak_magnitude(&self.speeds)
    }
}

/// Highest allowed motor magnitude for a speed limit
///
/// The limit acts as a divisor of full scale: 1 allows full speed, 2 half speed, and so on.
pub fn speed_bound(speed_limit: i64) -> Result<f64> {
    if speed_limit <= 0 {
        return Err(KinematicsError::InvalidLimit { limit: speed_limit });
    }
    Ok(1.0 / speed_limit as f64)
}

/// Convert a six-component twist to motor speeds on the default X-drive layout
///
/// # Arguments
/// * `linear_x` - Forward velocity in m/s (positive = forward)
/// * `linear_y` - Lateral velocity in m/s (positive = left)
/// * `linear_z` - Vertical velocity in m/s (no effect on a planar base)
/// * `angular_x`, `angular_y` - Roll and pitch rates in rad/s (no effect on a planar base)
/// * `angular_z` - Yaw rate in rad/s (positive = counter-clockwise)
/// * `speed_limit` - Divisor applied to full-scale speed, must be positive
pub fn compute(
    linear_x: f64,
    linear_y: f64,
    linear_z: f64,
    angular_x: f64,
    angular_y: f64,
    angular_z: f64,
    speed_limit: i64,
) -> Result<MotorSpeeds> {
    let cmd = VelocityCommand::new(
        [linear_x, linear_y, linear_z],
        [angular_x, angular_y, angular_z],
    );
    body_to_motor_speeds(&DEFAULT_LAYOUT, &cmd, speed_limit)
}

/// Convert a body-frame twist to motor speeds for the given layout
///
/// If any motor would exceed the limit bound, every motor is scaled by the same
/// factor so the commanded direction of motion is kept.
pub fn body_to_motor_speeds(
    layout: &DriveLayout,
    cmd: &VelocityCommand,
    speed_limit: i64,
) -> Result<MotorSpeeds> {
    let bound = speed_bound(speed_limit)?;
    cmd.validate()?;

    let mut speeds = layout.unlimited_speeds(cmd);
    let mut peak = peak_magnitude(&speeds);
    let mut saturated = peak > bound;

    if !peak.is_finite() {
        // Mixing overflowed f64: recompute the direction from a unit-scaled command.
        // The true peak is far above any bound, so it always saturates.
        speeds = layout.unlimited_speeds(&cmd.scaled(1.0 / cmd.max_abs()));
        peak = peak_magnitude(&speeds);
        saturated = true;

        if !peak.is_finite() {
            return Err(KinematicsError::InvalidLayout(
                "mixing overflows for a unit command".to_string(),
            ));
        }
    }

    if saturated && peak > 0.0 {
        for speed in &mut speeds {
            *speed = *speed / peak * bound;
        }
    }

    Ok(MotorSpeeds::new(speeds))
}

fn peak_magnitude(speeds: &[f64]) -> f64 {
    speeds.iter().fold(0.0f64, |m, s| m.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    /// A spread of finite commands covering each axis, mixes and large magnitudes
    fn sample_commands() -> Vec<VelocityCommand> {
        let mut cmds = Vec::new();
        for &x in &[-3.0, -0.5, 0.0, 0.25, 2.0] {
            for &y in &[-1.5, 0.0, 0.7] {
                for &yaw in &[-4.0, 0.0, 0.3, 12.0] {
                    cmds.push(VelocityCommand::new([x, y, 0.4], [0.1, -0.2, yaw]));
                }
            }
        }
        cmds.push(VelocityCommand::new([1e300, -1e300, 0.0], [0.0, 0.0, 1e300]));
        cmds.push(VelocityCommand::planar(f64::MAX, f64::MAX, f64::MAX));
        cmds
    }

    #[test]
    fn test_zero_velocity() {
        for limit in [1, 2, 7, i64::MAX] {
            let speeds = compute(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, limit).unwrap();
            assert_eq!(speeds.len(), 4);
            assert!(speeds.as_slice().iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_peak_never_exceeds_bound() {
        let layouts = [DriveLayout::x_drive(), DriveLayout::kiwi()];
        for layout in &layouts {
            for cmd in sample_commands() {
                for limit in [1, 2, 3, 10] {
                    let speeds = body_to_motor_speeds(layout, &cmd, limit).unwrap();
                    let bound = 1.0 / limit as f64;
                    assert!(
                        speeds.peak() <= bound + EPS,
                        "{:?} limit {} gave peak {}",
                        cmd,
                        limit,
                        speeds.peak()
                    );
                    assert!(speeds.as_slice().iter().all(|s| s.is_finite()));
                }
            }
        }
    }

    #[test]
    fn test_linearity_when_unclamped() {
        // Small commands stay well under full scale, so doubling or halving is exact
        let cmd = VelocityCommand::new([0.1, -0.05, 0.02], [0.01, 0.03, 0.2]);
        let base = body_to_motor_speeds(&DriveLayout::x_drive(), &cmd, 1).unwrap();

        for k in [2.0, 0.5, 0.25] {
            let scaled = body_to_motor_speeds(&DriveLayout::x_drive(), &cmd.scaled(k), 1).unwrap();
            for (a, b) in base.as_slice().iter().zip(scaled.as_slice()) {
                assert_eq!(a * k, *b);
            }
        }
    }

    #[test]
    fn test_rotation_only_golden_values() {
        // X-drive: every wheel is 0.2 m from centre, full scale 1.0 m/s
        let speeds = compute(0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1).unwrap();
        assert_eq!(speeds.as_slice(), &[0.2, 0.2, 0.2, 0.2]);

        let speeds = compute(0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 1).unwrap();
        assert_eq!(speeds.as_slice(), &[-0.2, -0.2, -0.2, -0.2]);

        // Kiwi: 0.125 m offset, full scale 0.5 m/s
        let cmd = VelocityCommand::planar(0.0, 0.0, 1.0);
        let speeds = body_to_motor_speeds(&DriveLayout::kiwi(), &cmd, 1).unwrap();
        assert_eq!(speeds.as_slice(), &[0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_rotation_saturates_uniformly() {
        // 10 rad/s would need 2.0 of full scale on every wheel
        let speeds = compute(0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 1).unwrap();
        for s in speeds.as_slice() {
            assert!((s - 1.0).abs() < EPS);
        }

        let speeds = compute(0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 2).unwrap();
        for s in speeds.as_slice() {
            assert!((s - 0.5).abs() < EPS);
        }
    }

    #[test]
    fn test_forward_motion() {
        // Front wheels roll backwards-diagonal, rear wheels forwards-diagonal
        let speeds = compute(0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 1).unwrap();
        println!("Forward: {:?}", speeds.as_slice());

        let half_root = 0.5 * std::f64::consts::FRAC_1_SQRT_2;
        let expected = [-half_root, -half_root, half_root, half_root];
        for (s, e) in speeds.as_slice().iter().zip(expected) {
            assert!((s - e).abs() < EPS, "got {}, expected {}", s, e);
        }
    }

    #[test]
    fn test_saturation_preserves_ratios() {
        let layout = DriveLayout::x_drive();
        let cmd = VelocityCommand::planar(3.0, 1.0, 2.0);
        let raw = layout.unlimited_speeds(&cmd);
        let limited = body_to_motor_speeds(&layout, &cmd, 4).unwrap();

        assert!((limited.peak() - 0.25).abs() < EPS);

        let ratio = limited.as_slice()[0] / raw[0];
        for (l, r) in limited.as_slice().iter().zip(&raw) {
            assert!((l / r - ratio).abs() < EPS);
        }
    }

    #[test]
    fn test_out_of_plane_components_have_no_effect() {
        let planar = compute(0.3, -0.2, 0.0, 0.0, 0.0, 0.5, 1).unwrap();
        let full = compute(0.3, -0.2, 5.0, -2.0, 1.0, 0.5, 1).unwrap();
        assert_eq!(planar, full);
    }

    #[test]
    fn test_invalid_limit() {
        for limit in [0, -1, i64::MIN] {
            let err = compute(0.1, 0.0, 0.0, 0.0, 0.0, 0.0, limit).unwrap_err();
            assert_eq!(err, KinematicsError::InvalidLimit { limit });
        }
    }

    #[test]
    fn test_limit_checked_before_velocity() {
        let err = compute(f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0, 0).unwrap_err();
        assert_eq!(err, KinematicsError::InvalidLimit { limit: 0 });
    }

    #[test]
    fn test_non_finite_velocity_rejected() {
        let bad = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY];
        for value in bad {
            for axis in 0..6 {
                let mut components = [0.0; 6];
                components[axis] = value;
                let [lx, ly, lz, ax, ay, az] = components;
                let err = compute(lx, ly, lz, ax, ay, az, 1).unwrap_err();
                assert!(
                    matches!(err, KinematicsError::InvalidVelocity { .. }),
                    "axis {} value {} gave {:?}",
                    axis,
                    value,
                    err
                );
            }
        }
    }

    #[test]
    fn test_invalid_velocity_names_component() {
        let err = compute(0.0, 0.0, 0.0, 0.0, f64::INFINITY, 0.0, 1).unwrap_err();
        match err {
            KinematicsError::InvalidVelocity { component, value } => {
                assert_eq!(component, "angular.y");
                assert_eq!(value, f64::INFINITY);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_idempotent() {
        for cmd in sample_commands() {
            let a = body_to_motor_speeds(&DriveLayout::x_drive(), &cmd, 3).unwrap();
            let b = body_to_motor_speeds(&DriveLayout::x_drive(), &cmd, 3).unwrap();
            let a_bits: Vec<u64> = a.as_slice().iter().map(|s| s.to_bits()).collect();
            let b_bits: Vec<u64> = b.as_slice().iter().map(|s| s.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
    }

    #[test]
    fn test_overflowing_command_keeps_direction() {
        // Diagonal at f64::MAX overflows the mixing sum but must still point diagonally
        let huge = compute(f64::MAX, f64::MAX, 0.0, 0.0, 0.0, 0.0, 1).unwrap();
        let modest = compute(10.0, 10.0, 0.0, 0.0, 0.0, 0.0, 1).unwrap();
        for (h, m) in huge.as_slice().iter().zip(modest.as_slice()) {
            assert!((h - m).abs() < EPS);
        }
    }
}
